//! HTTP client integration for key set retrieval.

// crates.io
use reqwest::{Client, redirect::Policy};
// self
use crate::{_prelude::*, key::KeySet, registry::SourceDescriptor};

/// Default per-fetch timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default size guard (1 MiB).
pub const DEFAULT_MAX_RESPONSE_BYTES: u64 = 1_048_576;
/// Maximum redirect depth.
pub const MAX_REDIRECTS: usize = 10;

/// Transport settings shared by every fetch.
#[derive(Clone, Debug)]
pub struct FetcherConfig {
	/// Upper bound for one whole fetch, body included.
	pub timeout: Duration,
	/// Upper bound for establishing the connection.
	pub connect_timeout: Duration,
	/// Largest accepted response body in bytes.
	pub max_response_bytes: u64,
}
impl Default for FetcherConfig {
	fn default() -> Self {
		Self {
			timeout: DEFAULT_FETCH_TIMEOUT,
			connect_timeout: DEFAULT_CONNECT_TIMEOUT,
			max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
		}
	}
}

/// Retrieves and decodes one source's key set per call.
///
/// No retries and no caching happen here; the next scheduled tick is the retry.
#[derive(Clone, Debug)]
pub struct Fetcher {
	client: Client,
	config: FetcherConfig,
}
impl Fetcher {
	/// Build a fetcher with a dedicated reqwest client.
	pub fn new(config: FetcherConfig) -> Result<Self> {
		if config.max_response_bytes == 0 {
			return Err(Error::Validation {
				field: "max_response_bytes",
				reason: "Must be greater than zero.".into(),
			});
		}
		if config.timeout.is_zero() {
			return Err(Error::Validation {
				field: "timeout",
				reason: "Must be greater than zero.".into(),
			});
		}

		let client = Client::builder()
			.redirect(Policy::limited(MAX_REDIRECTS))
			.user_agent(format!("jwks-aggregator/{}", env!("CARGO_PKG_VERSION")))
			.connect_timeout(config.connect_timeout)
			.build()
			.map_err(|err| Error::Config(format!("Failed to build HTTP client: {err}.")))?;

		Ok(Self { client, config })
	}

	/// Fetch and decode the key set published by `source`.
	pub async fn fetch(&self, source: &SourceDescriptor) -> Result<KeySet> {
		let fetch_failed =
			|cause: reqwest::Error| Error::FetchFailed { source_id: source.id.clone(), cause };
		let start = Instant::now();
		let mut response = self
			.client
			.get(source.location.clone())
			.timeout(self.config.timeout)
			.send()
			.await
			.and_then(|response| response.error_for_status())
			.map_err(fetch_failed)?;
		let status = response.status();
		let limit = self.config.max_response_bytes;
		let too_large =
			|size: u64| Error::PayloadTooLarge { source_id: source.id.clone(), size, limit };

		if let Some(size) = response.content_length()
			&& size > limit
		{
			return Err(too_large(size));
		}

		let mut bytes = Vec::new();

		while let Some(chunk) = response.chunk().await.map_err(fetch_failed)? {
			let size = (bytes.len() + chunk.len()) as u64;

			if size > limit {
				return Err(too_large(size));
			}

			bytes.extend_from_slice(&chunk);
		}

		let jwks: KeySet = serde_json::from_slice(&bytes)
			.map_err(|cause| Error::DecodeFailed { source_id: source.id.clone(), cause })?;

		tracing::debug!(
			source = %source.id,
			status = %status,
			elapsed = ?start.elapsed(),
			keys = jwks.len(),
			"jwks fetch complete"
		);

		Ok(jwks)
	}
}
