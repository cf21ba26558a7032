//! Crate-wide error types and `Result` alias.

/// Library-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the JWKS aggregator crate.
#[allow(missing_docs)]
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Toml(#[from] toml::de::Error),
	#[error(transparent)]
	Url(#[from] url::ParseError),

	#[error("Failed to fetch JWKS from source '{source_id}': {cause}")]
	FetchFailed {
		source_id: String,
		#[source]
		cause: reqwest::Error,
	},
	#[error("Failed to decode JWKS from source '{source_id}': {cause}")]
	DecodeFailed {
		source_id: String,
		#[source]
		cause: serde_json::Error,
	},
	#[error("Response from source '{source_id}' is {size} bytes, above the {limit} byte guard")]
	PayloadTooLarge { source_id: String, size: u64, limit: u64 },

	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Metrics error: {0}")]
	Metrics(String),
	#[error("Security violation: {0}")]
	Security(String),
	#[error("Validation failed for {field}: {reason}")]
	Validation { field: &'static str, reason: String },
}
impl Error {
	/// Classify the error for logging and metrics labels.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::FetchFailed { .. } => ErrorKind::Fetch,
			Self::DecodeFailed { .. } | Self::PayloadTooLarge { .. } => ErrorKind::Decode,
			_ => ErrorKind::Other,
		}
	}

	/// Identifier of the source that produced the error, if any.
	pub fn source_id(&self) -> Option<&str> {
		match self {
			Self::FetchFailed { source_id, .. }
			| Self::DecodeFailed { source_id, .. }
			| Self::PayloadTooLarge { source_id, .. } => Some(source_id),
			_ => None,
		}
	}
}

/// Coarse error classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
	/// Transport-level failure: connection, timeout, or non-success status.
	Fetch,
	/// Payload arrived but could not be turned into a key set.
	Decode,
	/// Anything outside the fetch path.
	Other,
}
impl ErrorKind {
	/// Stable label used in logs and metrics.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Fetch => "fetch",
			Self::Decode => "decode",
			Self::Other => "other",
		}
	}
}
