//! Process configuration: TOML file plus command-line overrides.

// std
use std::{
	fs,
	net::{Ipv4Addr, SocketAddr},
	path::{Path, PathBuf},
};
// crates.io
use clap::Parser;
use serde::{Deserialize, Serialize};
// self
use crate::{
	_prelude::*,
	cache::state::FailurePolicy,
	http::client::{
		DEFAULT_CONNECT_TIMEOUT, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_RESPONSE_BYTES, FetcherConfig,
	},
	registry::{SourceDescriptor, SourceRegistry},
	scheduler::DEFAULT_REFRESH_INTERVAL,
	security,
};

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8000;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "jwks-aggregator", version, about)]
pub struct Cli {
	/// Path to a TOML configuration file.
	#[arg(long, short, env = "JWKS_AGGREGATOR_CONFIG")]
	pub config: Option<PathBuf>,
	/// Address to serve on, overriding the configuration file.
	#[arg(long, env = "JWKS_AGGREGATOR_LISTEN")]
	pub listen: Option<SocketAddr>,
}

/// Aggregator configuration. Every field has a default.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	/// Address the read endpoint binds to.
	pub listen: SocketAddr,
	/// Seconds between refresh ticks.
	pub refresh_interval_secs: u64,
	/// What a failed fetch does to that source's published keys.
	pub failure_policy: FailurePolicy,
	/// Reject source locations that are not HTTPS.
	pub require_https: bool,
	/// Host suffix allowlist for source locations; empty allows every host.
	#[serde(deserialize_with = "security::deserialize_allowed_domains")]
	pub allowed_domains: Vec<String>,
	/// Install the Prometheus recorder and serve `/metrics`.
	pub metrics: bool,
	/// Transport settings.
	pub fetch: FetchSettings,
	/// Sources in merge order. Google and Microsoft are used when empty.
	pub sources: Vec<SourceDescriptor>,
}
impl Config {
	/// Parse a TOML document.
	pub fn from_toml_str(raw: &str) -> Result<Self> {
		let config: Self = toml::from_str(raw)?;

		config.validate()?;

		Ok(config)
	}

	/// Load from `path`, or fall back to defaults when no path is given.
	pub fn load(path: Option<&Path>) -> Result<Self> {
		match path {
			Some(path) => {
				let raw = fs::read_to_string(path).map_err(|err| {
					Error::Config(format!("Failed to read {}: {err}.", path.display()))
				})?;

				Self::from_toml_str(&raw)
			},
			None => Ok(Self::default()),
		}
	}

	/// Load the file named by `cli` and apply its overrides.
	pub fn from_cli(cli: &Cli) -> Result<Self> {
		let mut config = Self::load(cli.config.as_deref())?;

		if let Some(listen) = cli.listen {
			config.listen = listen;
		}

		Ok(config)
	}

	/// Check value ranges.
	pub fn validate(&self) -> Result<()> {
		if self.refresh_interval_secs == 0 {
			return Err(Error::Validation {
				field: "refresh_interval_secs",
				reason: "Must be greater than zero.".into(),
			});
		}
		if self.fetch.timeout_secs == 0 {
			return Err(Error::Validation {
				field: "fetch.timeout_secs",
				reason: "Must be greater than zero.".into(),
			});
		}
		if self.fetch.max_response_bytes == 0 {
			return Err(Error::Validation {
				field: "fetch.max_response_bytes",
				reason: "Must be greater than zero.".into(),
			});
		}

		Ok(())
	}

	/// Period between refresh ticks.
	pub fn refresh_interval(&self) -> Duration {
		Duration::from_secs(self.refresh_interval_secs)
	}

	/// Transport settings for the fetcher.
	pub fn fetcher_config(&self) -> FetcherConfig {
		FetcherConfig {
			timeout: Duration::from_secs(self.fetch.timeout_secs),
			connect_timeout: Duration::from_secs(self.fetch.connect_timeout_secs),
			max_response_bytes: self.fetch.max_response_bytes,
		}
	}

	/// Build the source registry described by this configuration.
	pub fn registry(&self) -> Result<SourceRegistry> {
		let sources = if self.sources.is_empty() {
			SourceRegistry::default_sources()
		} else {
			self.sources.clone()
		};

		sources
			.into_iter()
			.fold(
				SourceRegistry::builder()
					.require_https(self.require_https)
					.allowed_domains(&self.allowed_domains),
				|builder, source| builder.register(source),
			)
			.build()
	}
}
impl Default for Config {
	fn default() -> Self {
		Self {
			listen: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
			refresh_interval_secs: DEFAULT_REFRESH_INTERVAL.as_secs(),
			failure_policy: FailurePolicy::default(),
			require_https: true,
			allowed_domains: Vec::new(),
			metrics: false,
			fetch: FetchSettings::default(),
			sources: Vec::new(),
		}
	}
}

/// `[fetch]` table.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchSettings {
	/// Whole-fetch timeout in seconds.
	pub timeout_secs: u64,
	/// Connect timeout in seconds.
	pub connect_timeout_secs: u64,
	/// Largest accepted response body in bytes.
	pub max_response_bytes: u64,
}
impl Default for FetchSettings {
	fn default() -> Self {
		Self {
			timeout_secs: DEFAULT_FETCH_TIMEOUT.as_secs(),
			connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT.as_secs(),
			max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
		}
	}
}
