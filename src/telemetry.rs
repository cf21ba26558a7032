//! Tracing subscriber setup for the binary.

// crates.io
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
// self
use crate::_prelude::*;

/// Filter applied when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,jwks_aggregator=info,tower_http=warn";

/// Install the global `tracing` subscriber. Override the filter via `RUST_LOG`.
pub fn init_tracing() -> Result<()> {
	let filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

	tracing_subscriber::registry()
		.with(filter)
		.with(fmt::layer())
		.try_init()
		.map_err(|err| Error::Config(format!("Failed to install tracing subscriber: {err}.")))
}
