//! Periodic JWKS aggregator: polls several key publishers on a schedule, merges their key sets,
//! and serves the merged snapshot without putting network calls on the read path.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod app;
pub mod cache;
pub mod config;
pub mod http;
pub mod key;
pub mod metrics;
pub mod registry;
pub mod scheduler;
pub mod security;
pub mod server;
pub mod telemetry;

mod error;
mod _prelude {
	pub use std::{sync::Arc, time::Duration};

	pub use chrono::{DateTime, Utc};
	pub use tokio::time::Instant;

	pub use crate::{Error, Result};
}

pub use crate::{
	app::App,
	cache::{
		orchestrator::{Orchestrator, SourceFailure, TickOutcome, TickReport},
		state::{FailurePolicy, SourceHealth, SourceState, SourceStatus},
		store::{Snapshot, SnapshotStore},
	},
	config::{Cli, Config},
	error::{Error, ErrorKind, Result},
	http::client::{Fetcher, FetcherConfig},
	key::{Key, KeySet},
	registry::{SourceDescriptor, SourceRegistry, SourceRegistryBuilder},
	scheduler::SchedulerHandle,
};
