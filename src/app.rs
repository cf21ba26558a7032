//! Wiring of registry, fetcher, orchestrator, scheduler, and server into one process.

// std
use std::{future::Future, net::SocketAddr};
// crates.io
use tokio::net::TcpListener;
// self
use crate::{
	_prelude::*,
	cache::{orchestrator::Orchestrator, store::SnapshotStore},
	config::Config,
	http::client::Fetcher,
	metrics,
	scheduler::SchedulerHandle,
	server::{self, AppState},
};

/// Fully wired aggregator, ready to serve.
#[derive(Debug)]
pub struct App {
	config: Config,
	orchestrator: Orchestrator,
	listener: TcpListener,
}
impl App {
	/// Build every component from `config` and bind the listen address.
	pub async fn bind(config: Config) -> Result<Self> {
		config.validate()?;

		let registry = config.registry()?;
		let fetcher = Fetcher::new(config.fetcher_config())?;
		let orchestrator =
			Orchestrator::new(registry, fetcher, SnapshotStore::new(), config.failure_policy);
		let listener = TcpListener::bind(config.listen).await?;

		if config.metrics {
			metrics::install_default_exporter()?;
		}

		tracing::info!(
			sources = orchestrator.registry().len(),
			policy = ?config.failure_policy,
			interval = ?config.refresh_interval(),
			"jwks aggregator configured"
		);

		Ok(Self { config, orchestrator, listener })
	}

	/// Address the listener is bound to.
	pub fn local_addr(&self) -> Result<SocketAddr> {
		Ok(self.listener.local_addr()?)
	}

	/// Store the read endpoint serves from.
	pub fn store(&self) -> &SnapshotStore {
		self.orchestrator.store()
	}

	/// Start the refresh loop and serve until `shutdown` resolves.
	pub async fn run<F>(self, shutdown: F) -> Result<()>
	where
		F: Future<Output = ()> + Send + 'static,
	{
		let Self { config, orchestrator, listener } = self;
		let mut state = AppState::new(orchestrator.store().clone());

		if let Some(handle) = metrics::prometheus_handle() {
			state = state.with_metrics(handle.clone());
		}

		let scheduler = SchedulerHandle::spawn(orchestrator, config.refresh_interval())?;
		let served = server::serve(listener, server::router(state), shutdown).await;

		scheduler.shutdown().await;

		served
	}
}
