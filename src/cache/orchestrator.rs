//! Refresh orchestration: fan out one fetch per source, join, merge, publish.

// crates.io
use tokio::sync::Mutex;
// self
use crate::{
	_prelude::*,
	ErrorKind,
	cache::{
		state::{FailurePolicy, SourceState},
		store::{Snapshot, SnapshotStore},
	},
	http::client::Fetcher,
	key::KeySet,
	metrics,
	registry::SourceRegistry,
};

/// Drives refresh ticks for every registered source.
///
/// Clones share the same per-source state and store. Only one tick runs at a time; a tick that
/// starts while another is in flight is skipped.
#[derive(Clone, Debug)]
pub struct Orchestrator {
	registry: SourceRegistry,
	fetcher: Arc<Fetcher>,
	store: SnapshotStore,
	policy: FailurePolicy,
	state: Arc<Mutex<TickState>>,
}
impl Orchestrator {
	/// Wire an orchestrator over the given registry, fetcher, and store.
	pub fn new(
		registry: SourceRegistry,
		fetcher: Fetcher,
		store: SnapshotStore,
		policy: FailurePolicy,
	) -> Self {
		let sources = registry.all().iter().map(|_| SourceState::new()).collect();

		Self {
			registry,
			fetcher: Arc::new(fetcher),
			store,
			policy,
			state: Arc::new(Mutex::new(TickState { generation: 0, sources })),
		}
	}

	/// Store this orchestrator publishes into.
	pub fn store(&self) -> &SnapshotStore {
		&self.store
	}

	/// Registered sources.
	pub fn registry(&self) -> &SourceRegistry {
		&self.registry
	}

	/// Run one refresh cycle.
	///
	/// Per-source failures are logged and folded into the source's state; they never fail the
	/// tick.
	#[tracing::instrument(skip(self), fields(sources = self.registry.len()))]
	pub async fn tick(&self) -> TickOutcome {
		let Ok(mut state) = self.state.try_lock() else {
			tracing::warn!("previous refresh still running; skipping tick");

			metrics::record_tick_skipped();

			return TickOutcome::Skipped;
		};
		let started = Instant::now();
		let tasks: Vec<_> = self
			.registry
			.all()
			.iter()
			.cloned()
			.map(|source| {
				let fetcher = self.fetcher.clone();

				tokio::spawn(async move {
					let fetch_started = Instant::now();
					let result = fetcher.fetch(&source).await;

					(result, fetch_started.elapsed(), Utc::now())
				})
			})
			.collect();
		let mut succeeded = Vec::new();
		let mut failed = Vec::new();

		for ((source, task), slot) in
			self.registry.all().iter().zip(tasks).zip(state.sources.iter_mut())
		{
			match task.await {
				Ok((Ok(jwks), elapsed, finished_at)) => {
					metrics::record_fetch_success(&source.id, elapsed, jwks.len());

					slot.record_success(jwks, finished_at);
					succeeded.push(source.id.clone());
				},
				Ok((Err(err), _, finished_at)) => {
					let kind = err.kind();

					tracing::error!(source = %source.id, kind = kind.as_str(), error = %err, "jwks fetch failed");

					metrics::record_fetch_error(&source.id, kind);

					let message = err.to_string();

					slot.record_failure(message.clone(), finished_at, self.policy);
					failed.push(SourceFailure { source_id: source.id.clone(), kind, message });
				},
				Err(err) => {
					tracing::error!(source = %source.id, error = %err, "jwks fetch task aborted");

					metrics::record_fetch_error(&source.id, ErrorKind::Other);

					let message = format!("Fetch task aborted: {err}.");

					slot.record_failure(message.clone(), Utc::now(), self.policy);
					failed.push(SourceFailure {
						source_id: source.id.clone(),
						kind: ErrorKind::Other,
						message,
					});
				},
			}
		}

		let jwks = KeySet::concat(state.sources.iter().map(SourceState::contribution));
		let sources = self
			.registry
			.all()
			.iter()
			.zip(state.sources.iter())
			.map(|(source, slot)| slot.status(source))
			.collect::<Vec<_>>();

		state.generation += 1;

		let generation = state.generation;
		let keys = jwks.len();

		self.store.set(Snapshot {
			generation,
			published_at: Some(Utc::now()),
			jwks: Arc::new(jwks),
			sources: Arc::from(sources),
		});

		let elapsed = started.elapsed();

		metrics::record_tick_published(elapsed, keys);

		tracing::info!(
			generation,
			keys,
			failed = failed.len(),
			elapsed = ?elapsed,
			"jwks aggregate published"
		);

		TickOutcome::Published(TickReport { generation, keys, succeeded, failed, elapsed })
	}
}

/// Result of calling [`Orchestrator::tick`].
#[derive(Clone, Debug)]
pub enum TickOutcome {
	/// A new snapshot was published.
	Published(TickReport),
	/// Another tick was still running; nothing was fetched or published.
	Skipped,
}
impl TickOutcome {
	/// Report of the published tick, if any.
	pub fn report(&self) -> Option<&TickReport> {
		match self {
			Self::Published(report) => Some(report),
			Self::Skipped => None,
		}
	}
}

/// Summary of one published tick.
#[derive(Clone, Debug)]
pub struct TickReport {
	/// Generation of the published snapshot.
	pub generation: u64,
	/// Keys in the published aggregate.
	pub keys: usize,
	/// Sources whose fetch succeeded, in registry order.
	pub succeeded: Vec<String>,
	/// Sources whose fetch failed, in registry order.
	pub failed: Vec<SourceFailure>,
	/// Wall time from fan-out to publish.
	pub elapsed: Duration,
}

/// One failed source within a tick.
#[derive(Clone, Debug)]
pub struct SourceFailure {
	/// Source identifier.
	pub source_id: String,
	/// Classification of the failure.
	pub kind: ErrorKind,
	/// Rendered error message.
	pub message: String,
}

#[derive(Debug)]
struct TickState {
	generation: u64,
	sources: Vec<SourceState>,
}
