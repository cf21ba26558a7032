//! Snapshot store shared by the refresh orchestrator (writer) and the read endpoint (readers).

// crates.io
use tokio::sync::watch;
// self
use crate::{_prelude::*, cache::state::SourceStatus, key::KeySet};

/// Immutable published view: the merged key set plus per-source status.
#[derive(Clone, Debug)]
pub struct Snapshot {
	/// Publish counter; zero until the first tick completes.
	pub generation: u64,
	/// When this snapshot was published.
	pub published_at: Option<DateTime<Utc>>,
	/// Aggregate key set served to readers.
	pub jwks: Arc<KeySet>,
	/// Status of every source, in registry order.
	pub sources: Arc<[SourceStatus]>,
}
impl Snapshot {
	/// Snapshot served before anything has been published.
	pub fn empty() -> Self {
		Self {
			generation: 0,
			published_at: None,
			jwks: Arc::new(KeySet::empty()),
			sources: Arc::from(Vec::new()),
		}
	}
}
impl Default for Snapshot {
	fn default() -> Self {
		Self::empty()
	}
}

/// Holds the current [`Snapshot`].
///
/// Readers clone an `Arc` and never wait on refresh work; the writer builds the next snapshot
/// before swapping it in. Clones share the same underlying slot.
#[derive(Clone, Debug)]
pub struct SnapshotStore {
	slot: Arc<watch::Sender<Arc<Snapshot>>>,
}
impl SnapshotStore {
	/// Create a store holding [`Snapshot::empty`].
	pub fn new() -> Self {
		let (slot, _) = watch::channel(Arc::new(Snapshot::empty()));

		Self { slot: Arc::new(slot) }
	}

	/// Current snapshot.
	pub fn get(&self) -> Arc<Snapshot> {
		self.slot.borrow().clone()
	}

	/// Current aggregate key set.
	pub fn jwks(&self) -> Arc<KeySet> {
		self.slot.borrow().jwks.clone()
	}

	/// Replace the published snapshot.
	pub fn set(&self, snapshot: Snapshot) {
		self.slot.send_replace(Arc::new(snapshot));
	}

	/// Receiver that is notified on every publish.
	pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
		self.slot.subscribe()
	}
}
impl Default for SnapshotStore {
	fn default() -> Self {
		Self::new()
	}
}
