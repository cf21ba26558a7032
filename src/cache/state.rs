//! Per-source state cells and their status view.

// crates.io
use serde::{Deserialize, Serialize};
use url::Url;
// self
use crate::{_prelude::*, key::KeySet, registry::SourceDescriptor};

/// What a failed fetch does to the source's contribution.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
	/// The source contributes nothing until its next successful fetch.
	#[default]
	Clear,
	/// The last successfully fetched keys keep being published.
	RetainStale,
}

/// Health of one source as seen by the most recent tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum SourceHealth {
	/// No fetch has completed yet.
	Pending,
	/// The latest fetch succeeded.
	Healthy,
	/// The latest fetch failed.
	Failing,
}

/// Mutable cell holding one source's current contribution.
///
/// Each cell is written only with its own source's fetch result, at most once per tick.
#[derive(Clone, Debug)]
pub struct SourceState {
	contribution: Arc<KeySet>,
	last_attempt_at: Option<DateTime<Utc>>,
	last_success_at: Option<DateTime<Utc>>,
	last_error: Option<String>,
	consecutive_failures: u32,
}
impl SourceState {
	/// Create an empty cell.
	pub fn new() -> Self {
		Self {
			contribution: Arc::new(KeySet::empty()),
			last_attempt_at: None,
			last_success_at: None,
			last_error: None,
			consecutive_failures: 0,
		}
	}

	/// Keys this source contributes to the next aggregate.
	pub fn contribution(&self) -> &KeySet {
		&self.contribution
	}

	/// Store a freshly fetched key set.
	pub fn record_success(&mut self, jwks: KeySet, at: DateTime<Utc>) {
		self.contribution = Arc::new(jwks);
		self.last_attempt_at = Some(at);
		self.last_success_at = Some(at);
		self.last_error = None;
		self.consecutive_failures = 0;
	}

	/// Record a failed fetch, applying `policy` to the contribution.
	pub fn record_failure(&mut self, error: String, at: DateTime<Utc>, policy: FailurePolicy) {
		if policy == FailurePolicy::Clear {
			self.contribution = Arc::new(KeySet::empty());
		}

		self.last_attempt_at = Some(at);
		self.last_error = Some(error);
		self.consecutive_failures = self.consecutive_failures.saturating_add(1);
	}

	/// Health derived from the latest attempt.
	pub fn health(&self) -> SourceHealth {
		match (self.last_attempt_at, &self.last_error) {
			(None, _) => SourceHealth::Pending,
			(Some(_), None) => SourceHealth::Healthy,
			(Some(_), Some(_)) => SourceHealth::Failing,
		}
	}

	/// Consecutive failed fetches since the last success.
	pub fn consecutive_failures(&self) -> u32 {
		self.consecutive_failures
	}

	/// Build the public status view for `source`.
	pub fn status(&self, source: &SourceDescriptor) -> SourceStatus {
		SourceStatus {
			id: source.id.clone(),
			name: source.name.clone(),
			location: source.location.clone(),
			state: self.health(),
			keys: self.contribution.len(),
			last_attempt_at: self.last_attempt_at,
			last_success_at: self.last_success_at,
			consecutive_failures: self.consecutive_failures,
			last_error: self.last_error.clone(),
		}
	}
}
impl Default for SourceState {
	fn default() -> Self {
		Self::new()
	}
}

/// Public representation of one source at publish time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStatus {
	/// Source identifier.
	pub id: String,
	/// Display name.
	pub name: String,
	/// Fetch location.
	pub location: Url,
	/// Health derived from the latest attempt.
	pub state: SourceHealth,
	/// Keys contributed to the published aggregate.
	pub keys: usize,
	/// When the latest fetch finished.
	pub last_attempt_at: Option<DateTime<Utc>>,
	/// When the latest successful fetch finished.
	pub last_success_at: Option<DateTime<Utc>>,
	/// Failed fetches since the last success.
	pub consecutive_failures: u32,
	/// Message of the latest failure, cleared on success.
	pub last_error: Option<String>,
}
