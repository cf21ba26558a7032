//! Metrics helpers for fetch and tick telemetry.

// std
use std::sync::OnceLock;
// crates.io
use metrics::Label;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use smallvec::SmallVec;
// self
use crate::{_prelude::*, ErrorKind};

type LabelSet = SmallVec<[Label; 3]>;

const METRIC_FETCH_TOTAL: &str = "jwks_aggregator_fetch_total";
const METRIC_FETCH_DURATION: &str = "jwks_aggregator_fetch_duration_seconds";
const METRIC_FETCH_ERRORS: &str = "jwks_aggregator_fetch_errors_total";
const METRIC_SOURCE_KEYS: &str = "jwks_aggregator_source_keys";
const METRIC_TICKS_TOTAL: &str = "jwks_aggregator_ticks_total";
const METRIC_TICK_DURATION: &str = "jwks_aggregator_tick_duration_seconds";
const METRIC_AGGREGATE_KEYS: &str = "jwks_aggregator_aggregate_keys";

/// Shared Prometheus handle installed by [`install_default_exporter`].
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the default Prometheus recorder backed by `metrics`.
///
/// Multiple invocations are safe; subsequent calls become no-ops once the recorder is installed.
pub fn install_default_exporter() -> Result<()> {
	if PROMETHEUS_HANDLE.get().is_some() {
		return Ok(());
	}

	let handle = PrometheusBuilder::new()
		.install_recorder()
		.map_err(|err| Error::Metrics(err.to_string()))?;
	let _ = PROMETHEUS_HANDLE.set(handle);

	Ok(())
}

/// Access the global Prometheus exporter handle when installed.
pub fn prometheus_handle() -> Option<&'static PrometheusHandle> {
	PROMETHEUS_HANDLE.get()
}

/// Record a successful fetch for `source`.
pub fn record_fetch_success(source: &str, duration: Duration, keys: usize) {
	metrics::counter!(METRIC_FETCH_TOTAL, status_labels(source, "success").iter()).increment(1);
	metrics::histogram!(METRIC_FETCH_DURATION, source_labels(source).iter())
		.record(duration.as_secs_f64());
	metrics::gauge!(METRIC_SOURCE_KEYS, source_labels(source).iter()).set(keys as f64);
}

/// Record a failed fetch for `source`.
pub fn record_fetch_error(source: &str, kind: ErrorKind) {
	let mut labels = source_labels(source);

	labels.push(Label::new("kind", kind.as_str()));

	metrics::counter!(METRIC_FETCH_TOTAL, status_labels(source, "error").iter()).increment(1);
	metrics::counter!(METRIC_FETCH_ERRORS, labels.iter()).increment(1);
}

/// Record a published tick.
pub fn record_tick_published(duration: Duration, aggregate_keys: usize) {
	metrics::counter!(METRIC_TICKS_TOTAL, "outcome" => "published").increment(1);
	metrics::histogram!(METRIC_TICK_DURATION).record(duration.as_secs_f64());
	metrics::gauge!(METRIC_AGGREGATE_KEYS).set(aggregate_keys as f64);
}

/// Record a tick skipped because another one was still running.
pub fn record_tick_skipped() {
	metrics::counter!(METRIC_TICKS_TOTAL, "outcome" => "skipped").increment(1);
}

fn source_labels(source: &str) -> LabelSet {
	let mut labels = LabelSet::new();

	labels.push(Label::new("source", source.to_owned()));

	labels
}

fn status_labels(source: &str, status: &'static str) -> LabelSet {
	let mut labels = source_labels(source);

	labels.push(Label::new("status", status));

	labels
}
