//! Read endpoints over the snapshot store.
//!
//! Handlers only read the current snapshot; nothing here touches the network or waits on a
//! refresh.

// std
use std::future::Future;
// crates.io
use axum::{
	Json, Router,
	extract::State,
	response::{IntoResponse, Response},
	routing::get,
};
use http::{StatusCode, header::CONTENT_TYPE};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
// self
use crate::{
	_prelude::*,
	cache::{state::SourceStatus, store::SnapshotStore},
	key::KeySet,
};

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
	store: SnapshotStore,
	metrics: Option<PrometheusHandle>,
}
impl AppState {
	/// State serving `store` without a metrics endpoint.
	pub fn new(store: SnapshotStore) -> Self {
		Self { store, metrics: None }
	}

	/// Expose the given Prometheus handle on `/metrics`.
	pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
		self.metrics = Some(handle);

		self
	}
}

/// Body of `GET /status`.
#[derive(Debug, Serialize)]
struct StatusBody {
	generation: u64,
	published_at: Option<DateTime<Utc>>,
	keys: usize,
	sources: Arc<[SourceStatus]>,
}

/// Build the HTTP router.
pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/jwks", get(jwks))
		.route("/status", get(status))
		.route("/metrics", get(prometheus))
		.route("/healthz", get(healthz))
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

/// Serve `router` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
	F: Future<Output = ()> + Send + 'static,
{
	tracing::info!(addr = ?listener.local_addr().ok(), "serving jwks");

	axum::serve(listener, router).with_graceful_shutdown(shutdown).await?;

	Ok(())
}

async fn jwks(State(state): State<AppState>) -> Json<Arc<KeySet>> {
	Json(state.store.jwks())
}

async fn status(State(state): State<AppState>) -> Json<StatusBody> {
	let snapshot = state.store.get();

	Json(StatusBody {
		generation: snapshot.generation,
		published_at: snapshot.published_at,
		keys: snapshot.jwks.len(),
		sources: snapshot.sources.clone(),
	})
}

async fn prometheus(State(state): State<AppState>) -> Response {
	match state.metrics {
		Some(handle) => {
			([(CONTENT_TYPE, "text/plain; version=0.0.4")], handle.render()).into_response()
		},
		None => StatusCode::NOT_FOUND.into_response(),
	}
}

async fn healthz() -> &'static str {
	"ok"
}
