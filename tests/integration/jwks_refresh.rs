//! Integration tests for refresh ticks across time: failure policy, recovery, and determinism.

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use jwks_aggregator::{
	ErrorKind, FailurePolicy, Fetcher, FetcherConfig, Orchestrator, Result, SnapshotStore,
	SourceHealth, SourceRegistry, TickReport,
};
use wiremock::{
	Mock, MockServer, ResponseTemplate,
	matchers::{method, path},
};

const JWKS_A: &str = r#"{
    "keys": [
        {
            "kty": "RSA",
            "alg": "RS256",
            "use": "sig",
            "kid": "a1",
            "n": "AQIDBAUGBwgJCgsMDQ4PEBESExQVFhcYGRobHB0eHyAhIiMkJSYnKCkqKywtLi8wMTIzNDU2Nzg5Ojs8PT4_QEFCQ0RFRkdISUpLTE1OT1BRUlNUVVZXWFlaW1xdXl9gYWJjZGVmZ2hpamtsbW5vcHFyc3R1dnd4eXp7fH1-f4A",
            "e": "AQAB"
        }
    ]
}"#;

const JWKS_B: &str = r#"{
    "keys": [
        {
            "kty": "EC",
            "alg": "ES256",
            "use": "sig",
            "kid": "b1",
            "crv": "P-256",
            "x": "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU",
            "y": "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0"
        }
    ]
}"#;

/// Mounts a responder on `route` that succeeds on the first call and answers with `later`
/// afterwards.
async fn mount_then(server: &MockServer, route: &str, first: &'static str, later: ResponseTemplate) {
	let calls = Arc::new(AtomicUsize::new(0));

	Mock::given(method("GET"))
		.and(path(route))
		.respond_with(move |_: &wiremock::Request| {
			if calls.fetch_add(1, Ordering::SeqCst) == 0 {
				ResponseTemplate::new(200).set_body_string(first)
			} else {
				later.clone()
			}
		})
		.mount(server)
		.await;
}

async fn mount_ok(server: &MockServer, route: &str, body: &'static str) {
	Mock::given(method("GET"))
		.and(path(route))
		.respond_with(ResponseTemplate::new(200).set_body_string(body))
		.mount(server)
		.await;
}

fn orchestrator(server: &MockServer, policy: FailurePolicy) -> Result<Orchestrator> {
	let registry = SourceRegistry::builder()
		.require_https(false)
		.register_source("a", "a-jwks-api", format!("{}/a", server.uri()))?
		.register_source("b", "b-jwks-api", format!("{}/b", server.uri()))?
		.build()?;
	let fetcher = Fetcher::new(FetcherConfig::default())?;

	Ok(Orchestrator::new(registry, fetcher, SnapshotStore::new(), policy))
}

async fn tick(orchestrator: &Orchestrator) -> TickReport {
	orchestrator.tick().await.report().cloned().expect("tick published")
}

fn kids(orchestrator: &Orchestrator) -> Vec<String> {
	orchestrator.store().jwks().kids().map(str::to_owned).collect()
}

#[tokio::test]
async fn failed_source_contributes_nothing_under_clear_policy() -> Result<()> {
	let _ = tracing_subscriber::fmt::try_init();

	let server = MockServer::start().await;

	mount_ok(&server, "/a", JWKS_A).await;
	mount_then(&server, "/b", JWKS_B, ResponseTemplate::new(500)).await;

	let orchestrator = orchestrator(&server, FailurePolicy::Clear)?;

	tick(&orchestrator).await;

	assert_eq!(kids(&orchestrator), ["a1", "b1"]);

	let report = tick(&orchestrator).await;

	// Source b succeeded one tick earlier; its keys must not survive the failure.
	assert_eq!(kids(&orchestrator), ["a1"]);
	assert_eq!(report.failed.len(), 1);
	assert_eq!(report.failed[0].kind, ErrorKind::Fetch);

	let snapshot = orchestrator.store().get();

	assert_eq!(snapshot.generation, 2);
	assert_eq!(snapshot.sources[1].state, SourceHealth::Failing);
	assert_eq!(snapshot.sources[1].keys, 0);
	assert!(snapshot.sources[1].last_success_at.is_some());
	Ok(())
}

#[tokio::test]
async fn retain_stale_policy_keeps_last_successful_keys() -> Result<()> {
	let _ = tracing_subscriber::fmt::try_init();

	let server = MockServer::start().await;

	mount_ok(&server, "/a", JWKS_A).await;
	mount_then(&server, "/b", JWKS_B, ResponseTemplate::new(200).set_body_string("not json")).await;

	let orchestrator = orchestrator(&server, FailurePolicy::RetainStale)?;

	tick(&orchestrator).await;

	let report = tick(&orchestrator).await;

	assert_eq!(kids(&orchestrator), ["a1", "b1"]);
	assert_eq!(report.failed[0].source_id, "b");
	assert_eq!(report.failed[0].kind, ErrorKind::Decode);
	assert_eq!(orchestrator.store().get().sources[1].consecutive_failures, 1);
	Ok(())
}

#[tokio::test]
async fn unreachable_source_is_isolated() -> Result<()> {
	let _ = tracing_subscriber::fmt::try_init();

	// Bind then release a port so nothing is listening on it.
	let dead_addr = std::net::TcpListener::bind("127.0.0.1:0")?.local_addr()?;

	let server = MockServer::start().await;

	mount_ok(&server, "/a", JWKS_A).await;

	let registry = SourceRegistry::builder()
		.require_https(false)
		.register_source("a", "a-jwks-api", format!("{}/a", server.uri()))?
		.register_source("down", "down-jwks-api", format!("http://{dead_addr}/keys"))?
		.build()?;
	let orchestrator = Orchestrator::new(
		registry,
		Fetcher::new(FetcherConfig::default())?,
		SnapshotStore::new(),
		FailurePolicy::Clear,
	);
	let report = tick(&orchestrator).await;

	assert_eq!(report.succeeded, ["a"]);
	assert_eq!(report.failed[0].source_id, "down");
	assert_eq!(report.failed[0].kind, ErrorKind::Fetch);
	assert_eq!(kids(&orchestrator), ["a1"]);
	Ok(())
}

#[tokio::test]
async fn identical_fetches_serialize_identically() -> Result<()> {
	let _ = tracing_subscriber::fmt::try_init();

	let server = MockServer::start().await;

	mount_ok(&server, "/a", JWKS_A).await;
	mount_ok(&server, "/b", JWKS_B).await;

	let orchestrator = orchestrator(&server, FailurePolicy::Clear)?;

	tick(&orchestrator).await;

	let first = serde_json::to_vec(&*orchestrator.store().jwks()).expect("serialize aggregate");

	tick(&orchestrator).await;

	let second = serde_json::to_vec(&*orchestrator.store().jwks()).expect("serialize aggregate");

	assert_eq!(first, second);
	assert_eq!(orchestrator.store().get().generation, 2);
	Ok(())
}
