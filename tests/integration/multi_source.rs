//! End-to-end coverage: configured sources, the refresh loop, and the HTTP read endpoint.

// std
use std::{net::SocketAddr, time::Duration};
// crates.io
use jwks_aggregator::{App, Config, Result, SourceDescriptor};
use serde_json::{Value, json};
use tokio::sync::oneshot;
use wiremock::{
	Mock, MockServer, ResponseTemplate,
	matchers::{method, path},
};

const JWKS_A: &str = r#"{"keys":[{"kty":"RSA","use":"sig","alg":"RS256","kid":"a1","n":"na","e":"AQAB"}]}"#;
const JWKS_B: &str = r#"{"keys":[{"kty":"RSA","use":"sig","alg":"RS256","kid":"b1","n":"nb","e":"AQAB"}]}"#;

fn config_for(server: &MockServer) -> Result<Config> {
	Ok(Config {
		listen: SocketAddr::from(([127, 0, 0, 1], 0)),
		require_https: false,
		sources: vec![
			SourceDescriptor::new("a", "a-jwks-api", format!("{}/a", server.uri()))?,
			SourceDescriptor::new("b", "b-jwks-api", format!("{}/b", server.uri()))?,
		],
		..Config::default()
	})
}

async fn get_json(addr: SocketAddr, route: &str) -> (u16, Value) {
	let response =
		reqwest::get(format!("http://{addr}{route}")).await.expect("read endpoint reachable");
	let status = response.status().as_u16();

	(status, response.json().await.expect("json body"))
}

#[tokio::test]
async fn serves_merged_keys_in_registry_order() -> Result<()> {
	let _ = tracing_subscriber::fmt::try_init();

	let server = MockServer::start().await;

	// The first source answers last; the merge must still follow registry order.
	Mock::given(method("GET"))
		.and(path("/a"))
		.respond_with(
			ResponseTemplate::new(200)
				.set_body_string(JWKS_A)
				.set_delay(Duration::from_millis(150)),
		)
		.expect(1..)
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path("/b"))
		.respond_with(ResponseTemplate::new(200).set_body_string(JWKS_B))
		.expect(1..)
		.mount(&server)
		.await;

	let app = App::bind(config_for(&server)?).await?;
	let addr = app.local_addr()?;
	let mut published = app.store().subscribe();
	let (stop, stopped) = oneshot::channel::<()>();
	let running = tokio::spawn(app.run(async move {
		let _ = stopped.await;
	}));

	tokio::time::timeout(Duration::from_secs(5), published.changed())
		.await
		.expect("first tick within deadline")
		.expect("store alive");

	let (status, body) = get_json(addr, "/jwks").await;

	assert_eq!(status, 200);
	assert_eq!(
		body,
		json!({"keys": [
			{"kty": "RSA", "use": "sig", "alg": "RS256", "kid": "a1", "n": "na", "e": "AQAB"},
			{"kty": "RSA", "use": "sig", "alg": "RS256", "kid": "b1", "n": "nb", "e": "AQAB"}
		]})
	);

	let (_, status_body) = get_json(addr, "/status").await;

	assert_eq!(status_body["generation"], 1);
	assert_eq!(status_body["sources"][0]["id"], "a");
	assert_eq!(status_body["sources"][1]["state"], "Healthy");

	let _ = stop.send(());

	running.await.expect("app task")?;
	server.verify().await;
	Ok(())
}

#[tokio::test]
async fn serves_empty_set_before_first_tick_and_survives_bad_source() -> Result<()> {
	let _ = tracing_subscriber::fmt::try_init();

	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.and(path("/a"))
		.respond_with(
			ResponseTemplate::new(200)
				.set_body_string(JWKS_A)
				.set_delay(Duration::from_millis(500)),
		)
		.mount(&server)
		.await;
	Mock::given(method("GET"))
		.and(path("/b"))
		.respond_with(ResponseTemplate::new(200).set_body_string("{\"keys\": 42}"))
		.mount(&server)
		.await;

	let app = App::bind(config_for(&server)?).await?;
	let addr = app.local_addr()?;
	let mut published = app.store().subscribe();
	let (stop, stopped) = oneshot::channel::<()>();
	let running = tokio::spawn(app.run(async move {
		let _ = stopped.await;
	}));
	let (status, body) = get_json(addr, "/jwks").await;

	assert_eq!(status, 200);
	assert_eq!(body, json!({"keys": []}));

	tokio::time::timeout(Duration::from_secs(5), published.changed())
		.await
		.expect("first tick within deadline")
		.expect("store alive");

	let (status, body) = get_json(addr, "/jwks").await;

	assert_eq!(status, 200);
	assert_eq!(body["keys"].as_array().map(Vec::len), Some(1));
	assert_eq!(body["keys"][0]["kid"], "a1");

	let (_, status_body) = get_json(addr, "/status").await;

	assert_eq!(status_body["sources"][1]["state"], "Failing");
	assert!(status_body["sources"][1]["last_error"].as_str().is_some_and(|err| err.contains("decode")));

	let _ = stop.send(());

	running.await.expect("app task")?;
	Ok(())
}
