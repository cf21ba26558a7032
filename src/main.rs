//! `jwks-aggregator` binary entry point.

// crates.io
use clap::Parser;
// self
use jwks_aggregator::{App, Cli, Config, Result, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	telemetry::init_tracing()?;

	let config = Config::from_cli(&cli)?;
	let app = App::bind(config).await?;

	tracing::info!(addr = %app.local_addr()?, "jwks aggregator listening");

	app.run(shutdown_signal()).await
}

async fn shutdown_signal() {
	if let Err(err) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %err, "failed to listen for shutdown signal");

		std::future::pending::<()>().await;
	}

	tracing::info!("shutdown signal received");
}
