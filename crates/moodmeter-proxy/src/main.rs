use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use moodmeter_proxy::telemetry::init_tracing;
use moodmeter_proxy::{build_router, ProxyConfig, ProxyState, StartupError};

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal in production.
    let _ = dotenvy::dotenv();
    init_tracing("info");

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "proxy server stopped");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<(), StartupError> {
    let config = ProxyConfig::parse();
    config.validate()?;
    let addr = config.listen_addr()?;

    let configured = config.configured_vendors();
    if configured.len() < 4 {
        tracing::warn!(?configured, "some vendor keys are missing; their routes will answer 500");
    }

    let state = Arc::new(ProxyState::new(config)?);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, ?configured, "proxy server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
