use std::sync::Arc;

use anyhow::Context as _;
use tokio::signal;
use tracing::info;

use beacon_core::tracing::init_tracing;
use beacon_health::HealthResponder;
use beacon_server::config::ServerConfig;
use beacon_server::infra::build_registry;
use beacon_server::router::build_router;
use beacon_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ServerConfig::from_env().context("load configuration")?;

    let registry = build_registry(&config).await?;
    let state = AppState {
        http: config.http.clone(),
        health: registry.map(|r| HealthResponder::new(Arc::new(r))),
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("bind {addr}"))?;

    info!(app = %config.http.app_name, "beacon listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("beacon stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received, draining connections");
}
