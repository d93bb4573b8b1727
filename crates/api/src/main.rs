use std::sync::Arc;

use anyhow::Context;

use wholesale_api::app::services::{self, AppServices};
use wholesale_api::{ApiConfig, build_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    wholesale_observability::init();

    let config = ApiConfig::from_env()?;
    let services = Arc::new(services::build_services(&config).await.context("failed to start services")?);
    let app = build_app(&config, Arc::clone(&services));

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(services))
        .await?;
    Ok(())
}

async fn shutdown_signal(services: Arc<AppServices>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
    services.shutdown();
}
