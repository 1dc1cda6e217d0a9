//! # TaskChain API Server
//!
//! Serves the task sequencing workflow over HTTP. Migrations are not run
//! here; apply them first with `taskchain-migrate`.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p taskchain-api --bin taskchain-api
//! ```

use anyhow::Context;
use std::sync::Arc;
use taskchain_api::{
    app::{build_router, AppState},
    config::Config,
};
use taskchain_shared::{
    db::pool::{close_pool, create_pool},
    store::PgStore,
    workflow::WorkflowService,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "taskchain_api=debug,taskchain_shared=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "TaskChain API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let config = Config::from_env().context("Failed to load configuration")?;
    let pool = create_pool(config.pool_config())
        .await
        .context("Failed to connect to database")?;

    let workflow = WorkflowService::new(Arc::new(PgStore::new(pool.clone())));
    let bind_address = config.bind_address();
    let state = AppState::new(pool.clone(), workflow, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    tracing::info!(address = %bind_address, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    close_pool(pool).await;
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
