//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, cache tier selection, background jobs, and
//! the Axum server lifecycle.

use crate::application::jobs::{ClickAggregator, ExpirySweeper, spawn_warm_up};
use crate::application::services::LinkService;
use crate::config::Config;
use crate::infrastructure::cache::CacheManager;
use crate::infrastructure::persistence::PgLinkRepository;
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Cache tiers (in-process, plus Redis when reachable)
/// - Background cache warm-up, click aggregation and expiry sweep
/// - Axum HTTP server
///
/// On Ctrl+C or SIGTERM the server stops accepting connections, drains
/// in-flight requests, then signals the background jobs and waits for them;
/// the click aggregator flushes pending counts one last time.
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let cache = Arc::new(CacheManager::connect(&config.cache_settings()).await);

    let repository = Arc::new(PgLinkRepository::new(Arc::new(pool)));
    let link_service = Arc::new(LinkService::new(
        repository.clone(),
        cache.clone(),
        config.link_settings(),
    ));

    spawn_warm_up(link_service.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let aggregation = ClickAggregator::new(cache, repository, config.aggregation_interval())
        .spawn(shutdown_rx.clone());
    let sweeper =
        ExpirySweeper::new(link_service.clone(), config.expiry_sweep_interval()).spawn(shutdown_rx);

    let app = app_router(AppState::new(link_service));

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{addr}");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    info!("Stopping background jobs...");
    let _ = shutdown_tx.send(true);
    for (name, handle) in [("Click aggregation", aggregation), ("Expiry sweeper", sweeper)] {
        if let Err(e) = handle.await {
            error!("{} task failed: {}", name, e);
        }
    }
    info!("Shutdown complete");

    served.context("Server error")
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating shutdown..."),
    }
}
