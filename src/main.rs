mod analytics;
mod api;
mod config;
mod db;
mod error;
mod ingest;
mod service;
mod types;

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::routes::{router, ApiState};
use crate::config::Config;
use crate::db::TransactionStore;
use crate::error::Result;
use crate::service::SalesService;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let store = TransactionStore::open(&cfg.db_path, cfg.storage_timeout()).await?;
    info!("{} sales rows on record", store.count().await?);

    let service = Arc::new(SalesService::new(store, &cfg));
    info!(
        "Analytics ready: window={}d top={} forecast_min_active_days={} date_formats={}",
        cfg.report_window_days,
        cfg.top_products,
        cfg.forecast_min_active_days,
        cfg.date_formats.len(),
    );

    // --- HTTP API server ---
    let app = router(ApiState {
        service: Arc::clone(&service),
        health: Arc::new(HealthState::new()),
    });
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // In-flight appends have finished or rolled back by now.
    service.store().close().await;
    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
