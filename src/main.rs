mod api;
mod config;
mod db;
mod error;
mod service;
mod state;
mod stats;
mod types;

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::routes::{router, ApiState};
use crate::config::{Config, StoreBackend};
use crate::db::{DocumentStore, SqliteDocumentStore};
use crate::error::Result;
use crate::service::{MatchService, RecomputeTimings};
use crate::state::InMemoryDocumentStore;

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
    // --- Document store ---
    let store: Arc<dyn DocumentStore> = match cfg.store_backend {
        StoreBackend::Sqlite => Arc::new(SqliteDocumentStore::open(&cfg.db_path).await?),
        StoreBackend::Memory => {
            info!("Using in-memory store; matches will not survive a restart");
            Arc::new(InMemoryDocumentStore::new())
        }
    };

    // --- Service ---
    let health = Arc::new(HealthState::new());
    let service = Arc::new(MatchService::new(
        store,
        cfg.subject_id.clone(),
        Arc::clone(&health),
        Arc::new(RecomputeTimings::new()?),
    ));

    // Snapshot is rebuilt from the stored matches so it can never start stale.
    let stats = service.recompute_stats().await?;
    info!(
        subject_id = %service.subject_id(),
        total_matches = stats.total_matches,
        "Stats snapshot ready"
    );

    // --- HTTP API server ---
    let app = router(ApiState { service, health });
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
