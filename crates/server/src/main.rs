//! reelgate server entry point.
//!
//! Boots the offline-caching gateway: loads configuration, opens the
//! partition store, runs the install and activate lifecycle (or teardown,
//! when that mode is selected), and only then binds the HTTP listener —
//! no intercepted request is served before activation finishes.

use std::sync::Arc;

use anyhow::Result;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use reelgate_client::{FetchClient, FetchConfig, TmdbClient, TmdbConfig};
use reelgate_core::{AppConfig, CacheDb, CacheManager, Classifier, Fetch, Lifecycle, WorkerMode};

mod context;
mod error;
mod gateway;
mod routes;

use context::AppContext;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = AppConfig::load()?;
    let db = CacheDb::open(&config.db_path).await?;

    let fetcher: Arc<dyn Fetch> = Arc::new(FetchClient::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
    })?);

    let classifier = Classifier::from_config(&config)?;
    let manager = Arc::new(CacheManager::new(
        db,
        Arc::clone(&fetcher),
        classifier,
        &config.precache_manifest,
    )?);

    if config.mode == WorkerMode::Teardown {
        manager.teardown().await?;
        return Ok(());
    }

    manager.on_install().await?;
    manager.on_activate().await?;

    let tmdb = match &config.tmdb_api_key {
        Some(key) => Some(Arc::new(TmdbClient::new(TmdbConfig { api_key: key.clone(), ..Default::default() })?)),
        None => {
            tracing::warn!("REELGATE_TMDB_API_KEY not set; proxy endpoints will return errors");
            None
        }
    };

    let ctx = AppContext { manager, fetcher, tmdb };
    let app = routes::router(ctx).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "reelgate listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install shutdown handler");
        return;
    }
    tracing::info!("shutdown signal received");
}
