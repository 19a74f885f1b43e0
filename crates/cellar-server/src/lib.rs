//! HTTP API for the Cellar storefront.
//!
//! JSON over axum: accounts, cart, catalog search and reviews, checkout
//! with VNPay callbacks, and order history. Sessions are bearer tokens.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;
pub mod telemetry;

use anyhow::{Context, Result};
use cellar_auth::{LogNotifier, VerificationNotifier};
use cellar_cache::Cache;
use cellar_db::Db;
use config::Config;
use state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;

pub use error::ApiError;
pub use routes::router;
pub use state::SharedState;

/// How often expired sessions are swept from the cache.
const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Open the database file, creating its directory, and apply every migration.
pub fn open_database(config: &Config) -> Result<Arc<Db>> {
    let path = &config.database.path;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }
    let db = Db::open(path)
        .with_context(|| format!("Failed to open database: {}", path.display()))?;
    let applied = migrate(&db)?;
    tracing::info!(path = %path.display(), applied, "database ready");
    Ok(Arc::new(db))
}

/// Apply storefront and account migrations. Returns how many ran.
pub fn migrate(db: &Db) -> Result<usize> {
    let commerce = cellar_commerce::store::migrate(db).context("Commerce migrations failed")?;
    let auth = db
        .migrate(cellar_auth::MIGRATIONS)
        .context("Account migrations failed")?;
    Ok(commerce + auth)
}

/// Build the shared state from config.
pub fn build_state(config: &Config, db: Arc<Db>, cache: Arc<Cache>) -> Result<SharedState> {
    let gateway = config.gateway()?.map(Arc::new);
    if gateway.is_none() {
        tracing::warn!("VNPay is not configured; VNPay checkout will be refused");
    }
    let notifier: Arc<dyn VerificationNotifier> = Arc::new(LogNotifier);
    Ok(Arc::new(AppState::new(db, cache, gateway, notifier)))
}

/// Run the HTTP server until Ctrl+C.
pub async fn serve(config: Config) -> Result<()> {
    let db = open_database(&config)?;
    let cache = Arc::new(Cache::in_memory());
    let state = build_state(&config, db, cache.clone())?;

    tokio::spawn(sweep_sessions(cache));

    let app = router(state).layer(CorsLayer::permissive());
    let addr = config.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    tracing::info!(%addr, "cellar listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    tracing::info!("server shut down");
    Ok(())
}

async fn sweep_sessions(cache: Arc<Cache>) {
    let mut interval = tokio::time::interval(CACHE_SWEEP_INTERVAL);
    loop {
        interval.tick().await;
        if let Err(e) = cache.purge_expired() {
            tracing::warn!(error = %e, "cache sweep failed");
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_database_creates_directory_and_migrates_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.database.path = dir.path().join("nested").join("cellar.db");

        let db = open_database(&config).unwrap();
        assert!(config.database.path.exists());
        assert_eq!(migrate(&db).unwrap(), 0);
    }

    #[test]
    fn test_build_state_without_gateway() {
        let db = Arc::new(Db::open_in_memory().unwrap());
        migrate(&db).unwrap();
        let state = build_state(&Config::default(), db, Arc::new(Cache::in_memory())).unwrap();
        assert!(state.checkout.gateway().is_none());
    }
}
