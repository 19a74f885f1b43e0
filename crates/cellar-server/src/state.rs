//! Shared application state.

use crate::error::ApiError;
use cellar_auth::{AccountService, VerificationNotifier};
use cellar_cache::Cache;
use cellar_commerce::cart::CartService;
use cellar_commerce::catalog::CatalogService;
use cellar_commerce::checkout::CheckoutService;
use cellar_commerce::payment::VnpayGateway;
use cellar_db::Db;
use std::sync::Arc;

pub struct AppState {
    pub accounts: AccountService,
    pub catalog: CatalogService,
    pub carts: CartService,
    pub checkout: CheckoutService,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(
        db: Arc<Db>,
        cache: Arc<Cache>,
        gateway: Option<Arc<VnpayGateway>>,
        notifier: Arc<dyn VerificationNotifier>,
    ) -> Self {
        Self {
            accounts: AccountService::new(db.clone(), cache, notifier),
            catalog: CatalogService::new(db.clone()),
            carts: CartService::new(db.clone()),
            checkout: CheckoutService::new(db, gateway),
        }
    }
}

/// Run `f` against the state on a blocking thread.
///
/// Service calls take the SQLite connection lock and must not run on a
/// runtime worker.
pub async fn blocking<F, R, E>(state: &SharedState, f: F) -> Result<R, ApiError>
where
    F: FnOnce(&AppState) -> Result<R, E> + Send + 'static,
    R: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    let state = state.clone();
    tokio::task::spawn_blocking(move || f(&state).map_err(Into::into))
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {e}")))?
}
