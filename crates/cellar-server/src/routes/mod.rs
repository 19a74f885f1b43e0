//! HTTP routes.

mod accounts;
mod cart;
mod items;
mod orders;

use crate::state::SharedState;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

pub use cart::CartCount;

/// Build the full API router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api", get(health))
        .merge(accounts::routes())
        .merge(cart::routes())
        .merge(items::routes())
        .merge(orders::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "Cellar API is running"
}
