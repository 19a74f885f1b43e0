//! Cart endpoints. All require a signed-in user.

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::state::{blocking, SharedState};
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use cellar_commerce::cart::CartView;
use cellar_commerce::catalog::ItemKind;
use cellar_commerce::ItemId;
use serde::{Deserialize, Serialize};

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/cart/count", get(count))
        .route("/cart/items", get(items))
        .route("/cart/add", post(add))
        .route("/cart/remove", post(remove))
        .route("/cart/update", post(update))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRequest {
    pub item_id: ItemId,
    pub item_type: ItemKind,
    #[serde(default = "one")]
    pub quantity: i64,
}

fn one() -> i64 {
    1
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRequest {
    pub item_id: ItemId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequest {
    pub item_id: ItemId,
    pub quantity: i64,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartCount {
    pub count: i64,
}

async fn count(
    State(state): State<SharedState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<CartCount>, ApiError> {
    let count = blocking(&state, move |s| s.carts.count(&session.user_id)).await?;
    Ok(Json(CartCount { count }))
}

async fn items(
    State(state): State<SharedState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<CartView>, ApiError> {
    let view = blocking(&state, move |s| s.carts.view(&session.user_id)).await?;
    Ok(Json(view))
}

async fn add(
    State(state): State<SharedState>,
    CurrentUser(session): CurrentUser,
    Json(body): Json<AddRequest>,
) -> Result<Json<CartCount>, ApiError> {
    let count = blocking(&state, move |s| {
        s.carts
            .add(&session.user_id, body.item_type, &body.item_id, body.quantity)
    })
    .await?;
    Ok(Json(CartCount { count }))
}

async fn remove(
    State(state): State<SharedState>,
    CurrentUser(session): CurrentUser,
    Json(body): Json<RemoveRequest>,
) -> Result<Json<CartCount>, ApiError> {
    let count = blocking(&state, move |s| s.carts.remove(&session.user_id, &body.item_id)).await?;
    Ok(Json(CartCount { count }))
}

async fn update(
    State(state): State<SharedState>,
    CurrentUser(session): CurrentUser,
    Json(body): Json<UpdateRequest>,
) -> Result<Json<CartCount>, ApiError> {
    let count = blocking(&state, move |s| {
        s.carts
            .update(&session.user_id, &body.item_id, body.quantity)
    })
    .await?;
    Ok(Json(CartCount { count }))
}
