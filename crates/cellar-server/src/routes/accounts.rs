//! Registration, email verification and login.

use crate::error::ApiError;
use crate::extract::CurrentUser;
use crate::state::{blocking, SharedState};
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use cellar_auth::Role;
use cellar_commerce::UserId;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub fn routes() -> Router<SharedState> {
    Router::new()
        .route("/register", post(register))
        .route("/verify-otp", post(verify_otp))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: i64,
    pub user: SessionUser,
}

#[derive(Serialize)]
pub struct SessionUser {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

async fn register(
    State(state): State<SharedState>,
    Json(body): Json<Credentials>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let now = chrono::Utc::now().timestamp();
    let pending = blocking(&state, move |s| {
        s.accounts.register(&body.email, &body.password, now)
    })
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Verification code sent",
            "email": pending.email,
            "expires_at": pending.expires_at,
        })),
    ))
}

async fn verify_otp(
    State(state): State<SharedState>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<Value>, ApiError> {
    let now = chrono::Utc::now().timestamp();
    blocking(&state, move |s| s.accounts.verify_email(&body.email, &body.otp, now)).await?;
    Ok(Json(json!({"verified": true})))
}

async fn login(
    State(state): State<SharedState>,
    Json(body): Json<Credentials>,
) -> Result<Json<LoginResponse>, ApiError> {
    let now = chrono::Utc::now().timestamp();
    let session = blocking(&state, move |s| {
        s.accounts.login(&body.email, &body.password, now)
    })
    .await?;
    Ok(Json(LoginResponse {
        token: session.id,
        expires_at: session.expires_at,
        user: SessionUser {
            id: session.user_id,
            email: session.email,
            role: session.role,
        },
    }))
}

async fn logout(
    State(state): State<SharedState>,
    CurrentUser(session): CurrentUser,
) -> Result<Json<Value>, ApiError> {
    let ended = state.accounts.logout(&session.id)?;
    Ok(Json(json!({"logged_out": ended})))
}
