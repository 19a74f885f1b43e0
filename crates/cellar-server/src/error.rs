//! HTTP error responses.

use axum::response::{IntoResponse, Response};
use axum::Json;
use cellar_auth::AuthError;
use cellar_commerce::catalog::StockShortfall;
use cellar_commerce::payment::PaymentError;
use cellar_commerce::CommerceError;
use http::StatusCode;
use serde_json::json;
use thiserror::Error;

/// Error returned by handlers, rendered as `{"error": "..."}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Checkout refused; every short line is listed.
    #[error("Insufficient stock")]
    OutOfStock(Vec<StockShortfall>),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::OutOfStock(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::OutOfStock(shortfalls) => json!({
                "error": self.to_string(),
                "details": shortfalls.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "shortfalls": shortfalls,
            }),
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "request failed");
                json!({"error": "Internal server error"})
            }
            other => json!({"error": other.to_string()}),
        };
        (status, Json(body)).into_response()
    }
}

impl From<CommerceError> for ApiError {
    fn from(err: CommerceError) -> Self {
        match err {
            CommerceError::ItemNotFound(_) | CommerceError::OrderNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            CommerceError::OutOfStock(shortfalls) => ApiError::OutOfStock(shortfalls),
            CommerceError::ItemNotInCart(_)
            | CommerceError::EmptyCart
            | CommerceError::InvalidQuantity(_)
            | CommerceError::QuantityExceedsLimit(..)
            | CommerceError::UnknownVariant { .. }
            | CommerceError::CurrencyMismatch { .. }
            | CommerceError::ValidationError(_) => ApiError::BadRequest(err.to_string()),
            CommerceError::Payment(payment) => payment.into(),
            CommerceError::Overflow
            | CommerceError::DatabaseError(_)
            | CommerceError::SerializationError(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::NotConfigured(_)
            | PaymentError::InvalidConfig { .. }
            | PaymentError::CallbackUrl { .. } => ApiError::Unavailable(err.to_string()),
            PaymentError::InvalidSignature | PaymentError::MissingParam(_) => {
                ApiError::BadRequest(err.to_string())
            }
            PaymentError::UnsupportedAmount(_) | PaymentError::Encoding(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials
            | AuthError::SessionNotFound
            | AuthError::SessionExpired => ApiError::Unauthorized(err.to_string()),
            AuthError::InsufficientPermissions | AuthError::EmailNotVerified => {
                ApiError::Forbidden(err.to_string())
            }
            AuthError::UserNotFound(_) => ApiError::NotFound(err.to_string()),
            AuthError::UserAlreadyExists(_) => ApiError::Conflict(err.to_string()),
            AuthError::InvalidEmail(_)
            | AuthError::WeakPassword(_)
            | AuthError::InvalidCode
            | AuthError::CodeExpired => ApiError::BadRequest(err.to_string()),
            AuthError::Delivery(_)
            | AuthError::Cache(_)
            | AuthError::Database(_)
            | AuthError::Internal(_) => ApiError::Internal(err.to_string()),
        }
    }
}
