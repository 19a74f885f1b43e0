//! Authentication errors.

use thiserror::Error;

/// Authentication error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Wrong password or unknown email.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Email address is malformed.
    #[error("invalid email: {0}")]
    InvalidEmail(String),

    /// User not found.
    #[error("user not found: {0}")]
    UserNotFound(String),

    /// A verified account already uses this email.
    #[error("user already exists: {0}")]
    UserAlreadyExists(String),

    /// Password too weak.
    #[error("password too weak: {0}")]
    WeakPassword(String),

    /// Email not verified.
    #[error("email not verified")]
    EmailNotVerified,

    /// Verification code does not match.
    #[error("invalid verification code")]
    InvalidCode,

    /// Verification code is past its expiry.
    #[error("verification code expired")]
    CodeExpired,

    /// Session not found.
    #[error("session not found")]
    SessionNotFound,

    /// Session expired.
    #[error("session expired")]
    SessionExpired,

    /// Insufficient permissions.
    #[error("insufficient permissions")]
    InsufficientPermissions,

    /// Verification code could not be delivered.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// Cache error.
    #[error("cache error: {0}")]
    Cache(#[from] cellar_cache::CacheError),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<cellar_db::DbError> for AuthError {
    fn from(e: cellar_db::DbError) -> Self {
        AuthError::Database(e.to_string())
    }
}
