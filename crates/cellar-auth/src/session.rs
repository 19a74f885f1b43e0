//! Bearer-token sessions kept in the cache.

use crate::user::{Role, User};
use crate::AuthError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use cellar_cache::{cache_key, Cache};
use cellar_commerce::ids::UserId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Opaque bearer token.
    pub id: String,
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    /// Unix timestamp of creation.
    pub created_at: i64,
    /// Unix timestamp when session expires.
    pub expires_at: i64,
}

impl AuthSession {
    /// Default session duration: 1 day.
    pub const DEFAULT_DURATION_SECS: i64 = 24 * 60 * 60;

    /// Create a new session for a user.
    pub fn new(user: &User, now: i64) -> Self {
        Self {
            id: generate_token(),
            user_id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: now,
            expires_at: now + Self::DEFAULT_DURATION_SECS,
        }
    }

    /// Check if session is expired.
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at
    }

    /// Validate the session, returning error if invalid.
    pub fn validate(&self, now: i64) -> Result<(), AuthError> {
        if self.is_expired(now) {
            Err(AuthError::SessionExpired)
        } else {
            Ok(())
        }
    }

    /// Require at least `role`.
    pub fn require(&self, role: Role) -> Result<(), AuthError> {
        if self.role.has_permission(role) {
            Ok(())
        } else {
            Err(AuthError::InsufficientPermissions)
        }
    }

    /// Get cache key for this session.
    pub fn cache_key(&self) -> String {
        session_key(&self.id)
    }
}

fn session_key(token: &str) -> String {
    cache_key!("session", token)
}

/// 256 random bits, URL-safe base64 without padding.
fn generate_token() -> String {
    URL_SAFE_NO_PAD.encode(rand::random::<[u8; 32]>())
}

/// Session persistence over the shared cache.
pub struct SessionStore<'a> {
    cache: &'a Cache,
}

impl<'a> SessionStore<'a> {
    pub fn new(cache: &'a Cache) -> Self {
        Self { cache }
    }

    /// Store a session until it expires.
    pub fn save(&self, session: &AuthSession, now: i64) -> Result<(), AuthError> {
        let ttl = (session.expires_at - now).max(0) as u64;
        self.cache
            .set_with_ttl(&session.cache_key(), session, Duration::from_secs(ttl))?;
        Ok(())
    }

    pub fn get(&self, token: &str) -> Result<Option<AuthSession>, AuthError> {
        Ok(self.cache.get(&session_key(token))?)
    }

    /// Drop a session. Returns whether it existed.
    pub fn delete(&self, token: &str) -> Result<bool, AuthError> {
        let key = session_key(token);
        let existed = self.cache.exists(&key)?;
        self.cache.delete(&key)?;
        Ok(existed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        User {
            id: UserId::new("u1"),
            email: "an@example.vn".into(),
            password_hash: String::new(),
            role: Role::Customer,
            verified: true,
            verification: None,
            created_at: 0,
        }
    }

    #[test]
    fn test_session_expiry() {
        let session = AuthSession::new(&user(), 1_000);
        assert!(!session.is_expired(1_000 + AuthSession::DEFAULT_DURATION_SECS));
        assert!(session.is_expired(1_001 + AuthSession::DEFAULT_DURATION_SECS));
        assert!(session.validate(1_000).is_ok());
    }

    #[test]
    fn test_tokens_are_unique_and_url_safe() {
        let a = AuthSession::new(&user(), 0);
        let b = AuthSession::new(&user(), 0);
        assert_ne!(a.id, b.id);
        assert_eq!(a.id.len(), 43);
        assert!(a
            .id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(a.cache_key(), format!("session:{}", a.id));
    }

    #[test]
    fn test_require_role() {
        let session = AuthSession::new(&user(), 0);
        assert!(session.require(Role::Customer).is_ok());
        assert!(matches!(
            session.require(Role::Admin),
            Err(AuthError::InsufficientPermissions)
        ));
    }

    #[test]
    fn test_store_round_trip() {
        let cache = Cache::in_memory();
        let store = SessionStore::new(&cache);
        let session = AuthSession::new(&user(), 0);
        store.save(&session, 0).unwrap();

        assert_eq!(store.get(&session.id).unwrap(), Some(session.clone()));
        assert!(store.delete(&session.id).unwrap());
        assert!(!store.delete(&session.id).unwrap());
        assert!(store.get(&session.id).unwrap().is_none());
    }
}
