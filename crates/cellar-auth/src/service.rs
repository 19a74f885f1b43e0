//! Account lifecycle: register, verify, log in, log out.

use crate::otp::EmailVerification;
use crate::password::PasswordHasher;
use crate::session::{AuthSession, SessionStore};
use crate::store::UserStore;
use crate::user::{normalize_email, Role, User};
use crate::{AuthError, VerificationNotifier};
use cellar_cache::Cache;
use cellar_commerce::ids::UserId;
use cellar_db::Db;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Returned by `register`: where the code went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingVerification {
    pub user_id: UserId,
    pub email: String,
    pub expires_at: i64,
}

#[derive(Clone)]
pub struct AccountService {
    db: Arc<Db>,
    cache: Arc<Cache>,
    notifier: Arc<dyn VerificationNotifier>,
    hasher: PasswordHasher,
}

impl AccountService {
    pub fn new(db: Arc<Db>, cache: Arc<Cache>, notifier: Arc<dyn VerificationNotifier>) -> Self {
        Self {
            db,
            cache,
            notifier,
            hasher: PasswordHasher::new(),
        }
    }

    fn users(&self) -> UserStore<'_, Db> {
        UserStore::new(&*self.db)
    }

    fn sessions(&self) -> SessionStore<'_> {
        SessionStore::new(&self.cache)
    }

    /// Create an account, or refresh an unverified one, and send a code.
    ///
    /// An unverified account takes the new password; a verified email is
    /// rejected.
    pub fn register(
        &self,
        email: &str,
        password: &str,
        now: i64,
    ) -> Result<PendingVerification, AuthError> {
        let email = normalize_email(email)?;
        PasswordHasher::validate_password(password)?;
        let password_hash = self.hasher.hash(password)?;
        let verification = EmailVerification::issue(now);

        let user = match self.users().find_by_email(&email)? {
            Some(existing) if existing.verified => {
                return Err(AuthError::UserAlreadyExists(email));
            }
            Some(existing) => User {
                password_hash,
                verification: Some(verification.clone()),
                ..existing
            },
            None => User {
                id: UserId::generate(),
                email,
                password_hash,
                role: Role::Customer,
                verified: false,
                verification: Some(verification.clone()),
                created_at: now,
            },
        };
        self.users().save(&user)?;
        self.notifier.send_code(&user.email, &verification.code)?;
        tracing::info!(user_id = %user.id, "verification code sent");

        Ok(PendingVerification {
            user_id: user.id,
            email: user.email,
            expires_at: verification.expires_at,
        })
    }

    /// Confirm the emailed code. Verifying twice is harmless.
    pub fn verify_email(&self, email: &str, code: &str, now: i64) -> Result<(), AuthError> {
        let email = normalize_email(email)?;
        let mut user = self
            .users()
            .find_by_email(&email)?
            .ok_or_else(|| AuthError::UserNotFound(email.clone()))?;
        if user.verified {
            return Ok(());
        }
        user.verification
            .as_ref()
            .ok_or(AuthError::InvalidCode)?
            .check(code, now)?;

        user.verified = true;
        user.verification = None;
        self.users().save(&user)?;
        tracing::info!(user_id = %user.id, "email verified");
        Ok(())
    }

    /// Check credentials and open a session.
    pub fn login(&self, email: &str, password: &str, now: i64) -> Result<AuthSession, AuthError> {
        let email = normalize_email(email).map_err(|_| AuthError::InvalidCredentials)?;
        let user = self
            .users()
            .find_by_email(&email)?
            .ok_or(AuthError::InvalidCredentials)?;
        if !self.hasher.verify(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }
        if !user.verified {
            return Err(AuthError::EmailNotVerified);
        }

        let session = AuthSession::new(&user, now);
        self.sessions().save(&session, now)?;
        tracing::info!(user_id = %user.id, "logged in");
        Ok(session)
    }

    /// End a session. Unknown tokens are ignored.
    pub fn logout(&self, token: &str) -> Result<bool, AuthError> {
        self.sessions().delete(token)
    }

    /// Resolve a bearer token to its live session.
    pub fn authenticate(&self, token: &str, now: i64) -> Result<AuthSession, AuthError> {
        let session = self
            .sessions()
            .get(token)?
            .ok_or(AuthError::SessionNotFound)?;
        if session.is_expired(now) {
            self.sessions().delete(token)?;
            return Err(AuthError::SessionExpired);
        }
        Ok(session)
    }

    /// Grant or revoke admin rights by email.
    pub fn set_role(&self, email: &str, role: Role) -> Result<(), AuthError> {
        let email = normalize_email(email)?;
        if !self.users().set_role(&email, role)? {
            return Err(AuthError::UserNotFound(email));
        }
        tracing::info!(%email, role = role.as_str(), "role changed");
        Ok(())
    }
}
