//! One-time email verification codes.

use crate::AuthError;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// How long an emailed code stays valid.
pub const VERIFICATION_TTL_SECS: i64 = 10 * 60;

/// A six-digit code sent to the user's email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailVerification {
    pub code: String,
    /// Unix timestamp after which the code is rejected.
    pub expires_at: i64,
}

impl EmailVerification {
    /// Issue a fresh random code.
    pub fn issue(now: i64) -> Self {
        let code: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
        Self {
            code: code.to_string(),
            expires_at: now + VERIFICATION_TTL_SECS,
        }
    }

    /// Check a submitted code. A wrong code is reported before expiry.
    pub fn check(&self, code: &str, now: i64) -> Result<(), AuthError> {
        if self.code != code.trim() {
            return Err(AuthError::InvalidCode);
        }
        if now > self.expires_at {
            return Err(AuthError::CodeExpired);
        }
        Ok(())
    }
}
