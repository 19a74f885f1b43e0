//! Delivery of verification codes.

use crate::AuthError;

/// Sends a verification code to an email address.
pub trait VerificationNotifier: Send + Sync {
    fn send_code(&self, email: &str, code: &str) -> Result<(), AuthError>;
}

/// Writes codes to the log instead of sending mail.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl VerificationNotifier for LogNotifier {
    fn send_code(&self, email: &str, code: &str) -> Result<(), AuthError> {
        tracing::info!(%email, %code, "verification code issued");
        Ok(())
    }
}
