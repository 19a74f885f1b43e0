//! Authentication module for Cellar.
//!
//! Provides email/password accounts with emailed verification codes,
//! bearer-token sessions kept in `cellar-cache`, and role checks.

mod error;
mod notifier;
mod otp;
mod password;
mod service;
mod session;
mod store;
mod user;

pub use error::AuthError;
pub use notifier::{LogNotifier, VerificationNotifier};
pub use otp::{EmailVerification, VERIFICATION_TTL_SECS};
pub use password::{PasswordHasher, MIN_PASSWORD_LEN};
pub use service::{AccountService, PendingVerification};
pub use session::{AuthSession, SessionStore};
pub use store::{UserStore, MIGRATIONS};
pub use user::{normalize_email, Role, User};
