//! Payment gateway integration.

pub mod vnpay;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use vnpay::{IpnAck, VerifiedCallback, VnpayConfig, VnpayGateway};

/// Errors raised while talking to a payment gateway.
#[derive(Error, Debug)]
pub enum PaymentError {
    /// Gateway credentials are missing.
    #[error("Payment gateway not configured: {0}")]
    NotConfigured(String),

    /// A configured value is unusable.
    #[error("Invalid payment configuration {name}: {reason}")]
    InvalidConfig { name: &'static str, reason: String },

    /// No usable callback URL could be derived.
    #[error("Cannot build callback URL for {path}: {reason}")]
    CallbackUrl { path: String, reason: String },

    /// Callback signature missing or wrong.
    #[error("Invalid signature")]
    InvalidSignature,

    /// A required callback parameter was absent.
    #[error("Missing callback parameter: {0}")]
    MissingParam(&'static str),

    /// Amount cannot be expressed in the gateway's format.
    #[error("Unsupported amount: {0}")]
    UnsupportedAmount(String),

    /// Parameters could not be encoded.
    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// What a verified callback says happened to the payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentOutcome {
    Succeeded,
    Declined { code: String },
}

impl PaymentOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PaymentOutcome::Succeeded)
    }
}
