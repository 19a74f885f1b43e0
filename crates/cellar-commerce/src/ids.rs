//! Newtype IDs for type-safe identifiers.
//!
//! Using newtypes prevents accidentally mixing up different ID types,
//! e.g., passing an ItemId where an OrderId is expected.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate newtype ID structs.
macro_rules! define_id {
    ($name:ident) => {
        /// A unique identifier.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a new unique ID.
            pub fn generate() -> Self {
                Self(generate_id())
            }

            /// Get the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&$name> for cellar_db::Value {
            fn from(id: &$name) -> Self {
                cellar_db::Value::Text(id.0.clone())
            }
        }
    };
}

define_id!(ItemId);
define_id!(UserId);
define_id!(OrderId);
define_id!(ReviewId);

/// Order references carry Vietnam local time (UTC+7).
pub(crate) const VN_OFFSET_HOURS: i64 = 7;

/// Max length of a gateway transaction reference.
const REFERENCE_MAX_LEN: usize = 20;

impl OrderId {
    /// Generate a gateway-safe order reference: `YYMMDDHHmmss` in UTC+7
    /// followed by six random digits.
    pub fn generate_reference(now: DateTime<Utc>) -> Self {
        let local = now.naive_utc() + Duration::hours(VN_OFFSET_HOURS);
        let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
        let mut reference = format!("{}{:06}", local.format("%y%m%d%H%M%S"), suffix);
        reference.truncate(REFERENCE_MAX_LEN);
        Self(reference)
    }
}

/// Generate a unique ID from 128 random bits.
fn generate_id() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}
