//! Cache errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    /// A value could not be encoded to or decoded from JSON.
    #[error("cache value encoding failed: {0}")]
    SerializeError(#[from] serde_json::Error),

    /// The map behind the cache is unusable, e.g. its lock was poisoned.
    #[error("cache store unavailable: {0}")]
    StoreError(String),
}
