//! Type-safe key-value caching layer for the Cellar storefront.
//!
//! Values are stored as JSON bytes in a process-local map, optionally with
//! a time-to-live. Sessions and other short-lived records live here.
//!
//! # Example
//!
//! ```rust,ignore
//! use cellar_cache::{Cache, cache_key};
//! use std::time::Duration;
//!
//! let cache = Cache::in_memory();
//!
//! let key = cache_key!("session", token);
//! cache.set_with_ttl(&key, &session, Duration::from_secs(86_400))?;
//!
//! let session: Option<Session> = cache.get(&key)?;
//! cache.delete(&key)?;
//! ```

mod error;
mod kv;

pub use error::CacheError;
pub use kv::Cache;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{cache_key, Cache, CacheError};
}
