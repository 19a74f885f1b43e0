//! Key-value store with automatic serialization and expiry.

use crate::CacheError;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

struct Entry {
    bytes: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Type-safe in-process cache.
///
/// Provides automatic JSON serialization for any type that implements
/// `Serialize` and `DeserializeOwned`. Expired entries are invisible to
/// readers and dropped lazily on write or by [`Cache::purge_expired`].
#[derive(Default)]
pub struct Cache {
    store: RwLock<HashMap<String, Entry>>,
}

impl Cache {
    /// Create an empty in-memory cache.
    pub fn in_memory() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Entry>>, CacheError> {
        self.store
            .read()
            .map_err(|e| CacheError::StoreError(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Entry>>, CacheError> {
        self.store
            .write()
            .map_err(|e| CacheError::StoreError(e.to_string()))
    }

    /// Get a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let session: Option<AuthSession> = cache.get("session:abc")?;
    /// ```
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let now = Instant::now();
        {
            let store = self.read()?;
            match store.get(key) {
                Some(entry) if entry.is_live(now) => {
                    let value: T = serde_json::from_slice(&entry.bytes)?;
                    return Ok(Some(value));
                }
                None => return Ok(None),
                Some(_) => {}
            }
        }

        // Expired: evict unless a writer refreshed it in the meantime.
        let mut store = self.write()?;
        if store.get(key).is_some_and(|e| !e.is_live(now)) {
            store.remove(key);
        }
        Ok(None)
    }

    /// Set a value in the cache with no expiry.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        self.insert(key, value, None)
    }

    /// Set a value that disappears after `ttl`.
    pub fn set_with_ttl<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.insert(key, value, Some(Instant::now() + ttl))
    }

    fn insert<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        expires_at: Option<Instant>,
    ) -> Result<(), CacheError> {
        let bytes = serde_json::to_vec(value)?;
        self.write()?
            .insert(key.to_string(), Entry { bytes, expires_at });
        Ok(())
    }

    /// Delete a value from the cache. Deleting a missing key is not an error.
    pub fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.write()?.remove(key);
        Ok(())
    }

    /// Check if a live key exists in the cache.
    pub fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let now = Instant::now();
        Ok(self.read()?.get(key).is_some_and(|e| e.is_live(now)))
    }

    /// Get all live keys in the cache.
    pub fn keys(&self) -> Result<Vec<String>, CacheError> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .read()?
            .iter()
            .filter(|(_, e)| e.is_live(now))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = Instant::now();
        let mut store = self.write()?;
        let before = store.len();
        store.retain(|_, e| e.is_live(now));
        let removed = before - store.len();
        if removed > 0 {
            tracing::debug!(removed, "purged expired cache entries");
        }
        Ok(removed)
    }
}

/// Helper to build cache keys with namespacing.
///
/// # Example
///
/// ```rust,ignore
/// let key = cache_key!("session", token);
/// // Returns "session:<token>"
/// ```
#[macro_export]
macro_rules! cache_key {
    ($prefix:expr, $($part:expr),+) => {{
        let mut key = String::from($prefix);
        $(
            key.push(':');
            key.push_str(&$part.to_string());
        )+
        key
    }};
}
