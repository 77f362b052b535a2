//! Cache collaborator: the cache contract, the named-cache manager, and an
//! in-memory implementation.
//!
//! The dispatcher uses the manager's default cache for request-level output
//! caching, keyed by [`request_cache_key`]. Commands that declare
//! themselves cacheable can reach the same manager through the execution
//! context to cache their own data; the core never does that for them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::error::DispatchError;

/// Builds the request-level cache key for a request name.
///
/// # Example
///
/// ```
/// assert_eq!(crescendo::request_cache_key("front"), "request-front");
/// ```
#[must_use]
pub fn request_cache_key(request_name: &str) -> String {
    format!("request-{request_name}")
}

/// Contract for a cache backend.
///
/// Values are opaque byte strings. A backend may evict entries at any time;
/// `get` after `set` is a hint, never a guarantee.
pub trait RequestCache: Send + Sync {
    /// Fetches the value stored under `key`, if present and unexpired.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Stores `value` under `key`, optionally expiring after `ttl`.
    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>);

    /// Removes the entry stored under `key`, if any.
    fn delete(&self, key: &str);

    /// Removes every entry.
    fn clear(&self);
}

/// Named set of cache backends with one designated default.
///
/// The default cache is what the dispatcher consults for request-level
/// caching; a manager with no default disables that step entirely.
#[derive(Clone, Default)]
pub struct CacheManager {
    caches: Vec<(String, Arc<dyn RequestCache>)>,
    default_name: Option<String>,
}

impl CacheManager {
    /// Creates a manager with no caches.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a named cache. The first cache registered with
    /// `is_default` set becomes the default.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::DuplicateRegistration`] if a cache with the
    /// same name is already present.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        cache: Arc<dyn RequestCache>,
        is_default: bool,
    ) -> Result<(), DispatchError> {
        let name = name.into();
        if self.by_name(&name).is_some() {
            return Err(DispatchError::duplicate(format!(
                "cache '{name}' is already registered"
            )));
        }
        if is_default && self.default_name.is_none() {
            self.default_name = Some(name.clone());
        }
        self.caches.push((name, cache));
        Ok(())
    }

    /// Looks up a cache by its registered name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<Arc<dyn RequestCache>> {
        self.caches
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| Arc::clone(c))
    }

    /// Returns the default cache, if one was designated.
    #[must_use]
    pub fn default_cache(&self) -> Option<Arc<dyn RequestCache>> {
        self.default_name.as_deref().and_then(|n| self.by_name(n))
    }

    /// Returns the number of registered caches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.caches.len()
    }

    /// Returns `true` when no caches are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.caches.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("CacheManager")
            .field("caches", &names)
            .field("default", &self.default_name)
            .finish()
    }
}

/// In-memory cache with optional per-entry expiry.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (Vec<u8>, Option<Instant>)>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl RequestCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let entries = self.entries.lock().ok()?;
        let (value, expiry) = entries.get(key)?;
        if expiry.is_some_and(|deadline| Instant::now() >= deadline) {
            return None;
        }
        Some(value.clone())
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) {
        let expiry = ttl.map(|d| Instant::now() + d);
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_owned(), (value, expiry));
        }
    }

    fn delete(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }

    fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}
