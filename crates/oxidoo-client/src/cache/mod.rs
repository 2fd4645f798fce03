//! Result caching with one-shot activation.
//!
//! [`ResultCache`] wraps an external key-value store behind the
//! [`CacheStore`] trait. Caching is strictly opt-in per call: arming the
//! directive with [`ResultCache::activate`] covers exactly the next
//! [`ResultCache::fetch_or_compute`] - hit or miss, the directive is
//! consumed at entry and a second fetch bypasses the store entirely until
//! re-armed.
//!
//! [`MemoryStore`] is the bundled in-process store; anything with
//! `has`/`get`/`set` semantics (a Redis wrapper, a disk cache) can be
//! attached instead.

pub mod key;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::debug;

use oxidoo_protocol::{Error, Result};

/// An external key-value store with per-entry TTL.
///
/// `ttl: None` means the store's own default expiry (or no expiry for
/// stores without one).
pub trait CacheStore: Send + Sync {
    /// Whether a live entry exists for the key.
    fn has(&self, key: &str) -> bool;
    /// Fetch a live entry.
    fn get(&self, key: &str) -> Option<Value>;
    /// Store an entry with an optional TTL.
    fn set(&self, key: &str, value: Value, ttl: Option<Duration>);
}

struct StoreEntry {
    value: Value,
    expires_at: Option<Instant>,
}

impl StoreEntry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// In-process [`CacheStore`] backed by a `RwLock`'d map.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, StoreEntry>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl CacheStore for MemoryStore {
    fn has(&self, key: &str) -> bool {
        self.entries.read().get(key).is_some_and(|entry| !entry.is_expired())
    }

    fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.write();
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    fn set(&self, key: &str, value: Value, ttl: Option<Duration>) {
        let entry = StoreEntry {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.write().insert(key.to_string(), entry);
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore").field("entries", &self.len()).finish()
    }
}

/// The one-shot activation state.
#[derive(Debug, Clone, Copy, Default)]
struct CacheDirective {
    active: bool,
    ttl: Option<Duration>,
}

/// One-shot result cache over an optional backing store.
pub struct ResultCache {
    store: Option<Arc<dyn CacheStore>>,
    directive: Mutex<CacheDirective>,
}

impl ResultCache {
    /// Create a cache over an optional store.
    #[must_use]
    pub fn new(store: Option<Arc<dyn CacheStore>>) -> Self {
        Self {
            store,
            directive: Mutex::new(CacheDirective::default()),
        }
    }

    /// Whether a backing store is attached.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.store.is_some()
    }

    /// Arm the directive: the next fetch consults and populates the store.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::CacheNotConfigured`] when no store is attached -
    /// a hard failure so misconfiguration is noticed, never silently
    /// degraded to uncached calls.
    pub fn activate(&self, ttl: Option<Duration>) -> Result<()> {
        if self.store.is_none() {
            return Err(Error::CacheNotConfigured);
        }
        *self.directive.lock() = CacheDirective { active: true, ttl };
        Ok(())
    }

    /// Serve from the store or run `compute`, honoring the one-shot
    /// directive.
    ///
    /// The directive is consumed at entry; both the hit and the miss path
    /// leave it cleared. Without a prior [`activate`](Self::activate) the
    /// store is bypassed entirely, even if it holds a fresh entry.
    ///
    /// # Errors
    ///
    /// Propagates whatever `compute` fails with; cache handling itself
    /// never fails.
    pub async fn fetch_or_compute<F, Fut>(&self, key: &str, compute: F) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let directive = std::mem::take(&mut *self.directive.lock());

        if directive.active
            && let Some(store) = &self.store
            && store.has(key)
            && let Some(value) = store.get(key)
        {
            debug!(key, "result cache hit");
            return Ok(value);
        }

        let result = compute().await?;

        if directive.active && let Some(store) = &self.store {
            debug!(key, ttl = ?directive.ttl, "stored result");
            store.set(key, result.clone(), directive.ttl);
        }
        Ok(result)
    }
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("configured", &self.is_configured())
            .field("directive", &*self.directive.lock())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use serde_json::json;

    use super::*;

    fn counting_compute(counter: &Arc<AtomicU32>) -> impl Future<Output = Result<Value>> + use<> {
        let counter = Arc::clone(counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(json!([1, 2, 3]))
        }
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        store.set("k", json!({"v": 1}), None);
        assert!(store.has("k"));
        assert_eq!(store.get("k"), Some(json!({"v": 1})));
        assert!(!store.has("missing"));
    }

    #[test]
    fn test_memory_store_expiry() {
        let store = MemoryStore::new();
        store.set("k", json!(1), Some(Duration::from_millis(1)));
        std::thread::sleep(Duration::from_millis(5));
        assert!(!store.has("k"));
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_activate_without_store_fails_loudly() {
        let cache = ResultCache::new(None);
        let err = cache.activate(None).unwrap_err();
        assert_eq!(err, Error::CacheNotConfigured);
    }

    #[tokio::test]
    async fn test_unactivated_fetch_always_computes() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
        let cache = ResultCache::new(Some(Arc::clone(&store)));
        let calls = Arc::new(AtomicU32::new(0));

        for _ in 0..3 {
            cache.fetch_or_compute("k", || counting_compute(&calls)).await.unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Never activated, so nothing was stored either.
        assert!(!store.has("k"));
    }

    #[tokio::test]
    async fn test_activation_is_single_use() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
        let cache = ResultCache::new(Some(Arc::clone(&store)));
        let calls = Arc::new(AtomicU32::new(0));

        // Miss path: computes and stores.
        cache.activate(None).unwrap();
        cache.fetch_or_compute("k", || counting_compute(&calls)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(store.has("k"));

        // Directive consumed: computes again despite the fresh entry.
        cache.fetch_or_compute("k", || counting_compute(&calls)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        // Re-armed: served from the store.
        cache.activate(None).unwrap();
        cache.fetch_or_compute("k", || counting_compute(&calls)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_hit_consumes_the_directive_too() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
        store.set("k", json!("cached"), None);
        let cache = ResultCache::new(Some(Arc::clone(&store)));
        let calls = Arc::new(AtomicU32::new(0));

        cache.activate(None).unwrap();
        let value = cache.fetch_or_compute("k", || counting_compute(&calls)).await.unwrap();
        assert_eq!(value, json!("cached"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // Hit cleared the directive as well.
        cache.fetch_or_compute("k", || counting_compute(&calls)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stored_entry_honors_ttl() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
        let cache = ResultCache::new(Some(Arc::clone(&store)));
        let calls = Arc::new(AtomicU32::new(0));

        cache.activate(Some(Duration::from_millis(1))).unwrap();
        cache.fetch_or_compute("k", || counting_compute(&calls)).await.unwrap();

        std::thread::sleep(Duration::from_millis(5));
        assert!(!store.has("k"));
    }

    #[tokio::test]
    async fn test_compute_failure_propagates_and_stores_nothing() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryStore::new());
        let cache = ResultCache::new(Some(Arc::clone(&store)));

        cache.activate(None).unwrap();
        let result = cache
            .fetch_or_compute("k", || async {
                Err(Error::Authentication("login rejected".into()))
            })
            .await;
        assert!(result.is_err());
        assert!(!store.has("k"));
    }
}
