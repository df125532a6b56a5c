//! Time-bounded memoization for fetch results.
//!
//! Each fetch operation owns one [`TtlCache`] keyed by its arguments. An entry
//! is served while its age is below the TTL; once the age reaches the TTL the
//! entry counts as a miss and the next fill overwrites it.
//!
//! Entries are stamped with an injectable [`Clock`] rather than relying on
//! moka's internal expiry alone, so tests can step time with [`ManualClock`].
//! moka still evicts on the same TTL and bounds the entry count.
//!
//! Concurrent misses on the same key are coalesced into one fetch; misses on
//! different keys fill independently.

use std::collections::HashMap;
use std::convert::Infallible;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use moka::future::Cache as MokaCache;
use tracing::debug;

/// Default TTL: one hour.
const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Source of "now" for entry stamping.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let offset = *self.offset.lock().unwrap_or_else(PoisonError::into_inner);
        self.base + offset
    }
}

/// Configuration for a cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl CacheConfig {
    /// Set a custom TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the maximum number of entries.
    pub fn with_max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = max_capacity;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            max_capacity: 1000,
        }
    }
}

/// Value plus the instant it was stored.
#[derive(Clone)]
struct Stamped<V> {
    value: V,
    stored_at: Instant,
}

/// Per-key lock held while a miss is being filled.
type FillLock = Arc<tokio::sync::Mutex<()>>;

/// Memoizing cache with a fixed TTL.
pub struct TtlCache<K, V> {
    name: &'static str,
    entries: MokaCache<K, Stamped<V>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,

    /// Keys with a fill in progress or waiting.
    fills: Mutex<HashMap<K, FillLock>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a new cache. `name` only appears in logs.
    pub fn new(name: &'static str, config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let entries = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self {
            name,
            entries,
            ttl: config.ttl,
            clock,
            fills: Mutex::new(HashMap::new()),
        }
    }

    /// Get a fresh entry, if any.
    pub async fn get(&self, key: &K) -> Option<V> {
        let entry = self.entries.get(key).await?;
        let age = self.clock.now().saturating_duration_since(entry.stored_at);
        if age >= self.ttl {
            return None;
        }
        Some(entry.value)
    }

    /// Store a value, replacing any previous entry for the key.
    pub async fn insert(&self, key: K, value: V) {
        let stamped = Stamped {
            value,
            stored_at: self.clock.now(),
        };
        self.entries.insert(key, stamped).await;
    }

    /// Return the cached value for `key`, or run `fetch` and cache its success.
    ///
    /// Errors are returned as-is and never cached.
    pub async fn get_or_try_fetch<F, Fut, E>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(&key).await {
            debug!(cache = self.name, "cache hit");
            return Ok(hit);
        }

        let lock = self.fill_lock(&key);
        let result = {
            let _guard = lock.lock().await;

            // Someone else may have filled it while we waited.
            if let Some(hit) = self.get(&key).await {
                debug!(cache = self.name, "cache hit after wait");
                Ok(hit)
            } else {
                debug!(cache = self.name, "cache miss");
                match fetch().await {
                    Ok(value) => {
                        self.insert(key.clone(), value.clone()).await;
                        Ok(value)
                    }
                    Err(e) => Err(e),
                }
            }
        };
        self.release_fill_lock(&key, lock);
        result
    }

    /// Like [`get_or_try_fetch`](Self::get_or_try_fetch) for computations that cannot fail.
    pub async fn get_or_insert_with<F, Fut>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        let Ok(value) = self
            .get_or_try_fetch(key, || async move { Ok::<_, Infallible>(compute().await) })
            .await;
        value
    }

    fn fill_lock(&self, key: &K) -> FillLock {
        let mut fills = self.fills.lock().unwrap_or_else(PoisonError::into_inner);
        fills.entry(key.clone()).or_default().clone()
    }

    fn release_fill_lock(&self, key: &K, lock: FillLock) {
        let mut fills = self.fills.lock().unwrap_or_else(PoisonError::into_inner);
        // Held only by the map and by us: nobody else is waiting on this key.
        if Arc::strong_count(&lock) == 2 {
            fills.remove(key);
        }
        // Drop our handle before the map guard so the next releaser counts correctly.
        drop(lock);
    }

    /// The configured TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}
