use async_trait::async_trait;
use coinwatch::domain::CacheEntry;
use coinwatch::ports::CacheStore;
use moka::future::Cache;
use std::fmt::Debug;
use std::hash::Hash;

/// Moka-backed TTL cache store.
///
/// Entries carry their own `cached_at` and are never expired by age, so a
/// stale entry stays available as an upstream-failure fallback. Growth is
/// bounded by an optional entry capacity; moka's TinyLFU policy picks the
/// victims once it is reached.
pub struct MokaCache<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + Clone + 'static,
{
    cache: Cache<K, CacheEntry<V>>,
}

impl<K, V> MokaCache<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + Clone + 'static,
{
    /// Create an unbounded store
    pub fn new_unbounded() -> Self {
        Self {
            cache: Cache::builder().build(),
        }
    }

    /// Create a store holding at most `max_entries` entries
    pub fn new_bounded(max_entries: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_entries).build(),
        }
    }

    /// Create a named store with an optional capacity
    pub fn new(name: &str, max_entries: Option<u64>) -> Self {
        let mut builder = Cache::builder().name(name);

        if let Some(capacity) = max_entries {
            builder = builder.max_capacity(capacity);
        }

        Self {
            cache: builder.build(),
        }
    }

    /// Apply pending evictions; moka defers them to maintenance passes
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}

#[async_trait]
impl<K, V> CacheStore<K, V> for MokaCache<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + Clone + 'static,
{
    async fn get(&self, key: &K) -> Option<CacheEntry<V>> {
        self.cache.get(key).await
    }

    async fn put(&self, key: K, payload: V) -> CacheEntry<V> {
        let entry = CacheEntry::new(payload);
        tracing::debug!("Storing cache entry for key {:?}", key);
        self.cache.insert(key, entry.clone()).await;
        entry
    }

    fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }
}

impl<K, V> Debug for MokaCache<K, V>
where
    K: Debug + Hash + Eq + Send + Sync + 'static,
    V: Debug + Send + Sync + Clone + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaCache")
            .field("name", &self.cache.name())
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}
