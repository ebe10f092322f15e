//! Cache-aside capability consumed by the translation store.
//!
//! Values are opaque strings (the store keeps JSON-encoded rows), the way a
//! memcached-style backend would hold them.

use std::time::Duration;

/// A key/value cache with explicit invalidation.
pub trait Cache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn invalidate(&self, key: &str);
}

/// Entries kept before the least useful ones are evicted.
pub const DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// Process-local cache with a fixed time-to-live per entry.
///
/// Backed by `moka`, which drops expired entries in its own housekeeping and
/// bounds the entry count.
pub struct MemoryCache {
    entries: moka::sync::Cache<String, String>,
}

impl MemoryCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_capacity(ttl: Duration, max_entries: u64) -> Self {
        let entries = moka::sync::Cache::builder()
            .max_capacity(max_entries)
            .time_to_live(ttl)
            .build();
        Self { entries }
    }

    /// Number of live entries, after pending expirations and evictions have
    /// been applied.
    pub fn len(&self) -> usize {
        self.entries.run_pending_tasks();
        self.entries.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key)
    }

    fn set(&self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn invalidate(&self, key: &str) {
        self.entries.invalidate(key);
    }
}

/// Cache that never stores anything (caching disabled).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl Cache for NoCache {
    fn get(&self, _key: &str) -> Option<String> {
        None
    }

    fn set(&self, _key: &str, _value: String) {}

    fn invalidate(&self, _key: &str) {}
}
