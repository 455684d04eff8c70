//! In-process visualization cache

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{CacheEntry, CacheStats, ScatterCache};
use crate::clock::{self, Clock};

/// Map-backed cache. Only visible to the owning process.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_clock(clock::system())
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        tracing::info!("Using in-memory cache strategy");
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("docviz_cache_misses_total", "strategy" => "memory").increment(1);
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScatterCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let now = self.clock.now();

        let expired = {
            let entries = self.entries.read();
            match entries.get(key) {
                None => {
                    self.record_miss();
                    return None;
                }
                Some(entry) if entry.is_live(now) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    metrics::counter!("docviz_cache_hits_total", "strategy" => "memory")
                        .increment(1);
                    return Some(entry.data.clone());
                }
                Some(_) => true,
            }
        };

        if expired {
            // Re-check under the write lock: a concurrent set may have refreshed it
            let mut entries = self.entries.write();
            if entries.get(key).is_some_and(|e| !e.is_live(now)) {
                entries.remove(key);
                tracing::debug!("Evicted expired cache entry '{}'", key);
            }
        }
        self.record_miss();
        None
    }

    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        let entry = CacheEntry::new(value, self.clock.now(), ttl);
        self.entries.write().insert(key.to_string(), entry);
    }

    async fn clear(&self, key: Option<&str>) {
        let mut entries = self.entries.write();
        match key {
            Some(key) => {
                entries.remove(key);
            }
            None => entries.clear(),
        }
    }

    async fn is_valid(&self, key: &str) -> bool {
        let now = self.clock.now();
        self.entries
            .read()
            .get(key)
            .is_some_and(|entry| entry.is_live(now))
    }

    async fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let entries = self.entries.read();
        let live: Vec<&CacheEntry> = entries.values().filter(|e| e.is_live(now)).collect();
        let memory_usage = serde_json::to_vec(&live).map(|b| b.len()).unwrap_or(0);

        CacheStats::new("in-memory", live.len())
            .with_detail("memory_usage_bytes", memory_usage)
            .with_detail("hits", self.hits.load(Ordering::Relaxed))
            .with_detail("misses", self.misses.load(Ordering::Relaxed))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use serde_json::json;

    fn cache_with_clock() -> (MemoryCache, ManualClock) {
        let clock = ManualClock::default();
        (MemoryCache::with_clock(Arc::new(clock.clone())), clock)
    }

    #[tokio::test]
    async fn test_expired_read_evicts_entry() {
        let (cache, clock) = cache_with_clock();
        cache
            .set("viz:a", json!({"n": 1}), Duration::from_secs(10))
            .await;

        clock.advance(chrono::Duration::seconds(11));

        // is_valid has no side effects: the stale entry is still stored
        assert!(!cache.is_valid("viz:a").await);
        assert_eq!(cache.entries.read().len(), 1);

        assert!(cache.get("viz:a").await.is_none());
        assert_eq!(cache.entries.read().len(), 0);
    }

    #[tokio::test]
    async fn test_entry_live_at_exact_expiry() {
        let (cache, clock) = cache_with_clock();
        cache.set("viz:a", json!(1), Duration::from_millis(500)).await;

        clock.advance(chrono::Duration::milliseconds(500));
        assert_eq!(cache.get("viz:a").await, Some(json!(1)));

        clock.advance(chrono::Duration::milliseconds(1));
        assert!(cache.get("viz:a").await.is_none());
    }

    #[tokio::test]
    async fn test_set_overwrites_and_resets_ttl() {
        let (cache, clock) = cache_with_clock();
        cache.set("viz:a", json!("old"), Duration::from_secs(5)).await;
        clock.advance(chrono::Duration::seconds(4));
        cache.set("viz:a", json!("new"), Duration::from_secs(5)).await;
        clock.advance(chrono::Duration::seconds(4));

        assert_eq!(cache.get("viz:a").await, Some(json!("new")));
    }

    #[tokio::test]
    async fn test_stats_counts_live_entries_and_hits() {
        let (cache, clock) = cache_with_clock();
        cache.set("viz:short", json!(1), Duration::from_secs(1)).await;
        cache.set("viz:long", json!(2), Duration::from_secs(60)).await;

        cache.get("viz:long").await; // hit
        cache.get("viz:missing").await; // miss
        clock.advance(chrono::Duration::seconds(2));

        let stats = cache.stats().await;
        assert_eq!(stats.strategy, "in-memory");
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.details["hits"], json!(1));
        assert_eq!(stats.details["misses"], json!(1));
        assert!(stats.details["memory_usage_bytes"].as_u64().unwrap() > 0);
    }
}
