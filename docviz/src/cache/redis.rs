//! Redis-based visualization cache

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use super::{CacheStats, ScatterCache, KEY_PREFIX};
use crate::error::{Error, Result};

/// Redis-backed cache shared by every process pointing at the same server.
///
/// The connection is opened lazily on first use and reused afterwards. Expiry
/// is delegated to Redis (`SET ... PX`).
pub struct RedisCache {
    client: redis::Client,
    url: String,
    prefix: String,
    conn: RwLock<Option<MultiplexedConnection>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RedisCache {
    /// Create a cache for the given URL. No connection is made yet.
    pub fn new(url: &str) -> Result<Self> {
        Self::with_prefix(url, KEY_PREFIX)
    }

    /// Create with a custom namespace prefix
    pub fn with_prefix(url: &str, prefix: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        tracing::info!("Using Redis cache strategy: {}", url);
        Ok(Self {
            client,
            url: url.to_string(),
            prefix: prefix.to_string(),
            conn: RwLock::new(None),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.conn.read().is_some()
    }

    /// Open the connection if there is none.
    ///
    /// Errors go to the caller and leave the cache disconnected. Concurrent
    /// callers may both dial; the first connection stored is kept.
    pub async fn connect(&self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }

        let conn = self.client.get_multiplexed_async_connection().await?;
        let mut probe = conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut probe).await?;

        let mut slot = self.conn.write();
        if slot.is_none() {
            *slot = Some(conn);
            tracing::info!("Connected to Redis at {}", self.url);
        }
        Ok(())
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        let existing = self.conn.read().clone();
        if let Some(conn) = existing {
            return Ok(conn);
        }
        self.connect().await?;
        let conn = self.conn.read().clone();
        conn.ok_or_else(|| Error::Cache("Redis connection dropped during connect".to_string()))
    }

    /// Log a failed operation. Redis-level failures also drop the connection
    /// so the next call dials again.
    fn degrade(&self, op: &str, err: &Error) {
        tracing::warn!("Redis {} failed, continuing without cache: {}", op, err);
        if matches!(err, Error::Cache(_)) {
            *self.conn.write() = None;
        }
    }

    fn namespace_pattern(&self) -> String {
        format!("{}*", self.prefix)
    }

    async fn try_get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(key).await?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn try_set(&self, key: &str, value: &serde_json::Value, ttl: Duration) -> Result<()> {
        let mut conn = self.connection().await?;
        let payload = serde_json::to_string(value)?;
        // PX rejects 0
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let _: () = redis::cmd("SET")
            .arg(key)
            .arg(payload)
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn try_clear(&self, key: Option<&str>) -> Result<usize> {
        let mut conn = self.connection().await?;
        let keys: Vec<String> = match key {
            Some(key) => vec![key.to_string()],
            None => conn.keys(self.namespace_pattern()).await?,
        };
        if keys.is_empty() {
            return Ok(0);
        }
        let removed: usize = conn.del(&keys).await?;
        Ok(removed)
    }

    async fn try_is_valid(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        // -2: missing, -1: exists without expiry
        let pttl: i64 = conn.pttl(key).await?;
        Ok(pttl > 0 || pttl == -1)
    }

    async fn try_count(&self) -> Result<usize> {
        let mut conn = self.connection().await?;
        let keys: Vec<String> = conn.keys(self.namespace_pattern()).await?;
        Ok(keys.len())
    }
}

#[async_trait]
impl ScatterCache for RedisCache {
    async fn get(&self, key: &str) -> Option<serde_json::Value> {
        match self.try_get(key).await {
            Ok(Some(value)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("docviz_cache_hits_total", "strategy" => "redis").increment(1);
                Some(value)
            }
            Ok(None) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("docviz_cache_misses_total", "strategy" => "redis")
                    .increment(1);
                None
            }
            Err(e) => {
                self.degrade("get", &e);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        if let Err(e) = self.try_set(key, &value, ttl).await {
            self.degrade("set", &e);
        }
    }

    async fn clear(&self, key: Option<&str>) {
        match self.try_clear(key).await {
            Ok(removed) => tracing::debug!("Removed {} Redis key(s)", removed),
            Err(e) => self.degrade("clear", &e),
        }
    }

    async fn is_valid(&self, key: &str) -> bool {
        match self.try_is_valid(key).await {
            Ok(valid) => valid,
            Err(e) => {
                self.degrade("is_valid", &e);
                false
            }
        }
    }

    async fn stats(&self) -> CacheStats {
        let counts = |stats: CacheStats| {
            stats
                .with_detail("url", self.url.clone())
                .with_detail("hits", self.hits.load(Ordering::Relaxed))
                .with_detail("misses", self.misses.load(Ordering::Relaxed))
        };

        match self.try_count().await {
            Ok(entries) => counts(CacheStats::new("redis", entries))
                .with_detail("connected", self.is_connected()),
            Err(e) => {
                self.degrade("stats", &e);
                counts(CacheStats::new("redis", 0))
                    .with_detail("connected", false)
                    .with_detail("error", e.to_string())
            }
        }
    }

    fn name(&self) -> &'static str {
        "redis"
    }

    async fn disconnect(&self) {
        if self.conn.write().take().is_some() {
            tracing::info!("Disconnected from Redis at {}", self.url);
        }
    }
}
