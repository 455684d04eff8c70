//! Cache module for docviz
//!
//! Holds generated visualizations between requests. Two strategies implement
//! [`ScatterCache`]: an in-process map ([`MemoryCache`], default) and a
//! Redis-backed store ([`RedisCache`]) shared between processes.
//!
//! Entries carry an absolute expiry and are treated as absent once it has
//! passed. Expiry is lazy: nothing sweeps the cache in the background.

mod memory;

pub use memory::MemoryCache;

#[cfg(feature = "cache-redis")]
mod redis;

#[cfg(feature = "cache-redis")]
pub use self::redis::RedisCache;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::error::{Error, Result};

/// Namespace shared by every key this crate writes
pub const KEY_PREFIX: &str = "viz:";

pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

/// One hour
pub const DEFAULT_TTL_MS: u64 = 3_600_000;

/// Which [`ScatterCache`] implementation to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Process-local map, lost on restart
    #[default]
    Memory,
    /// Shared Redis instance
    Redis,
}

impl CacheBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redis => "redis",
        }
    }
}

impl FromStr for CacheBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            other => Err(Error::Config(format!(
                "Unknown cache strategy '{}', expected 'memory' or 'redis'",
                other
            ))),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Backend type: "memory" or "redis"
    #[serde(default)]
    pub backend: CacheBackend,

    /// URL for Redis connection
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Time-to-live for cached visualizations, in milliseconds
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,

    /// Cache key policy
    #[serde(default)]
    pub key_strategy: crate::visualization::KeyStrategy,
}

fn default_redis_url() -> String {
    DEFAULT_REDIS_URL.to_string()
}

fn default_ttl_ms() -> u64 {
    DEFAULT_TTL_MS
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::memory()
    }
}

impl CacheConfig {
    pub fn memory() -> Self {
        Self {
            backend: CacheBackend::Memory,
            url: default_redis_url(),
            ttl_ms: DEFAULT_TTL_MS,
            key_strategy: Default::default(),
        }
    }

    pub fn redis(url: &str) -> Self {
        Self {
            backend: CacheBackend::Redis,
            url: url.to_string(),
            ..Self::memory()
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

/// A stored value together with its lifetime
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(data: serde_json::Value, now: DateTime<Utc>, ttl: Duration) -> Self {
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self {
            data,
            created_at: now,
            expires_at,
        }
    }

    /// Readable while `now <= expires_at`
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }
}

/// Snapshot of a cache strategy's state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheStats {
    pub strategy: String,
    pub entries: usize,
    /// Strategy-specific diagnostics
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl CacheStats {
    pub fn new(strategy: &str, entries: usize) -> Self {
        Self {
            strategy: strategy.to_string(),
            entries,
            details: serde_json::Map::new(),
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

/// Key/value store for generated visualizations with per-entry TTL.
///
/// Implementations never fail at this boundary: backend problems are logged
/// and reported as a miss (`get`), a no-op (`set`, `clear`) or `false`
/// (`is_valid`), so generation keeps working without a cache.
#[async_trait]
pub trait ScatterCache: Send + Sync {
    /// Fetch a live entry. Expired entries read as `None`.
    async fn get(&self, key: &str) -> Option<serde_json::Value>;

    /// Store `value` until `now + ttl`, replacing any existing entry.
    async fn set(&self, key: &str, value: serde_json::Value, ttl: Duration);

    /// Remove one key, or every key in this crate's namespace when `None`.
    async fn clear(&self, key: Option<&str>);

    /// Whether a live entry exists. Never mutates the cache.
    async fn is_valid(&self, key: &str) -> bool;

    async fn stats(&self) -> CacheStats;

    /// Short strategy name used in logs and metrics labels
    fn name(&self) -> &'static str;

    /// Release external resources. No-op for process-local strategies.
    async fn disconnect(&self) {}
}

/// Build the configured cache strategy
pub fn create_cache(config: &CacheConfig, clock: Arc<dyn Clock>) -> Result<Arc<dyn ScatterCache>> {
    match config.backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryCache::with_clock(clock))),
        #[cfg(feature = "cache-redis")]
        CacheBackend::Redis => {
            let _ = clock;
            Ok(Arc::new(RedisCache::new(&config.url)?))
        }
        #[cfg(not(feature = "cache-redis"))]
        CacheBackend::Redis => Err(Error::Config(
            "Redis cache requires the 'cache-redis' feature".to_string(),
        )),
    }
}
