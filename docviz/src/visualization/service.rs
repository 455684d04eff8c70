//! Cached access to scatter visualizations

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{KeyStrategy, ScatterOptions, ScatterResponse, VisualizationPipeline, VisualizationResult};
use crate::cache::{self, CacheStats, ScatterCache};
use crate::clock::{self, Clock};
use crate::config::Config;
use crate::reduce::HttpReducer;
use crate::store::QdrantStore;
use crate::Result;

/// Serves scatter data from cache, generating on a miss.
///
/// Concurrent misses are not coalesced: each runs the pipeline and the last
/// write wins.
pub struct VisualizationService {
    cache: Arc<dyn ScatterCache>,
    pipeline: VisualizationPipeline,
    ttl: Duration,
    key_strategy: KeyStrategy,
    clock: Arc<dyn Clock>,
}

impl VisualizationService {
    pub fn new(cache: Arc<dyn ScatterCache>, pipeline: VisualizationPipeline, ttl: Duration) -> Self {
        Self {
            cache,
            pipeline,
            ttl,
            key_strategy: KeyStrategy::default(),
            clock: clock::system(),
        }
    }

    /// Wire up Qdrant, the HTTP reducer and the configured cache
    pub fn from_config(config: &Config) -> Result<Self> {
        let clock = clock::system();
        let store = Arc::new(QdrantStore::new(
            &config.vector_store.url,
            config.vector_store.api_key.clone(),
        ));
        let reducer = Arc::new(HttpReducer::new(&config.reducer.url));
        let pipeline = VisualizationPipeline::new(store, reducer, &config.vector_store.collection)
            .with_clock(clock.clone());
        let cache = cache::create_cache(&config.cache, clock.clone())?;

        tracing::info!(
            "Visualization service initialized with {} cache, TTL: {}ms",
            config.cache.backend.as_str(),
            config.cache.ttl_ms
        );

        Ok(Self::new(cache, pipeline, config.cache.ttl())
            .with_key_strategy(config.cache.key_strategy)
            .with_clock(clock))
    }

    pub fn with_key_strategy(mut self, key_strategy: KeyStrategy) -> Self {
        self.key_strategy = key_strategy;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn cache_key(&self, options: &ScatterOptions) -> String {
        self.key_strategy.key_for(options)
    }

    pub async fn get_scatter_data(&self, options: &ScatterOptions) -> Result<ScatterResponse> {
        let started = Instant::now();
        let key = self.cache_key(options);

        if !options.force_refresh {
            if let Some(cached) = self.read_cached(&key).await {
                let age = (self.clock.now() - cached.metadata.generated_at)
                    .to_std()
                    .unwrap_or_default();
                tracing::debug!("Cache hit for '{}' (age: {}s)", key, age.as_secs());
                return Ok(ScatterResponse {
                    result: cached,
                    from_cache: true,
                    cache_age_ms: Some(u64::try_from(age.as_millis()).unwrap_or(u64::MAX)),
                    generation_time_ms: None,
                });
            }
        }

        tracing::info!("Cache miss for '{}', generating visualization", key);
        let result = self.pipeline.generate(options).await?;

        match serde_json::to_value(&result) {
            Ok(value) => self.cache.set(&key, value, self.ttl).await,
            Err(e) => tracing::warn!("Could not serialize visualization for cache: {}", e),
        }

        let elapsed = started.elapsed();
        tracing::info!("Generation complete in {}ms", elapsed.as_millis());

        Ok(ScatterResponse {
            result,
            from_cache: false,
            cache_age_ms: None,
            generation_time_ms: Some(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)),
        })
    }

    /// Cached entry for `key`. Entries that no longer parse are dropped and
    /// count as a miss.
    async fn read_cached(&self, key: &str) -> Option<VisualizationResult> {
        let value = self.cache.get(key).await?;
        match serde_json::from_value(value) {
            Ok(result) => Some(result),
            Err(e) => {
                tracing::warn!("Discarding unreadable cache entry '{}': {}", key, e);
                self.cache.clear(Some(key)).await;
                None
            }
        }
    }

    /// Drop the cached visualization
    pub async fn clear_cache(&self) {
        if self.key_strategy.is_multi_slot() {
            self.cache.clear(None).await;
        } else {
            self.cache
                .clear(Some(&self.key_strategy.key_for(&ScatterOptions::default())))
                .await;
        }
        tracing::info!("Visualization cache cleared");
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Release the cache backend's connection, if it holds one
    pub async fn disconnect(&self) {
        self.cache.disconnect().await;
    }
}
