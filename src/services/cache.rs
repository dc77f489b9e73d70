use crate::models::{CandidateEvent, GameFilters};
use crate::services::store::{EventStore, StoreError};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// Multi-tier cache manager
///
/// L1 is in-process (moka), L2 is Redis and shared across instances. Without
/// Redis the manager runs L1-only.
pub struct CacheManager {
    redis: Option<Arc<tokio::sync::Mutex<ConnectionManager>>>,
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    ttl_secs: u64,
}

impl CacheManager {
    /// Create a cache manager backed by Redis
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = redis::aio::ConnectionManager::new(client).await?;

        Ok(Self {
            redis: Some(Arc::new(tokio::sync::Mutex::new(redis))),
            l1_cache: build_l1(l1_size, ttl_secs),
            ttl_secs,
        })
    }

    /// Create an in-process only cache manager
    pub fn local(l1_size: u64, ttl_secs: u64) -> Self {
        Self {
            redis: None,
            l1_cache: build_l1(l1_size, ttl_secs),
            ttl_secs,
        }
    }

    /// Get a value from cache (L1 first, then L2)
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        if let Some(bytes) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(serde_json::from_slice(&bytes)?);
        }

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut *conn).await?;
            drop(conn);

            if let Some(json) = value {
                tracing::trace!("L2 cache hit: {}", key);
                self.l1_cache
                    .insert(key.to_string(), json.as_bytes().to_vec())
                    .await;
                return Ok(serde_json::from_str(&json)?);
            }
        }

        tracing::trace!("Cache miss: {}", key);
        Err(CacheError::CacheMiss(key.to_string()))
    }

    /// Set a value in cache (both tiers)
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;

        self.l1_cache
            .insert(key.to_string(), json.as_bytes().to_vec())
            .await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            redis::cmd("SETEX")
                .arg(key)
                .arg(self.ttl_secs)
                .arg(json)
                .query_async::<()>(&mut *conn)
                .await?;
        }

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Invalidate all cache entries matching a pattern
    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<(), CacheError> {
        // L1 has no pattern support, so clear it entirely
        self.l1_cache.invalidate_all();

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let keys: Vec<String> = redis::cmd("KEYS").arg(pattern).query_async(&mut *conn).await?;

            if !keys.is_empty() {
                redis::cmd("DEL").arg(keys).query_async::<()>(&mut *conn).await?;
            }
        }

        tracing::debug!("Invalidated cache pattern: {}", pattern);
        Ok(())
    }
}

fn build_l1(l1_size: u64, ttl_secs: u64) -> moka::future::Cache<String, Vec<u8>> {
    moka::future::CacheBuilder::new(l1_size)
        .time_to_live(Duration::from_secs(ttl_secs))
        .build()
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    pub const OPEN_GAMES_PATTERN: &'static str = "open_games:*";

    /// Build a cache key for an open games listing
    pub fn open_games(filters: &GameFilters) -> String {
        format!(
            "open_games:{}:{}",
            filters.sport.as_deref().unwrap_or("*any"),
            filters.district.as_deref().unwrap_or("*any")
        )
    }
}

/// Event store decorator caching open-event listings
///
/// Single event reads and attendance writes go straight through; an
/// attendance write drops cached listings since the event may have filled.
pub struct CachedEventStore {
    inner: Arc<dyn EventStore>,
    cache: Arc<CacheManager>,
}

impl CachedEventStore {
    pub fn new(inner: Arc<dyn EventStore>, cache: Arc<CacheManager>) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl EventStore for CachedEventStore {
    async fn list_open(&self, filters: &GameFilters) -> Result<Vec<CandidateEvent>, StoreError> {
        let key = CacheKey::open_games(filters);

        match self.cache.get::<Vec<CandidateEvent>>(&key).await {
            Ok(events) => return Ok(events),
            Err(CacheError::CacheMiss(_)) => {}
            Err(e) => tracing::warn!("Cache read failed for {}, querying store: {}", key, e),
        }

        let events = self.inner.list_open(filters).await?;

        if let Err(e) = self.cache.set(&key, &events).await {
            tracing::warn!("Failed to cache {}: {}", key, e);
        }

        Ok(events)
    }

    async fn get(&self, event_id: &str) -> Result<Option<CandidateEvent>, StoreError> {
        self.inner.get(event_id).await
    }

    async fn record_attendance(&self, player_id: &str, event_id: &str) -> Result<(), StoreError> {
        self.inner.record_attendance(player_id, event_id).await?;

        if let Err(e) = self.cache.invalidate_pattern(CacheKey::OPEN_GAMES_PATTERN).await {
            tracing::warn!("Failed to invalidate open games cache: {}", e);
        }

        Ok(())
    }
}
