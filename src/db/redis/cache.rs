use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;

use crate::error::AppError;
use crate::error::AppResult;

/// Typed cache keys, namespaced per concern
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Hot-list fallback, keyed by result size
    HotList(i64),
    /// AI recommendation result for one user
    AiRecommend(i64),
    /// Distinct region/category facets for the browse filters
    Facets,
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::HotList(limit) => write!(f, "hot:{}", limit),
            CacheKey::AiRecommend(user_id) => write!(f, "airec:{}", user_id),
            CacheKey::Facets => write!(f, "facets"),
        }
    }
}

/// Creates a Redis client for caching
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Cache handler for storing and retrieving data from Redis
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
}

impl Cache {
    pub fn new(redis_client: Client) -> Self {
        Self { redis_client }
    }

    /// Retrieves a value from the cache by key
    ///
    /// Returns `None` when the key does not exist.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(format!("{}", key)).await?;

        match cached {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Stores a value in the cache with a TTL.
    ///
    /// Cache write failures are logged and swallowed; a cold cache must
    /// never fail the request that warmed it.
    pub async fn store(&self, key: &CacheKey, value: &impl serde::Serialize, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let result: AppResult<()> = async {
            let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
            let _: () = conn.set_ex(format!("{}", key), json, ttl).await?;
            Ok(())
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(key = %key, error = %e, "Cache write failed");
        }
    }

    /// Drops a cached entry, if present
    pub async fn invalidate(&self, key: &CacheKey) {
        let result: AppResult<()> = async {
            let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
            let _: () = conn.del(format!("{}", key)).await?;
            Ok(())
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(key = %key, error = %e, "Cache invalidation failed");
        }
    }
}
