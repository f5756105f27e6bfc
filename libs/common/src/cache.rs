//! Redis client used for shared session storage
//!
//! Keys are namespaced so several services can share one Redis database
//! without stepping on each other.

use crate::error::{CacheError, CacheResult};
use redis::{AsyncCommands, Client};
use serde::Deserialize;
use tracing::{debug, info};

/// Configuration for Redis connection
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    #[serde(default = "default_url")]
    pub url: String,
    /// Prefix prepended to every key, followed by `:`
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_namespace() -> String {
    "model2".to_string()
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            namespace: default_namespace(),
        }
    }
}

/// Redis connection handle
///
/// Cloning is cheap; every operation opens a multiplexed connection from the
/// shared client.
#[derive(Clone)]
pub struct RedisPool {
    client: Client,
    namespace: String,
}

impl RedisPool {
    /// Create the client. No connection is opened until the first command.
    pub fn new(config: &RedisConfig) -> CacheResult<Self> {
        let client = Client::open(config.url.clone()).map_err(CacheError::Connection)?;
        info!("Redis client initialized with URL: {}", config.url);
        Ok(RedisPool {
            client,
            namespace: config.namespace.clone(),
        })
    }

    /// Full key for `key` inside this pool's namespace
    pub fn key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    async fn get_connection(&self) -> CacheResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(CacheError::Connection)
    }

    /// Set a key-value pair with optional TTL
    pub async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> CacheResult<()> {
        let mut conn = self.get_connection().await?;
        let key = self.key(key);
        debug!("SET {} (ttl={:?})", key, ttl_seconds);

        if let Some(ttl) = ttl_seconds {
            let _: () = conn
                .set_ex(&key, value, ttl)
                .await
                .map_err(CacheError::Command)?;
        } else {
            let _: () = conn.set(&key, value).await.map_err(CacheError::Command)?;
        }

        Ok(())
    }

    /// Get a value by key
    pub async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn
            .get(self.key(key))
            .await
            .map_err(CacheError::Command)?;
        Ok(value)
    }

    /// Delete a key, returning whether it existed
    pub async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.get_connection().await?;
        let removed: u64 = conn
            .del(self.key(key))
            .await
            .map_err(CacheError::Command)?;
        Ok(removed > 0)
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> CacheResult<bool> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(CacheError::Command)?;

        if pong == "PONG" {
            Ok(true)
        } else {
            Err(CacheError::UnexpectedReply(pong))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_namespaced() {
        let pool = RedisPool::new(&RedisConfig {
            url: "redis://localhost:6379".to_string(),
            namespace: "control".to_string(),
        })
        .expect("client");

        assert_eq!(pool.key("session:abc"), "control:session:abc");
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let result = RedisPool::new(&RedisConfig {
            url: "not-a-redis-url".to_string(),
            namespace: default_namespace(),
        });
        assert!(matches!(result, Err(CacheError::Connection(_))));
    }

    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn test_set_get_delete() -> CacheResult<()> {
        let pool = RedisPool::new(&RedisConfig::default())?;
        assert!(pool.health_check().await?);

        let key = "test_key";
        pool.set(key, "test_value", Some(5)).await?;
        assert_eq!(pool.get(key).await?, Some("test_value".to_string()));

        assert!(pool.delete(key).await?);
        assert_eq!(pool.get(key).await?, None);

        Ok(())
    }
}
