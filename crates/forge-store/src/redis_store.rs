//! Redis-backed state store for multi-instance deployments.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `REDIS_URL`: Redis connection URL (default: redis://localhost:6379)

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::RwLock;
use tracing::{debug, info};

use forge_core::{defaults, Error, Result, StateStore};

/// Redis implementation of [`StateStore`].
///
/// Any process instance connected to the same Redis can serve a poll for a
/// token issued by another instance. Unlike a cache, store errors propagate:
/// the token protocol must fail fast when the initial persist fails so a
/// token is never handed out for a job that was never recorded.
pub struct RedisStateStore {
    connection: RwLock<ConnectionManager>,
}

impl RedisStateStore {
    /// Connect to Redis at the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        info!(
            url = %url.replace(|c: char| c.is_ascii_alphanumeric(), "*"),
            "Redis state store connected"
        );
        Ok(Self {
            connection: RwLock::new(connection),
        })
    }

    /// Connect using environment configuration (`REDIS_URL`).
    pub async fn from_env() -> Result<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| defaults::REDIS_URL.to_string());
        Self::connect(&url).await
    }
}

#[async_trait]
impl StateStore for RedisStateStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection.write().await;
        let value: Option<String> = conn.get(key).await.map_err(Error::from)?;
        debug!(key, hit = value.is_some(), "state GET");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.connection.write().await;
        match ttl {
            Some(ttl) => conn
                .set_ex::<_, _, ()>(key, value, ttl.as_secs())
                .await
                .map_err(Error::from)?,
            None => conn.set::<_, _, ()>(key, value).await.map_err(Error::from)?,
        }
        debug!(key, ttl_secs = ttl.map(|t| t.as_secs()), "state SET");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.connection.write().await;
        conn.del::<_, ()>(key).await.map_err(Error::from)?;
        debug!(key, "state DEL");
        Ok(())
    }
}
