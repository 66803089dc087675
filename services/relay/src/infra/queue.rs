use std::time::Duration;

use anyhow::Context as _;
use deadpool_redis::redis::{self, AsyncCommands, AsyncConnectionConfig};
use deadpool_redis::{Manager, Pool, Runtime};

use crate::domain::repository::{EventPublisher, WorkQueue};
use crate::error::RelayServiceError;

/// Redis-backed work queues and pub/sub publisher.
///
/// Blocking pops go through their own pool. Its connections have no client
/// response timeout, so a pop only ends when the server answers it.
#[derive(Clone)]
pub struct RedisQueue {
    pub pool: Pool,
    pub blocking: Pool,
}

// Blocking pops take whole seconds; 0 would block forever.
fn timeout_secs(timeout: Duration) -> u64 {
    timeout.as_secs().max(1)
}

impl RedisQueue {
    pub fn from_url(url: &str) -> anyhow::Result<Self> {
        let pool = deadpool_redis::Config::from_url(url)
            .create_pool(Some(Runtime::Tokio1))
            .context("failed to create redis pool")?;
        let manager = Manager::new_with_config(
            url,
            AsyncConnectionConfig::new().set_response_timeout(None),
        )
        .context("invalid redis url")?;
        let blocking = Pool::builder(manager)
            .runtime(Runtime::Tokio1)
            .build()
            .context("failed to create blocking redis pool")?;
        Ok(Self { pool, blocking })
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection, RelayServiceError> {
        Ok(self.pool.get().await?)
    }

    async fn blocking_conn(&self) -> Result<deadpool_redis::Connection, RelayServiceError> {
        Ok(self.blocking.get().await?)
    }

    pub async fn ping(&self) -> Result<(), RelayServiceError> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

impl WorkQueue for RedisQueue {
    async fn push(&self, key: &str, value: &str) -> Result<(), RelayServiceError> {
        let mut conn = self.conn().await?;
        let _: i64 = conn.lpush(key, value).await?;
        Ok(())
    }

    async fn push_back(&self, key: &str, value: &str) -> Result<(), RelayServiceError> {
        let mut conn = self.conn().await?;
        let _: i64 = conn.rpush(key, value).await?;
        Ok(())
    }

    async fn pop_blocking(
        &self,
        key: &str,
        timeout: Duration,
    ) -> Result<Option<String>, RelayServiceError> {
        let mut conn = self.blocking_conn().await?;
        let popped: Option<(String, String)> = redis::cmd("BRPOP")
            .arg(key)
            .arg(timeout_secs(timeout))
            .query_async(&mut conn)
            .await?;
        Ok(popped.map(|(_, value)| value))
    }

    async fn pop_front_blocking(
        &self,
        key: &str,
        timeout: Duration,
    ) -> Result<Option<String>, RelayServiceError> {
        let mut conn = self.blocking_conn().await?;
        let popped: Option<(String, String)> = redis::cmd("BLPOP")
            .arg(key)
            .arg(timeout_secs(timeout))
            .query_async(&mut conn)
            .await?;
        Ok(popped.map(|(_, value)| value))
    }

    async fn move_blocking(
        &self,
        src: &str,
        dst: &str,
        timeout: Duration,
    ) -> Result<Option<String>, RelayServiceError> {
        let mut conn = self.blocking_conn().await?;
        let moved: Option<String> = redis::cmd("BRPOPLPUSH")
            .arg(src)
            .arg(dst)
            .arg(timeout_secs(timeout))
            .query_async(&mut conn)
            .await?;
        Ok(moved)
    }

    async fn peek_oldest(&self, key: &str) -> Result<Option<String>, RelayServiceError> {
        let mut conn = self.conn().await?;
        let value: Option<String> = conn.lindex(key, -1).await?;
        Ok(value)
    }

    async fn remove(&self, key: &str, value: &str) -> Result<u64, RelayServiceError> {
        let mut conn = self.conn().await?;
        // Negative count searches from the tail, where the oldest entries live.
        let removed: u64 = conn.lrem(key, -1, value).await?;
        Ok(removed)
    }

    async fn remove_all(&self, key: &str, value: &str) -> Result<u64, RelayServiceError> {
        let mut conn = self.conn().await?;
        let removed: u64 = conn.lrem(key, 0, value).await?;
        Ok(removed)
    }

    async fn len(&self, key: &str) -> Result<u64, RelayServiceError> {
        let mut conn = self.conn().await?;
        let len: u64 = conn.llen(key).await?;
        Ok(len)
    }

    async fn list(&self, key: &str) -> Result<Vec<String>, RelayServiceError> {
        let mut conn = self.conn().await?;
        let values: Vec<String> = conn.lrange(key, 0, -1).await?;
        Ok(values)
    }
}

impl EventPublisher for RedisQueue {
    async fn publish(&self, channel: &str, message: &str) -> Result<(), RelayServiceError> {
        let mut conn = self.conn().await?;
        let _: i64 = conn.publish(channel, message).await?;
        Ok(())
    }
}
