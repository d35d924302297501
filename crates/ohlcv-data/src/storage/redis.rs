//! Redis 캐시 저장소.

use super::CacheStore;
use crate::error::{Result, StorageError};
use async_trait::async_trait;
use ohlcv_core::CacheKey;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Redis 저장소.
///
/// 항목은 TTL 없이 저장되며 키는 `{prefix}:{cache key}` 형식입니다.
#[derive(Clone)]
pub struct RedisStore {
    connection: Arc<RwLock<MultiplexedConnection>>,
    key_prefix: String,
}

impl RedisStore {
    /// 새로운 Redis 연결을 생성합니다.
    pub async fn connect(url: &str, key_prefix: impl Into<String>) -> Result<Self> {
        info!("Connecting to Redis...");

        let client = Client::open(url)?;
        let connection = client.get_multiplexed_async_connection().await?;

        info!("Redis connection established");

        Ok(Self {
            connection: Arc::new(RwLock::new(connection)),
            key_prefix: key_prefix.into(),
        })
    }

    /// Redis 상태를 확인합니다.
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.connection.write().await;
        let result: String = redis::cmd("PING").query_async(&mut *conn).await?;
        Ok(result == "PONG")
    }

    fn redis_key(&self, key: &CacheKey) -> String {
        prefixed_key(&self.key_prefix, key)
    }
}

fn prefixed_key(prefix: &str, key: &CacheKey) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}:{}", prefix, key)
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn exists(&self, key: &CacheKey) -> Result<bool> {
        let mut conn = self.connection.write().await;
        let exists: bool = conn.exists(self.redis_key(key)).await?;
        Ok(exists)
    }

    async fn read(&self, key: &CacheKey) -> Result<Vec<u8>> {
        let mut conn = self.connection.write().await;
        let value: Option<Vec<u8>> = conn.get(self.redis_key(key)).await?;
        value.ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn write(&self, key: &CacheKey, bytes: &[u8]) -> Result<()> {
        let mut conn = self.connection.write().await;
        let _: () = conn.set(self.redis_key(key), bytes).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ohlcv_core::{CandleRequest, Timeframe};

    #[test]
    fn test_prefixed_key() {
        let key = CacheKey::from_request(&CandleRequest::between(
            "BTCUSDT",
            Timeframe::D1,
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 10, 0, 0, 0).unwrap(),
        ));
        assert_eq!(
            prefixed_key("ohlcv", &key),
            "ohlcv:BTCUSDT:1d:2020-01-01T00:00:00.000Z:2020-01-10T00:00:00.000Z"
        );
        assert_eq!(prefixed_key("", &key), key.as_str());
    }
}
