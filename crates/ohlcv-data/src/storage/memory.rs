//! 메모리 캐시 저장소.

use super::CacheStore;
use crate::error::{Result, StorageError};
use async_trait::async_trait;
use ohlcv_core::CacheKey;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// 프로세스 메모리 저장소. 프로세스 종료 시 사라집니다.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 항목 수.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// 저장된 바이트를 그대로 교체합니다 (손상 항목 재현용).
    pub async fn overwrite_raw(&self, key: &CacheKey, bytes: Vec<u8>) {
        self.entries.write().await.insert(key.to_string(), bytes);
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn exists(&self, key: &CacheKey) -> Result<bool> {
        Ok(self.entries.read().await.contains_key(key.as_str()))
    }

    async fn read(&self, key: &CacheKey) -> Result<Vec<u8>> {
        self.entries
            .read()
            .await
            .get(key.as_str())
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn write(&self, key: &CacheKey, bytes: &[u8]) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}
