//! 캐시 저장소.
//!
//! - File 저장소: 키당 JSON 파일 하나 (기본)
//! - Memory 저장소: 프로세스 메모리 (테스트/임시 사용)
//! - Redis 저장소: 만료 없는 키-값 저장

pub mod file;
pub mod memory;
pub mod redis;

use crate::error::Result;
use async_trait::async_trait;
use ohlcv_core::CacheKey;
use std::sync::Arc;

pub use self::file::FileStore;
pub use self::memory::MemoryStore;
pub use self::redis::RedisStore;

/// 캐시 항목 바이트 저장소.
///
/// 항목은 한 번 쓰이면 수정되거나 만료되지 않습니다.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// 키에 해당하는 항목이 있는지 확인합니다.
    async fn exists(&self, key: &CacheKey) -> Result<bool>;

    /// 항목을 읽습니다. 없으면 `StorageError::NotFound`.
    async fn read(&self, key: &CacheKey) -> Result<Vec<u8>>;

    /// 항목을 씁니다. 같은 키가 이미 있으면 덮어씁니다.
    async fn write(&self, key: &CacheKey, bytes: &[u8]) -> Result<()>;
}

#[async_trait]
impl<T: CacheStore + ?Sized> CacheStore for Arc<T> {
    async fn exists(&self, key: &CacheKey) -> Result<bool> {
        (**self).exists(key).await
    }

    async fn read(&self, key: &CacheKey) -> Result<Vec<u8>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &CacheKey, bytes: &[u8]) -> Result<()> {
        (**self).write(key, bytes).await
    }
}
