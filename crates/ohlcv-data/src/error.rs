//! 데이터 모듈 오류 타입.

use ohlcv_core::CandleError;
use thiserror::Error;

/// 캐시 저장소 오류.
#[derive(Debug, Error)]
pub enum StorageError {
    /// 파일 시스템 오류
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Redis 연결/명령 오류
    #[error("Redis error: {0}")]
    Redis(String),

    /// 키에 해당하는 항목이 없음
    #[error("Entry not found: {0}")]
    NotFound(String),

    /// 직렬화/역직렬화 오류
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<redis::RedisError> for StorageError {
    fn from(err: redis::RedisError) -> Self {
        StorageError::Redis(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

impl From<StorageError> for CandleError {
    fn from(err: StorageError) -> Self {
        CandleError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StorageError>;
