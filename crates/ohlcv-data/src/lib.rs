//! 캔들 조회 레이어 및 캐시 저장소.
//!
//! 이 crate는 다음을 제공합니다:
//! - 범위 분할 조회기 (`ChunkedRetriever`)
//! - 캐시 기반 조회기 (`CachedRetriever`)
//! - 캐시 저장소: 파일, 메모리, Redis
//! - 설정 기반 파이프라인 조합 (`RetrieverPipeline`)

pub mod cache;
pub mod chunking;
pub mod error;
pub mod pipeline;
pub mod storage;

pub use error::{Result, StorageError};

pub use cache::{CacheEntry, CacheMetrics, CacheStats, CachedRetriever};
pub use chunking::{count_gaps, merge_records, ChunkedRetriever};
pub use pipeline::{open_store, RetrieverPipeline};
pub use storage::{CacheStore, FileStore, MemoryStore, RedisStore};
