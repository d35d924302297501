//! 캐시 기반 조회 레이어.
//!
//! - `CachedRetriever`: 요청 키 단위로 결과를 영구 저장하는 조회기
//! - `CacheEntry`: 저장소에 기록되는 JSON 봉투
//! - `CacheStats`: 적중/미스/저장 실패 통계

pub mod entry;
pub mod retriever;

pub use entry::CacheEntry;
pub use retriever::{CacheMetrics, CacheStats, CachedRetriever};
