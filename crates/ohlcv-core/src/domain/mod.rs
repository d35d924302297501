//! 캔들 조회 도메인 모델.
//!
//! - `CandleRecord` - OHLCV 캔들 레코드
//! - `CandleRequest` - 조회 요청 값 객체
//! - `CacheKey` - 요청에서 파생되는 결정적 캐시 키
//! - `CandleRetriever` - 모든 조회 레이어가 공유하는 능력 계약

mod cache_key;
mod candle;
mod request;
mod retriever;

pub use cache_key::*;
pub use candle::*;
pub use request::*;
pub use retriever::*;
