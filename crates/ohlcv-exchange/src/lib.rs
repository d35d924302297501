//! 업스트림 캔들 제공자 어댑터.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Binance 시세 커넥터 (`/api/v3/klines`)
//! - Binance 커넥터를 감싼 `CandleRetriever` 구현
//! - 네트워크 없이 동작하는 시뮬레이션 제공자
//! - 거래소 에러 타입과 조회 에러 변환

pub mod connector;
pub mod error;
pub mod provider;
pub mod simulated;

pub use connector::{BinanceClient, BinanceConfig};
pub use error::*;
pub use provider::BinanceKlineProvider;
pub use simulated::SimulatedProvider;
