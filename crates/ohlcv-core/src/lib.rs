//! # OHLCV Core
//!
//! 과거 캔들 조회 파이프라인의 핵심 도메인 모델 및 공통 인프라를 제공합니다.
//!
//! - 캔들 레코드, 조회 요청, 캐시 키
//! - 모든 조회 레이어가 구현하는 `CandleRetriever` trait
//! - 타임프레임 기간 산술
//! - 에러 타입
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use self::config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
