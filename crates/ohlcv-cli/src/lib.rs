//! 캔들 조회 CLI 도구.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 캔들 조회 및 JSON/CSV 출력 (`fetch`)
//! - 캐시 키와 저장소 다이제스트 확인 (`key`)

pub mod commands;

pub use commands::*;
