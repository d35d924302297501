//! 캔들 조회 파이프라인의 에러 타입.
//!
//! 모든 조회 레이어는 같은 에러 타입을 공유하며, 하위 레이어에서 올라온
//! 에러를 감싸거나 변환하지 않고 그대로 호출자에게 전달합니다.

use thiserror::Error;

/// 캔들 조회 에러.
#[derive(Debug, Error)]
pub enum CandleError {
    /// 잘못된 요청 (역전된 범위, 빈 범위, 빈 심볼 등)
    #[error("잘못된 요청: {0}")]
    InvalidRequest(String),

    /// 업스트림 조회 실패 (네트워크, 전송, 응답 파싱)
    #[error("데이터 조회 실패: {0}")]
    Retrieval(String),

    /// 저장된 캐시 항목을 역직렬화할 수 없음
    #[error("캐시 항목 손상 ({key}): {reason}")]
    CacheCorruption { key: String, reason: String },

    /// 캐시 저장소 읽기/쓰기 실패
    #[error("저장소 에러: {0}")]
    Storage(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),
}

/// 캔들 조회 작업을 위한 Result 타입.
pub type CandleResult<T> = Result<T, CandleError>;

impl CandleError {
    /// 재시도 가능한 에러인지 확인합니다.
    ///
    /// 파이프라인 내부에서는 재시도하지 않으며, 호출자가 판단할 때 사용합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CandleError::Retrieval(_))
    }

    /// 요청 자체가 잘못된 에러인지 확인합니다.
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, CandleError::InvalidRequest(_))
    }
}

impl From<config::ConfigError> for CandleError {
    fn from(err: config::ConfigError) -> Self {
        CandleError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        assert!(CandleError::Retrieval("timeout".to_string()).is_retryable());
        assert!(!CandleError::InvalidRequest("end < start".to_string()).is_retryable());
        assert!(!CandleError::CacheCorruption {
            key: "k".to_string(),
            reason: "eof".to_string(),
        }
        .is_retryable());
    }

    #[test]
    fn test_corruption_message_names_key() {
        let err = CandleError::CacheCorruption {
            key: "BTCUSDT:1d".to_string(),
            reason: "EOF while parsing".to_string(),
        };
        assert!(err.to_string().contains("BTCUSDT:1d"));
    }
}
