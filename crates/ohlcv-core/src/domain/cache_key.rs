//! 결정적 캐시 키.
//!
//! 키 형식: `{SYMBOL}:{timeframe}:{start}:{end}`
//!
//! 시각은 밀리초 고정 정밀도의 ISO-8601 UTC 문자열로 정규화됩니다
//! (`2020-01-01T00:00:00.000Z`). 종료 시각이 없는 요청은 `open`으로 표기합니다.
//! `Display`나 로케일 의존 형식은 사용하지 않습니다.

use crate::domain::CandleRequest;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fmt;

/// 종료 시각이 없는 요청의 키 표기.
const OPEN_END: &str = "open";

/// 요청 파라미터에서 파생된 캐시 키.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// 요청에서 캐시 키를 생성합니다.
    pub fn from_request(request: &CandleRequest) -> Self {
        let end = request
            .end_date()
            .map(|end| canonical_instant(&end))
            .unwrap_or_else(|| OPEN_END.to_string());

        Self(format!(
            "{}:{}:{}:{}",
            request.symbol(),
            request.timeframe().to_binance_interval(),
            canonical_instant(&request.start_date()),
            end
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 키의 SHA-256 16진 다이제스트.
    ///
    /// 파일 이름처럼 문자 제약이 있는 저장소에서 사용합니다.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.0.as_bytes()))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// 시각을 밀리초 정밀도 ISO-8601 UTC 문자열로 변환합니다.
pub fn canonical_instant(instant: &DateTime<Utc>) -> String {
    instant.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}
