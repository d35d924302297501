//! 캐시 키 확인 명령.

use ohlcv_core::{CacheKey, CandleRequest};
use serde::Serialize;

/// 요청의 캐시 키 정보.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyInfo {
    /// 정규화된 캐시 키
    pub key: String,
    /// 저장소 다이제스트 (파일 저장소의 파일 이름)
    pub digest: String,
    /// 캐시 저장 대상 여부 (종료 시각이 없으면 캐시를 우회)
    pub cacheable: bool,
}

impl KeyInfo {
    pub fn from_request(request: &CandleRequest) -> Self {
        let key = CacheKey::from_request(request);
        Self {
            digest: key.digest(),
            key: key.to_string(),
            cacheable: request.end_date().is_some(),
        }
    }

    /// 파일 저장소 기준 항목 파일 이름.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone, Utc};
    use ohlcv_core::Timeframe;

    #[test]
    fn test_key_info() {
        let request = CandleRequest::between(
            "btcusdt",
            Timeframe::D1,
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 10, 0, 0, 0).unwrap(),
        );
        let info = KeyInfo::from_request(&request);

        assert_eq!(info.key, "BTCUSDT:1d:2020-01-01T00:00:00.000Z:2020-01-10T00:00:00.000Z");
        assert_eq!(info.digest.len(), 64);
        assert!(info.file_name().ends_with(".json"));
        assert!(info.cacheable);
    }

    #[test]
    fn test_open_ended_key_is_not_cacheable() {
        let request = CandleRequest::new(
            "BTCUSDT",
            Timeframe::H1,
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        );
        let info = KeyInfo::from_request(&request);

        assert!(info.key.ends_with(":open"));
        assert!(!info.cacheable);
    }

    #[test]
    fn test_key_info_offset_invariant() {
        let kst = FixedOffset::east_opt(9 * 3600).unwrap();
        let utc_request = CandleRequest::new(
            "BTCUSDT",
            Timeframe::H1,
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        );
        let kst_request = CandleRequest::new(
            "BTCUSDT",
            Timeframe::H1,
            kst.with_ymd_and_hms(2020, 1, 1, 9, 0, 0).unwrap(),
        );
        assert_eq!(KeyInfo::from_request(&utc_request), KeyInfo::from_request(&kst_request));
    }
}
