//! 캐시 항목 직렬화.
//!
//! 항목은 `{ key, created_at, records }` JSON 봉투로 저장됩니다.
//! 저장된 키가 요청 키와 다르거나 역직렬화에 실패하면 손상으로 처리하며,
//! 미스로 간주해 다시 조회하지 않습니다.

use chrono::{DateTime, Utc};
use ohlcv_core::{CacheKey, CandleError, CandleRecord, CandleResult};
use serde::{Deserialize, Serialize};

/// 저장된 캐시 항목.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheEntry {
    /// 정규화된 캐시 키 (다이제스트 충돌/오배치 검증용)
    pub key: String,
    /// 저장 시각
    pub created_at: DateTime<Utc>,
    /// 캔들 목록
    pub records: Vec<CandleRecord>,
}

#[derive(Serialize)]
struct CacheEntryRef<'a> {
    key: &'a str,
    created_at: DateTime<Utc>,
    records: &'a [CandleRecord],
}

impl CacheEntry {
    /// 캔들 목록을 항목 바이트로 직렬화합니다.
    pub fn encode(key: &CacheKey, records: &[CandleRecord]) -> CandleResult<Vec<u8>> {
        let entry = CacheEntryRef {
            key: key.as_str(),
            created_at: Utc::now(),
            records,
        };
        serde_json::to_vec(&entry)
            .map_err(|e| CandleError::Storage(format!("캐시 항목 직렬화 실패: {}", e)))
    }

    /// 항목 바이트를 역직렬화하고 키를 검증합니다.
    pub fn decode(key: &CacheKey, bytes: &[u8]) -> CandleResult<Self> {
        let entry: CacheEntry =
            serde_json::from_slice(bytes).map_err(|e| CandleError::CacheCorruption {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        if entry.key != key.as_str() {
            return Err(CandleError::CacheCorruption {
                key: key.to_string(),
                reason: format!("저장된 키 불일치: {}", entry.key),
            });
        }

        Ok(entry)
    }
}
