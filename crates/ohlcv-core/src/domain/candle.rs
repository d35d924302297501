//! OHLCV 캔들 레코드.

use crate::types::{Price, Volume};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// OHLCV 캔들스틱 레코드.
///
/// 가격과 거래량은 문자열 형식 Decimal로 직렬화되어 캐시 왕복 시
/// 정밀도 손실이 없습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandleRecord {
    /// 캔들 시작 시간
    pub open_time: DateTime<Utc>,
    /// 시가
    pub open: Price,
    /// 고가
    pub high: Price,
    /// 저가
    pub low: Price,
    /// 종가
    pub close: Price,
    /// 거래량
    pub volume: Volume,
    /// 캔들 종료 시간
    pub close_time: DateTime<Utc>,
}

impl CandleRecord {
    /// 새 캔들을 생성합니다.
    pub fn new(
        open_time: DateTime<Utc>,
        open: Price,
        high: Price,
        low: Price,
        close: Price,
        volume: Volume,
        close_time: DateTime<Utc>,
    ) -> Self {
        Self {
            open_time,
            open,
            high,
            low,
            close,
            volume,
            close_time,
        }
    }

    /// 캔들 범위(고가 - 저가)를 반환합니다.
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    /// 시작 시간이 `[start, end)` 안에 있는지 확인합니다.
    pub fn opens_within(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.open_time >= start && self.open_time < end
    }
}
