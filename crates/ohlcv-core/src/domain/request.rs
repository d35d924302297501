//! 캔들 조회 요청.

use crate::error::{CandleError, CandleResult};
use crate::types::Timeframe;
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::fmt;

/// 캔들 조회 요청 값 객체.
///
/// 생성 이후 변경할 수 없습니다. 모든 시각은 생성 시점에 UTC로
/// 정규화되므로, 같은 순간을 다른 오프셋으로 표현한 요청은 서로 같습니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CandleRequest {
    symbol: String,
    timeframe: Timeframe,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
}

/// 종료 시각이 확정된 `[start, end)` 범위.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CandleRequest {
    /// 종료 시각이 없는(현재까지) 요청을 생성합니다.
    ///
    /// 심볼은 앞뒤 공백을 제거하고 대문자로 정규화합니다.
    pub fn new<Tz: TimeZone>(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        start_date: DateTime<Tz>,
    ) -> Self {
        Self {
            symbol: symbol.into().trim().to_uppercase(),
            timeframe,
            start_date: start_date.with_timezone(&Utc),
            end_date: None,
        }
    }

    /// `[start_date, end_date)` 범위 요청을 생성합니다.
    pub fn between<Tz: TimeZone, Tz2: TimeZone>(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        start_date: DateTime<Tz>,
        end_date: DateTime<Tz2>,
    ) -> Self {
        Self::new(symbol, timeframe, start_date).with_end(end_date)
    }

    /// 종료 시각을 지정합니다.
    pub fn with_end<Tz: TimeZone>(mut self, end_date: DateTime<Tz>) -> Self {
        self.end_date = Some(end_date.with_timezone(&Utc));
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    /// 종료 시각. `None`이면 호출 시점의 현재 시각까지입니다.
    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }

    /// 요청을 검증하고 종료 시각을 확정합니다.
    ///
    /// 종료 시각이 없으면 `now`를 사용합니다.
    ///
    /// # Errors
    ///
    /// - 심볼이 비어 있으면 `CandleError::InvalidRequest`
    /// - 종료 시각이 시작 시각보다 이르거나 같으면 `CandleError::InvalidRequest`
    pub fn resolve(&self, now: DateTime<Utc>) -> CandleResult<ResolvedRange> {
        if self.symbol.is_empty() {
            return Err(CandleError::InvalidRequest("심볼이 비어 있습니다".to_string()));
        }

        let end = self.end_date.unwrap_or(now);
        if end < self.start_date {
            return Err(CandleError::InvalidRequest(format!(
                "종료 시각({})이 시작 시각({})보다 이릅니다",
                end, self.start_date
            )));
        }
        if end == self.start_date {
            return Err(CandleError::InvalidRequest(format!(
                "빈 범위입니다 (시작 = 종료 = {})",
                end
            )));
        }

        Ok(ResolvedRange {
            start: self.start_date,
            end,
        })
    }

    /// 같은 심볼/타임프레임으로 `[start, end)` 하위 요청을 생성합니다.
    pub fn sub_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe,
            start_date: start,
            end_date: Some(end),
        }
    }
}

impl ResolvedRange {
    /// 주어진 타임프레임 기준 기간 수.
    pub fn span(&self, timeframe: Timeframe) -> i64 {
        timeframe.periods_between(self.start, self.end)
    }
}

impl fmt::Display for CandleRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end_date {
            Some(end) => write!(
                f,
                "{} {} [{} .. {})",
                self.symbol, self.timeframe, self.start_date, end
            ),
            None => write!(f, "{} {} [{} .. now)", self.symbol, self.timeframe, self.start_date),
        }
    }
}
