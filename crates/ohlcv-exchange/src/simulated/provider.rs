//! 시뮬레이션 CandleRetriever.

use super::data_feed::generate_candles;
use async_trait::async_trait;
use chrono::Utc;
use ohlcv_core::{
    CandleError, CandleRecord, CandleRequest, CandleResult, CandleRetriever, Price, ResolvedRange,
};
use rust_decimal::Decimal;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// 결정적 캔들을 반환하는 시뮬레이션 제공자.
pub struct SimulatedProvider {
    base_price: Price,
    /// 요청당 최대 캔들 수. 초과분은 업스트림처럼 잘립니다.
    request_limit: Option<usize>,
    /// `end` 시각의 캔들까지 포함 (양쪽 포함 경계를 쓰는 업스트림 흉내)
    inclusive_end: bool,
    /// 지정한 호출 순번(1부터)에서 실패
    fail_on_call: Option<usize>,
    calls: Mutex<Vec<ResolvedRange>>,
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedProvider {
    /// 새 시뮬레이션 제공자 생성.
    pub fn new() -> Self {
        Self {
            base_price: Decimal::from(100),
            request_limit: None,
            inclusive_end: false,
            fail_on_call: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_base_price(mut self, base_price: Price) -> Self {
        self.base_price = base_price;
        self
    }

    pub fn with_request_limit(mut self, limit: usize) -> Self {
        self.request_limit = Some(limit);
        self
    }

    pub fn with_inclusive_end(mut self, inclusive: bool) -> Self {
        self.inclusive_end = inclusive;
        self
    }

    /// `call`번째 호출에서 조회 실패를 반환하도록 설정합니다.
    pub fn failing_on_call(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    /// 지금까지의 호출 수.
    pub fn call_count(&self) -> usize {
        self.recorded().len()
    }

    /// 호출된 범위 목록 (호출 순서).
    pub fn calls(&self) -> Vec<ResolvedRange> {
        self.recorded().clone()
    }

    fn recorded(&self) -> MutexGuard<'_, Vec<ResolvedRange>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CandleRetriever for SimulatedProvider {
    async fn get_candles_between(&self, request: &CandleRequest) -> CandleResult<Vec<CandleRecord>> {
        let range = request.resolve(Utc::now())?;

        let call = {
            let mut calls = self.recorded();
            calls.push(range);
            calls.len()
        };

        if self.fail_on_call == Some(call) {
            return Err(CandleError::Retrieval(format!(
                "시뮬레이션 조회 실패 (호출 #{})",
                call
            )));
        }

        let mut candles = generate_candles(
            request.timeframe(),
            range.start,
            range.end,
            self.base_price,
            self.inclusive_end,
        );

        if let Some(limit) = self.request_limit {
            candles.truncate(limit);
        }

        debug!(
            symbol = request.symbol(),
            timeframe = %request.timeframe(),
            call,
            count = candles.len(),
            "시뮬레이션 캔들 생성"
        );

        Ok(candles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone};
    use ohlcv_core::Timeframe;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_records_calls() {
        let provider = SimulatedProvider::new();
        let request = CandleRequest::between("BTCUSDT", Timeframe::D1, utc(2020, 1, 1), utc(2020, 1, 10));

        let candles = provider.get_candles_between(&request).await.unwrap();

        assert_eq!(candles.len(), 9);
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.calls()[0].start, utc(2020, 1, 1));
        assert_eq!(provider.calls()[0].end, utc(2020, 1, 10));
    }

    #[tokio::test]
    async fn test_request_limit_truncates() {
        let provider = SimulatedProvider::new().with_request_limit(5);
        let request = CandleRequest::between("BTCUSDT", Timeframe::D1, utc(2020, 1, 1), utc(2020, 2, 1));

        let candles = provider.get_candles_between(&request).await.unwrap();
        assert_eq!(candles.len(), 5);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let provider = SimulatedProvider::new().failing_on_call(2);
        let request = CandleRequest::between("BTCUSDT", Timeframe::D1, utc(2020, 1, 1), utc(2020, 1, 3));

        assert!(provider.get_candles_between(&request).await.is_ok());
        let err = provider.get_candles_between(&request).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(provider.get_candles_between(&request).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_request_not_recorded() {
        let provider = SimulatedProvider::new();
        let request = CandleRequest::between("BTCUSDT", Timeframe::D1, utc(2020, 1, 3), utc(2020, 1, 1));

        assert!(provider.get_candles_between(&request).await.unwrap_err().is_invalid_request());
        assert_eq!(provider.call_count(), 0);
    }
}
