//! Binance CandleRetriever 구현.

use crate::connector::binance::{BinanceClient, BinanceConfig};
use crate::error::ExchangeResult;
use async_trait::async_trait;
use chrono::Utc;
use ohlcv_core::{CandleError, CandleRecord, CandleRequest, CandleResult, CandleRetriever};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Binance 캔들 제공자.
///
/// BinanceClient를 래핑하여 한 번의 요청으로 처리 가능한 범위만 조회합니다.
/// 요청당 한도를 넘는 범위는 거부하므로 긴 구간은 범위 분할 레이어와 함께 사용합니다.
pub struct BinanceKlineProvider {
    client: Arc<BinanceClient>,
}

impl BinanceKlineProvider {
    /// 새 BinanceKlineProvider 생성.
    pub fn new(client: Arc<BinanceClient>) -> Self {
        Self { client }
    }

    /// BinanceClient에서 생성.
    pub fn from_client(client: BinanceClient) -> Self {
        Self::new(Arc::new(client))
    }

    /// 설정에서 클라이언트와 함께 생성.
    pub fn from_config(config: BinanceConfig) -> ExchangeResult<Self> {
        Ok(Self::from_client(BinanceClient::new(config)?))
    }

    /// 한 번의 요청으로 조회 가능한 최대 기간 수.
    pub fn max_span(&self) -> i64 {
        i64::from(self.client.request_limit())
    }
}

#[async_trait]
impl CandleRetriever for BinanceKlineProvider {
    #[instrument(skip(self), fields(symbol = request.symbol(), timeframe = %request.timeframe()))]
    async fn get_candles_between(&self, request: &CandleRequest) -> CandleResult<Vec<CandleRecord>> {
        let range = request.resolve(Utc::now())?;
        let span = range.span(request.timeframe());

        if span > self.max_span() {
            return Err(CandleError::InvalidRequest(format!(
                "요청 범위({}개 기간)가 요청당 한도({})를 초과합니다",
                span,
                self.max_span()
            )));
        }

        let mut candles = self
            .client
            .get_klines_range(request.symbol(), request.timeframe(), range.start, range.end)
            .await?;

        // 업스트림 경계 처리와 무관하게 [start, end)만 유지
        candles.retain(|c| c.opens_within(range.start, range.end));
        candles.sort_by_key(|c| c.open_time);
        candles.dedup_by_key(|c| c.open_time);

        debug!(span, count = candles.len(), "Binance 캔들 조회 완료");

        Ok(candles)
    }
}
