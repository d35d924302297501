//! 범위 분할 조회기.
//!
//! 하위 조회기가 한 번에 처리할 수 있는 기간 수(`max_span`)를 넘는 요청을
//! `split_span` 단위 경계에서 둘로 나누어 순차적으로 조회하고 이어 붙입니다.
//!
//! ```text
//! [start ─────────────── end)   span > max_span, n = ⌈span / split_span⌉ 조각
//!    │
//!    ├─ [start, mid)            mid = start + split_span × ⌈n / 2⌉ 기간
//!    └─ [mid, end)              양쪽 모두 다시 분할될 수 있음
//! ```
//!
//! 하위 호출 범위는 `split_span` 조각과 마지막 나머지 조각이며, 조각 수를 매번
//! 절반으로 줄이므로 재귀 깊이는 ⌈log2 n⌉ 수준입니다. 왼쪽이 항상 더 많은 조각을
//! 가지므로 깊이 한도 초과는 첫 하위 호출 전에 드러납니다.
//!
//! 병합 단계에서 시작 시각 기준으로 정렬/중복 제거하므로, 양쪽 경계를 모두
//! 포함해 돌려주는 하위 조회기를 감싸도 분할 지점 캔들은 한 번만 나타납니다.

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use futures::future::BoxFuture;
use ohlcv_core::{
    CandleError, CandleRecord, CandleRequest, CandleResult, CandleRetriever, ChunkingConfig,
    ResolvedRange, Timeframe,
};
use tracing::{debug, instrument, warn};

/// 범위 분할 조회기.
pub struct ChunkedRetriever<R> {
    inner: R,
    config: ChunkingConfig,
}

impl<R: CandleRetriever> ChunkedRetriever<R> {
    /// 새 분할 조회기 생성.
    ///
    /// # Errors
    /// `0 < split_span < max_span` 조건을 만족하지 않으면 `CandleError::Config`.
    pub fn new(inner: R, config: ChunkingConfig) -> CandleResult<Self> {
        config.validate()?;
        Ok(Self { inner, config })
    }

    /// `max_span`/`split_span`만 지정해 생성 (최대 깊이는 기본값).
    pub fn with_spans(inner: R, max_span: i64, split_span: i64) -> CandleResult<Self> {
        Self::new(
            inner,
            ChunkingConfig {
                max_span,
                split_span,
                ..Default::default()
            },
        )
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// 범위를 재귀적으로 분할해 조회합니다.
    ///
    /// 왼쪽 구간을 끝까지 조회한 뒤 오른쪽 구간을 조회하며, 어느 단계든 실패하면
    /// 부분 결과 없이 즉시 에러를 반환합니다.
    fn retrieve<'a>(
        &'a self,
        request: &'a CandleRequest,
        range: ResolvedRange,
        depth: u32,
    ) -> BoxFuture<'a, CandleResult<Vec<CandleRecord>>> {
        Box::pin(async move {
            if depth > self.config.max_depth {
                return Err(CandleError::InvalidRequest(format!(
                    "분할 깊이 한도({}) 초과: {}",
                    self.config.max_depth, request
                )));
            }

            let timeframe = request.timeframe();
            let span = range.span(timeframe);

            if span <= self.config.max_span {
                debug!(
                    start = %range.start,
                    end = %range.end,
                    span,
                    depth,
                    "하위 조회기 호출"
                );
                return self.inner.get_candles_between(request).await;
            }

            let mid = timeframe
                .advance(range.start, split_offset(span, self.config.split_span))
                .filter(|mid| *mid < range.end)
                .ok_or_else(|| {
                    CandleError::InvalidRequest(format!("분할 지점을 계산할 수 없습니다: {}", request))
                })?;

            let left = request.sub_range(range.start, mid);
            let right = request.sub_range(mid, range.end);

            let mut records = self
                .retrieve(
                    &left,
                    ResolvedRange {
                        start: range.start,
                        end: mid,
                    },
                    depth + 1,
                )
                .await?;
            records.extend(
                self.retrieve(
                    &right,
                    ResolvedRange {
                        start: mid,
                        end: range.end,
                    },
                    depth + 1,
                )
                .await?,
            );

            Ok(records)
        })
    }
}

#[async_trait]
impl<R: CandleRetriever> CandleRetriever for ChunkedRetriever<R> {
    #[instrument(skip(self), fields(symbol = request.symbol(), timeframe = %request.timeframe()))]
    async fn get_candles_between(&self, request: &CandleRequest) -> CandleResult<Vec<CandleRecord>> {
        let range = request.resolve(Utc::now())?;

        let records = self.retrieve(request, range, 0).await?;
        let records = merge_records(records, range);

        detect_and_warn_gaps(request.symbol(), request.timeframe(), &records);

        Ok(records)
    }
}

/// 분할 지점까지의 기간 수.
///
/// `span`을 `split_span` 조각으로 나눴을 때 앞쪽 절반(올림) 조각의 길이입니다.
/// `span > split_span`이면 결과는 `0`보다 크고 `span`보다 작습니다.
pub fn split_offset(span: i64, split_span: i64) -> i64 {
    let chunks = (span + split_span - 1) / split_span;
    split_span * ((chunks + 1) / 2)
}

/// 조회 결과를 `[start, end)` 범위로 제한하고 시작 시각 기준으로 정렬/중복 제거합니다.
pub fn merge_records(mut records: Vec<CandleRecord>, range: ResolvedRange) -> Vec<CandleRecord> {
    let fetched = records.len();

    records.retain(|c| c.opens_within(range.start, range.end));
    records.sort_by_key(|c| c.open_time);
    records.dedup_by_key(|c| c.open_time);

    if records.len() != fetched {
        debug!(
            fetched,
            kept = records.len(),
            "범위 밖 또는 중복 캔들 제거"
        );
    }

    records
}

/// 연속 캔들 간격이 기간의 1.5배를 넘는 구간 수를 셉니다.
pub fn count_gaps(timeframe: Timeframe, records: &[CandleRecord]) -> usize {
    let Ok(expected) = TimeDelta::from_std(timeframe.duration()) else {
        return 0;
    };
    // 예상 간격의 1.5배를 초과하면 갭으로 간주
    let threshold = expected + expected / 2;

    records
        .windows(2)
        .filter(|w| w[1].open_time - w[0].open_time > threshold)
        .count()
}

fn detect_and_warn_gaps(symbol: &str, timeframe: Timeframe, records: &[CandleRecord]) {
    let gap_count = count_gaps(timeframe, records);
    if gap_count > 0 {
        warn!(
            symbol = symbol,
            timeframe = %timeframe,
            gap_count = gap_count,
            "데이터 갭 감지 (거래 중단 구간일 수 있음)"
        );
    }
}
