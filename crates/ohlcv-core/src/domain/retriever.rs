//! 캔들 조회 능력 계약.
//!
//! 거래소 어댑터, 범위 분할 레이어, 캐시 레이어가 모두 이 trait를 구현하며,
//! 데코레이터 방식으로 임의 순서로 조합할 수 있습니다.

use std::sync::Arc;

use async_trait::async_trait;

use super::{CandleRecord, CandleRequest};
use crate::error::CandleResult;

/// 캔들 조회 trait.
///
/// # 계약
///
/// - 결과는 `open_time` 오름차순이며 중복 타임스탬프가 없습니다.
/// - 결과는 `[start_date, end_date)` (종료 시각이 없으면 `[start_date, now)`)
///   범위만 포함합니다.
/// - 실패는 `CandleError`로 반환하며, 상위 레이어는 이를 변환하지 않고
///   그대로 전달합니다. 부분 결과는 반환하지 않습니다.
///
/// # 구현 예시
///
/// ```ignore
/// pub struct MyProvider;
///
/// #[async_trait]
/// impl CandleRetriever for MyProvider {
///     async fn get_candles_between(
///         &self,
///         request: &CandleRequest,
///     ) -> CandleResult<Vec<CandleRecord>> {
///         // 업스트림 호출 1회
///     }
/// }
/// ```
#[async_trait]
pub trait CandleRetriever: Send + Sync {
    /// 요청 범위의 캔들을 조회합니다.
    async fn get_candles_between(&self, request: &CandleRequest)
        -> CandleResult<Vec<CandleRecord>>;
}

#[async_trait]
impl<T: CandleRetriever + ?Sized> CandleRetriever for Arc<T> {
    async fn get_candles_between(
        &self,
        request: &CandleRequest,
    ) -> CandleResult<Vec<CandleRecord>> {
        (**self).get_candles_between(request).await
    }
}

#[async_trait]
impl<T: CandleRetriever + ?Sized> CandleRetriever for Box<T> {
    async fn get_candles_between(
        &self,
        request: &CandleRequest,
    ) -> CandleResult<Vec<CandleRecord>> {
        (**self).get_candles_between(request).await
    }
}
