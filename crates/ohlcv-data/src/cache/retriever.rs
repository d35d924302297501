//! 캐시 기반 조회기.
//!
//! # 동작 흐름
//!
//! ```text
//! 요청 (symbol, timeframe, start, end)
//!         │
//!         ▼
//! ┌───────────────────┐
//! │ 1. 요청 검증/키 생성 │ ← 종료 시각 없음: 캐시 우회
//! └─────────┬─────────┘
//!           │
//!     ┌─────┴─────┐
//!     │ 항목 존재? │
//!     └─────┬─────┘
//!       YES │ NO
//!           │   │
//!           │   ▼
//!           │ ┌─────────────────────┐
//!           │ │ 2. (선택) 키 Lock 획득 │ ← 획득 후 캐시 재확인
//!           │ └──────────┬──────────┘
//!           │   ┌────────▼────────┐
//!           │   │ 3. 하위 조회기 호출 │
//!           │   └────────┬────────┘
//!           │   ┌────────▼────────┐
//!           │   │ 4. 항목 저장     │ ← 실패 시 WritePolicy
//!           │   └────────┬────────┘
//!           ▼            ▼
//!     ┌─────────────────────┐
//!     │ 5. 캔들 반환          │
//!     └─────────────────────┘
//! ```
//!
//! 종료 시각이 없는 요청은 호출 시점마다 범위가 달라지므로 저장소를 거치지 않고
//! 하위 조회기로 바로 전달합니다.

use super::entry::CacheEntry;
use crate::storage::CacheStore;
use async_trait::async_trait;
use chrono::Utc;
use ohlcv_core::{
    CacheKey, CandleRecord, CandleRequest, CandleResult, CandleRetriever, WritePolicy,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// 캐시 키별 페칭 상태를 추적하는 Lock 맵.
type FetchLockMap = Arc<RwLock<HashMap<String, Arc<RwLock<()>>>>>;

/// 캐시 통계.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// 캐시를 거치지 않은 요청 (종료 시각 없음)
    pub bypasses: u64,
    pub store_failures: u64,
    pub hit_rate: f64,
}

/// 캐시 조회기의 누적 카운터.
///
/// 파이프라인이 조회기를 감싼 뒤에도 통계를 읽을 수 있도록 `Arc`로 공유됩니다.
#[derive(Debug, Default)]
pub struct CacheMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    bypasses: AtomicU64,
    store_failures: AtomicU64,
}

impl CacheMetrics {
    /// 현재 통계 스냅샷.
    pub fn snapshot(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        CacheStats {
            hits,
            misses,
            bypasses: self.bypasses.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            hit_rate,
        }
    }

    /// 통계를 초기화합니다.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.bypasses.store(0, Ordering::Relaxed);
        self.store_failures.store(0, Ordering::Relaxed);
    }
}

/// 캐시 기반 조회기.
///
/// 같은 키의 요청은 처음 한 번만 하위 조회기를 호출하고, 이후에는 저장된
/// 항목을 그대로 반환합니다. 항목은 만료되지 않습니다. 종료 시각이 없는 요청은
/// 캐시하지 않습니다.
pub struct CachedRetriever<R, S> {
    inner: R,
    store: S,
    write_policy: WritePolicy,
    /// 같은 키 동시 미스 제어 (비활성화 시 None, 마지막 쓰기 우선)
    fetch_locks: Option<FetchLockMap>,
    metrics: Arc<CacheMetrics>,
}

impl<R, S> CachedRetriever<R, S>
where
    R: CandleRetriever,
    S: CacheStore,
{
    /// 새 캐시 조회기 생성.
    pub fn new(inner: R, store: S) -> Self {
        Self {
            inner,
            store,
            write_policy: WritePolicy::default(),
            fetch_locks: None,
            metrics: Arc::new(CacheMetrics::default()),
        }
    }

    /// 저장 실패 정책 설정.
    pub fn with_write_policy(mut self, policy: WritePolicy) -> Self {
        self.write_policy = policy;
        self
    }

    /// 같은 키에 대한 동시 조회를 하나로 제한합니다.
    pub fn with_fetch_guard(mut self, enabled: bool) -> Self {
        self.fetch_locks = enabled.then(|| Arc::new(RwLock::new(HashMap::new())));
        self
    }

    /// 캐시 통계.
    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot()
    }

    /// 공유 카운터 핸들.
    pub fn metrics(&self) -> Arc<CacheMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// 페칭 Lock 맵에 남아 있는 키 수 (가드 비활성화 시 0).
    pub async fn pending_fetch_locks(&self) -> usize {
        match &self.fetch_locks {
            Some(locks) => locks.read().await.len(),
            None => 0,
        }
    }

    /// 저장된 항목 조회. 항목이 없으면 `None`.
    async fn lookup(&self, key: &CacheKey) -> CandleResult<Option<Vec<CandleRecord>>> {
        if !self.store.exists(key).await? {
            return Ok(None);
        }

        let bytes = self.store.read(key).await?;
        let entry = CacheEntry::decode(key, &bytes)?;

        debug!(key = %key, count = entry.records.len(), created_at = %entry.created_at, "캐시 적중");
        Ok(Some(entry.records))
    }

    /// 조회 결과를 저장합니다. 실패 처리는 `write_policy`를 따릅니다.
    async fn store_records(&self, key: &CacheKey, records: &[CandleRecord]) -> CandleResult<()> {
        let result: CandleResult<()> = match CacheEntry::encode(key, records) {
            Ok(bytes) => self.store.write(key, &bytes).await.map_err(Into::into),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                info!(key = %key, count = records.len(), "캐시 항목 저장");
                Ok(())
            }
            Err(e) => {
                self.metrics.store_failures.fetch_add(1, Ordering::Relaxed);
                match self.write_policy {
                    WritePolicy::FailOpen => {
                        warn!(key = %key, error = %e, "캐시 저장 실패 (결과는 반환)");
                        Ok(())
                    }
                    WritePolicy::FailClosed => Err(e),
                }
            }
        }
    }

    /// 키별 Lock 획득 또는 생성.
    async fn get_or_create_lock(locks: &FetchLockMap, key: &str) -> Arc<RwLock<()>> {
        let read = locks.read().await;
        if let Some(lock) = read.get(key) {
            return lock.clone();
        }
        drop(read);

        let mut write = locks.write().await;
        write
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(RwLock::new(())))
            .clone()
    }

    /// 다른 대기자가 없으면 키별 Lock을 맵에서 제거합니다.
    async fn release_lock(locks: &FetchLockMap, key: &str, lock: Arc<RwLock<()>>) {
        let mut write = locks.write().await;
        // 맵과 현재 작업만 참조하는 경우
        let idle = write
            .get(key)
            .is_some_and(|held| Arc::ptr_eq(held, &lock) && Arc::strong_count(&lock) == 2);
        if idle {
            write.remove(key);
        }
    }

    /// 하위 조회기를 호출하고 결과를 저장합니다.
    async fn fetch_and_store(
        &self,
        key: &CacheKey,
        request: &CandleRequest,
    ) -> CandleResult<Vec<CandleRecord>> {
        self.metrics.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, "캐시 미스, 하위 조회기 호출");

        let records = self.inner.get_candles_between(request).await?;
        self.store_records(key, &records).await?;

        Ok(records)
    }

    /// 키별 Lock을 잡은 상태에서 캐시를 재확인한 뒤 조회합니다.
    async fn fetch_guarded(
        &self,
        locks: &FetchLockMap,
        key: &CacheKey,
        request: &CandleRequest,
    ) -> CandleResult<Vec<CandleRecord>> {
        let lock = Self::get_or_create_lock(locks, key.as_str()).await;

        let result = {
            let _guard = lock.write().await;
            // Lock 대기 중 다른 작업이 저장했을 수 있음
            match self.lookup(key).await {
                Ok(Some(records)) => {
                    self.metrics.hits.fetch_add(1, Ordering::Relaxed);
                    Ok(records)
                }
                Ok(None) => self.fetch_and_store(key, request).await,
                Err(e) => Err(e),
            }
        };

        Self::release_lock(locks, key.as_str(), lock).await;
        result
    }
}

#[async_trait]
impl<R, S> CandleRetriever for CachedRetriever<R, S>
where
    R: CandleRetriever,
    S: CacheStore,
{
    #[instrument(skip(self), fields(symbol = request.symbol(), timeframe = %request.timeframe()))]
    async fn get_candles_between(&self, request: &CandleRequest) -> CandleResult<Vec<CandleRecord>> {
        // 잘못된 요청은 저장소 접근 전에 거부
        request.resolve(Utc::now())?;

        if request.end_date().is_none() {
            self.metrics.bypasses.fetch_add(1, Ordering::Relaxed);
            debug!(request = %request, "종료 시각 없음, 캐시 우회");
            return self.inner.get_candles_between(request).await;
        }

        let key = CacheKey::from_request(request);

        if let Some(records) = self.lookup(&key).await? {
            self.metrics.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(records);
        }

        match &self.fetch_locks {
            Some(locks) => self.fetch_guarded(locks, &key, request).await,
            None => self.fetch_and_store(&key, request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result as StorageResult, StorageError};
    use crate::storage::MemoryStore;
    use chrono::{DateTime, TimeZone};
    use ohlcv_core::{CandleError, Timeframe};
    use ohlcv_exchange::SimulatedProvider;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn request() -> CandleRequest {
        CandleRequest::between("BTCUSDT", Timeframe::D1, utc(2020, 1, 1), utc(2020, 1, 10))
    }

    /// 쓰기가 항상 실패하는 저장소.
    struct ReadOnlyStore;

    #[async_trait]
    impl CacheStore for ReadOnlyStore {
        async fn exists(&self, _key: &CacheKey) -> StorageResult<bool> {
            Ok(false)
        }

        async fn read(&self, key: &CacheKey) -> StorageResult<Vec<u8>> {
            Err(StorageError::NotFound(key.to_string()))
        }

        async fn write(&self, _key: &CacheKey, _bytes: &[u8]) -> StorageResult<()> {
            Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )))
        }
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let cached = CachedRetriever::new(SimulatedProvider::new(), MemoryStore::new());

        let first = cached.get_candles_between(&request()).await.unwrap();
        let second = cached.get_candles_between(&request()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cached.inner().call_count(), 1);
        assert_eq!(cached.store().len().await, 1);

        let stats = cached.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_fail_open_returns_records() {
        let cached = CachedRetriever::new(SimulatedProvider::new(), ReadOnlyStore);

        let records = cached.get_candles_between(&request()).await.unwrap();

        assert_eq!(records.len(), 9);
        assert_eq!(cached.stats().store_failures, 1);
    }

    #[tokio::test]
    async fn test_fail_closed_propagates_storage_error() {
        let cached = CachedRetriever::new(SimulatedProvider::new(), ReadOnlyStore)
            .with_write_policy(WritePolicy::FailClosed);

        let err = cached.get_candles_between(&request()).await.unwrap_err();

        assert!(matches!(err, CandleError::Storage(_)));
        assert_eq!(cached.inner().call_count(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_not_refetched() {
        let cached = CachedRetriever::new(SimulatedProvider::new(), MemoryStore::new());
        let key = CacheKey::from_request(&request());
        cached.store().overwrite_raw(&key, b"garbage".to_vec()).await;

        let err = cached.get_candles_between(&request()).await.unwrap_err();

        assert!(matches!(err, CandleError::CacheCorruption { .. }));
        assert_eq!(cached.inner().call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_request_skips_store() {
        let cached = CachedRetriever::new(SimulatedProvider::new(), ReadOnlyStore)
            .with_write_policy(WritePolicy::FailClosed);
        let reversed =
            CandleRequest::between("BTCUSDT", Timeframe::D1, utc(2020, 1, 10), utc(2020, 1, 1));

        let err = cached.get_candles_between(&reversed).await.unwrap_err();

        assert!(err.is_invalid_request());
        assert_eq!(cached.inner().call_count(), 0);
        assert_eq!(cached.stats(), CacheStats::default());
    }

    #[tokio::test]
    async fn test_open_ended_request_bypasses_cache() {
        let cached = CachedRetriever::new(SimulatedProvider::new(), MemoryStore::new());
        let start = Utc::now() - chrono::TimeDelta::days(3);
        let open = CandleRequest::new("BTCUSDT", Timeframe::H1, start);

        let first = cached.get_candles_between(&open).await.unwrap();
        let second = cached.get_candles_between(&open).await.unwrap();

        // 매 호출이 그 시점의 [start, now)를 새로 조회
        assert!(!first.is_empty());
        assert!(second.len() >= first.len());
        assert_eq!(cached.inner().call_count(), 2);
        assert!(cached.store().is_empty().await);

        let stats = cached.stats();
        assert_eq!(stats.bypasses, 2);
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[tokio::test]
    async fn test_fetch_guard_releases_lock_entries() {
        let cached = CachedRetriever::new(SimulatedProvider::new(), MemoryStore::new())
            .with_fetch_guard(true);
        let other =
            CandleRequest::between("ETHUSDT", Timeframe::D1, utc(2021, 1, 1), utc(2021, 1, 5));

        cached.get_candles_between(&request()).await.unwrap();
        cached.get_candles_between(&other).await.unwrap();

        assert_eq!(cached.pending_fetch_locks().await, 0);
        assert_eq!(cached.store().len().await, 2);
    }

    #[tokio::test]
    async fn test_fetch_guard_releases_lock_on_error() {
        let cached = CachedRetriever::new(SimulatedProvider::new().failing_on_call(1), MemoryStore::new())
            .with_fetch_guard(true);

        assert!(cached.get_candles_between(&request()).await.is_err());
        assert_eq!(cached.pending_fetch_locks().await, 0);
    }

    #[tokio::test]
    async fn test_metrics_handle_is_shared() {
        let cached = CachedRetriever::new(SimulatedProvider::new(), MemoryStore::new());
        let metrics = cached.metrics();

        cached.get_candles_between(&request()).await.unwrap();
        assert_eq!(metrics.snapshot().misses, 1);

        metrics.reset();
        assert_eq!(cached.stats().misses, 0);
    }
}
