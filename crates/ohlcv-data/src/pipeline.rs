//! 조회 레이어 조합.
//!
//! 설정의 `pipeline.order`에 따라 제공자 위에 분할/캐시 레이어를 쌓습니다.
//!
//! - `cache_outer`: 캐시 → 분할 → 제공자. 요청 전체가 하나의 캐시 항목입니다.
//! - `chunk_outer`: 분할 → 캐시 → 제공자. 하위 범위마다 캐시 항목이 생깁니다.

use crate::cache::{CacheMetrics, CacheStats, CachedRetriever};
use crate::chunking::ChunkedRetriever;
use crate::storage::{CacheStore, FileStore, MemoryStore, RedisStore};
use async_trait::async_trait;
use ohlcv_core::{
    AppConfig, CacheBackend, CacheConfig, CandleRecord, CandleRequest, CandleResult,
    CandleRetriever, LayerOrder,
};
use std::sync::Arc;
use tracing::info;

/// 설정에 맞는 캐시 저장소를 엽니다.
pub async fn open_store(config: &CacheConfig) -> CandleResult<Arc<dyn CacheStore>> {
    let store: Arc<dyn CacheStore> = match config.backend {
        CacheBackend::File => Arc::new(FileStore::new(config.dir.clone())),
        CacheBackend::Memory => Arc::new(MemoryStore::new()),
        CacheBackend::Redis => {
            Arc::new(RedisStore::connect(&config.redis_url, config.key_prefix.clone()).await?)
        }
    };

    info!(backend = ?config.backend, "캐시 저장소 준비 완료");
    Ok(store)
}

/// 조합된 조회 파이프라인.
pub struct RetrieverPipeline {
    retriever: Box<dyn CandleRetriever>,
    metrics: Arc<CacheMetrics>,
    order: LayerOrder,
}

impl RetrieverPipeline {
    /// 제공자와 저장소로 파이프라인을 구성합니다.
    ///
    /// # Errors
    /// 분할 설정이 잘못되면 `CandleError::Config`.
    pub fn build<P>(provider: P, store: Arc<dyn CacheStore>, config: &AppConfig) -> CandleResult<Self>
    where
        P: CandleRetriever + 'static,
    {
        let order = config.pipeline.order;
        let cache = &config.cache;

        let (retriever, metrics) = match order {
            LayerOrder::CacheOuter => {
                let chunked = ChunkedRetriever::new(provider, config.chunking)?;
                let cached = CachedRetriever::new(chunked, store)
                    .with_write_policy(cache.write_policy)
                    .with_fetch_guard(cache.fetch_guard);
                let metrics = cached.metrics();
                (Box::new(cached) as Box<dyn CandleRetriever>, metrics)
            }
            LayerOrder::ChunkOuter => {
                let cached = CachedRetriever::new(provider, store)
                    .with_write_policy(cache.write_policy)
                    .with_fetch_guard(cache.fetch_guard);
                let metrics = cached.metrics();
                let chunked = ChunkedRetriever::new(cached, config.chunking)?;
                (Box::new(chunked) as Box<dyn CandleRetriever>, metrics)
            }
        };

        info!(
            order = ?order,
            max_span = config.chunking.max_span,
            split_span = config.chunking.split_span,
            write_policy = ?cache.write_policy,
            "조회 파이프라인 구성"
        );

        Ok(Self {
            retriever,
            metrics,
            order,
        })
    }

    /// 설정의 저장소를 열어 파이프라인을 구성합니다.
    pub async fn from_config<P>(provider: P, config: &AppConfig) -> CandleResult<Self>
    where
        P: CandleRetriever + 'static,
    {
        let store = open_store(&config.cache).await?;
        Self::build(provider, store, config)
    }

    pub fn order(&self) -> LayerOrder {
        self.order
    }

    /// 캐시 통계.
    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl CandleRetriever for RetrieverPipeline {
    async fn get_candles_between(&self, request: &CandleRequest) -> CandleResult<Vec<CandleRecord>> {
        self.retriever.get_candles_between(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use ohlcv_core::{CandleError, ChunkingConfig, Timeframe};
    use ohlcv_exchange::SimulatedProvider;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn config(order: LayerOrder) -> AppConfig {
        let mut config = AppConfig::default();
        config.pipeline.order = order;
        config.cache.backend = CacheBackend::Memory;
        config.chunking = ChunkingConfig {
            max_span: 10,
            split_span: 9,
            max_depth: 64,
        };
        config
    }

    #[tokio::test]
    async fn test_cache_outer_stores_single_entry() {
        let provider = Arc::new(SimulatedProvider::new());
        let store = Arc::new(MemoryStore::new());
        let pipeline =
            RetrieverPipeline::build(provider.clone(), store.clone(), &config(LayerOrder::CacheOuter))
                .unwrap();
        let request = CandleRequest::between("BTCUSDT", Timeframe::D1, utc(2020, 1, 1), utc(2020, 1, 26));

        let first = pipeline.get_candles_between(&request).await.unwrap();
        let second = pipeline.get_candles_between(&request).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 25);
        assert_eq!(provider.call_count(), 3);
        assert_eq!(store.len().await, 1);
        assert_eq!(pipeline.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_chunk_outer_stores_entry_per_sub_range() {
        let provider = Arc::new(SimulatedProvider::new());
        let store = Arc::new(MemoryStore::new());
        let pipeline =
            RetrieverPipeline::build(provider.clone(), store.clone(), &config(LayerOrder::ChunkOuter))
                .unwrap();
        let request = CandleRequest::between("BTCUSDT", Timeframe::D1, utc(2020, 1, 1), utc(2020, 1, 26));

        pipeline.get_candles_between(&request).await.unwrap();
        pipeline.get_candles_between(&request).await.unwrap();

        assert_eq!(provider.call_count(), 3);
        assert_eq!(store.len().await, 3);
        assert_eq!(pipeline.stats().hits, 3);
        assert_eq!(pipeline.stats().misses, 3);
    }

    #[tokio::test]
    async fn test_build_rejects_bad_chunking() {
        let mut config = config(LayerOrder::CacheOuter);
        config.chunking.split_span = 10;

        let result = RetrieverPipeline::build(
            SimulatedProvider::new(),
            Arc::new(MemoryStore::new()),
            &config,
        );
        assert!(matches!(result, Err(CandleError::Config(_))));
    }

    #[tokio::test]
    async fn test_from_config_memory_backend() {
        let pipeline = RetrieverPipeline::from_config(SimulatedProvider::new(), &config(LayerOrder::CacheOuter))
            .await
            .unwrap();
        assert_eq!(pipeline.order(), LayerOrder::CacheOuter);
    }
}
