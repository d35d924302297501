//! 캔들 조회 명령.
//!
//! 설정에 따라 제공자(Binance 또는 시뮬레이션) 위에 분할/캐시 레이어를 쌓아
//! 요청 범위의 캔들을 조회하고 JSON 또는 CSV로 출력합니다.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use ohlcv_core::{canonical_instant, AppConfig, CandleRecord, CandleRequest, CandleRetriever, Timeframe};
use ohlcv_data::RetrieverPipeline;
use ohlcv_exchange::{BinanceConfig, BinanceKlineProvider, SimulatedProvider};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

/// 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => anyhow::bail!("Invalid output format: {}. Supported: json, csv", s),
        }
    }
}

/// 조회 명령 설정.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// 심볼 (예: BTCUSDT)
    pub symbol: String,
    /// 타임프레임
    pub timeframe: Timeframe,
    /// 시작 시각
    pub start: DateTime<Utc>,
    /// 종료 시각 (None이면 현재까지)
    pub end: Option<DateTime<Utc>>,
    /// 출력 형식
    pub format: OutputFormat,
    /// 출력 파일 (None이면 stdout)
    pub output: Option<PathBuf>,
    /// 시뮬레이션 제공자 사용
    pub simulated: bool,
}

impl FetchConfig {
    /// 조회 요청 생성.
    pub fn request(&self) -> CandleRequest {
        let request = CandleRequest::new(&self.symbol, self.timeframe, self.start);
        match self.end {
            Some(end) => request.with_end(end),
            None => request,
        }
    }
}

/// 설정된 제공자로 파이프라인을 구성합니다.
pub async fn build_pipeline(simulated: bool, app: &AppConfig) -> Result<RetrieverPipeline> {
    let pipeline = if simulated {
        info!("Using simulated provider");
        let provider = SimulatedProvider::new().with_request_limit(app.binance.request_limit as usize);
        RetrieverPipeline::from_config(provider, app).await?
    } else {
        let provider = BinanceKlineProvider::from_config(BinanceConfig::from_settings(&app.binance))
            .context("Failed to create Binance client")?;
        RetrieverPipeline::from_config(provider, app).await?
    };

    Ok(pipeline)
}

/// 캔들을 조회해 출력합니다. 출력한 캔들 수를 반환합니다.
pub async fn run_fetch(config: &FetchConfig, app: &AppConfig) -> Result<usize> {
    let pipeline = build_pipeline(config.simulated, app).await?;
    let request = config.request();

    info!(request = %request, order = ?pipeline.order(), "Fetching candles");

    let records = pipeline
        .get_candles_between(&request)
        .await
        .with_context(|| format!("Failed to fetch {}", request))?;

    let stats = pipeline.stats();
    debug!(
        hits = stats.hits,
        misses = stats.misses,
        bypasses = stats.bypasses,
        "Cache stats"
    );

    match &config.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            write_records(BufWriter::new(file), &records, config.format)?;
            info!(path = %path.display(), count = records.len(), "Saved candles");
        }
        None => {
            let stdout = std::io::stdout();
            write_records(stdout.lock(), &records, config.format)?;
        }
    }

    Ok(records.len())
}

/// 지정한 형식으로 캔들을 기록합니다.
pub fn write_records<W: Write>(mut writer: W, records: &[CandleRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, records)?;
            writeln!(writer)?;
        }
        OutputFormat::Csv => {
            // CSV 헤더 작성
            writeln!(writer, "open_time,open,high,low,close,volume,close_time")?;

            for candle in records {
                writeln!(
                    writer,
                    "{},{},{},{},{},{},{}",
                    canonical_instant(&candle.open_time),
                    candle.open,
                    candle.high,
                    candle.low,
                    candle.close,
                    candle.volume,
                    canonical_instant(&candle.close_time)
                )?;
            }
        }
    }

    writer.flush()?;
    Ok(())
}

/// 기본 출력 경로 (`data/{SYMBOL}_{interval}_{from}_to_{to}.{ext}`).
pub fn default_output_path(config: &FetchConfig) -> PathBuf {
    let ext = match config.format {
        OutputFormat::Json => "json",
        OutputFormat::Csv => "csv",
    };
    let end = config
        .end
        .map(|end| end.format("%Y%m%d").to_string())
        .unwrap_or_else(|| "now".to_string());

    Path::new("data").join(format!(
        "{}_{}_{}_to_{}.{}",
        config.symbol.trim().to_uppercase(),
        config.timeframe,
        config.start.format("%Y%m%d"),
        end,
        ext
    ))
}
