//! 과거 캔들 조회 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # BTCUSDT 일봉 조회 (JSON, stdout)
//! ohlcv fetch -s BTCUSDT -i 1d -f 2020-01-01 -t 2020-01-10
//!
//! # 긴 범위를 CSV 파일로 저장 (자동 분할 + 캐시)
//! ohlcv fetch -s ETHUSDT -i 1h -f 2021-01-01 -t 2021-06-01 --format csv -o data/eth_1h.csv
//!
//! # 네트워크 없이 시뮬레이션 데이터로 확인
//! ohlcv fetch -s BTCUSDT -i 1d -f 2020-01-01 --simulated
//!
//! # 캐시 키와 저장 파일 이름 확인
//! ohlcv key -s BTCUSDT -i 1d -f 2020-01-01 -t 2020-01-10
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ohlcv_cli::commands::fetch::{default_output_path, run_fetch, FetchConfig, OutputFormat};
use ohlcv_cli::commands::key::KeyInfo;
use ohlcv_cli::commands::parse_instant;
use ohlcv_core::{init_logging, AppConfig, CandleRequest, LogConfig, LogFormat, Timeframe};
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "ohlcv")]
#[command(about = "Historical candle retrieval CLI - 자동 범위 분할 및 영구 캐시", long_about = None)]
#[command(version)]
struct Cli {
    /// 설정 파일 (없으면 기본값 + 환경 변수)
    #[arg(short, long, global = true, default_value = "config/ohlcv.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 캔들 조회 (캐시 우선, 긴 범위 자동 분할)
    Fetch {
        /// 심볼 (예: BTCUSDT)
        #[arg(short, long)]
        symbol: String,

        /// 타임프레임 간격 (1m, 5m, 1h, 4h, 1d, 1w, 1M 등)
        #[arg(short, long, default_value = "1d")]
        interval: String,

        /// 시작 날짜 (YYYY-MM-DD 또는 RFC 3339)
        #[arg(short = 'f', long)]
        from: String,

        /// 종료 날짜 (생략 시 현재까지)
        #[arg(short, long)]
        to: Option<String>,

        /// 출력 형식 (json, csv)
        #[arg(long, default_value = "json")]
        format: String,

        /// 출력 파일 경로 (지정하지 않으면 stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// 기본 경로(data/)에 파일로 저장
        #[arg(long, default_value = "false")]
        save: bool,

        /// 시뮬레이션 제공자 사용 (네트워크 없음)
        #[arg(long, default_value = "false")]
        simulated: bool,
    },

    /// 요청의 캐시 키와 저장소 다이제스트 출력
    Key {
        /// 심볼 (예: BTCUSDT)
        #[arg(short, long)]
        symbol: String,

        /// 타임프레임 간격
        #[arg(short, long, default_value = "1d")]
        interval: String,

        /// 시작 날짜 (YYYY-MM-DD 또는 RFC 3339)
        #[arg(short = 'f', long)]
        from: String,

        /// 종료 날짜 (생략 시 open, 캐시되지 않음)
        #[arg(short, long)]
        to: Option<String>,
    },
}

fn load_config(path: &str) -> Result<AppConfig> {
    let config = if Path::new(path).exists() {
        AppConfig::load(path).with_context(|| format!("Failed to load config: {}", path))?
    } else {
        AppConfig::from_env()?
    };
    Ok(config)
}

fn parse_timeframe(interval: &str) -> Result<Timeframe> {
    interval.parse::<Timeframe>().map_err(|e| {
        anyhow::anyhow!(
            "Invalid interval: {} ({}). Supported: 1m, 3m, 5m, 15m, 30m, 1h, 2h, 4h, 6h, 8h, 12h, 1d, 3d, 1w, 1M",
            interval,
            e
        )
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let app = load_config(&cli.config)?;

    // 로깅 초기화 (LOG_FORMAT 환경 변수 우선)
    let mut log_config = LogConfig::from(&app.logging);
    if let Some(format) = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|f| f.parse::<LogFormat>().ok())
    {
        log_config = log_config.with_format(format);
    }
    init_logging(log_config).map_err(|e| anyhow::anyhow!("Failed to init logging: {}", e))?;

    match cli.command {
        Commands::Fetch {
            symbol,
            interval,
            from,
            to,
            format,
            output,
            save,
            simulated,
        } => {
            let timeframe = parse_timeframe(&interval)?;
            let start = parse_instant(&from)?;
            let end = to.as_deref().map(parse_instant).transpose()?;

            if end.is_some_and(|end| end <= start) {
                anyhow::bail!("Start date must be before end date");
            }

            let mut config = FetchConfig {
                symbol,
                timeframe,
                start,
                end,
                format: format.parse::<OutputFormat>()?,
                output: output.map(PathBuf::from),
                simulated,
            };
            if save && config.output.is_none() {
                config.output = Some(default_output_path(&config));
            }

            match run_fetch(&config, &app).await {
                Ok(count) => {
                    info!("Successfully fetched {} candles", count);
                    if let Some(path) = &config.output {
                        eprintln!("\n캔들 조회 완료: {} 캔들", count);
                        eprintln!("저장 위치: {}", path.display());
                    }
                }
                Err(e) => {
                    error!("Fetch failed: {:#}", e);
                    return Err(e);
                }
            }
        }

        Commands::Key {
            symbol,
            interval,
            from,
            to,
        } => {
            let timeframe = parse_timeframe(&interval)?;
            let mut request = CandleRequest::new(symbol, timeframe, parse_instant(&from)?);
            if let Some(to) = to {
                request = request.with_end(parse_instant(&to)?);
            }

            let info = KeyInfo::from_request(&request);
            println!("key:    {}", info.key);
            println!("digest: {}", info.digest);
            if info.cacheable {
                println!("file:   {}", app.cache.dir.join(info.file_name()).display());
            } else {
                println!("file:   (not cached, open-ended range)");
            }
        }
    }

    Ok(())
}
