//! Binance 시세 커넥터.
//!
//! 인증이 필요 없는 Spot REST 엔드포인트(`/api/v3/klines`)만 사용합니다.

use crate::error::{ExchangeError, ExchangeResult};
use chrono::{DateTime, TimeDelta, Utc};
use ohlcv_core::{BinanceSettings, CandleRecord, Timeframe};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, error};

// ============================================================================
// 설정
// ============================================================================

/// Binance 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    /// REST API 기본 URL
    pub rest_base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 요청당 최대 캔들 수
    pub request_limit: u32,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self::from_settings(&BinanceSettings::default())
    }
}

impl BinanceConfig {
    /// 애플리케이션 설정에서 생성.
    pub fn from_settings(settings: &BinanceSettings) -> Self {
        Self {
            rest_base_url: settings.rest_base_url.trim_end_matches('/').to_string(),
            timeout_secs: settings.timeout_secs,
            request_limit: settings.request_limit,
        }
    }

    /// 기본 URL을 변경합니다 (테스트 서버 등).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.rest_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// 요청당 최대 캔들 수를 변경합니다.
    pub fn with_request_limit(mut self, limit: u32) -> Self {
        self.request_limit = limit;
        self
    }
}

// ============================================================================
// API 응답 타입
// ============================================================================

#[derive(Debug, Deserialize)]
#[allow(dead_code)] // 응답 배열 전체 매핑 (일부만 사용)
struct BinanceKline(
    i64,    // 0: Open time
    String, // 1: Open
    String, // 2: High
    String, // 3: Low
    String, // 4: Close
    String, // 5: Volume
    i64,    // 6: Close time
    String, // 7: Quote asset volume
    i64,    // 8: Number of trades
    String, // 9: Taker buy base asset volume
    String, // 10: Taker buy quote asset volume
    String, // 11: Ignore
);

#[derive(Debug, Deserialize)]
struct BinanceError {
    code: i32,
    msg: String,
}

// ============================================================================
// Binance 클라이언트
// ============================================================================

/// Binance 시세 클라이언트.
pub struct BinanceClient {
    config: BinanceConfig,
    client: Client,
}

impl BinanceClient {
    /// 새 Binance 클라이언트 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `ExchangeError::NetworkError`를 반환합니다.
    pub fn new(config: BinanceConfig) -> ExchangeResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                ExchangeError::NetworkError(format!("HTTP 클라이언트 생성 실패: {}", e))
            })?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &BinanceConfig {
        &self.config
    }

    /// 요청당 최대 캔들 수.
    pub fn request_limit(&self) -> u32 {
        self.config.request_limit
    }

    /// `[start, end)` 구간의 캔들을 한 번의 요청으로 조회합니다.
    ///
    /// Binance의 `endTime`은 포함 경계이므로 `end - 1ms`로 보냅니다.
    /// 응답이 `request_limit`개로 잘릴 수 있으므로 구간 크기는 호출자가 제한해야 합니다.
    pub async fn get_klines_range(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ExchangeResult<Vec<CandleRecord>> {
        let end_inclusive = end - TimeDelta::milliseconds(1);

        let resp: Vec<BinanceKline> = self
            .public_get(
                "/api/v3/klines",
                &[
                    ("symbol", symbol.to_string()),
                    ("interval", timeframe.to_binance_interval().to_string()),
                    ("startTime", start.timestamp_millis().to_string()),
                    ("endTime", end_inclusive.timestamp_millis().to_string()),
                    ("limit", self.config.request_limit.to_string()),
                ],
            )
            .await?;

        resp.into_iter().map(Self::parse_kline).collect()
    }

    /// 공개 API 요청 (인증 불필요).
    ///
    /// 파라미터 값은 reqwest가 URL 인코딩합니다.
    async fn public_get<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> ExchangeResult<T> {
        let url = format!("{}{}", self.config.rest_base_url, endpoint);

        debug!(url = %url, params = ?params, "GET");

        let response = self.client.get(&url).query(params).send().await?;

        self.handle_response(response).await
    }

    /// API 응답 처리.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> ExchangeResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::NetworkError(e.to_string()))?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| {
                error!("Failed to parse response: {} - Body: {}", e, body);
                ExchangeError::ParseError(e.to_string())
            })
        } else if status.as_u16() == 429 || status.as_u16() == 418 {
            Err(ExchangeError::RateLimited)
        } else if let Ok(error) = serde_json::from_str::<BinanceError>(&body) {
            Err(Self::map_error_code(error.code, &error.msg))
        } else {
            Err(ExchangeError::ApiError {
                code: status.as_u16() as i32,
                message: body,
            })
        }
    }

    /// Binance 에러 코드를 ExchangeError로 매핑.
    fn map_error_code(code: i32, msg: &str) -> ExchangeError {
        match code {
            -1000 => ExchangeError::Unknown(msg.to_string()),
            -1001 => ExchangeError::NetworkError(msg.to_string()),
            -1003 => ExchangeError::RateLimited,
            -1007 => ExchangeError::Timeout(msg.to_string()),
            -1121 => ExchangeError::SymbolNotFound(msg.to_string()),
            _ => ExchangeError::ApiError {
                code,
                message: msg.to_string(),
            },
        }
    }

    /// 응답 행을 캔들로 변환.
    ///
    /// 값이 잘못된 행은 0으로 대체하지 않고 에러로 처리합니다.
    fn parse_kline(k: BinanceKline) -> ExchangeResult<CandleRecord> {
        Ok(CandleRecord::new(
            Self::parse_timestamp(k.0)?,
            Self::parse_decimal(&k.1)?,
            Self::parse_decimal(&k.2)?,
            Self::parse_decimal(&k.3)?,
            Self::parse_decimal(&k.4)?,
            Self::parse_decimal(&k.5)?,
            Self::parse_timestamp(k.6)?,
        ))
    }

    /// 문자열에서 Decimal 파싱.
    fn parse_decimal(s: &str) -> ExchangeResult<Decimal> {
        s.parse()
            .map_err(|e| ExchangeError::ParseError(format!("잘못된 숫자 '{}': {}", s, e)))
    }

    fn parse_timestamp(millis: i64) -> ExchangeResult<DateTime<Utc>> {
        DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| ExchangeError::ParseError(format!("잘못된 타임스탬프: {}", millis)))
    }
}
