//! 캔들스틱 데이터를 위한 타임프레임 정의.
//!
//! 타임프레임은 캔들 간격을 정의하며, 날짜 범위를 기간(period) 단위로
//! 환산하는 산술 연산을 제공합니다. 범위 분할과 캐시 키 생성이 모두
//! 이 연산에 의존합니다.

use chrono::{DateTime, Datelike, Months, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// 캔들스틱 타임프레임.
///
/// 직렬화 형식은 바이낸스 간격 문자열(`"1d"`, `"1w"`, `"1M"` 등)입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Timeframe {
    /// 1분봉
    M1,
    /// 3분봉
    M3,
    /// 5분봉
    M5,
    /// 15분봉
    M15,
    /// 30분봉
    M30,
    /// 1시간봉
    H1,
    /// 2시간봉
    H2,
    /// 4시간봉
    H4,
    /// 6시간봉
    H6,
    /// 8시간봉
    H8,
    /// 12시간봉
    H12,
    /// 일봉
    D1,
    /// 3일봉
    D3,
    /// 주봉
    W1,
    /// 월봉 (달력 기준)
    MN1,
}

impl Timeframe {
    /// 이 타임프레임의 명목 기간을 반환합니다.
    ///
    /// 월봉은 30일 근사값입니다. 정확한 기간 계산은 [`Timeframe::advance`]와
    /// [`Timeframe::periods_between`]을 사용해야 합니다.
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.fixed_secs().unwrap_or(30 * 24 * 60 * 60))
    }

    /// 이 타임프레임의 초 단위 값을 반환합니다.
    pub fn as_secs(&self) -> u64 {
        self.duration().as_secs()
    }

    /// 고정 길이 타임프레임의 초 단위 값. 월봉은 `None`.
    fn fixed_secs(&self) -> Option<u64> {
        let secs = match self {
            Timeframe::M1 => 60,
            Timeframe::M3 => 3 * 60,
            Timeframe::M5 => 5 * 60,
            Timeframe::M15 => 15 * 60,
            Timeframe::M30 => 30 * 60,
            Timeframe::H1 => 60 * 60,
            Timeframe::H2 => 2 * 60 * 60,
            Timeframe::H4 => 4 * 60 * 60,
            Timeframe::H6 => 6 * 60 * 60,
            Timeframe::H8 => 8 * 60 * 60,
            Timeframe::H12 => 12 * 60 * 60,
            Timeframe::D1 => 24 * 60 * 60,
            Timeframe::D3 => 3 * 24 * 60 * 60,
            Timeframe::W1 => 7 * 24 * 60 * 60,
            Timeframe::MN1 => return None,
        };
        Some(secs)
    }

    /// `instant`에서 `periods`개 기간만큼 이동한 시각을 반환합니다.
    ///
    /// 월봉은 달력 월 단위로 이동합니다. 범위를 벗어나면 `None`.
    pub fn advance(&self, instant: DateTime<Utc>, periods: i64) -> Option<DateTime<Utc>> {
        match self.fixed_secs() {
            Some(secs) => {
                let total = (secs as i64).checked_mul(periods)?;
                instant.checked_add_signed(TimeDelta::try_seconds(total)?)
            }
            None => {
                let months = Months::new(u32::try_from(periods.unsigned_abs()).ok()?);
                if periods >= 0 {
                    instant.checked_add_months(months)
                } else {
                    instant.checked_sub_months(months)
                }
            }
        }
    }

    /// `[start, end)` 범위를 덮는 데 필요한 기간 수를 반환합니다.
    ///
    /// 마지막 부분 기간도 하나로 셉니다. `end <= start`이면 0입니다.
    pub fn periods_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
        if end <= start {
            return 0;
        }

        match self.fixed_secs() {
            Some(secs) => {
                let period_ms = secs as i64 * 1000;
                let elapsed_ms = (end - start).num_milliseconds();
                (elapsed_ms + period_ms - 1) / period_ms
            }
            None => {
                // 달력 월 차이로 추정 후 보정
                let mut months = (end.year() as i64 - start.year() as i64) * 12
                    + (end.month() as i64 - start.month() as i64);
                months = months.max(0);
                while months > 0 && self.advance(start, months - 1).is_some_and(|t| t >= end) {
                    months -= 1;
                }
                while self.advance(start, months).is_some_and(|t| t < end) {
                    months += 1;
                }
                months
            }
        }
    }

    /// 바이낸스 간격 문자열로 변환합니다.
    pub fn to_binance_interval(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M3 => "3m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H2 => "2h",
            Timeframe::H4 => "4h",
            Timeframe::H6 => "6h",
            Timeframe::H8 => "8h",
            Timeframe::H12 => "12h",
            Timeframe::D1 => "1d",
            Timeframe::D3 => "3d",
            Timeframe::W1 => "1w",
            Timeframe::MN1 => "1M",
        }
    }

    /// 바이낸스 간격 문자열에서 파싱합니다.
    pub fn from_binance_interval(s: &str) -> Option<Self> {
        match s {
            "1m" => Some(Timeframe::M1),
            "3m" => Some(Timeframe::M3),
            "5m" => Some(Timeframe::M5),
            "15m" => Some(Timeframe::M15),
            "30m" => Some(Timeframe::M30),
            "1h" => Some(Timeframe::H1),
            "2h" => Some(Timeframe::H2),
            "4h" => Some(Timeframe::H4),
            "6h" => Some(Timeframe::H6),
            "8h" => Some(Timeframe::H8),
            "12h" => Some(Timeframe::H12),
            "1d" => Some(Timeframe::D1),
            "3d" => Some(Timeframe::D3),
            "1w" => Some(Timeframe::W1),
            "1M" => Some(Timeframe::MN1),
            _ => None,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_binance_interval())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_binance_interval(s).ok_or_else(|| format!("Invalid timeframe: {}", s))
    }
}

impl TryFrom<String> for Timeframe {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timeframe> for String {
    fn from(timeframe: Timeframe) -> Self {
        timeframe.to_binance_interval().to_string()
    }
}
