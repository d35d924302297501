//! 결정적 캔들 격자 생성.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use ohlcv_core::{CandleRecord, Price, Timeframe};
use rust_decimal::Decimal;

/// 1970-01-05(월요일)까지의 밀리초. 주봉 격자 기준점.
const WEEK_ORIGIN_MS: i64 = 4 * 24 * 60 * 60 * 1000;

/// `instant` 이후(포함) 첫 캔들 시작 시각을 반환합니다.
///
/// 고정 길이 타임프레임은 유닉스 에포크 기준, 주봉은 월요일 기준,
/// 월봉은 매월 1일 00:00 UTC 기준으로 정렬합니다.
pub fn align_to_period(timeframe: Timeframe, instant: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if timeframe == Timeframe::MN1 {
        let month_start = Utc
            .with_ymd_and_hms(instant.year(), instant.month(), 1, 0, 0, 0)
            .single()?;
        return if month_start == instant {
            Some(month_start)
        } else {
            timeframe.advance(month_start, 1)
        };
    }

    let period_ms = timeframe.as_secs() as i64 * 1000;
    let origin = if timeframe == Timeframe::W1 {
        WEEK_ORIGIN_MS
    } else {
        0
    };
    let offset = (instant.timestamp_millis() - origin).rem_euclid(period_ms);
    let aligned = if offset == 0 {
        instant.timestamp_millis()
    } else {
        instant.timestamp_millis() - offset + period_ms
    };
    DateTime::from_timestamp_millis(aligned)
}

/// `[start, end)` 구간의 캔들을 생성합니다. `include_end`면 `end` 시각의 캔들도 포함합니다.
///
/// 가격은 캔들 시작 시각에서만 파생되므로 어떤 구간으로 나누어 생성해도
/// 같은 시각의 캔들은 같은 값을 가집니다.
pub fn generate_candles(
    timeframe: Timeframe,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    base_price: Price,
    include_end: bool,
) -> Vec<CandleRecord> {
    let mut candles = Vec::new();
    let Some(mut open_time) = align_to_period(timeframe, start) else {
        return candles;
    };

    while open_time < end || (include_end && open_time == end) {
        let Some(next_open) = timeframe.advance(open_time, 1) else {
            break;
        };
        candles.push(synthesize(open_time, next_open, base_price));
        open_time = next_open;
    }

    candles
}

fn synthesize(open_time: DateTime<Utc>, next_open: DateTime<Utc>, base_price: Price) -> CandleRecord {
    // 시작 시각(시간 단위)에서 파생한 결정적 파형
    let seed = open_time.timestamp().div_euclid(3600);
    let wave = Decimal::new(seed.wrapping_mul(7919).rem_euclid(2001) - 1000, 2);
    let drift = Decimal::new(seed.wrapping_mul(31).rem_euclid(201) - 100, 2);

    let open = base_price + wave;
    let close = open + drift;
    let high = open.max(close) + Decimal::ONE;
    let low = open.min(close) - Decimal::ONE;
    let volume = Decimal::from(100 + seed.rem_euclid(50));

    CandleRecord::new(
        open_time,
        open,
        high,
        low,
        close,
        volume,
        next_open - chrono::TimeDelta::milliseconds(1),
    )
}
