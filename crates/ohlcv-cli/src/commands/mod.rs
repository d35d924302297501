//! CLI 명령어 구현 모듈.

pub mod fetch;
pub mod key;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};

/// 날짜(`YYYY-MM-DD`, UTC 자정) 또는 RFC 3339 시각을 파싱합니다.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .with_context(|| format!("Invalid date: {}", s));
    }

    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| {
            format!(
                "Invalid date format: {}. Expected YYYY-MM-DD or RFC 3339 (2020-01-01T09:00:00+09:00)",
                s
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_date_only() {
        assert_eq!(
            parse_instant("2020-01-01").unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        assert_eq!(
            parse_instant("2020-01-01T09:00:00+09:00").unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_instant("01/01/2020").is_err());
    }
}
