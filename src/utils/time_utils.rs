use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, Utc};

pub struct TimeUtils;

impl TimeUtils {
    pub const MS_IN_S: i64 = 1000;
    pub const MS_IN_MIN: i64 = Self::MS_IN_S * 60;
    pub const MS_IN_H: i64 = Self::MS_IN_MIN * 60;
    pub const MS_IN_D: i64 = Self::MS_IN_H * 24;
    pub const STANDARD_TIME_FORMAT: &str = "%Y-%m-%d";
}

// Time Helper functions

pub fn epoch_ms_to_utc(epoch_ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(epoch_ms)
}

/// Calendar date (UTC) of an epoch-millisecond timestamp.
pub fn epoch_ms_to_date(epoch_ms: i64) -> Option<NaiveDate> {
    epoch_ms_to_utc(epoch_ms).map(|dt| dt.date_naive())
}

pub fn date_to_epoch_ms(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or_default()
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_timestamp_ms(text: &str) -> Result<i64> {
    if let Ok(date) = NaiveDate::parse_from_str(text, TimeUtils::STANDARD_TIME_FORMAT) {
        return Ok(date_to_epoch_ms(date));
    }
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc).timestamp_millis())
        .map_err(|e| anyhow!("Unrecognised date '{}': {}", text, e))
}

pub fn now_utc() -> DateTime<Utc> {
    Utc::now()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_dates_and_rfc3339() {
        let plain = parse_timestamp_ms("2024-01-05").unwrap();
        let full = parse_timestamp_ms("2024-01-05T13:30:00Z").unwrap();
        assert_eq!(epoch_ms_to_date(plain), epoch_ms_to_date(full));
        assert_eq!(full - plain, 13 * TimeUtils::MS_IN_H + 30 * TimeUtils::MS_IN_MIN);
        assert!(parse_timestamp_ms("05/01/2024").is_err());
    }
}
