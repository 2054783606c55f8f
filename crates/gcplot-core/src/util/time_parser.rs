//! Flexible parser for the JVM start instant given on the command line.
//!
//! Supports multiple formats:
//! - ISO 8601: `2015-05-26T14:45:37` (optional fractional seconds/offset)
//! - Unix timestamp: `1432651537`
//! - Date+time (UTC): `2015-05-26:14:45` or `2015-05-26:14:45:37`

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Error type for time parsing failures.
#[derive(Debug, Clone)]
pub struct TimeParseError {
    pub input: String,
    pub message: String,
}

impl std::fmt::Display for TimeParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse time '{}': {}", self.input, self.message)
    }
}

impl std::error::Error for TimeParseError {}

/// Parse a JVM start instant.
///
/// | Format | Example |
/// |--------|---------|
/// | ISO 8601 | `2015-05-26T14:45:37` |
/// | ISO 8601 with offset | `2015-05-26T14:45:37.987-02:00` |
/// | Unix timestamp | `1432651537` |
/// | Date+time (UTC) | `2015-05-26:14:45:37` |
pub fn parse_jvm_start(input: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let input = input.trim();

    if let Some(dt) = try_parse_unix_timestamp(input) {
        return Ok(dt);
    }
    if let Some(dt) = try_parse_iso8601(input) {
        return Ok(dt);
    }
    if let Some(dt) = try_parse_date_colon_time(input) {
        return Ok(dt);
    }

    Err(TimeParseError {
        input: input.to_string(),
        message: "Unrecognized format. Use: ISO 8601 (2015-05-26T14:45:37), \
                  Unix timestamp (1432651537), or date:time (2015-05-26:14:45:37)"
            .to_string(),
    })
}

fn try_parse_unix_timestamp(input: &str) -> Option<DateTime<Utc>> {
    if input.is_empty() || !input.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let secs: i64 = input.parse().ok()?;
    Utc.timestamp_opt(secs, 0).single()
}

fn try_parse_iso8601(input: &str) -> Option<DateTime<Utc>> {
    if !input.contains('T') {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    // GC logs use a compact offset without the colon.
    if let Ok(dt) = DateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.3f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.3f") {
        return Some(Utc.from_utc_datetime(&ndt));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M") {
        return Some(Utc.from_utc_datetime(&ndt));
    }
    None
}

fn try_parse_date_colon_time(input: &str) -> Option<DateTime<Utc>> {
    // YYYY-MM-DD:HH:MM or YYYY-MM-DD:HH:MM:SS
    if input.len() < 11 || !input[10..].starts_with(':') {
        return None;
    }
    let date = NaiveDate::parse_from_str(&input[..10], "%Y-%m-%d").ok()?;
    let time_part = &input[11..];
    let time = if time_part.len() == 5 {
        NaiveTime::parse_from_str(time_part, "%H:%M").ok()?
    } else if time_part.len() == 8 {
        NaiveTime::parse_from_str(time_part, "%H:%M:%S").ok()?
    } else {
        return None;
    };
    Some(Utc.from_utc_datetime(&NaiveDateTime::new(date, time)))
}
