//! Shared formatting helpers for report rendering.
//!
//! Pure functions; the CLI's text renderer and the bottleneck lists are
//! the consumers.

use chrono::{DateTime, Duration, Utc};

/// Byte count as a human-readable size: `"1.5G"`, `"100.3M"`, `"512B"`.
pub fn format_bytes(bytes: u64) -> String {
    let f = bytes as f64;
    if bytes >= 1024 * 1024 * 1024 {
        format!("{:.1}G", f / (1024.0 * 1024.0 * 1024.0))
    } else if bytes >= 1024 * 1024 {
        format!("{:.1}M", f / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1}K", f / 1024.0)
    } else {
        format!("{}B", bytes)
    }
}

/// Millisecond duration: `"234ms"` below a second, `"3.456s"` above.
pub fn format_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else {
        format!("{:.3}s", ms as f64 / 1000.0)
    }
}

/// Event timestamp: relative seconds since JVM start, or an absolute
/// instant when the start date is known.
pub fn format_timestamp(ms: u64, jvm_start: Option<DateTime<Utc>>) -> String {
    match jvm_start {
        Some(start) => {
            let at = start + Duration::milliseconds(ms as i64);
            at.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
        }
        None => format!("{:.3}s", ms as f64 / 1000.0),
    }
}

/// Percentage with one decimal: `"93.4%"`.
pub fn format_pct(pct: f64) -> String {
    format!("{:.1}%", pct)
}
