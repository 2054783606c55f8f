//! Low-level field scanners for GC log lines.
//!
//! These are pure functions over string slices, designed to be testable
//! with string inputs. Prefix scanners return the parsed value together
//! with the unconsumed remainder so matchers can chain them.
//!
//! Durations are parsed from their decimal text to whole microseconds,
//! rounding half-up at the microsecond digit; reporting surfaces divide
//! down to milliseconds.

use chrono::{DateTime, FixedOffset, Utc};

use crate::event::{MemoryAmount, MemoryRegion, Unit, WorkerTimes};

/// Parse a decimal string (`"19810.091"`, `"0.0225213"`) into whole
/// microseconds of the value interpreted as seconds.
pub fn decimal_secs_to_us(s: &str) -> Option<u64> {
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let whole: u64 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().ok()?
    };
    if !frac_part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    // Scale the fraction to 6 digits; a 7th digit rounds half-up.
    let mut frac_us: u64 = 0;
    for (i, c) in frac_part.chars().enumerate() {
        let d = (c as u8 - b'0') as u64;
        if i < 6 {
            frac_us = frac_us * 10 + d;
        } else {
            if i == 6 && d >= 5 {
                frac_us += 1;
            }
            break;
        }
    }
    frac_us *= 10u64.pow(6u32.saturating_sub(frac_part.len().min(6) as u32));

    Some(whole.checked_mul(1_000_000)?.checked_add(frac_us)?)
}

/// Leading decimal number of seconds, returning `(microseconds, rest)`.
pub fn take_decimal_secs(s: &str) -> Option<(u64, &str)> {
    let end = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    Some((decimal_secs_to_us(&s[..end])?, &s[end..]))
}

/// Leading unsigned integer, returning `(value, rest)`.
pub fn take_u64(s: &str) -> Option<(u64, &str)> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    Some((s[..end].parse().ok()?, &s[end..]))
}

/// An uptime prefix: `"19810.091: rest"`. Returns milliseconds and the rest.
pub fn take_uptime_prefix(line: &str) -> Option<(u64, &str)> {
    let (us, rest) = take_decimal_secs(line)?;
    let rest = rest.strip_prefix(": ")?;
    Some((us / 1000, rest))
}

/// An ISO-8601 datestamp prefix: `"2015-05-26T14:45:37.987-0200: rest"`.
pub fn take_datestamp_prefix(line: &str) -> Option<(DateTime<FixedOffset>, &str)> {
    // Datestamps are fixed-width up to the offset; find the ": " that
    // terminates the decoration rather than guessing the precision.
    let colon = line.find(": ")?;
    let candidate = &line[..colon];
    if candidate.len() < 19 || !candidate.as_bytes().get(10).is_some_and(|b| *b == b'T') {
        return None;
    }
    let dt = DateTime::parse_from_str(candidate, "%Y-%m-%dT%H:%M:%S%.3f%z")
        .or_else(|_| DateTime::parse_from_str(candidate, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()?;
    Some((dt, &line[colon + 2..]))
}

/// Convert a datestamp to event milliseconds: against the supplied JVM
/// start instant when one is known, otherwise since the Unix epoch.
/// Clamped at zero; event timestamps are never negative.
pub fn datestamp_to_ms(dt: DateTime<FixedOffset>, jvm_start: Option<DateTime<Utc>>) -> u64 {
    let millis = match jvm_start {
        Some(start) => dt.with_timezone(&Utc).timestamp_millis() - start.timestamp_millis(),
        None => dt.timestamp_millis(),
    };
    millis.max(0) as u64
}

/// The leading timestamp of a legacy line, in event milliseconds.
///
/// Logs may carry a datestamp, an uptime, or both (`<date>: <uptime>: [GC`);
/// the uptime wins when both are present since it is already relative to
/// JVM start.
pub fn take_timestamp_prefix(
    line: &str,
    jvm_start: Option<DateTime<Utc>>,
) -> Option<(u64, &str)> {
    if let Some((dt, rest)) = take_datestamp_prefix(line) {
        if let Some((ms, rest)) = take_uptime_prefix(rest) {
            return Some((ms, rest));
        }
        return Some((datestamp_to_ms(dt, jvm_start), rest));
    }
    take_uptime_prefix(line)
}

/// A memory figure with a unit letter: `"27808K"`, `"24M"`, `"12.0M"`.
/// Fractional values are re-expressed one unit finer so the amount stays
/// integral.
pub fn take_size(s: &str) -> Option<(MemoryAmount, &str)> {
    let end = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    let number = &s[..end];
    let unit = Unit::from_suffix(s[end..].chars().next()?)?;
    let rest = &s[end + 1..];

    let amount = match number.split_once('.') {
        None => MemoryAmount::new(number.parse().ok()?, unit),
        Some((int_part, frac_part)) => {
            if unit == Unit::Bytes {
                return None;
            }
            let whole: u64 = int_part.parse().ok()?;
            let frac: f64 = format!("0.{frac_part}").parse().ok()?;
            let finer = match unit {
                Unit::Gigabytes => Unit::Megabytes,
                Unit::Megabytes => Unit::Kilobytes,
                _ => Unit::Bytes,
            };
            let scaled = whole * 1024 + (frac * 1024.0).round() as u64;
            MemoryAmount::new(scaled, finer)
        }
    };
    Some((amount, rest))
}

/// An occupancy transition with capacity: `"27808K->632K(28032K)"`.
pub fn take_mem_triple(s: &str) -> Option<(MemoryRegion, &str)> {
    let (before, rest) = take_size(s)?;
    let rest = rest.strip_prefix("->")?;
    let (after, rest) = take_size(rest)?;
    let rest = rest.strip_prefix('(')?;
    let (capacity, rest) = take_size(rest)?;
    let rest = rest.strip_prefix(')')?;
    Some((MemoryRegion::new(before, after, capacity), rest))
}

/// An occupancy transition without capacity: `"27808K->632K"`. Used by
/// lines that report the capacity elsewhere or not at all.
pub fn take_mem_pair(s: &str) -> Option<(MemoryAmount, MemoryAmount, &str)> {
    let (before, rest) = take_size(s)?;
    let rest = rest.strip_prefix("->")?;
    let (after, rest) = take_size(rest)?;
    Some((before, after, rest))
}

/// A legacy duration suffix: `"0.0225213 secs"`. Returns microseconds.
pub fn take_secs_duration(s: &str) -> Option<(u64, &str)> {
    let (us, rest) = take_decimal_secs(s)?;
    let rest = rest.strip_prefix(" secs")?;
    Some((us, rest))
}

/// A unified duration: `"3.456ms"` or `"1.2s"`. Returns microseconds.
pub fn take_unified_duration(s: &str) -> Option<(u64, &str)> {
    let (us, rest) = take_decimal_secs(s)?;
    if let Some(rest) = rest.strip_prefix("ms") {
        return Some((us / 1000, rest));
    }
    if let Some(rest) = rest.strip_prefix("s") {
        return Some((us, rest));
    }
    None
}

/// A millisecond duration with a spaced suffix: `"4327.1 ms"`. Returns
/// microseconds. Shenandoah's pre-unified lines use this form.
pub fn take_spaced_ms_duration(s: &str) -> Option<(u64, &str)> {
    let (us_as_secs, rest) = take_decimal_secs(s)?;
    let rest = rest.strip_prefix(" ms")?;
    Some((us_as_secs / 1000, rest))
}

/// The last `", <decimal> secs"` duration of a line, wherever the line's
/// nesting put it. Scans right to left past suffixes that are not
/// durations (a `[Times: ...]` block, trailing brackets). Returns
/// microseconds.
pub fn last_secs_duration(line: &str) -> Option<u64> {
    let mut end = line.len();
    while let Some(pos) = line[..end].rfind(", ") {
        if let Some((us, _)) = take_secs_duration(&line[pos + 2..]) {
            return Some(us);
        }
        end = pos;
    }
    None
}

/// An optional leading parenthesized GC cause: `"(System.gc()) rest"`.
/// Returns [`crate::event::Trigger::None`] and the input untouched when no
/// group is present. Only for line positions where a parenthesized group
/// can only be a cause.
pub fn take_optional_cause(s: &str) -> (crate::event::Trigger, &str) {
    match take_paren_group(s) {
        Some((inner, rest)) => (
            crate::event::Trigger::from_cause(inner),
            rest.strip_prefix(' ').unwrap_or(rest),
        ),
        None => (crate::event::Trigger::None, s),
    }
}

/// Concurrent-phase CPU/wall pair: `"0.129/0.143 secs"`.
pub fn take_phase_times(s: &str) -> Option<(u64, u64, &str)> {
    let (cpu_us, rest) = take_decimal_secs(s)?;
    let rest = rest.strip_prefix('/')?;
    let (wall_us, rest) = take_secs_duration(rest)?;
    Some((cpu_us, wall_us, rest))
}

/// The `[Times: user=0.30 sys=0.01, real=0.02 secs]` suffix, scanned
/// anywhere in the line. A negative `real` is preserved for flagging.
pub fn find_worker_times(line: &str) -> Option<WorkerTimes> {
    let start = line.find("[Times: user=")?;
    let rest = &line[start + "[Times: user=".len()..];
    let (user_us, rest) = take_decimal_secs(rest)?;
    let rest = rest.strip_prefix(" sys=")?;
    let (sys_us, rest) = take_decimal_secs(rest)?;
    let rest = rest.strip_prefix(", real=")?;
    let (negative, rest) = match rest.strip_prefix('-') {
        Some(r) => (true, r),
        None => (false, rest),
    };
    let (real_abs, _) = take_decimal_secs(rest)?;
    let real_us = if negative {
        -(real_abs as i64)
    } else {
        real_abs as i64
    };
    Some(WorkerTimes {
        user_us,
        sys_us,
        real_us,
    })
}

/// A parenthesized group at the head of `s`: `"(System.gc()) rest"`.
/// Handles one level of nested parentheses, which cause strings contain.
pub fn take_paren_group(s: &str) -> Option<(&str, &str)> {
    let inner = s.strip_prefix('(')?;
    let mut depth = 1usize;
    for (i, c) in inner.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&inner[..i], &inner[i + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

/// Decorations of a unified-logging line.
#[derive(Debug, PartialEq)]
pub struct UnifiedLine<'a> {
    /// Uptime in milliseconds, when the uptime decorator is present.
    pub uptime_ms: Option<u64>,
    /// Wall-clock decorator, when present instead of (or before) uptime.
    pub datestamp: Option<DateTime<FixedOffset>>,
    pub level: &'a str,
    pub tags: &'a str,
    /// Payload after the last decoration, trimmed of one leading space.
    pub rest: &'a str,
}

/// Split a unified-logging line into decorations and payload:
/// `[0.234s][info][gc,start] Payload`. Returns `None` for legacy lines.
pub fn take_unified_decorations(line: &str) -> Option<UnifiedLine<'_>> {
    let mut rest = line;
    let mut uptime_ms = None;
    let mut datestamp = None;
    let mut level = "";
    let mut tags = "";
    let mut saw_any = false;

    while let Some(inner_start) = rest.strip_prefix('[') {
        let Some(close) = inner_start.find(']') else { break };
        let field = &inner_start[..close];
        let after = &inner_start[close + 1..];

        if let Some(millis) = field.strip_suffix("ms") {
            // [1234ms] millisecond uptime decorator; the value is already ms
            if let Some(us) = decimal_secs_to_us(millis) {
                uptime_ms = Some(us / 1_000_000);
            } else {
                break;
            }
        } else if let Some(secs) = field.strip_suffix('s')
            && secs.chars().next().is_some_and(|c| c.is_ascii_digit())
        {
            uptime_ms = decimal_secs_to_us(secs).map(|us| us / 1000);
        } else if field.len() >= 19 && field.as_bytes().get(10) == Some(&b'T') {
            datestamp = DateTime::parse_from_str(field, "%Y-%m-%dT%H:%M:%S%.3f%z")
                .or_else(|_| DateTime::parse_from_str(field, "%Y-%m-%dT%H:%M:%S%z"))
                .ok();
            if datestamp.is_none() {
                break;
            }
        } else if matches!(field, "trace" | "debug" | "info" | "warning" | "error") {
            level = field;
        } else if field.starts_with("gc") || field.starts_with("safepoint") {
            tags = field;
        } else {
            break;
        }
        saw_any = true;
        rest = after;
    }

    if !saw_any || tags.is_empty() {
        return None;
    }
    Some(UnifiedLine {
        uptime_ms,
        datestamp,
        level,
        tags,
        rest: rest.strip_prefix(' ').unwrap_or(rest),
    })
}

/// A unified `GC(n) ` prefix, returning the collection id and the rest.
pub fn take_gc_id(s: &str) -> Option<(u32, &str)> {
    let rest = s.strip_prefix("GC(")?;
    let (id, rest) = take_u64(rest)?;
    let rest = rest.strip_prefix(") ")?;
    Some((id as u32, rest))
}
