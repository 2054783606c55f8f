//! Safepoint and stopped-time line shapes.
//!
//! Legacy JVMs print stopped/application time as prose sentences with a
//! `seconds` suffix; unified JVMs emit a structured `[safepoint]` line
//! with nanosecond fields.

use crate::event::{Event, EventKind, SafepointEvent, StoppedTimeEvent};

use super::scan::{
    datestamp_to_ms, take_decimal_secs, take_timestamp_prefix, take_u64,
    take_unified_decorations,
};
use super::{ClassifyContext, Matcher};

pub(super) const MATCHERS: &[Matcher] = &[unified_safepoint, stopped_time, application_time];

/// `2.405: Total time for which application threads were stopped:
/// 0.0019444 seconds, Stopping threads took: 0.0000144 seconds`
fn stopped_time(line: &str, ctx: &ClassifyContext) -> Option<Event> {
    let (ts, rest) = match take_timestamp_prefix(line, ctx.jvm_start) {
        Some((ts, rest)) => (ts, rest),
        None => (0, line),
    };
    let rest = rest.strip_prefix("Total time for which application threads were stopped: ")?;
    let (duration_us, rest) = take_decimal_secs(rest)?;
    let rest = rest.strip_prefix(" seconds")?;

    let stopping_us = rest
        .strip_prefix(", Stopping threads took: ")
        .and_then(|r| take_decimal_secs(r))
        .map(|(us, _)| us);

    Some(Event::StoppedTime(StoppedTimeEvent {
        kind: EventKind::ApplicationStoppedTime,
        timestamp_ms: ts,
        duration_us,
        stopping_us,
    }))
}

/// `2.400: Application time: 0.3440086 seconds`
fn application_time(line: &str, ctx: &ClassifyContext) -> Option<Event> {
    let (ts, rest) = match take_timestamp_prefix(line, ctx.jvm_start) {
        Some((ts, rest)) => (ts, rest),
        None => (0, line),
    };
    let rest = rest.strip_prefix("Application time: ")?;
    let (duration_us, rest) = take_decimal_secs(rest)?;
    rest.strip_prefix(" seconds")?;

    Some(Event::StoppedTime(StoppedTimeEvent {
        kind: EventKind::ApplicationConcurrentTime,
        timestamp_ms: ts,
        duration_us,
        stopping_us: None,
    }))
}

/// `[12.1s][info][safepoint] Safepoint "ThreadDump", Time since last:
/// 12345 ns, Reaching safepoint: 271 ns, At safepoint: 578 ns, Total: 849 ns`
/// — plus the stopped-time sentence under the `[safepoint]` tag on 9-12.
fn unified_safepoint(line: &str, ctx: &ClassifyContext) -> Option<Event> {
    let u = take_unified_decorations(line)?;
    if !u.tags.starts_with("safepoint") {
        return None;
    }
    let ts = u
        .uptime_ms
        .or_else(|| u.datestamp.map(|d| datestamp_to_ms(d, ctx.jvm_start)))
        .unwrap_or(0);

    if let Some(rest) = u.rest.strip_prefix("Safepoint \"") {
        let (operation, rest) = rest.split_once('"')?;
        let sync_us = field_ns(rest, "Reaching safepoint: ").map(|ns| ns / 1000);
        let at_us = field_ns(rest, "At safepoint: ").map(|ns| ns / 1000);
        let total_us = field_ns(rest, "Total: ").map(|ns| ns / 1000);
        return Some(Event::Safepoint(SafepointEvent {
            timestamp_ms: ts,
            duration_us: at_us.or(total_us)?,
            sync_us,
            operation: Some(operation.to_string()),
        }));
    }

    // JDK 9-12 print the legacy sentences under the safepoint tag.
    if let Some(rest) = u
        .rest
        .strip_prefix("Total time for which application threads were stopped: ")
    {
        let (duration_us, rest) = take_decimal_secs(rest)?;
        rest.strip_prefix(" seconds")?;
        let stopping_us = rest
            .strip_prefix(", Stopping threads took: ")
            .and_then(|r| take_decimal_secs(r))
            .map(|(us, _)| us);
        return Some(Event::StoppedTime(StoppedTimeEvent {
            kind: EventKind::ApplicationStoppedTime,
            timestamp_ms: ts,
            duration_us,
            stopping_us,
        }));
    }
    if let Some(rest) = u.rest.strip_prefix("Application time: ") {
        let (duration_us, _) = take_decimal_secs(rest)?;
        return Some(Event::StoppedTime(StoppedTimeEvent {
            kind: EventKind::ApplicationConcurrentTime,
            timestamp_ms: ts,
            duration_us,
            stopping_us: None,
        }));
    }
    None
}

fn field_ns(s: &str, label: &str) -> Option<u64> {
    let pos = s.find(label)?;
    let rest = &s[pos + label.len()..];
    let (value, rest) = take_u64(rest)?;
    rest.strip_prefix(" ns")?;
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ClassifyContext {
        ClassifyContext::default()
    }

    #[test]
    fn test_stopped_time_with_stopping() {
        let line = "2.405: Total time for which application threads were stopped: 0.0019444 seconds, Stopping threads took: 0.0000144 seconds";
        let Event::StoppedTime(e) = stopped_time(line, &ctx()).unwrap() else {
            panic!()
        };
        assert_eq!(e.kind, EventKind::ApplicationStoppedTime);
        assert_eq!(e.timestamp_ms, 2405);
        assert_eq!(e.duration_us, 1944);
        assert_eq!(e.stopping_us, Some(14));
    }

    #[test]
    fn test_stopped_time_without_stopping() {
        let line = "2.405: Total time for which application threads were stopped: 0.0019444 seconds";
        let Event::StoppedTime(e) = stopped_time(line, &ctx()).unwrap() else {
            panic!()
        };
        assert_eq!(e.stopping_us, None);
    }

    #[test]
    fn test_application_time() {
        let line = "2.400: Application time: 0.3440086 seconds";
        let event = application_time(line, &ctx()).unwrap();
        assert_eq!(event.kind(), EventKind::ApplicationConcurrentTime);
        assert_eq!(event.duration_us(), Some(344009));
    }

    #[test]
    fn test_unified_safepoint() {
        let line = "[12.1s][info][safepoint] Safepoint \"ThreadDump\", Time since last: 12345 ns, Reaching safepoint: 271 ns, At safepoint: 578 ns, Total: 849 ns";
        let Event::Safepoint(sp) = unified_safepoint(line, &ctx()).unwrap() else {
            panic!()
        };
        assert_eq!(sp.timestamp_ms, 12100);
        assert_eq!(sp.operation.as_deref(), Some("ThreadDump"));
        // 578 ns rounds down to 0 us; the fields carry through unscaled
        assert_eq!(sp.duration_us, 0);
        assert_eq!(sp.sync_us, Some(0));
    }

    #[test]
    fn test_unified_stopped_sentence() {
        let line = "[4.5s][info][safepoint] Total time for which application threads were stopped: 0.0010234 seconds, Stopping threads took: 0.0000100 seconds";
        let event = unified_safepoint(line, &ctx()).unwrap();
        assert_eq!(event.kind(), EventKind::ApplicationStoppedTime);
        assert_eq!(event.duration_us(), Some(1023));
    }
}
