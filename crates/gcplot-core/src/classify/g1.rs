//! Legacy (pre-unified) G1 line shapes.
//!
//! Detailed G1 logs spread one pause over dozens of indented lines; the
//! preprocessor collapses them to the summary form matched here. Pause
//! headers stack parenthesized tags — cause, `(young)`/`(mixed)`,
//! `(initial-mark)`, `(to-space exhausted)` — in varying order across
//! versions, so tags are collected rather than matched positionally.

use crate::event::{ConcurrentEvent, Event, EventKind, Trigger};

use super::scan::{
    find_worker_times, take_mem_triple, take_paren_group, take_secs_duration,
    take_spaced_ms_duration, take_timestamp_prefix,
};
use super::{ClassifyContext, Matcher, make_pause};

pub(super) const MATCHERS: &[Matcher] = &[
    humongous_joined,
    g1_pause,
    g1_full,
    g1_remark,
    g1_cleanup,
    concurrent_phase,
];

struct PauseTags {
    trigger: Trigger,
    mixed: bool,
    initial_mark: bool,
    to_space_exhausted: bool,
}

/// Collect the parenthesized tags after `[GC pause `; returns the rest
/// after the last tag.
fn take_pause_tags(mut rest: &str) -> (PauseTags, &str) {
    let mut tags = PauseTags {
        trigger: Trigger::None,
        mixed: false,
        initial_mark: false,
        to_space_exhausted: false,
    };
    while let Some((inner, after)) = take_paren_group(rest) {
        match inner {
            "young" => {}
            "mixed" => tags.mixed = true,
            "initial-mark" => tags.initial_mark = true,
            "to-space exhausted" | "to-space overflow" => tags.to_space_exhausted = true,
            cause => {
                let trigger = Trigger::from_cause(cause);
                if trigger == Trigger::Unknown && tags.trigger != Trigger::None {
                    // Not a cause and not a known tag: stop consuming.
                    break;
                }
                tags.trigger = trigger;
            }
        }
        rest = after.strip_prefix(' ').unwrap_or(after);
    }
    (tags, rest)
}

/// `1.305: [GC pause (G1 Evacuation Pause) (young) 102M->24M(256M),
/// 0.0254565 secs]`, plus the mixed/initial-mark/to-space variants.
fn g1_pause(line: &str, ctx: &ClassifyContext) -> Option<Event> {
    let (ts, rest) = take_timestamp_prefix(line, ctx.jvm_start)?;
    let rest = rest.strip_prefix("[GC pause ")?;
    let (tags, rest) = take_pause_tags(rest);

    let (regions, rest) = match take_mem_triple(rest) {
        Some((combined, r)) => (Some(combined), r),
        None => (None, rest),
    };
    let rest = rest.strip_prefix(", ")?;
    let (duration_us, rest) = take_secs_duration(rest)?;
    rest.strip_prefix(']')?;

    let kind = if tags.mixed {
        EventKind::G1Mixed
    } else if tags.initial_mark {
        EventKind::G1YoungInitialMark
    } else {
        EventKind::G1Young
    };
    let trigger = if tags.to_space_exhausted {
        Trigger::ToSpaceExhausted
    } else {
        tags.trigger
    };

    let mut pause = make_pause(kind, ts, duration_us, trigger);
    pause.regions.combined = regions;
    pause.worker = find_worker_times(line);
    // Sub-phase carried over from a collapsed detail block.
    if let Some(pos) = line.find("[Other: ") {
        if let Some((us, _)) = take_spaced_ms_duration(&line[pos + "[Other: ".len()..]) {
            pause.phases.other_us = Some(us);
        }
    }
    Some(Event::Pause(pause))
}

/// An ergonomics humongous-allocation notice joined by the preprocessor
/// to the pause it provoked: the composite classifies as one pause with
/// the humongous trigger.
fn humongous_joined(line: &str, ctx: &ClassifyContext) -> Option<Event> {
    let (notice, pause_line) = line.split_once("; ")?;
    if !notice.contains("[G1Ergonomics") || !notice.contains("humongous allocation") {
        return None;
    }
    let mut event = g1_pause(pause_line, ctx).or_else(|| g1_full(pause_line, ctx))?;
    if let Event::Pause(pause) = &mut event {
        pause.trigger = Trigger::HumongousAllocation;
    }
    Some(event)
}

/// `5.566: [Full GC (System.gc()) 24M->4M(64M), 0.0354234 secs]`
fn g1_full(line: &str, ctx: &ClassifyContext) -> Option<Event> {
    let (ts, rest) = take_timestamp_prefix(line, ctx.jvm_start)?;
    let rest = rest.strip_prefix("[Full GC")?;
    let rest = rest.strip_prefix(' ').unwrap_or(rest);
    let (trigger, rest) = match take_paren_group(rest) {
        Some((inner, after)) => (
            Trigger::from_cause(inner),
            after.strip_prefix(' ').unwrap_or(after),
        ),
        None => (Trigger::None, rest),
    };
    let (combined, rest) = take_mem_triple(rest)?;
    let rest = rest.strip_prefix(", ")?;
    let (duration_us, rest) = take_secs_duration(rest)?;
    rest.strip_prefix(']')?;

    let mut pause = make_pause(EventKind::G1Full, ts, duration_us, trigger);
    pause.regions.combined = Some(combined);
    pause.worker = find_worker_times(line);
    Some(Event::Pause(pause))
}

/// `1.409: [GC remark 1.409: [Finalize Marking, 0.0007422 secs] ...,
/// 0.0067364 secs]` — inner breakdown varies, the trailing duration is
/// the pause.
fn g1_remark(line: &str, ctx: &ClassifyContext) -> Option<Event> {
    let (ts, rest) = take_timestamp_prefix(line, ctx.jvm_start)?;
    rest.strip_prefix("[GC remark")?;
    let duration_us = super::scan::last_secs_duration(line)?;
    let mut pause = make_pause(EventKind::G1Remark, ts, duration_us, Trigger::None);
    pause.worker = find_worker_times(line);
    Some(Event::Pause(pause))
}

/// `1.416: [GC cleanup 18M->17M(64M), 0.0012165 secs]`
fn g1_cleanup(line: &str, ctx: &ClassifyContext) -> Option<Event> {
    let (ts, rest) = take_timestamp_prefix(line, ctx.jvm_start)?;
    let rest = rest.strip_prefix("[GC cleanup ")?;
    let (combined, rest) = take_mem_triple(rest)?;
    let rest = rest.strip_prefix(", ")?;
    let (duration_us, rest) = take_secs_duration(rest)?;
    rest.strip_prefix(']')?;

    let mut pause = make_pause(EventKind::G1Cleanup, ts, duration_us, Trigger::None);
    pause.regions.combined = Some(combined);
    pause.worker = find_worker_times(line);
    Some(Event::Pause(pause))
}

const PHASES: &[(&str, EventKind, Option<EventKind>)] = &[
    ("root-region-scan", EventKind::G1ConcurrentRootRegionScanStart, Some(EventKind::G1ConcurrentRootRegionScanEnd)),
    ("mark-abort", EventKind::G1ConcurrentMarkAbort, None),
    ("mark", EventKind::G1ConcurrentMarkStart, Some(EventKind::G1ConcurrentMarkEnd)),
    ("cleanup", EventKind::G1ConcurrentCleanupStart, Some(EventKind::G1ConcurrentCleanupEnd)),
    ("string-deduplication", EventKind::G1ConcurrentStringDeduplication, Some(EventKind::G1ConcurrentStringDeduplication)),
];

/// `1.408: [GC concurrent-mark-start]` / `1.409: [GC concurrent-mark-end,
/// 0.0005221 secs]`
fn concurrent_phase(line: &str, ctx: &ClassifyContext) -> Option<Event> {
    let (ts, rest) = take_timestamp_prefix(line, ctx.jvm_start)?;
    let rest = rest.strip_prefix("[GC concurrent-")?;
    for &(phase, start_kind, end_kind) in PHASES {
        let Some(after) = rest.strip_prefix(phase) else {
            continue;
        };
        if after.starts_with("-start]") || after.starts_with(']') {
            return Some(Event::Concurrent(ConcurrentEvent {
                kind: start_kind,
                timestamp_ms: ts,
                duration_us: None,
                gc_id: None,
            }));
        }
        if let Some(after) = after.strip_prefix("-end, ") {
            let (us, _) = take_secs_duration(after)?;
            return Some(Event::Concurrent(ConcurrentEvent {
                kind: end_kind?,
                timestamp_ms: ts,
                duration_us: Some(us),
                gc_id: None,
            }));
        }
        if after.starts_with("-end]") {
            return Some(Event::Concurrent(ConcurrentEvent {
                kind: end_kind?,
                timestamp_ms: ts,
                duration_us: None,
                gc_id: None,
            }));
        }
        return None;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Generation, MemoryAmount, Unit};

    fn ctx() -> ClassifyContext {
        ClassifyContext::default()
    }

    #[test]
    fn test_g1_young_simple() {
        let line = "1.305: [GC pause (G1 Evacuation Pause) (young) 102M->24M(256M), 0.0254565 secs]";
        let Event::Pause(p) = g1_pause(line, &ctx()).unwrap() else {
            panic!()
        };
        assert_eq!(p.kind, EventKind::G1Young);
        assert_eq!(p.trigger, Trigger::G1EvacuationPause);
        assert_eq!(p.duration_ms(), 25);
        let combined = p.regions.get(Generation::Combined).unwrap();
        assert_eq!(combined.capacity, MemoryAmount::new(256, Unit::Megabytes));
    }

    #[test]
    fn test_g1_mixed_and_initial_mark() {
        let mixed = "7.1: [GC pause (G1 Evacuation Pause) (mixed) 120M->80M(256M), 0.0354565 secs]";
        assert_eq!(g1_pause(mixed, &ctx()).unwrap().kind(), EventKind::G1Mixed);

        let im = "2.5: [GC pause (G1 Humongous Allocation) (young) (initial-mark) 90M->60M(256M), 0.02 secs]";
        let event = g1_pause(im, &ctx()).unwrap();
        assert_eq!(event.kind(), EventKind::G1YoungInitialMark);
        assert_eq!(event.trigger(), Trigger::HumongousAllocation);
    }

    #[test]
    fn test_g1_to_space_exhausted_wins() {
        let line = "9.8: [GC pause (G1 Evacuation Pause) (young) (to-space exhausted), 0.1354565 secs]";
        let event = g1_pause(line, &ctx()).unwrap();
        assert_eq!(event.trigger(), Trigger::ToSpaceExhausted);
    }

    #[test]
    fn test_g1_full_and_cleanup() {
        let full = "5.566: [Full GC (System.gc()) 24M->4M(64M), 0.0354234 secs]";
        let event = g1_full(full, &ctx()).unwrap();
        assert_eq!(event.kind(), EventKind::G1Full);
        assert_eq!(event.trigger(), Trigger::SystemGc);

        let cleanup = "1.416: [GC cleanup 18M->17M(64M), 0.0012165 secs]";
        assert_eq!(g1_cleanup(cleanup, &ctx()).unwrap().kind(), EventKind::G1Cleanup);
    }

    #[test]
    fn test_g1_concurrent_phases() {
        let s = concurrent_phase("1.408: [GC concurrent-mark-start]", &ctx()).unwrap();
        assert_eq!(s.kind(), EventKind::G1ConcurrentMarkStart);

        let e = concurrent_phase("1.409: [GC concurrent-root-region-scan-end, 0.0005221 secs]", &ctx()).unwrap();
        assert_eq!(e.kind(), EventKind::G1ConcurrentRootRegionScanEnd);
        assert_eq!(e.duration_us(), Some(522));

        let a = concurrent_phase("2.0: [GC concurrent-mark-abort]", &ctx()).unwrap();
        assert_eq!(a.kind(), EventKind::G1ConcurrentMarkAbort);
    }

    #[test]
    fn test_humongous_joined_line() {
        let line = "4.561: [G1Ergonomics (Concurrency Cycles) request concurrent cycle initiation, reason: occupancy higher than threshold, source: concurrent humongous allocation]; 4.562: [GC pause (G1 Humongous Allocation) (young) (initial-mark) 1801M->1607M(3072M), 0.0301813 secs]";
        let event = humongous_joined(line, &ctx()).unwrap();
        assert_eq!(event.kind(), EventKind::G1YoungInitialMark);
        assert_eq!(event.trigger(), Trigger::HumongousAllocation);
        assert_eq!(event.timestamp_ms(), 4562);
    }
}
