//! Pre-unified Shenandoah line shapes (the JDK 8 backport).
//!
//! Shenandoah reports pause durations in spaced milliseconds
//! (`, 0.437 ms]`) rather than the `secs` suffix the other legacy
//! collectors use.

use crate::event::{ConcurrentEvent, Event, EventKind, Trigger, WarningEvent};

use super::scan::{take_mem_triple, take_paren_group, take_spaced_ms_duration, take_timestamp_prefix};
use super::{ClassifyContext, Matcher, make_pause};

pub(super) const MATCHERS: &[Matcher] = &[pause, concurrent, cancelling];

const PAUSES: &[(&str, EventKind)] = &[
    ("Init Mark", EventKind::ShenandoahInitMark),
    ("Final Mark", EventKind::ShenandoahFinalMark),
    ("Init Update Refs", EventKind::ShenandoahInitUpdateRefs),
    ("Final Update Refs", EventKind::ShenandoahFinalUpdateRefs),
    ("Final Roots", EventKind::ShenandoahFinalRoots),
    ("Degenerated GC", EventKind::ShenandoahDegenerated),
    ("Full", EventKind::ShenandoahFull),
];

const CONCURRENT: &[(&str, EventKind)] = &[
    ("reset", EventKind::ShenandoahConcurrentReset),
    ("marking", EventKind::ShenandoahConcurrentMarking),
    ("precleaning", EventKind::ShenandoahConcurrentPrecleaning),
    ("evacuation", EventKind::ShenandoahConcurrentEvacuation),
    ("update references", EventKind::ShenandoahConcurrentUpdateRefs),
    ("cleanup", EventKind::ShenandoahConcurrentCleanup),
    ("uncommit", EventKind::ShenandoahConcurrentUncommit),
];

/// `0.407: [Pause Init Mark, 0.437 ms]` and
/// `6.212: [Pause Degenerated GC (Mark) 93M->66M(128M), 53.697 ms]`
fn pause(line: &str, ctx: &ClassifyContext) -> Option<Event> {
    let (ts, rest) = take_timestamp_prefix(line, ctx.jvm_start)?;
    let rest = rest.strip_prefix("[Pause ")?;
    let (name, kind) = PAUSES
        .iter()
        .find(|(name, _)| rest.starts_with(name))
        .copied()?;
    let mut rest = &rest[name.len()..];

    // Degenerated pauses tag the point the cycle degenerated at.
    if let Some(r) = rest.strip_prefix(' ')
        && r.starts_with('(')
    {
        let (_point, after) = take_paren_group(r)?;
        rest = after;
    }

    let mut pause = make_pause(kind, ts, 0, Trigger::None);
    if kind == EventKind::ShenandoahDegenerated {
        pause.trigger = Trigger::DegeneratedGc;
    }

    let rest = rest.strip_prefix(' ').unwrap_or(rest);
    let rest = match take_mem_triple(rest) {
        Some((combined, r)) => {
            pause.regions.combined = Some(combined);
            r
        }
        None => rest,
    };
    let rest = rest.strip_prefix(", ")?;
    let (duration_us, rest) = take_spaced_ms_duration(rest)?;
    rest.strip_prefix(']')?;
    pause.duration_us = duration_us;
    Some(Event::Pause(pause))
}

/// `0.413: [Concurrent marking 16M->17M(128M), 2.332 ms]`
fn concurrent(line: &str, ctx: &ClassifyContext) -> Option<Event> {
    let (ts, rest) = take_timestamp_prefix(line, ctx.jvm_start)?;
    let rest = rest.strip_prefix("[Concurrent ")?;
    let (name, kind) = CONCURRENT
        .iter()
        .find(|(name, _)| rest.starts_with(name))
        .copied()?;
    let rest = &rest[name.len()..];
    let rest = rest.strip_prefix(' ').unwrap_or(rest);
    let rest = match take_mem_triple(rest) {
        Some((_combined, r)) => r,
        None => rest,
    };
    let rest = rest.strip_prefix(", ")?;
    let (duration_us, rest) = take_spaced_ms_duration(rest)?;
    rest.strip_prefix(']')?;
    Some(Event::Concurrent(ConcurrentEvent {
        kind,
        timestamp_ms: ts,
        duration_us: Some(duration_us),
        gc_id: None,
    }))
}

/// `Cancelling GC: Allocation Failure` — the collector abandoning a
/// concurrent cycle, usually right before a degenerated or full pause.
fn cancelling(line: &str, ctx: &ClassifyContext) -> Option<Event> {
    let (ts, rest) = match take_timestamp_prefix(line, ctx.jvm_start) {
        Some((ts, rest)) => (ts, rest),
        None => (0, line),
    };
    let reason = rest.strip_prefix("Cancelling GC: ")?;
    Some(Event::Warning(WarningEvent {
        kind: EventKind::ShenandoahCancellingGc,
        timestamp_ms: ts,
        message: reason.to_string(),
    }))
}
