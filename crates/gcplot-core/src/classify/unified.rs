//! Unified-logging (JDK 9+) line shapes.
//!
//! One decorated grammar covers every collector, so many payloads are
//! structurally identical across families (`Pause Young`, `Pause Full`,
//! `Concurrent Mark`); the concrete kind is resolved from the family
//! context. Shenandoah keeps its phase names lowercase, which makes them
//! unambiguous without context.

use crate::event::{
    CollectorFamily, ConcurrentEvent, Event, EventKind, HeaderEvent, MemoryRegion, Trigger,
    WarningEvent,
};

use super::header::parse_jdk_major;
use super::scan::{
    datestamp_to_ms, take_gc_id, take_mem_triple, take_paren_group, take_size,
    take_unified_decorations, take_unified_duration,
};
use super::{ClassifyContext, Matcher, make_pause};

pub(super) const MATCHERS: &[Matcher] = &[unified];

fn unified(line: &str, ctx: &ClassifyContext) -> Option<Event> {
    let u = take_unified_decorations(line)?;
    if u.tags.starts_with("safepoint") {
        // The safepoint subset owns these.
        return None;
    }
    let ts = u
        .uptime_ms
        .or_else(|| u.datestamp.map(|d| datestamp_to_ms(d, ctx.jvm_start)))
        .unwrap_or(0);
    let (gc_id, payload) = match take_gc_id(u.rest) {
        Some((id, rest)) => (Some(id), rest),
        None => (None, u.rest),
    };

    if let Some(rest) = payload.strip_prefix("Pause ") {
        return pause(rest, ts, gc_id, ctx);
    }
    if let Some(rest) = payload.strip_prefix("Concurrent ") {
        return concurrent(rest, ts, gc_id, ctx);
    }
    if let Some(rest) = payload.strip_prefix("Using ") {
        return Some(Event::Header(HeaderEvent {
            kind: EventKind::UsingCollector,
            timestamp_ms: ts,
            text: payload.to_string(),
            family: CollectorFamily::from_announcement(rest),
            jdk_major: None,
            physical_memory: None,
        }));
    }
    if let Some(rest) = payload.strip_prefix("Cancelling GC: ") {
        return Some(Event::Warning(WarningEvent {
            kind: EventKind::ShenandoahCancellingGc,
            timestamp_ms: ts,
            message: rest.to_string(),
        }));
    }
    if payload.starts_with("Allocation Stall") {
        return Some(Event::Warning(WarningEvent {
            kind: EventKind::ZAllocationStall,
            timestamp_ms: ts,
            message: payload.to_string(),
        }));
    }
    init_header(payload, ts)
}

/// Trailing duration token: `... 3.456ms`.
fn tail_duration(payload: &str) -> Option<u64> {
    let token = payload.trim_end().rsplit(' ').next()?;
    let (us, rest) = take_unified_duration(token)?;
    rest.is_empty().then_some(us)
}

/// First whole-token `A->B(C)` transition in the payload.
fn find_mem_triple(payload: &str) -> Option<MemoryRegion> {
    payload.split(' ').find_map(|token| {
        take_mem_triple(token).and_then(|(region, rest)| rest.is_empty().then_some(region))
    })
}

fn young_kind(subtype: Option<&str>, family: CollectorFamily) -> EventKind {
    match family {
        CollectorFamily::G1 => match subtype {
            Some("Mixed") => EventKind::G1Mixed,
            Some("Concurrent Start") => EventKind::G1YoungInitialMark,
            Some("Prepare Mixed") => EventKind::G1YoungPrepareMixed,
            _ => EventKind::G1Young,
        },
        CollectorFamily::Cms => EventKind::ParNew,
        CollectorFamily::Parallel => EventKind::PsYoung,
        CollectorFamily::Serial => EventKind::DefNew,
        _ => EventKind::GenericYoung,
    }
}

fn full_kind(family: CollectorFamily) -> EventKind {
    match family {
        CollectorFamily::G1 => EventKind::G1Full,
        CollectorFamily::Parallel => EventKind::PsFull,
        CollectorFamily::Serial => EventKind::SerialFull,
        CollectorFamily::Cms => EventKind::CmsFull,
        CollectorFamily::Shenandoah => EventKind::ShenandoahFull,
        _ => EventKind::GenericFull,
    }
}

const SHENANDOAH_PAUSES: &[(&str, EventKind)] = &[
    ("Init Mark", EventKind::ShenandoahInitMark),
    ("Final Mark", EventKind::ShenandoahFinalMark),
    ("Init Update Refs", EventKind::ShenandoahInitUpdateRefs),
    ("Final Update Refs", EventKind::ShenandoahFinalUpdateRefs),
    ("Final Roots", EventKind::ShenandoahFinalRoots),
    ("Degenerated GC", EventKind::ShenandoahDegenerated),
];

const Z_PAUSES: &[(&str, EventKind)] = &[
    ("Mark Start", EventKind::ZPauseMarkStart),
    ("Mark End", EventKind::ZPauseMarkEnd),
    ("Relocate Start", EventKind::ZPauseRelocateStart),
];

fn pause(rest: &str, ts: u64, gc_id: Option<u32>, ctx: &ClassifyContext) -> Option<Event> {
    // Family-unambiguous pause names first.
    for &(name, kind) in SHENANDOAH_PAUSES {
        if rest.starts_with(name) {
            return finish_pause(kind, &rest[name.len()..], ts, gc_id, Trigger::None);
        }
    }
    for &(name, kind) in Z_PAUSES {
        if rest.starts_with(name) {
            return finish_pause(kind, &rest[name.len()..], ts, gc_id, Trigger::None);
        }
    }

    if let Some(after) = rest.strip_prefix("Young") {
        let (subtype, trigger, after) = take_pause_groups(after);
        let kind = young_kind(subtype.as_deref(), ctx.family);
        return finish_pause(kind, after, ts, gc_id, trigger);
    }
    if let Some(after) = rest.strip_prefix("Full") {
        let (_subtype, trigger, after) = take_pause_groups(after);
        return finish_pause(full_kind(ctx.family), after, ts, gc_id, trigger);
    }
    if let Some(after) = rest.strip_prefix("Initial Mark") {
        let kind = if ctx.family == CollectorFamily::Cms {
            EventKind::CmsInitialMark
        } else {
            EventKind::G1YoungInitialMark
        };
        return finish_pause(kind, after, ts, gc_id, Trigger::None);
    }
    if let Some(after) = rest.strip_prefix("Remark") {
        let kind = if ctx.family == CollectorFamily::Cms {
            EventKind::CmsRemark
        } else {
            EventKind::G1Remark
        };
        return finish_pause(kind, after, ts, gc_id, Trigger::None);
    }
    if let Some(after) = rest.strip_prefix("Cleanup") {
        return finish_pause(EventKind::G1Cleanup, after, ts, gc_id, Trigger::None);
    }
    None
}

/// Collect `(subtype)` and `(cause)` groups after the pause name.
fn take_pause_groups(mut rest: &str) -> (Option<String>, Trigger, &str) {
    let mut subtype = None;
    let mut trigger = Trigger::None;
    loop {
        let trimmed = rest.strip_prefix(' ').unwrap_or(rest);
        let Some((inner, after)) = take_paren_group(trimmed) else {
            return (subtype, trigger, trimmed);
        };
        match inner {
            "Normal" | "Mixed" | "Concurrent Start" | "Concurrent End" | "Prepare Mixed" => {
                subtype = Some(inner.to_string());
            }
            cause => {
                // Subtype tags this table does not know (a degeneration
                // point, a new qualifier) are not causes. An evacuation
                // failure marker outranks the nominal cause.
                let t = Trigger::from_cause(cause);
                if !matches!(t, Trigger::None | Trigger::Unknown)
                    && trigger != Trigger::ToSpaceExhausted
                {
                    trigger = t;
                }
            }
        }
        rest = after;
    }
}

fn finish_pause(
    kind: EventKind,
    after: &str,
    ts: u64,
    gc_id: Option<u32>,
    mut trigger: Trigger,
) -> Option<Event> {
    let (_subtype, group_trigger, tail) = take_pause_groups(after);
    if trigger == Trigger::None {
        trigger = group_trigger;
    }
    // Start lines carry no duration; the preprocessor merges them into
    // their end line, so a bare start here declines to Unrecognized.
    let duration_us = tail_duration(tail)?;
    let mut pause = make_pause(kind, ts, duration_us, trigger);
    pause.gc_id = gc_id;
    pause.regions.combined = find_mem_triple(tail);
    if kind == EventKind::ShenandoahDegenerated && trigger == Trigger::None {
        pause.trigger = Trigger::DegeneratedGc;
    }
    Some(Event::Pause(pause))
}

const SHENANDOAH_CONCURRENT: &[(&str, EventKind)] = &[
    ("reset", EventKind::ShenandoahConcurrentReset),
    ("marking", EventKind::ShenandoahConcurrentMarking),
    ("precleaning", EventKind::ShenandoahConcurrentPrecleaning),
    ("evacuation", EventKind::ShenandoahConcurrentEvacuation),
    ("update references", EventKind::ShenandoahConcurrentUpdateRefs),
    ("cleanup", EventKind::ShenandoahConcurrentCleanup),
    ("uncommit", EventKind::ShenandoahConcurrentUncommit),
];

const G1_CONCURRENT: &[(&str, EventKind)] = &[
    ("Clear Claimed Marks", EventKind::G1ConcurrentClearClaimedMarks),
    ("Scan Root Regions", EventKind::G1ConcurrentRootRegionScanEnd),
    ("Mark Abort", EventKind::G1ConcurrentMarkAbort),
    ("Rebuild Remembered Sets and Scrub Regions", EventKind::G1ConcurrentRebuildRememberedSets),
    ("Rebuild Remembered Sets", EventKind::G1ConcurrentRebuildRememberedSets),
    ("Cleanup for Next Mark", EventKind::G1ConcurrentCleanupEnd),
    ("Undo Cycle", EventKind::G1ConcurrentUndoCycle),
    ("String Deduplication", EventKind::G1ConcurrentStringDeduplication),
];

const Z_CONCURRENT: &[(&str, EventKind)] = &[
    ("Mark Continue", EventKind::ZConcurrentMarkContinue),
    ("Process Non-Strong References", EventKind::ZConcurrentProcessNonStrongReferences),
    ("Reset Relocation Set", EventKind::ZConcurrentResetRelocationSet),
    ("Select Relocation Set", EventKind::ZConcurrentSelectRelocationSet),
    ("Relocate", EventKind::ZConcurrentRelocate),
];

const CMS_CONCURRENT: &[(&str, EventKind)] = &[
    ("Abortable Preclean", EventKind::CmsConcurrentAbortablePreclean),
    ("Preclean", EventKind::CmsConcurrentPreclean),
    ("Mark", EventKind::CmsConcurrentMark),
    ("Sweep", EventKind::CmsConcurrentSweep),
    ("Reset", EventKind::CmsConcurrentReset),
];

fn concurrent(rest: &str, ts: u64, gc_id: Option<u32>, ctx: &ClassifyContext) -> Option<Event> {
    let emit = |kind| {
        Some(Event::Concurrent(ConcurrentEvent {
            kind,
            timestamp_ms: ts,
            duration_us: tail_duration(rest),
            gc_id,
        }))
    };

    // Shenandoah's lowercase phase names need no family context.
    for &(name, kind) in SHENANDOAH_CONCURRENT {
        if rest.starts_with(name) {
            return emit(kind);
        }
    }

    // Cycle markers: begin has no duration, the completed report does.
    if rest.starts_with("Mark Cycle") || rest.starts_with("Cycle") {
        return emit(if tail_duration(rest).is_some() {
            EventKind::G1ConcurrentCycleEnd
        } else {
            EventKind::G1ConcurrentCycleStart
        });
    }

    for &(name, kind) in G1_CONCURRENT {
        if rest.starts_with(name) {
            return emit(kind);
        }
    }
    for &(name, kind) in Z_CONCURRENT {
        if rest.starts_with(name) && ctx.family != CollectorFamily::Cms {
            return emit(kind);
        }
    }
    if ctx.family == CollectorFamily::Cms {
        for &(name, kind) in CMS_CONCURRENT {
            if rest.starts_with(name) {
                return emit(kind);
            }
        }
    }
    // `Concurrent Mark` with no family context, or a phase name from a
    // newer JVM: still a concurrent phase, just not attributable.
    if rest.starts_with("Mark") {
        return emit(match ctx.family {
            CollectorFamily::G1 => {
                if tail_duration(rest).is_some() {
                    EventKind::G1ConcurrentMarkEnd
                } else {
                    EventKind::G1ConcurrentMarkStart
                }
            }
            CollectorFamily::Z => EventKind::ZConcurrentMark,
            _ => EventKind::GenericConcurrent,
        });
    }
    emit(EventKind::GenericConcurrent)
}

/// `[gc,init]` and heap-configuration headers.
fn init_header(payload: &str, ts: u64) -> Option<Event> {
    let header = |kind, physical_memory, jdk_major| {
        Some(Event::Header(HeaderEvent {
            kind,
            timestamp_ms: ts,
            text: payload.to_string(),
            family: None,
            jdk_major,
            physical_memory,
        }))
    };

    if let Some(rest) = payload.strip_prefix("Version: ") {
        return header(EventKind::JvmVersion, None, parse_jdk_major(rest));
    }
    if payload.strip_prefix("Heap Region Size: ").is_some() {
        return header(EventKind::HeapRegionSize, None, None);
    }
    if payload.starts_with("Parallel Workers: ") || payload.starts_with("Concurrent Workers: ") {
        return header(EventKind::GcThreads, None, None);
    }
    if let Some(rest) = payload.strip_prefix("Memory: ") {
        let physical = take_size(rest).map(|(amount, _)| amount);
        return header(EventKind::MemoryConfig, physical, None);
    }
    None
}
