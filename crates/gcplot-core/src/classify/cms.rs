//! CMS collector line shapes.
//!
//! CMS logs are the messiest of the legacy formats: stop-the-world events
//! interleave with concurrent phase reports, and a failed cycle glues a
//! young collection, a concurrent phase tail, and the serial full
//! collection into one physical line (reassembled by the preprocessor
//! before it gets here). The composite failure matcher runs first since
//! its shape embeds the others.

use crate::event::{ConcurrentEvent, Event, EventKind, MemoryRegion, Trigger};

use super::scan::{
    find_worker_times, last_secs_duration, take_mem_triple, take_optional_cause,
    take_phase_times, take_secs_duration, take_size, take_timestamp_prefix, take_uptime_prefix,
};
use super::{ClassifyContext, Matcher, make_pause};

pub(super) const MATCHERS: &[Matcher] = &[
    concurrent_mode_failure,
    cms_full,
    par_new,
    initial_mark,
    remark,
    abort_preclean,
    concurrent_phase,
];

/// Occupancy-with-capacity figure: `"12849K(20288K)"`. CMS mark pauses
/// report a single occupancy, so before and after coincide.
fn take_occupancy(s: &str) -> Option<(MemoryRegion, &str)> {
    let (occ, rest) = take_size(s)?;
    let rest = rest.strip_prefix('(')?;
    let (cap, rest) = take_size(rest)?;
    let rest = rest.strip_prefix(')')?;
    Some((MemoryRegion::new(occ, occ, cap), rest))
}

/// `8.999: [GC 8.999: [ParNew: 16896K->2048K(16896K), 0.0281567 secs]
/// 40941K->28968K(62656K), 0.0283843 secs]`, with `(promotion failed)`
/// marking a young collection that could not evacuate.
fn par_new(line: &str, ctx: &ClassifyContext) -> Option<Event> {
    let (ts, rest) = take_timestamp_prefix(line, ctx.jvm_start)?;
    let rest = rest.strip_prefix("[GC")?;
    let (trigger, rest) = take_optional_cause(rest.strip_prefix(' ').unwrap_or(rest));
    let rest = match take_uptime_prefix(rest.trim_start()) {
        Some((_, r)) => r,
        None => rest.trim_start(),
    };

    let rest = rest.strip_prefix("[ParNew")?;
    let (kind, trigger, rest) = if let Some(r) = rest.strip_prefix(" (promotion failed)") {
        (EventKind::ParNewPromotionFailed, Trigger::PromotionFailed, r)
    } else if let Some(r) = rest.strip_prefix(" (to-space overflow)") {
        (EventKind::ParNewToSpaceOverflow, Trigger::ToSpaceOverflow, r)
    } else {
        (EventKind::ParNew, trigger, rest)
    };
    let rest = rest.strip_prefix(": ")?;
    let (young, rest) = take_mem_triple(rest)?;
    let rest = rest.strip_prefix(", ")?;
    let (_inner_us, rest) = take_secs_duration(rest)?;
    let rest = rest.strip_prefix("] ")?;
    let (combined, rest) = take_mem_triple(rest)?;
    let rest = rest.strip_prefix(", ")?;
    let (duration_us, rest) = take_secs_duration(rest)?;
    rest.strip_prefix(']')?;

    let mut pause = make_pause(kind, ts, duration_us, trigger);
    pause.regions.young = Some(young);
    pause.regions.combined = Some(combined);
    pause.regions.derive_old_from_combined();
    pause.worker = find_worker_times(line);
    Some(Event::Pause(pause))
}

/// `10.233: [GC (CMS Initial Mark) [1 CMS-initial-mark: 12849K(20288K)]
/// 13166K(27512K), 0.0004845 secs]`
fn initial_mark(line: &str, ctx: &ClassifyContext) -> Option<Event> {
    let (ts, _) = take_timestamp_prefix(line, ctx.jvm_start)?;
    let marker = line.find("[1 CMS-initial-mark: ")?;
    let rest = &line[marker + "[1 CMS-initial-mark: ".len()..];
    let (old, rest) = take_occupancy(rest)?;
    let rest = rest.strip_prefix("] ")?;
    let (combined, rest) = take_occupancy(rest)?;
    let rest = rest.strip_prefix(", ")?;
    let (duration_us, _) = take_secs_duration(rest)?;

    let mut pause = make_pause(EventKind::CmsInitialMark, ts, duration_us, Trigger::CmsInitialMark);
    pause.regions.old = Some(old);
    pause.regions.combined = Some(combined);
    pause.worker = find_worker_times(line);
    Some(Event::Pause(pause))
}

/// `12.986: [GC (CMS Final Remark) [YG occupancy: 5418 K (18624 K)]
/// 12.986: [Rescan (parallel) , 0.0024157 secs]12.989: [weak refs
/// processing, 0.0000061 secs] [1 CMS-remark: 13750K(16384K)]
/// 19168K(35008K), 0.0030918 secs]`
fn remark(line: &str, ctx: &ClassifyContext) -> Option<Event> {
    let (ts, _) = take_timestamp_prefix(line, ctx.jvm_start)?;
    let marker = line.find("[1 CMS-remark: ")?;
    let rest = &line[marker + "[1 CMS-remark: ".len()..];
    let (old, rest) = take_occupancy(rest)?;
    let rest = rest.strip_prefix("] ")?;
    let (combined, rest) = take_occupancy(rest)?;
    let rest = rest.strip_prefix(", ")?;
    let (duration_us, _) = take_secs_duration(rest)?;

    let kind = if line.contains("[class unloading") {
        EventKind::CmsRemarkWithClassUnloading
    } else {
        EventKind::CmsRemark
    };
    let mut pause = make_pause(kind, ts, duration_us, Trigger::CmsFinalRemark);
    pause.regions.old = Some(old);
    pause.regions.combined = Some(combined);

    // Sub-phase timings reported inside the remark breakdown.
    if let Some(pos) = line.find("[Rescan (parallel) , ") {
        if let Some((us, _)) = take_secs_duration(&line[pos + "[Rescan (parallel) , ".len()..]) {
            pause.phases.root_scanning_us = Some(us);
        }
    }
    if let Some(pos) = line.find("[weak refs processing, ") {
        if let Some((us, _)) = take_secs_duration(&line[pos + "[weak refs processing, ".len()..]) {
            pause.phases.other_us = Some(us);
        }
    }
    pause.worker = find_worker_times(line);
    Some(Event::Pause(pause))
}

/// The composite produced when a concurrent cycle loses the race: a
/// `[Full GC` (optionally wrapping a failed `ParNew`) with the in-flight
/// concurrent phase's tail spliced in, ending in the serial old
/// collection's figures. The preprocessor delivers it as one line.
fn concurrent_mode_failure(line: &str, ctx: &ClassifyContext) -> Option<Event> {
    let kind = if line.contains("(concurrent mode failure)") {
        EventKind::ConcurrentModeFailure
    } else if line.contains("(concurrent mode interrupted)") {
        EventKind::ConcurrentModeInterrupted
    } else {
        return None;
    };
    let (ts, _) = take_timestamp_prefix(line, ctx.jvm_start)?;

    let marker = if kind == EventKind::ConcurrentModeFailure {
        "(concurrent mode failure): "
    } else {
        "(concurrent mode interrupted): "
    };
    let pos = line.find(marker)?;
    let rest = &line[pos + marker.len()..];
    let (old, rest) = take_mem_triple(rest)?;
    let rest = rest.strip_prefix(", ")?;
    let (_cms_us, rest) = take_secs_duration(rest)?;
    let rest = rest.strip_prefix("] ")?;
    let (combined, mut rest) = take_mem_triple(rest)?;

    let trigger = if line.contains("(promotion failed)") {
        Trigger::PromotionFailed
    } else if kind == EventKind::ConcurrentModeFailure {
        Trigger::ConcurrentModeFailure
    } else {
        Trigger::ConcurrentModeInterrupted
    };

    let mut pause = make_pause(kind, ts, 0, trigger);
    pause.regions.old = Some(old);
    pause.regions.combined = Some(combined);
    pause.regions.derive_young_from_combined();

    rest = rest.trim_start_matches(|c| c == ',' || c == ' ');
    for (tag, perm) in [("[CMS Perm : ", true), ("[Metaspace: ", false)] {
        if let Some(r) = rest.strip_prefix(tag) {
            if let Some((meta, _)) = take_mem_triple(r) {
                pause.regions.class_metadata = Some(meta);
                pause.perm_gen = perm;
            }
            break;
        }
    }

    pause.duration_us = last_secs_duration(line)?;
    pause.worker = find_worker_times(line);
    Some(Event::Pause(pause))
}

/// `14.205: [Full GC (System.gc()) 14.205: [CMS: 12034K->10773K(49152K),
/// 0.0503874 secs] 15605K->10773K(65536K), [CMS Perm : 2726K->2724K(21248K)],
/// 0.0506086 secs]` — the serial full collection under CMS.
fn cms_full(line: &str, ctx: &ClassifyContext) -> Option<Event> {
    if line.contains("(concurrent mode") {
        return None;
    }
    let (ts, rest) = take_timestamp_prefix(line, ctx.jvm_start)?;
    let rest = rest.strip_prefix("[Full GC")?;
    let (trigger, rest) = take_optional_cause(rest.strip_prefix(' ').unwrap_or(rest));
    let rest = match take_uptime_prefix(rest.trim_start()) {
        Some((_, r)) => r,
        None => rest.trim_start(),
    };

    let rest = rest.strip_prefix("[CMS: ")?;
    let (old, rest) = take_mem_triple(rest)?;
    let rest = rest.strip_prefix(", ")?;
    let (_inner_us, rest) = take_secs_duration(rest)?;
    let rest = rest.strip_prefix("] ")?;
    let (combined, mut rest) = take_mem_triple(rest)?;

    let mut pause = make_pause(EventKind::CmsFull, ts, 0, trigger);
    pause.regions.old = Some(old);
    pause.regions.combined = Some(combined);
    pause.regions.derive_young_from_combined();

    rest = rest.trim_start_matches(|c| c == ',' || c == ' ');
    for (tag, perm) in [("[CMS Perm : ", true), ("[Metaspace: ", false)] {
        if let Some(r) = rest.strip_prefix(tag) {
            let (meta, r) = take_mem_triple(r)?;
            rest = r.strip_prefix(']')?.trim_start_matches(|c| c == ',' || c == ' ');
            pause.regions.class_metadata = Some(meta);
            pause.perm_gen = perm;
            break;
        }
    }

    let (duration_us, rest) = take_secs_duration(rest)?;
    rest.strip_prefix(']')?;
    pause.duration_us = duration_us;
    pause.worker = find_worker_times(line);
    Some(Event::Pause(pause))
}

/// ` CMS: abort preclean due to time 7.241: [CMS-concurrent-abortable-preclean:
/// 4.444/5.004 secs]`
fn abort_preclean(line: &str, ctx: &ClassifyContext) -> Option<Event> {
    let rest = line.trim_start().strip_prefix("CMS: abort preclean due to time ")?;
    let (ts, rest) = take_timestamp_prefix(rest, ctx.jvm_start)?;
    let rest = rest.strip_prefix("[CMS-concurrent-abortable-preclean: ")?;
    let (_cpu_us, wall_us, _) = take_phase_times(rest)?;
    Some(Event::Concurrent(ConcurrentEvent {
        kind: EventKind::CmsAbortPrecleanDueToTime,
        timestamp_ms: ts,
        duration_us: Some(wall_us),
        gc_id: None,
    }))
}

const PHASES: &[(&str, EventKind, EventKind)] = &[
    ("abortable-preclean", EventKind::CmsConcurrentAbortablePrecleanStart, EventKind::CmsConcurrentAbortablePreclean),
    ("preclean", EventKind::CmsConcurrentPrecleanStart, EventKind::CmsConcurrentPreclean),
    ("mark", EventKind::CmsConcurrentMarkStart, EventKind::CmsConcurrentMark),
    ("sweep", EventKind::CmsConcurrentSweepStart, EventKind::CmsConcurrentSweep),
    ("reset", EventKind::CmsConcurrentResetStart, EventKind::CmsConcurrentReset),
];

/// `3.443: [CMS-concurrent-mark-start]` and
/// `3.586: [CMS-concurrent-mark: 0.129/0.143 secs]`
fn concurrent_phase(line: &str, ctx: &ClassifyContext) -> Option<Event> {
    let (ts, rest) = take_timestamp_prefix(line, ctx.jvm_start)?;
    let rest = rest.strip_prefix("[CMS-concurrent-")?;
    for &(phase, start_kind, end_kind) in PHASES {
        let Some(after) = rest.strip_prefix(phase) else {
            continue;
        };
        if after.starts_with("-start]") {
            return Some(Event::Concurrent(ConcurrentEvent {
                kind: start_kind,
                timestamp_ms: ts,
                duration_us: None,
                gc_id: None,
            }));
        }
        if let Some(after) = after.strip_prefix(": ") {
            let (_cpu_us, wall_us, _) = take_phase_times(after)?;
            return Some(Event::Concurrent(ConcurrentEvent {
                kind: end_kind,
                timestamp_ms: ts,
                duration_us: Some(wall_us),
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
    use crate::event::{Generation, MemoryAmount};

    fn ctx() -> ClassifyContext {
        ClassifyContext::default()
    }

    #[test]
    fn test_par_new() {
        let line = "8.999: [GC 8.999: [ParNew: 16896K->2048K(16896K), 0.0281567 secs] 40941K->28968K(62656K), 0.0283843 secs]";
        let Event::Pause(p) = par_new(line, &ctx()).unwrap() else {
            panic!()
        };
        assert_eq!(p.kind, EventKind::ParNew);
        assert_eq!(p.duration_ms(), 28);
        let old = p.regions.get(Generation::Old).unwrap();
        assert_eq!(old.before, MemoryAmount::kilobytes(24045));
    }

    #[test]
    fn test_initial_mark() {
        let line = "10.233: [GC (CMS Initial Mark) [1 CMS-initial-mark: 12849K(20288K)] 13166K(27512K), 0.0004845 secs] [Times: user=0.00 sys=0.00, real=0.00 secs]";
        let Event::Pause(p) = initial_mark(line, &ctx()).unwrap() else {
            panic!()
        };
        assert_eq!(p.kind, EventKind::CmsInitialMark);
        assert_eq!(p.timestamp_ms, 10233);
        let old = p.regions.get(Generation::Old).unwrap();
        assert_eq!(old.before, old.after);
        assert_eq!(old.capacity, MemoryAmount::kilobytes(20288));
    }

    #[test]
    fn test_remark_with_subphases() {
        let line = "12.986: [GC (CMS Final Remark) [YG occupancy: 5418 K (18624 K)]12.986: [Rescan (parallel) , 0.0024157 secs]12.989: [weak refs processing, 0.0000061 secs] [1 CMS-remark: 13750K(16384K)] 19168K(35008K), 0.0030918 secs]";
        let Event::Pause(p) = remark(line, &ctx()).unwrap() else {
            panic!()
        };
        assert_eq!(p.kind, EventKind::CmsRemark);
        assert_eq!(p.phases.root_scanning_us, Some(2416));
        assert_eq!(p.phases.other_us, Some(6));
    }

    #[test]
    fn test_remark_class_unloading() {
        let line = "13.0: [GC[YG occupancy: 100 K (1000 K)]13.0: [Rescan (parallel) , 0.001 secs]13.0: [weak refs processing, 0.0001 secs]13.0: [class unloading, 0.002 secs] [1 CMS-remark: 500K(1000K)] 600K(2000K), 0.005 secs]";
        assert_eq!(
            remark(line, &ctx()).unwrap().kind(),
            EventKind::CmsRemarkWithClassUnloading
        );
    }

    #[test]
    fn test_concurrent_mode_failure_composite() {
        // Young figures derive from (combined - old), before with before
        // and after with after.
        let line = "2.807: [GC 2.807: [ParNew (promotion failed): 16384K->16384K(16384K), 0.0230987 secs]2.830: [CMS2.851: [CMS-concurrent-mark: 0.012/0.044 secs] (concurrent mode failure): 31755K->11485K(49152K), 0.0841070 secs] 47115K->11485K(65536K), [CMS Perm : 10756K->10740K(21248K)], 0.1077079 secs]";
        let Event::Pause(p) = concurrent_mode_failure(line, &ctx()).unwrap() else {
            panic!()
        };
        assert_eq!(p.kind, EventKind::ConcurrentModeFailure);
        assert_eq!(p.trigger, Trigger::PromotionFailed);
        assert_eq!(p.duration_ms(), 107);
        assert!(p.perm_gen);

        let young = p.regions.get(Generation::Young).unwrap();
        assert_eq!(young.before, MemoryAmount::kilobytes(47115 - 31755));
        assert_eq!(young.after, MemoryAmount::kilobytes(0));
        assert_eq!(young.capacity, MemoryAmount::kilobytes(65536 - 49152));
    }

    #[test]
    fn test_cms_full_explicit() {
        let line = "14.205: [Full GC (System.gc()) 14.205: [CMS: 12034K->10773K(49152K), 0.0503874 secs] 15605K->10773K(65536K), [CMS Perm : 2726K->2724K(21248K)], 0.0506086 secs]";
        let Event::Pause(p) = cms_full(line, &ctx()).unwrap() else {
            panic!()
        };
        assert_eq!(p.kind, EventKind::CmsFull);
        assert_eq!(p.trigger, Trigger::SystemGc);
        assert_eq!(p.duration_ms(), 50);
    }

    #[test]
    fn test_concurrent_phases() {
        let start = concurrent_phase("3.443: [CMS-concurrent-mark-start]", &ctx()).unwrap();
        assert_eq!(start.kind(), EventKind::CmsConcurrentMarkStart);
        assert_eq!(start.duration_us(), None);

        let end = concurrent_phase("3.586: [CMS-concurrent-mark: 0.129/0.143 secs]", &ctx()).unwrap();
        assert_eq!(end.kind(), EventKind::CmsConcurrentMark);
        assert_eq!(end.duration_ms(), Some(143));

        let pre = concurrent_phase(
            "3.6: [CMS-concurrent-abortable-preclean: 0.030/0.040 secs]",
            &ctx(),
        )
        .unwrap();
        assert_eq!(pre.kind(), EventKind::CmsConcurrentAbortablePreclean);
    }

    #[test]
    fn test_abort_preclean() {
        let line = " CMS: abort preclean due to time 7.241: [CMS-concurrent-abortable-preclean: 4.444/5.004 secs]";
        let event = abort_preclean(line, &ctx()).unwrap();
        assert_eq!(event.kind(), EventKind::CmsAbortPrecleanDueToTime);
        assert_eq!(event.timestamp_ms(), 7241);
    }
}
