//! Serial collector line shapes.
//!
//! Serial logs nest an inner uptime before the generation report
//! (`4.203: [GC 4.203: [DefNew: ...`); the inner duration covers the
//! young copy alone and the outer duration the whole pause, so the outer
//! one is the event duration.

use crate::event::{Event, EventKind, Trigger};

use super::scan::{
    find_worker_times, take_mem_triple, take_optional_cause, take_secs_duration,
    take_timestamp_prefix, take_uptime_prefix,
};
use super::{ClassifyContext, Matcher, make_pause};

pub(super) const MATCHERS: &[Matcher] = &[serial_full, def_new];

/// `4.203: [GC 4.203: [DefNew: 68096K->8512K(76608K), 0.0525211 secs]
/// 68096K->15562K(251648K), 0.0527053 secs]`
fn def_new(line: &str, ctx: &ClassifyContext) -> Option<Event> {
    let (ts, rest) = take_timestamp_prefix(line, ctx.jvm_start)?;
    let rest = rest.strip_prefix("[GC")?;
    let (trigger, rest) = take_optional_cause(rest.strip_prefix(' ').unwrap_or(rest));
    let rest = match take_uptime_prefix(rest.trim_start()) {
        Some((_, r)) => r,
        None => rest.trim_start(),
    };

    let rest = rest.strip_prefix("[DefNew")?;
    let (kind, trigger, rest) = match rest.strip_prefix(" (promotion failed)") {
        Some(r) => (EventKind::DefNewPromotionFailed, Trigger::PromotionFailed, r),
        None => (EventKind::DefNew, trigger, rest),
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

/// `11.675: [Full GC 11.675: [Tenured: 43439K->43439K(43712K), 0.1892530 secs]
/// 60375K->46332K(63104K), [Perm : 2710K->2710K(21248K)], 0.1893102 secs]`
fn serial_full(line: &str, ctx: &ClassifyContext) -> Option<Event> {
    let (ts, rest) = take_timestamp_prefix(line, ctx.jvm_start)?;
    let rest = rest.strip_prefix("[Full GC")?;
    let (trigger, rest) = take_optional_cause(rest.strip_prefix(' ').unwrap_or(rest));
    let rest = match take_uptime_prefix(rest.trim_start()) {
        Some((_, r)) => r,
        None => rest.trim_start(),
    };

    let rest = rest.strip_prefix("[Tenured: ")?;
    let (old, rest) = take_mem_triple(rest)?;
    let rest = rest.strip_prefix(", ")?;
    let (_inner_us, rest) = take_secs_duration(rest)?;
    let rest = rest.strip_prefix("] ")?;
    let (combined, mut rest) = take_mem_triple(rest)?;

    let mut pause = make_pause(EventKind::SerialFull, ts, 0, trigger);
    pause.regions.old = Some(old);
    pause.regions.combined = Some(combined);
    pause.regions.derive_young_from_combined();

    rest = rest.trim_start_matches(|c| c == ',' || c == ' ');
    for (tag, perm) in [("[Perm : ", true), ("[Metaspace: ", false)] {
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
