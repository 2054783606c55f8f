//! Parallel (throughput) collector line shapes.
//!
//! `PSYoungGen` scavenges report young plus combined figures; the old
//! generation is derived by subtraction. Full collections report every
//! generation explicitly, including the permanent generation on pre-8
//! JVMs and metaspace afterwards.

use crate::event::{Event, EventKind, Trigger};

use super::scan::{
    find_worker_times, take_mem_triple, take_optional_cause, take_secs_duration,
    take_timestamp_prefix,
};
use super::{ClassifyContext, Matcher, make_pause};

pub(super) const MATCHERS: &[Matcher] = &[ps_full, ps_young];

/// `19810.091: [GC [PSYoungGen: 27808K->632K(28032K)] 160183K->133159K(585088K), 0.0225213 secs]`
/// with an optional cause after `[GC` on 8+ and `[GC--` for a failed
/// scavenge.
fn ps_young(line: &str, ctx: &ClassifyContext) -> Option<Event> {
    let (ts, rest) = take_timestamp_prefix(line, ctx.jvm_start)?;
    let rest = rest.strip_prefix("[GC")?;
    let (trigger, rest) = match rest.strip_prefix("--") {
        Some(r) => (Trigger::PromotionFailed, r),
        None => take_optional_cause(rest.strip_prefix(' ').unwrap_or(rest)),
    };

    let rest = rest.trim_start().strip_prefix("[PSYoungGen: ")?;
    let (young, rest) = take_mem_triple(rest)?;
    let rest = rest.strip_prefix("] ")?;
    let (combined, rest) = take_mem_triple(rest)?;
    let rest = rest.strip_prefix(", ")?;
    let (duration_us, rest) = take_secs_duration(rest)?;
    rest.strip_prefix(']')?;

    let mut pause = make_pause(EventKind::PsYoung, ts, duration_us, trigger);
    pause.regions.young = Some(young);
    pause.regions.combined = Some(combined);
    pause.regions.derive_old_from_combined();
    pause.worker = find_worker_times(line);
    Some(Event::Pause(pause))
}

/// `[Full GC (System.gc()) [PSYoungGen: ...] [ParOldGen: ...] <combined>,
/// [Metaspace: ...], 0.0589214 secs]`; pre-8 logs print `[PSPermGen: ...]`.
fn ps_full(line: &str, ctx: &ClassifyContext) -> Option<Event> {
    let (ts, rest) = take_timestamp_prefix(line, ctx.jvm_start)?;
    let rest = rest.strip_prefix("[Full GC")?;
    let (trigger, rest) = take_optional_cause(rest.strip_prefix(' ').unwrap_or(rest));

    let rest = rest.trim_start().strip_prefix("[PSYoungGen: ")?;
    let (young, rest) = take_mem_triple(rest)?;
    let rest = rest.strip_prefix("] ")?;
    let rest = rest.strip_prefix("[ParOldGen: ")?;
    let (old, rest) = take_mem_triple(rest)?;
    let rest = rest.strip_prefix("] ")?;
    let (combined, mut rest) = take_mem_triple(rest)?;

    let mut pause = make_pause(EventKind::PsFull, ts, 0, trigger);
    pause.regions.young = Some(young);
    pause.regions.old = Some(old);
    pause.regions.combined = Some(combined);

    rest = rest.trim_start_matches(|c| c == ',' || c == ' ');
    for (tag, perm) in [("[PSPermGen: ", true), ("[Metaspace: ", false)] {
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
