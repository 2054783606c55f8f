//! Line classification.
//!
//! The classifier is total: every canonical line becomes exactly one
//! [`Event`], with [`EventKind::Unrecognized`] as the fallback. Matching
//! never panics on unmatched text.
//!
//! Matchers are plain functions grouped per collector family and held in a
//! [`PatternCatalog`] built once at startup. When the current family is
//! known its subset is tried first; lines that are structurally identical
//! across families (unified `Pause Young`, `Pause Full`) resolve their
//! concrete kind from the family context inside the matcher.

pub mod catalog;
pub mod scan;

mod cms;
mod g1;
mod header;
mod parallel;
mod safepoint;
mod serial;
mod shenandoah;
mod unified;

use chrono::{DateTime, Utc};

pub use catalog::PatternCatalog;

use crate::event::{CollectorFamily, Event, EventKind, UnrecognizedEvent};

/// Context a single classification runs under.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClassifyContext {
    /// Family established by earlier header or family-specific lines.
    pub family: CollectorFamily,
    /// Kind of the previously classified event, for lines whose meaning
    /// depends on what preceded them.
    pub previous: Option<EventKind>,
    /// JVM start instant, when the caller knows it; datestamp-only lines
    /// are measured against it instead of the Unix epoch.
    pub jvm_start: Option<DateTime<Utc>>,
}

/// A single line-shape matcher. Returns `None` to decline the line.
pub type Matcher = fn(&str, &ClassifyContext) -> Option<Event>;

/// Pause skeleton the family matchers fill in.
pub(crate) fn make_pause(
    kind: EventKind,
    timestamp_ms: u64,
    duration_us: u64,
    trigger: crate::event::Trigger,
) -> crate::event::PauseEvent {
    crate::event::PauseEvent {
        kind,
        timestamp_ms,
        duration_us,
        trigger,
        regions: crate::event::MemoryRegions::default(),
        worker: None,
        phases: crate::event::SubPhases::default(),
        gc_id: None,
        perm_gen: false,
    }
}

/// Classifies canonical lines against an immutable pattern catalog.
pub struct Classifier<'a> {
    catalog: &'a PatternCatalog,
}

impl<'a> Classifier<'a> {
    pub fn new(catalog: &'a PatternCatalog) -> Self {
        Self { catalog }
    }

    /// Classify one canonical line. Total: unmatched text becomes an
    /// [`Event::Unrecognized`] carrying the line.
    pub fn classify(&self, line: &str, ctx: &ClassifyContext) -> Event {
        let trimmed = line.trim_end();
        if let Some(event) = self.catalog.try_match(trimmed, ctx) {
            return event;
        }
        // Timestamp still extracted when the prefix parses; the line body
        // is preserved for the unidentified-lines report.
        let timestamp_ms = scan::take_timestamp_prefix(trimmed, ctx.jvm_start)
            .map(|(ms, _)| ms)
            .or_else(|| {
                scan::take_unified_decorations(trimmed).and_then(|u| {
                    u.uptime_ms
                        .or_else(|| u.datestamp.map(|d| scan::datestamp_to_ms(d, ctx.jvm_start)))
                })
            })
            .unwrap_or(0);
        Event::Unrecognized(UnrecognizedEvent {
            timestamp_ms,
            line: trimmed.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventCategory, Generation, MemoryAmount, Trigger};

    fn classify(line: &str) -> Event {
        classify_with(line, ClassifyContext::default())
    }

    fn classify_with(line: &str, ctx: ClassifyContext) -> Event {
        let catalog = PatternCatalog::new();
        Classifier::new(&catalog).classify(line, &ctx)
    }

    #[test]
    fn test_totality_on_garbage() {
        for line in [
            "",
            "complete nonsense",
            "12345",
            "[GC",
            "19810.091: [GC [PSYoungGen: not numbers]",
            "\u{1F980} unicode garbage",
        ] {
            let event = classify(line);
            // Must return exactly one event, unrecognized at worst.
            let _ = event.kind();
        }
    }

    #[test]
    fn test_end_to_end_psyounggen() {
        let line = "19810.091: [GC [PSYoungGen: 27808K->632K(28032K)] 160183K->133159K(585088K), 0.0225213 secs]";
        let event = classify(line);
        let Event::Pause(pause) = &event else {
            panic!("expected pause, got {event:?}");
        };
        assert_eq!(pause.kind, EventKind::PsYoung);
        assert_eq!(pause.timestamp_ms, 19810091);
        assert_eq!(pause.duration_ms(), 22);

        let young = pause.regions.get(Generation::Young).unwrap();
        assert_eq!(young.before, MemoryAmount::kilobytes(27808));
        assert_eq!(young.after, MemoryAmount::kilobytes(632));
        assert_eq!(young.capacity, MemoryAmount::kilobytes(28032));

        let old = pause.regions.get(Generation::Old).unwrap();
        assert_eq!(old.before, MemoryAmount::kilobytes(132375));
        assert_eq!(old.after, MemoryAmount::kilobytes(132527));
        assert_eq!(old.capacity, MemoryAmount::kilobytes(557056));
    }

    #[test]
    fn test_family_subset_resolves_unified_young() {
        let line = "[0.5s][info][gc] GC(3) Pause Young (Allocation Failure) 24M->4M(256M) 3.456ms";

        let under_serial = classify_with(
            line,
            ClassifyContext { family: CollectorFamily::Serial, ..Default::default() },
        );
        assert_eq!(under_serial.kind(), EventKind::DefNew);

        let under_cms = classify_with(
            line,
            ClassifyContext { family: CollectorFamily::Cms, ..Default::default() },
        );
        assert_eq!(under_cms.kind(), EventKind::ParNew);

        let unknown = classify_with(line, ClassifyContext::default());
        assert_eq!(unknown.kind(), EventKind::GenericYoung);
    }

    #[test]
    fn test_unrecognized_keeps_timestamp_and_text() {
        let event = classify("123.456: utterly novel line shape");
        let Event::Unrecognized(u) = &event else {
            panic!("expected unrecognized");
        };
        assert_eq!(u.timestamp_ms, 123456);
        assert!(u.line.contains("novel"));
        assert_eq!(event.category(), EventCategory::Unrecognized);
    }

    #[test]
    fn test_missing_trigger_is_none() {
        let line = "19810.091: [GC [PSYoungGen: 27808K->632K(28032K)] 160183K->133159K(585088K), 0.0225213 secs]";
        assert_eq!(classify(line).trigger(), Trigger::None);
    }
}
