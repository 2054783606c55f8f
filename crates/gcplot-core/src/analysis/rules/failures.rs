//! Collector failure-mode findings: a concurrent cycle losing the race
//! with allocation, promotion and evacuation failures, and degenerated
//! collectors falling back to full collections.

use crate::event::{Event, EventKind, Trigger};

use super::{DiagnosticRule, Finding, FindingCode, RuleContext, Severity};

pub struct ConcurrentModeFailureRule;

impl DiagnosticRule for ConcurrentModeFailureRule {
    fn code(&self) -> FindingCode {
        FindingCode::ConcurrentModeFailure
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Finding> {
        (ctx.event.kind() == EventKind::ConcurrentModeFailure).then(|| Finding {
            code: self.code(),
            severity: Severity::Critical,
            at_event_index: ctx.event_index,
            message: format!(
                "concurrent mode failure: CMS lost the race with allocation ({} ms full collection)",
                ctx.event.duration_ms().unwrap_or(0)
            ),
        })
    }
}

pub struct ConcurrentModeInterruptedRule;

impl DiagnosticRule for ConcurrentModeInterruptedRule {
    fn code(&self) -> FindingCode {
        FindingCode::ConcurrentModeInterrupted
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Finding> {
        (ctx.event.kind() == EventKind::ConcurrentModeInterrupted).then(|| Finding {
            code: self.code(),
            severity: Severity::Warning,
            at_event_index: ctx.event_index,
            message: "concurrent mode interrupted: a full collection cut the CMS cycle short"
                .to_string(),
        })
    }
}

pub struct PromotionFailureRule;

impl DiagnosticRule for PromotionFailureRule {
    fn code(&self) -> FindingCode {
        FindingCode::PromotionFailure
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Finding> {
        let promotion_failed = ctx.event.trigger() == Trigger::PromotionFailed
            || matches!(
                ctx.event.kind(),
                EventKind::ParNewPromotionFailed | EventKind::DefNewPromotionFailed
            );
        promotion_failed.then(|| Finding {
            code: self.code(),
            severity: Severity::Critical,
            at_event_index: ctx.event_index,
            message: "promotion failed: the old generation could not absorb surviving objects"
                .to_string(),
        })
    }
}

pub struct EvacuationFailureRule;

impl DiagnosticRule for EvacuationFailureRule {
    fn code(&self) -> FindingCode {
        FindingCode::EvacuationFailure
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Finding> {
        let exhausted = matches!(
            ctx.event.trigger(),
            Trigger::ToSpaceExhausted | Trigger::ToSpaceOverflow
        );
        exhausted.then(|| Finding {
            code: self.code(),
            severity: Severity::Critical,
            at_event_index: ctx.event_index,
            message: "evacuation failure: to-space exhausted during a G1 pause".to_string(),
        })
    }
}

pub struct DegeneratedCycleRule;

impl DiagnosticRule for DegeneratedCycleRule {
    fn code(&self) -> FindingCode {
        FindingCode::DegeneratedConcurrentCycle
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Finding> {
        let degenerated = ctx.event.kind() == EventKind::ShenandoahDegenerated
            || ctx.event.kind() == EventKind::ShenandoahCancellingGc;
        degenerated.then(|| Finding {
            code: self.code(),
            severity: Severity::Warning,
            at_event_index: ctx.event_index,
            message: "a concurrent cycle degenerated into a stop-the-world collection".to_string(),
        })
    }
}

pub struct FullGcFallbackRule;

impl DiagnosticRule for FullGcFallbackRule {
    fn code(&self) -> FindingCode {
        FindingCode::FullGcFallback
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Finding> {
        // An unrecoverable fault: the concurrent collector gave up
        // entirely and ran its full stop-the-world collection for a
        // non-explicit reason.
        let Event::Pause(pause) = ctx.event else {
            return None;
        };
        let fallback = matches!(pause.kind, EventKind::ShenandoahFull | EventKind::G1Full)
            && pause.trigger != Trigger::SystemGc
            && !pause.trigger.is_explicit_request();
        fallback.then(|| Finding {
            code: self.code(),
            severity: Severity::Critical,
            at_event_index: ctx.event_index,
            message: format!(
                "{} fell back to a full stop-the-world collection ({} ms)",
                ctx.family.name(),
                pause.duration_ms()
            ),
        })
    }
}

pub struct AllocationStallRule;

impl DiagnosticRule for AllocationStallRule {
    fn code(&self) -> FindingCode {
        FindingCode::AllocationStall
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Finding> {
        (ctx.event.kind() == EventKind::ZAllocationStall).then(|| Finding {
            code: self.code(),
            severity: Severity::Critical,
            at_event_index: ctx.event_index,
            message: "allocation stalled waiting for the concurrent collector".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Thresholds;
    use crate::event::{CollectorFamily, MemoryRegions, PauseEvent, SubPhases};

    fn pause(kind: EventKind, trigger: Trigger) -> Event {
        Event::Pause(PauseEvent {
            kind,
            timestamp_ms: 1000,
            duration_us: 100_000,
            trigger,
            regions: MemoryRegions::default(),
            worker: None,
            phases: SubPhases::default(),
            gc_id: None,
            perm_gen: false,
        })
    }

    fn ctx<'a>(event: &'a Event, thresholds: &'a Thresholds) -> RuleContext<'a> {
        RuleContext {
            event,
            family: CollectorFamily::Cms,
            event_index: 3,
            thresholds,
        }
    }

    #[test]
    fn test_concurrent_mode_failure_critical() {
        let t = Thresholds::default();
        let event = pause(EventKind::ConcurrentModeFailure, Trigger::PromotionFailed);
        let finding = ConcurrentModeFailureRule.evaluate(&ctx(&event, &t)).unwrap();
        assert_eq!(finding.severity, Severity::Critical);
    }

    #[test]
    fn test_promotion_failure_from_trigger_or_kind() {
        let t = Thresholds::default();
        let by_trigger = pause(EventKind::ParNew, Trigger::PromotionFailed);
        assert!(PromotionFailureRule.evaluate(&ctx(&by_trigger, &t)).is_some());

        let by_kind = pause(EventKind::DefNewPromotionFailed, Trigger::None);
        assert!(PromotionFailureRule.evaluate(&ctx(&by_kind, &t)).is_some());
    }

    #[test]
    fn test_evacuation_failure() {
        let t = Thresholds::default();
        let event = pause(EventKind::G1Young, Trigger::ToSpaceExhausted);
        assert!(EvacuationFailureRule.evaluate(&ctx(&event, &t)).is_some());
    }

    #[test]
    fn test_full_fallback_ignores_explicit() {
        let t = Thresholds::default();
        let explicit = pause(EventKind::G1Full, Trigger::SystemGc);
        assert!(FullGcFallbackRule.evaluate(&ctx(&explicit, &t)).is_none());

        let organic = pause(EventKind::G1Full, Trigger::AllocationFailure);
        assert!(FullGcFallbackRule.evaluate(&ctx(&organic, &t)).is_some());
    }
}
