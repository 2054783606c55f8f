//! Low-parallelism findings for CMS pauses.
//!
//! Parallelism is `(user + sys) / real`. A long pause whose parallelism
//! sits below the configured ratio means the parallel workers were
//! starved or the pause is effectively single-threaded. Only pauses at or
//! above the configured duration floor are judged; short pauses have too
//! much measurement noise.

use crate::event::{Event, EventKind};

use super::{DiagnosticRule, Finding, FindingCode, RuleContext, Severity};

fn low_parallelism(ctx: &RuleContext, kinds: &[EventKind]) -> Option<f64> {
    let Event::Pause(pause) = ctx.event else {
        return None;
    };
    if !kinds.contains(&pause.kind) {
        return None;
    }
    if pause.duration_us < ctx.thresholds.low_parallelism_floor_us {
        return None;
    }
    let times = pause.worker?;
    if times.flagged() || times.real_us == 0 {
        return None;
    }
    let parallelism = (times.user_us + times.sys_us) as f64 / times.real_us as f64;
    (parallelism < ctx.thresholds.low_parallelism_ratio).then_some(parallelism)
}

pub struct LowParallelismRemarkRule;

impl DiagnosticRule for LowParallelismRemarkRule {
    fn code(&self) -> FindingCode {
        FindingCode::LowParallelismRemark
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Finding> {
        let parallelism = low_parallelism(
            ctx,
            &[EventKind::CmsRemark, EventKind::CmsRemarkWithClassUnloading],
        )?;
        Some(Finding {
            code: self.code(),
            severity: Severity::Warning,
            at_event_index: ctx.event_index,
            message: format!("CMS remark ran at {parallelism:.2}x parallelism"),
        })
    }
}

pub struct LowParallelismYoungRule;

impl DiagnosticRule for LowParallelismYoungRule {
    fn code(&self) -> FindingCode {
        FindingCode::LowParallelismYoung
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Finding> {
        let parallelism = low_parallelism(
            ctx,
            &[
                EventKind::ParNew,
                EventKind::ParNewPromotionFailed,
                EventKind::ParNewToSpaceOverflow,
            ],
        )?;
        Some(Finding {
            code: self.code(),
            severity: Severity::Warning,
            at_event_index: ctx.event_index,
            message: format!("ParNew ran at {parallelism:.2}x parallelism"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Thresholds;
    use crate::event::{
        CollectorFamily, MemoryRegions, PauseEvent, SubPhases, Trigger, WorkerTimes,
    };

    fn remark(duration_us: u64, user_us: u64, real_us: i64) -> Event {
        Event::Pause(PauseEvent {
            kind: EventKind::CmsRemark,
            timestamp_ms: 1000,
            duration_us,
            trigger: Trigger::CmsFinalRemark,
            regions: MemoryRegions::default(),
            worker: Some(WorkerTimes {
                user_us,
                sys_us: 0,
                real_us,
            }),
            phases: SubPhases::default(),
            gc_id: None,
            perm_gen: false,
        })
    }

    fn ctx<'a>(event: &'a Event, thresholds: &'a Thresholds) -> RuleContext<'a> {
        RuleContext {
            event,
            family: CollectorFamily::Cms,
            event_index: 0,
            thresholds,
        }
    }

    #[test]
    fn test_fires_below_ratio_above_floor() {
        let t = Thresholds::default();
        // 20ms pause, parallelism 10/40 = 0.25 < 0.5
        let event = remark(20_000, 10_000, 40_000);
        assert!(LowParallelismRemarkRule.evaluate(&ctx(&event, &t)).is_some());
    }

    #[test]
    fn test_short_pause_exempt() {
        let t = Thresholds::default();
        // Below the 10ms floor.
        let event = remark(5_000, 1_000, 5_000);
        assert!(LowParallelismRemarkRule.evaluate(&ctx(&event, &t)).is_none());
    }

    #[test]
    fn test_healthy_parallelism_exempt() {
        let t = Thresholds::default();
        let event = remark(20_000, 60_000, 20_000);
        assert!(LowParallelismRemarkRule.evaluate(&ctx(&event, &t)).is_none());
    }
}
