//! Explicit-collection findings.
//!
//! `System.gc()` under a stop-the-world collector costs one full pause;
//! under a concurrent collector it serializes the whole heap through a
//! single-threaded full collection, so the severity rises with the
//! family.

use crate::event::{CollectorFamily, Event, EventCategory, Trigger};

use super::{DiagnosticRule, Finding, FindingCode, RuleContext, Severity};

fn explicit_full<'a>(ctx: &RuleContext<'a>) -> Option<&'a crate::event::PauseEvent> {
    let Event::Pause(pause) = ctx.event else {
        return None;
    };
    if pause.trigger != Trigger::SystemGc {
        return None;
    }
    matches!(
        pause.kind.category(),
        EventCategory::Full | EventCategory::Young
    )
    .then_some(pause)
}

pub struct ExplicitGcSerialRule;

impl DiagnosticRule for ExplicitGcSerialRule {
    fn code(&self) -> FindingCode {
        FindingCode::ExplicitGcSerial
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Finding> {
        let pause = explicit_full(ctx)?;
        if ctx.family != CollectorFamily::Serial {
            return None;
        }
        Some(Finding {
            code: self.code(),
            severity: Severity::Warning,
            at_event_index: ctx.event_index,
            message: format!(
                "explicit System.gc() ran a serial full collection ({} ms)",
                pause.duration_ms()
            ),
        })
    }
}

pub struct ExplicitGcParallelRule;

impl DiagnosticRule for ExplicitGcParallelRule {
    fn code(&self) -> FindingCode {
        FindingCode::ExplicitGcParallel
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Finding> {
        let pause = explicit_full(ctx)?;
        if ctx.family != CollectorFamily::Parallel {
            return None;
        }
        Some(Finding {
            code: self.code(),
            severity: Severity::Warning,
            at_event_index: ctx.event_index,
            message: format!(
                "explicit System.gc() forced a parallel full collection ({} ms)",
                pause.duration_ms()
            ),
        })
    }
}

pub struct ExplicitGcConcurrentRule;

impl DiagnosticRule for ExplicitGcConcurrentRule {
    fn code(&self) -> FindingCode {
        FindingCode::ExplicitGcConcurrent
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Finding> {
        let pause = explicit_full(ctx)?;
        if !ctx.family.is_concurrent_collector() {
            return None;
        }
        Some(Finding {
            code: self.code(),
            severity: Severity::Critical,
            at_event_index: ctx.event_index,
            message: format!(
                "explicit System.gc() under {} ran a stop-the-world full collection ({} ms)",
                ctx.family.name(),
                pause.duration_ms()
            ),
        })
    }
}
