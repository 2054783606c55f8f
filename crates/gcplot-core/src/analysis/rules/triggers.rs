//! Trigger-driven findings: collections provoked by tooling, metaspace
//! pressure, humongous allocation, and legacy configuration.

use crate::event::{Event, EventKind, Trigger};

use super::{DiagnosticRule, Finding, FindingCode, RuleContext, Severity};

/// A rule that fires on a specific trigger with a fixed severity; the
/// pattern covers most of the tool-provoked collection diagnostics.
macro_rules! trigger_rule {
    ($name:ident, $code:expr, $severity:expr, $triggers:pat, $message:expr) => {
        pub struct $name;

        impl DiagnosticRule for $name {
            fn code(&self) -> FindingCode {
                $code
            }

            fn evaluate(&self, ctx: &RuleContext) -> Option<Finding> {
                matches!(ctx.event.trigger(), $triggers).then(|| Finding {
                    code: $code,
                    severity: $severity,
                    at_event_index: ctx.event_index,
                    message: $message.to_string(),
                })
            }
        }
    };
}

trigger_rule!(
    HeapDumpRule,
    FindingCode::HeapDumpCollection,
    Severity::Info,
    Trigger::HeapDump,
    "a heap dump forced a collection"
);

trigger_rule!(
    HeapInspectionRule,
    FindingCode::HeapInspectionCollection,
    Severity::Info,
    Trigger::HeapInspection,
    "a heap inspection (jmap -histo:live or similar) forced a collection"
);

trigger_rule!(
    JvmtiForcedRule,
    FindingCode::JvmtiForcedCollection,
    Severity::Info,
    Trigger::JvmtiForceGc,
    "a JVMTI agent forced a collection"
);

trigger_rule!(
    DiagnosticCommandRule,
    FindingCode::DiagnosticCommandCollection,
    Severity::Info,
    Trigger::DiagnosticCommand,
    "a diagnostic command (jcmd GC.run or similar) forced a collection"
);

trigger_rule!(
    GcLockerRule,
    FindingCode::GcLockerCollection,
    Severity::Warning,
    Trigger::GcLocker,
    "a collection was deferred and then forced by the GC locker"
);

trigger_rule!(
    MetaspaceThresholdRule,
    FindingCode::MetaspaceThresholdCollection,
    Severity::Warning,
    Trigger::MetadataGcThreshold | Trigger::MetadataGcClearSoftRefs,
    "metaspace pressure triggered collections; consider raising MetaspaceSize"
);

trigger_rule!(
    LastDitchRule,
    FindingCode::LastDitchCollection,
    Severity::Critical,
    Trigger::LastDitchCollection,
    "a last-ditch collection ran after a metaspace allocation failure"
);

trigger_rule!(
    HumongousAllocationRule,
    FindingCode::HumongousAllocationTrigger,
    Severity::Warning,
    Trigger::HumongousAllocation,
    "humongous allocations are forcing collections; objects exceed half a G1 region"
);

pub struct PermGenRule;

impl DiagnosticRule for PermGenRule {
    fn code(&self) -> FindingCode {
        FindingCode::PermGenInUse
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Finding> {
        let Event::Pause(pause) = ctx.event else {
            return None;
        };
        pause.perm_gen.then(|| Finding {
            code: self.code(),
            severity: Severity::Info,
            at_event_index: ctx.event_index,
            message: "the log reports a permanent generation; this JVM predates metaspace"
                .to_string(),
        })
    }
}

pub struct ClassUnloadingDisabledRule;

impl DiagnosticRule for ClassUnloadingDisabledRule {
    fn code(&self) -> FindingCode {
        FindingCode::ClassUnloadingDisabled
    }

    fn evaluate(&self, ctx: &RuleContext) -> Option<Finding> {
        // A plain CMS remark means -XX:+CMSClassUnloadingEnabled was off;
        // classes accumulate until a full collection.
        (ctx.event.kind() == EventKind::CmsRemark).then(|| Finding {
            code: self.code(),
            severity: Severity::Warning,
            at_event_index: ctx.event_index,
            message: "CMS remark ran without class unloading".to_string(),
        })
    }
}
