//! Diagnostic rules.
//!
//! Each rule is an independent boolean predicate over the current event
//! and the carried family context. A rule produces at most one finding
//! per run; the aggregator checks the fired-code set before evaluating,
//! so repeated evidence never duplicates a finding. Rules neither see nor
//! depend on each other's firing order.

pub mod explicit_gc;
pub mod failures;
pub mod parallelism;
pub mod triggers;

use serde::Serialize;

use crate::event::{CollectorFamily, Event};

use super::Thresholds;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

/// Stable diagnostic codes; the reporting layer maps them to message
/// templates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCode {
    ExplicitGcSerial,
    ExplicitGcParallel,
    ExplicitGcConcurrent,
    ConcurrentModeFailure,
    ConcurrentModeInterrupted,
    PromotionFailure,
    EvacuationFailure,
    HeapDumpCollection,
    HeapInspectionCollection,
    JvmtiForcedCollection,
    DiagnosticCommandCollection,
    GcLockerCollection,
    MetaspaceThresholdCollection,
    LastDitchCollection,
    HumongousAllocationTrigger,
    LowParallelismRemark,
    LowParallelismYoung,
    ClassUnloadingDisabled,
    PermGenInUse,
    DegeneratedConcurrentCycle,
    FullGcFallback,
    AllocationStall,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub code: FindingCode,
    pub severity: Severity,
    /// Index of the event that produced the evidence.
    pub at_event_index: usize,
    pub message: String,
}

pub struct RuleContext<'a> {
    pub event: &'a Event,
    /// Collector family in effect when the event was classified.
    pub family: CollectorFamily,
    pub event_index: usize,
    pub thresholds: &'a Thresholds,
}

pub trait DiagnosticRule: Send + Sync {
    fn code(&self) -> FindingCode;
    fn evaluate(&self, ctx: &RuleContext) -> Option<Finding>;
}

pub fn all_rules() -> Vec<Box<dyn DiagnosticRule>> {
    vec![
        // Explicit collections, severity by collector family
        Box::new(explicit_gc::ExplicitGcSerialRule),
        Box::new(explicit_gc::ExplicitGcParallelRule),
        Box::new(explicit_gc::ExplicitGcConcurrentRule),
        // Collector failure modes
        Box::new(failures::ConcurrentModeFailureRule),
        Box::new(failures::ConcurrentModeInterruptedRule),
        Box::new(failures::PromotionFailureRule),
        Box::new(failures::EvacuationFailureRule),
        Box::new(failures::DegeneratedCycleRule),
        Box::new(failures::FullGcFallbackRule),
        Box::new(failures::AllocationStallRule),
        // Trigger-driven diagnostics
        Box::new(triggers::HeapDumpRule),
        Box::new(triggers::HeapInspectionRule),
        Box::new(triggers::JvmtiForcedRule),
        Box::new(triggers::DiagnosticCommandRule),
        Box::new(triggers::GcLockerRule),
        Box::new(triggers::MetaspaceThresholdRule),
        Box::new(triggers::LastDitchRule),
        Box::new(triggers::HumongousAllocationRule),
        Box::new(triggers::PermGenRule),
        Box::new(triggers::ClassUnloadingDisabledRule),
        // Worker parallelism
        Box::new(parallelism::LowParallelismRemarkRule),
        Box::new(parallelism::LowParallelismYoungRule),
    ]
}
