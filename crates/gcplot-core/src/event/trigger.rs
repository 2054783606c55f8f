//! GC triggers — the JVM-reported reason a collection occurred.
//!
//! HotSpot prints the cause in parentheses after the collection name, in
//! both legacy (`[GC (System.gc()) ...`) and unified
//! (`Pause Young (Normal) (G1 Evacuation Pause)`) formats. The literal
//! table below is built once into the pattern catalog; an unmatched cause
//! string maps to [`Trigger::Unknown`], a line with no cause at all to
//! [`Trigger::None`].

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    None,
    Unknown,
    // Explicit requests
    SystemGc,
    DiagnosticCommand,
    JvmtiForceGc,
    HeapInspection,
    HeapDump,
    WhiteBoxYoung,
    WhiteBoxFull,
    WhiteBoxConcurrentMark,
    // Allocation pressure
    AllocationFailure,
    AllocationProfiler,
    AllocationRate,
    AllocationStall,
    GcLocker,
    Ergonomics,
    // Metaspace / permanent generation
    MetadataGcThreshold,
    MetadataGcClearSoftRefs,
    LastDitchCollection,
    PermGenFull,
    // Failure modes
    PromotionFailed,
    ConcurrentModeFailure,
    ConcurrentModeInterrupted,
    ToSpaceExhausted,
    ToSpaceOverflow,
    UpgradeToFullGc,
    // CMS phases reported as causes
    CmsInitialMark,
    CmsFinalRemark,
    // G1
    G1EvacuationPause,
    HumongousAllocation,
    G1CompactionPause,
    G1PeriodicCollection,
    G1PreventiveCollection,
    // Z
    Timer,
    Warmup,
    Proactive,
    HighUsage,
    OutOfMemory,
    // Shenandoah
    ConcurrentGc,
    DegeneratedGc,
    // Test and tooling causes
    FullGcAlot,
    ScavengeAlot,
    UpdateAllocationContextStats,
    CodeCacheGcThreshold,
    NoGc,
}

/// Cause text exactly as HotSpot prints it, most specific first where one
/// literal is a prefix of another.
const TRIGGER_LITERALS: &[(&str, Trigger)] = &[
    ("System.gc()", Trigger::SystemGc),
    ("Diagnostic Command", Trigger::DiagnosticCommand),
    ("JvmtiEnv ForceGarbageCollection", Trigger::JvmtiForceGc),
    ("Heap Inspection Initiated GC", Trigger::HeapInspection),
    ("Heap Dump Initiated GC", Trigger::HeapDump),
    ("WhiteBox Initiated Young GC", Trigger::WhiteBoxYoung),
    ("WhiteBox Initiated Full GC", Trigger::WhiteBoxFull),
    ("WhiteBox Initiated Concurrent Mark", Trigger::WhiteBoxConcurrentMark),
    ("Allocation Failure During Evacuation", Trigger::AllocationFailure),
    ("Allocation Failure", Trigger::AllocationFailure),
    ("Allocation Profiler", Trigger::AllocationProfiler),
    ("Allocation Rate", Trigger::AllocationRate),
    ("Allocation Stall", Trigger::AllocationStall),
    ("GCLocker Initiated GC", Trigger::GcLocker),
    ("Ergonomics", Trigger::Ergonomics),
    ("Metadata GC Clear Soft References", Trigger::MetadataGcClearSoftRefs),
    ("Metadata GC Threshold", Trigger::MetadataGcThreshold),
    ("Last ditch collection", Trigger::LastDitchCollection),
    ("PermGen Full", Trigger::PermGenFull),
    ("promotion failed", Trigger::PromotionFailed),
    ("concurrent mode failure", Trigger::ConcurrentModeFailure),
    ("concurrent mode interrupted", Trigger::ConcurrentModeInterrupted),
    ("To-space Exhausted", Trigger::ToSpaceExhausted),
    ("to-space exhausted", Trigger::ToSpaceExhausted),
    ("to-space overflow", Trigger::ToSpaceOverflow),
    ("Upgrade To Full GC", Trigger::UpgradeToFullGc),
    ("CMS Initial Mark", Trigger::CmsInitialMark),
    ("CMS Final Remark", Trigger::CmsFinalRemark),
    ("G1 Evacuation Pause", Trigger::G1EvacuationPause),
    ("G1 Humongous Allocation", Trigger::HumongousAllocation),
    ("Humongous Allocation", Trigger::HumongousAllocation),
    ("G1 Compaction Pause", Trigger::G1CompactionPause),
    ("G1 Periodic Collection", Trigger::G1PeriodicCollection),
    ("G1 Preventive Collection", Trigger::G1PreventiveCollection),
    ("Timer", Trigger::Timer),
    ("Warmup", Trigger::Warmup),
    ("Proactive", Trigger::Proactive),
    ("High Usage", Trigger::HighUsage),
    ("Out of Memory", Trigger::OutOfMemory),
    ("Concurrent GC", Trigger::ConcurrentGc),
    ("Degenerated GC", Trigger::DegeneratedGc),
    ("FullGCAlot", Trigger::FullGcAlot),
    ("ScavengeAlot", Trigger::ScavengeAlot),
    ("Update Allocation Context Stats", Trigger::UpdateAllocationContextStats),
    ("CodeCache GC Threshold", Trigger::CodeCacheGcThreshold),
    ("No GC", Trigger::NoGc),
];

impl Trigger {
    /// Map a cause string (the text inside the parentheses) to a trigger.
    pub fn from_cause(cause: &str) -> Trigger {
        let cause = cause.trim();
        if cause.is_empty() {
            return Trigger::None;
        }
        for &(literal, trigger) in TRIGGER_LITERALS {
            if cause == literal {
                return trigger;
            }
        }
        Trigger::Unknown
    }

    /// Scan a line for the first parenthesized cause that matches the
    /// literal table. Returns [`Trigger::None`] when no parenthesized
    /// group matches; a line without a cause is not an error.
    pub fn find_in(line: &str) -> Trigger {
        let mut rest = line;
        while let Some(open) = rest.find('(') {
            let tail = &rest[open + 1..];
            let Some(close) = tail.find(')') else { break };
            let matched = Trigger::from_cause(&tail[..close]);
            if matched != Trigger::None && matched != Trigger::Unknown {
                return matched;
            }
            rest = &tail[close + 1..];
        }
        Trigger::None
    }

    /// True for causes that represent an externally requested collection
    /// rather than organic allocation pressure.
    pub fn is_explicit_request(&self) -> bool {
        matches!(
            self,
            Trigger::SystemGc
                | Trigger::DiagnosticCommand
                | Trigger::JvmtiForceGc
                | Trigger::HeapInspection
                | Trigger::HeapDump
        )
    }
}
