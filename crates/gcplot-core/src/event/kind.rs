//! The closed set of event kinds the classifier can produce.
//!
//! Two decades of HotSpot logging produce a wide but finite vocabulary of
//! collection and phase reports. Each kind knows its reporting category,
//! the collector family it belongs to, and whether it stops application
//! threads. Consumption sites match exhaustively; adding a kind is a
//! compile-time visible change.

use serde::{Deserialize, Serialize};

use super::family::CollectorFamily;

/// Reporting category a kind is aggregated under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    Young,
    Full,
    Concurrent,
    Safepoint,
    StoppedTime,
    Header,
    Warning,
    Unrecognized,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    // --- Serial ---
    DefNew,
    DefNewPromotionFailed,
    SerialFull,
    SerialOldCompaction,

    // --- Parallel ---
    PsYoung,
    PsFull,
    PsSerialOld,

    // --- CMS stop-the-world ---
    ParNew,
    ParNewPromotionFailed,
    ParNewToSpaceOverflow,
    CmsInitialMark,
    CmsRemark,
    CmsRemarkWithClassUnloading,
    CmsFull,
    ConcurrentModeFailure,
    ConcurrentModeInterrupted,

    // --- CMS concurrent phases ---
    CmsConcurrentMarkStart,
    CmsConcurrentMark,
    CmsConcurrentPrecleanStart,
    CmsConcurrentPreclean,
    CmsConcurrentAbortablePrecleanStart,
    CmsConcurrentAbortablePreclean,
    CmsAbortPrecleanDueToTime,
    CmsConcurrentSweepStart,
    CmsConcurrentSweep,
    CmsConcurrentResetStart,
    CmsConcurrentReset,

    // --- G1 pauses ---
    G1Young,
    G1YoungInitialMark,
    G1YoungPrepareMixed,
    G1Mixed,
    G1Remark,
    G1Cleanup,
    G1Full,

    // --- G1 concurrent phases ---
    G1ConcurrentCycleStart,
    G1ConcurrentCycleEnd,
    G1ConcurrentRootRegionScanStart,
    G1ConcurrentRootRegionScanEnd,
    G1ConcurrentMarkStart,
    G1ConcurrentMarkEnd,
    G1ConcurrentMarkAbort,
    G1ConcurrentRebuildRememberedSets,
    G1ConcurrentClearClaimedMarks,
    G1ConcurrentCleanupStart,
    G1ConcurrentCleanupEnd,
    G1ConcurrentUndoCycle,
    G1ConcurrentStringDeduplication,

    // --- Shenandoah pauses ---
    ShenandoahInitMark,
    ShenandoahFinalMark,
    ShenandoahInitUpdateRefs,
    ShenandoahFinalUpdateRefs,
    ShenandoahFinalRoots,
    ShenandoahDegenerated,
    ShenandoahFull,

    // --- Shenandoah concurrent phases ---
    ShenandoahConcurrentReset,
    ShenandoahConcurrentMarking,
    ShenandoahConcurrentPrecleaning,
    ShenandoahConcurrentEvacuation,
    ShenandoahConcurrentUpdateRefs,
    ShenandoahConcurrentCleanup,
    ShenandoahConcurrentUncommit,

    // --- Z pauses ---
    ZPauseMarkStart,
    ZPauseMarkEnd,
    ZPauseRelocateStart,

    // --- Z concurrent phases ---
    ZConcurrentMark,
    ZConcurrentMarkContinue,
    ZConcurrentProcessNonStrongReferences,
    ZConcurrentResetRelocationSet,
    ZConcurrentSelectRelocationSet,
    ZConcurrentRelocate,

    // --- Family-agnostic unified fallbacks ---
    GenericYoung,
    GenericFull,
    GenericConcurrent,

    // --- Safepoints and stopped time ---
    Safepoint,
    ApplicationStoppedTime,
    ApplicationConcurrentTime,

    // --- Headers / metadata ---
    JvmVersion,
    CommandLineFlags,
    MemoryConfig,
    UsingCollector,
    HeapRegionSize,
    GcThreads,

    // --- Diagnostics / VM warnings ---
    VmWarning,
    OutOfMemoryError,
    ShenandoahCancellingGc,
    ZAllocationStall,

    Unrecognized,
}

impl EventKind {
    pub fn category(&self) -> EventCategory {
        use EventKind::*;
        match self {
            DefNew | DefNewPromotionFailed | PsYoung | ParNew | ParNewPromotionFailed
            | ParNewToSpaceOverflow | G1Young | G1YoungInitialMark | G1YoungPrepareMixed
            | G1Mixed | GenericYoung => EventCategory::Young,

            SerialFull | SerialOldCompaction | PsFull | PsSerialOld | CmsFull
            | ConcurrentModeFailure | ConcurrentModeInterrupted | G1Full | ShenandoahDegenerated
            | ShenandoahFull | GenericFull => EventCategory::Full,

            CmsInitialMark | CmsRemark | CmsRemarkWithClassUnloading | G1Remark | G1Cleanup
            | ShenandoahInitMark | ShenandoahFinalMark | ShenandoahInitUpdateRefs
            | ShenandoahFinalUpdateRefs | ShenandoahFinalRoots | ZPauseMarkStart | ZPauseMarkEnd
            | ZPauseRelocateStart => EventCategory::Concurrent,

            CmsConcurrentMarkStart | CmsConcurrentMark | CmsConcurrentPrecleanStart
            | CmsConcurrentPreclean | CmsConcurrentAbortablePrecleanStart
            | CmsConcurrentAbortablePreclean | CmsAbortPrecleanDueToTime
            | CmsConcurrentSweepStart | CmsConcurrentSweep | CmsConcurrentResetStart
            | CmsConcurrentReset | G1ConcurrentCycleStart | G1ConcurrentCycleEnd
            | G1ConcurrentRootRegionScanStart
            | G1ConcurrentRootRegionScanEnd | G1ConcurrentMarkStart | G1ConcurrentMarkEnd
            | G1ConcurrentMarkAbort | G1ConcurrentRebuildRememberedSets
            | G1ConcurrentClearClaimedMarks | G1ConcurrentCleanupStart | G1ConcurrentCleanupEnd
            | G1ConcurrentUndoCycle | G1ConcurrentStringDeduplication | ShenandoahConcurrentReset
            | ShenandoahConcurrentMarking | ShenandoahConcurrentPrecleaning
            | ShenandoahConcurrentEvacuation | ShenandoahConcurrentUpdateRefs
            | ShenandoahConcurrentCleanup | ShenandoahConcurrentUncommit | ZConcurrentMark
            | ZConcurrentMarkContinue | ZConcurrentProcessNonStrongReferences
            | ZConcurrentResetRelocationSet | ZConcurrentSelectRelocationSet
            | ZConcurrentRelocate | GenericConcurrent => EventCategory::Concurrent,

            Safepoint => EventCategory::Safepoint,
            ApplicationStoppedTime | ApplicationConcurrentTime => EventCategory::StoppedTime,

            JvmVersion | CommandLineFlags | MemoryConfig | UsingCollector | HeapRegionSize
            | GcThreads => EventCategory::Header,

            VmWarning | OutOfMemoryError | ShenandoahCancellingGc | ZAllocationStall => {
                EventCategory::Warning
            }

            Unrecognized => EventCategory::Unrecognized,
        }
    }

    /// The family a kind is specific to, if any.
    pub fn family(&self) -> Option<CollectorFamily> {
        use EventKind::*;
        match self {
            DefNew | DefNewPromotionFailed | SerialFull | SerialOldCompaction => {
                Some(CollectorFamily::Serial)
            }
            PsYoung | PsFull | PsSerialOld => Some(CollectorFamily::Parallel),
            ParNew | ParNewPromotionFailed | ParNewToSpaceOverflow | CmsInitialMark | CmsRemark
            | CmsRemarkWithClassUnloading | CmsFull | ConcurrentModeFailure
            | ConcurrentModeInterrupted | CmsConcurrentMarkStart | CmsConcurrentMark
            | CmsConcurrentPrecleanStart | CmsConcurrentPreclean
            | CmsConcurrentAbortablePrecleanStart | CmsConcurrentAbortablePreclean
            | CmsAbortPrecleanDueToTime | CmsConcurrentSweepStart | CmsConcurrentSweep
            | CmsConcurrentResetStart | CmsConcurrentReset => Some(CollectorFamily::Cms),
            G1Young | G1YoungInitialMark | G1YoungPrepareMixed | G1Mixed | G1Remark | G1Cleanup
            | G1Full | G1ConcurrentCycleStart | G1ConcurrentCycleEnd
            | G1ConcurrentRootRegionScanStart
            | G1ConcurrentRootRegionScanEnd | G1ConcurrentMarkStart | G1ConcurrentMarkEnd
            | G1ConcurrentMarkAbort | G1ConcurrentRebuildRememberedSets
            | G1ConcurrentClearClaimedMarks | G1ConcurrentCleanupStart | G1ConcurrentCleanupEnd
            | G1ConcurrentUndoCycle | G1ConcurrentStringDeduplication => Some(CollectorFamily::G1),
            ShenandoahInitMark | ShenandoahFinalMark | ShenandoahInitUpdateRefs
            | ShenandoahFinalUpdateRefs | ShenandoahFinalRoots | ShenandoahDegenerated
            | ShenandoahFull | ShenandoahConcurrentReset | ShenandoahConcurrentMarking
            | ShenandoahConcurrentPrecleaning | ShenandoahConcurrentEvacuation
            | ShenandoahConcurrentUpdateRefs | ShenandoahConcurrentCleanup
            | ShenandoahConcurrentUncommit | ShenandoahCancellingGc => {
                Some(CollectorFamily::Shenandoah)
            }
            ZPauseMarkStart | ZPauseMarkEnd | ZPauseRelocateStart | ZConcurrentMark
            | ZConcurrentMarkContinue | ZConcurrentProcessNonStrongReferences
            | ZConcurrentResetRelocationSet | ZConcurrentSelectRelocationSet
            | ZConcurrentRelocate | ZAllocationStall => Some(CollectorFamily::Z),
            _ => None,
        }
    }

    /// True when application threads are fully stopped for the event.
    ///
    /// Concurrent-cycle pauses (initial mark, remark, Z pause phases) are
    /// blocking even though the cycle they belong to is not.
    pub fn is_blocking(&self) -> bool {
        use EventKind::*;
        match self.category() {
            EventCategory::Young | EventCategory::Full => true,
            EventCategory::Concurrent => matches!(
                self,
                CmsInitialMark
                    | CmsRemark
                    | CmsRemarkWithClassUnloading
                    | G1Remark
                    | G1Cleanup
                    | ShenandoahInitMark
                    | ShenandoahFinalMark
                    | ShenandoahInitUpdateRefs
                    | ShenandoahFinalUpdateRefs
                    | ShenandoahFinalRoots
                    | ZPauseMarkStart
                    | ZPauseMarkEnd
                    | ZPauseRelocateStart
            ),
            _ => false,
        }
    }

    /// True for phases that run alongside the application.
    pub fn is_concurrent_phase(&self) -> bool {
        self.category() == EventCategory::Concurrent && !self.is_blocking()
    }

    pub fn name(&self) -> &'static str {
        use EventKind::*;
        match self {
            DefNew => "DefNew",
            DefNewPromotionFailed => "DefNew (promotion failed)",
            SerialFull => "Serial Full GC",
            SerialOldCompaction => "Serial Old compaction",
            PsYoung => "PSYoungGen scavenge",
            PsFull => "Parallel Full GC",
            PsSerialOld => "Parallel serial old",
            ParNew => "ParNew",
            ParNewPromotionFailed => "ParNew (promotion failed)",
            ParNewToSpaceOverflow => "ParNew (to-space overflow)",
            CmsInitialMark => "CMS initial mark",
            CmsRemark => "CMS remark",
            CmsRemarkWithClassUnloading => "CMS remark (class unloading)",
            CmsFull => "CMS full GC",
            ConcurrentModeFailure => "concurrent mode failure",
            ConcurrentModeInterrupted => "concurrent mode interrupted",
            CmsConcurrentMarkStart => "CMS concurrent mark start",
            CmsConcurrentMark => "CMS concurrent mark",
            CmsConcurrentPrecleanStart => "CMS concurrent preclean start",
            CmsConcurrentPreclean => "CMS concurrent preclean",
            CmsConcurrentAbortablePrecleanStart => "CMS abortable preclean start",
            CmsConcurrentAbortablePreclean => "CMS abortable preclean",
            CmsAbortPrecleanDueToTime => "CMS abort preclean due to time",
            CmsConcurrentSweepStart => "CMS concurrent sweep start",
            CmsConcurrentSweep => "CMS concurrent sweep",
            CmsConcurrentResetStart => "CMS concurrent reset start",
            CmsConcurrentReset => "CMS concurrent reset",
            G1Young => "G1 young pause",
            G1YoungInitialMark => "G1 young (initial mark)",
            G1YoungPrepareMixed => "G1 young (prepare mixed)",
            G1Mixed => "G1 mixed pause",
            G1Remark => "G1 remark",
            G1Cleanup => "G1 cleanup",
            G1Full => "G1 full GC",
            G1ConcurrentCycleStart => "G1 concurrent cycle start",
            G1ConcurrentCycleEnd => "G1 concurrent cycle",
            G1ConcurrentRootRegionScanStart => "G1 concurrent root region scan start",
            G1ConcurrentRootRegionScanEnd => "G1 concurrent root region scan",
            G1ConcurrentMarkStart => "G1 concurrent mark start",
            G1ConcurrentMarkEnd => "G1 concurrent mark",
            G1ConcurrentMarkAbort => "G1 concurrent mark abort",
            G1ConcurrentRebuildRememberedSets => "G1 rebuild remembered sets",
            G1ConcurrentClearClaimedMarks => "G1 clear claimed marks",
            G1ConcurrentCleanupStart => "G1 concurrent cleanup start",
            G1ConcurrentCleanupEnd => "G1 concurrent cleanup",
            G1ConcurrentUndoCycle => "G1 concurrent undo cycle",
            G1ConcurrentStringDeduplication => "G1 string deduplication",
            ShenandoahInitMark => "Shenandoah init mark",
            ShenandoahFinalMark => "Shenandoah final mark",
            ShenandoahInitUpdateRefs => "Shenandoah init update refs",
            ShenandoahFinalUpdateRefs => "Shenandoah final update refs",
            ShenandoahFinalRoots => "Shenandoah final roots",
            ShenandoahDegenerated => "Shenandoah degenerated GC",
            ShenandoahFull => "Shenandoah full GC",
            ShenandoahConcurrentReset => "Shenandoah concurrent reset",
            ShenandoahConcurrentMarking => "Shenandoah concurrent marking",
            ShenandoahConcurrentPrecleaning => "Shenandoah concurrent precleaning",
            ShenandoahConcurrentEvacuation => "Shenandoah concurrent evacuation",
            ShenandoahConcurrentUpdateRefs => "Shenandoah concurrent update refs",
            ShenandoahConcurrentCleanup => "Shenandoah concurrent cleanup",
            ShenandoahConcurrentUncommit => "Shenandoah concurrent uncommit",
            ZPauseMarkStart => "Z pause mark start",
            ZPauseMarkEnd => "Z pause mark end",
            ZPauseRelocateStart => "Z pause relocate start",
            ZConcurrentMark => "Z concurrent mark",
            ZConcurrentMarkContinue => "Z concurrent mark continue",
            ZConcurrentProcessNonStrongReferences => "Z process non-strong references",
            ZConcurrentResetRelocationSet => "Z reset relocation set",
            ZConcurrentSelectRelocationSet => "Z select relocation set",
            ZConcurrentRelocate => "Z concurrent relocate",
            GenericYoung => "young collection",
            GenericFull => "full collection",
            GenericConcurrent => "concurrent phase",
            Safepoint => "safepoint",
            ApplicationStoppedTime => "application stopped time",
            ApplicationConcurrentTime => "application concurrent time",
            JvmVersion => "JVM version",
            CommandLineFlags => "command line flags",
            MemoryConfig => "memory configuration",
            UsingCollector => "collector announcement",
            HeapRegionSize => "heap region size",
            GcThreads => "GC thread count",
            VmWarning => "VM warning",
            OutOfMemoryError => "out of memory",
            ShenandoahCancellingGc => "Shenandoah cancelling GC",
            ZAllocationStall => "Z allocation stall",
            Unrecognized => "unrecognized",
        }
    }
}
