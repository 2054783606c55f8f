//! Typed GC event model.
//!
//! One classified log line becomes exactly one [`Event`]. The payload shape
//! varies by category (a pause carries memory regions and worker times, a
//! header carries option text), but every event has a timestamp in
//! milliseconds since JVM start — or since the log's first datestamp when
//! the log carries only wall-clock time.
//!
//! Durations are held in whole microseconds as parsed; reporting surfaces
//! use whole milliseconds (`duration_ms`).

mod family;
mod kind;
mod memory;
mod trigger;

pub use family::CollectorFamily;
pub use kind::{EventCategory, EventKind};
pub use memory::{Generation, MemoryAmount, MemoryRegion, MemoryRegions, Unit};
pub use trigger::Trigger;

use serde::{Deserialize, Serialize};

/// Parallel worker wall/CPU readings from a `[Times: user=.. sys=.., real=..]`
/// suffix. `real` stays signed: a negative reading is kept and flagged for
/// anomaly detection rather than rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerTimes {
    pub user_us: u64,
    pub sys_us: u64,
    pub real_us: i64,
}

impl WorkerTimes {
    pub fn flagged(&self) -> bool {
        self.real_us < 0
    }
}

/// Sub-phase durations reported inside a pause breakdown, when present.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubPhases {
    pub root_scanning_us: Option<u64>,
    pub other_us: Option<u64>,
    pub termination_us: Option<u64>,
}

/// A stop-the-world collection (young, mixed, full, or a blocking phase of
/// a concurrent cycle).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PauseEvent {
    pub kind: EventKind,
    pub timestamp_ms: u64,
    pub duration_us: u64,
    pub trigger: Trigger,
    pub regions: MemoryRegions,
    pub worker: Option<WorkerTimes>,
    pub phases: SubPhases,
    /// Unified-logging collection id (`GC(n)`).
    pub gc_id: Option<u32>,
    /// The line reported a permanent generation rather than metaspace.
    pub perm_gen: bool,
}

impl PauseEvent {
    pub fn duration_ms(&self) -> u64 {
        self.duration_us / 1000
    }
}

/// A concurrent-cycle phase report. Start markers carry no duration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcurrentEvent {
    pub kind: EventKind,
    pub timestamp_ms: u64,
    pub duration_us: Option<u64>,
    pub gc_id: Option<u32>,
}

/// A JVM safepoint that is not itself a GC pause.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafepointEvent {
    pub timestamp_ms: u64,
    pub duration_us: u64,
    /// Time spent bringing threads to the safepoint, when reported.
    pub sync_us: Option<u64>,
    /// Safepoint operation name (`Deoptimize`, `ThreadDump`, ...).
    pub operation: Option<String>,
}

/// `Total time for which application threads were stopped` and its
/// concurrent-time sibling.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoppedTimeEvent {
    pub kind: EventKind,
    pub timestamp_ms: u64,
    pub duration_us: u64,
    /// `Stopping threads took: ...` portion, when reported.
    pub stopping_us: Option<u64>,
}

/// Header and metadata lines: version banners, flag dumps, memory figures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderEvent {
    pub kind: EventKind,
    pub timestamp_ms: u64,
    pub text: String,
    /// Family announced by the header, if it announces one.
    pub family: Option<CollectorFamily>,
    pub jdk_major: Option<u32>,
    pub physical_memory: Option<MemoryAmount>,
}

/// VM warnings and collector fault reports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningEvent {
    pub kind: EventKind,
    pub timestamp_ms: u64,
    pub message: String,
}

/// A line no pattern matched. Counted, never an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnrecognizedEvent {
    pub timestamp_ms: u64,
    pub line: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    Pause(PauseEvent),
    Concurrent(ConcurrentEvent),
    Safepoint(SafepointEvent),
    StoppedTime(StoppedTimeEvent),
    Header(HeaderEvent),
    Warning(WarningEvent),
    Unrecognized(UnrecognizedEvent),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Pause(e) => e.kind,
            Event::Concurrent(e) => e.kind,
            Event::Safepoint(_) => EventKind::Safepoint,
            Event::StoppedTime(e) => e.kind,
            Event::Header(e) => e.kind,
            Event::Warning(e) => e.kind,
            Event::Unrecognized(_) => EventKind::Unrecognized,
        }
    }

    pub fn category(&self) -> EventCategory {
        self.kind().category()
    }

    pub fn timestamp_ms(&self) -> u64 {
        match self {
            Event::Pause(e) => e.timestamp_ms,
            Event::Concurrent(e) => e.timestamp_ms,
            Event::Safepoint(e) => e.timestamp_ms,
            Event::StoppedTime(e) => e.timestamp_ms,
            Event::Header(e) => e.timestamp_ms,
            Event::Warning(e) => e.timestamp_ms,
            Event::Unrecognized(e) => e.timestamp_ms,
        }
    }

    /// Duration in whole microseconds, for events that have one.
    pub fn duration_us(&self) -> Option<u64> {
        match self {
            Event::Pause(e) => Some(e.duration_us),
            Event::Concurrent(e) => e.duration_us,
            Event::Safepoint(e) => Some(e.duration_us),
            Event::StoppedTime(e) => Some(e.duration_us),
            _ => None,
        }
    }

    /// Duration in whole milliseconds, for events that have one.
    pub fn duration_ms(&self) -> Option<u64> {
        self.duration_us().map(|us| us / 1000)
    }

    pub fn trigger(&self) -> Trigger {
        match self {
            Event::Pause(e) => e.trigger,
            _ => Trigger::None,
        }
    }

    /// True when application threads were fully stopped for this event.
    pub fn is_blocking(&self) -> bool {
        self.kind().is_blocking()
    }

    /// Blocking GC pauses and safepoints participate in the temporal
    /// ordering invariant; other events may interleave freely.
    pub fn is_ordered(&self) -> bool {
        self.is_blocking() || matches!(self, Event::Safepoint(_) | Event::StoppedTime(_))
    }
}
