//! gcplot-core — GC log analysis library.
//!
//! Provides:
//! - `event` — the typed event model (kinds, triggers, families, memory)
//! - `preproc` — raw-log preprocessing into canonical single-event lines
//! - `classify` — total classification of canonical lines into events
//! - `analysis` — aggregation, diagnostic rules, bottlenecks, summary
//! - `store` — the event-sink collaborator and chunk file codec
//! - `fmt` — shared formatting helpers for report rendering
//! - `util` — helper utilities (JVM start time parsing)
//! - `pipeline` — the whole thing wired together
//!
//! ```text
//! raw lines -> Preprocessor -> canonical lines -> Classifier -> events
//!           -> Aggregator (incremental) -> RunSummary (final)
//! ```

pub mod analysis;
pub mod classify;
pub mod event;
pub mod fmt;
pub mod pipeline;
pub mod preproc;
pub mod store;
pub mod util;

pub use analysis::summary::RunSummary;
pub use analysis::{Thresholds, Timewarp};
pub use event::{CollectorFamily, Event, EventCategory, EventKind, Trigger};
pub use pipeline::{AnalyzeConfig, AnalyzeError, analyze_lines};
