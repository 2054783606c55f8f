//! Event storage collaborator.
//!
//! The core depends only on the [`EventSink`] capability: insert, query
//! by kind or category, and aggregate max/total durations. The storage
//! technology behind it can vary without touching the analysis code; the
//! in-memory store here is the default, and [`chunk`] adds a compressed
//! file codec for persisting a parsed run.

pub mod chunk;

use crate::event::{Event, EventCategory, EventKind};

/// Inserts may be buffered; callers must `flush` before querying a store
/// they just filled.
pub trait EventSink {
    fn insert(&mut self, event: Event);
    fn flush(&mut self);
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn query_by_kind(&self, kind: EventKind) -> Vec<Event>;
    fn query_by_category(&self, category: EventCategory) -> Vec<Event>;
    /// All stored events in insertion order.
    fn events(&self) -> Vec<Event>;
    fn max_duration_ms(&self, category: EventCategory) -> Option<u64>;
    fn total_duration_ms(&self, category: EventCategory) -> u64;
}

/// Batch size after which buffered inserts spill into the store.
const INSERT_BATCH: usize = 64;

/// Vec-backed store with a fixed-size insert buffer.
#[derive(Default)]
pub struct MemoryStore {
    buffer: Vec<Event>,
    events: Vec<Event>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for MemoryStore {
    fn insert(&mut self, event: Event) {
        self.buffer.push(event);
        if self.buffer.len() >= INSERT_BATCH {
            self.events.append(&mut self.buffer);
        }
    }

    fn flush(&mut self) {
        self.events.append(&mut self.buffer);
    }

    fn len(&self) -> usize {
        self.events.len() + self.buffer.len()
    }

    fn query_by_kind(&self, kind: EventKind) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| e.kind() == kind)
            .cloned()
            .collect()
    }

    fn query_by_category(&self, category: EventCategory) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| e.category() == category)
            .cloned()
            .collect()
    }

    fn events(&self) -> Vec<Event> {
        self.events.clone()
    }

    fn max_duration_ms(&self, category: EventCategory) -> Option<u64> {
        self.events
            .iter()
            .filter(|e| e.category() == category)
            .filter_map(|e| e.duration_ms())
            .max()
    }

    fn total_duration_ms(&self, category: EventCategory) -> u64 {
        self.events
            .iter()
            .filter(|e| e.category() == category)
            .filter_map(|e| e.duration_ms())
            .sum()
    }
}
