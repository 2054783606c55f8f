//! Unified-logging multi-line assembly.
//!
//! Unified pauses log a begin line (`[gc,start] GC(9) Pause Young ...`),
//! zero or more detail lines keyed by the same collection id, and an end
//! line carrying the heap transition and duration. Only the end line is
//! canonical; the begin and detail lines are absorbed into it, and a
//! `To-space exhausted` marker between them is folded into the end line
//! so the classifier sees the evacuation failure.

use super::grammar::{Drain, FamilyGrammar, MergeOutcome};
use crate::classify::scan::{take_gc_id, take_unified_decorations};

struct Open {
    gc_id: Option<u32>,
    raw: Vec<String>,
    to_space_exhausted: bool,
}

#[derive(Default)]
pub struct UnifiedGrammar {
    open: Option<Open>,
}

impl UnifiedGrammar {
    pub fn new() -> Self {
        Self::default()
    }
}

struct Parts<'a> {
    start: bool,
    safepoint: bool,
    gc_id: Option<u32>,
    payload: &'a str,
}

fn parts(line: &str) -> Option<Parts<'_>> {
    let u = take_unified_decorations(line)?;
    let start = u.tags.contains(",start");
    let safepoint = u.tags.starts_with("safepoint");
    let (gc_id, payload) = match take_gc_id(u.rest) {
        Some((id, rest)) => (Some(id), rest),
        None => (None, u.rest),
    };
    Some(Parts {
        start,
        safepoint,
        gc_id,
        payload,
    })
}

/// Insert the evacuation-failure marker after the pause name so the
/// classifier's tag scan picks it up.
fn fold_to_space(line: &str) -> String {
    for name in ["Pause Young", "Pause Full"] {
        if let Some(pos) = line.find(name) {
            let (head, tail) = line.split_at(pos + name.len());
            return format!("{head} (To-space Exhausted){tail}");
        }
    }
    line.to_string()
}

impl FamilyGrammar for UnifiedGrammar {
    fn name(&self) -> &'static str {
        "unified"
    }

    fn applies(&self, jdk_major: Option<u32>) -> bool {
        jdk_major.is_none_or(|major| major >= 9)
    }

    fn offer(&mut self, line: &str, _next: Option<&str>) -> MergeOutcome {
        let Some(open) = &mut self.open else {
            let Some(p) = parts(line) else {
                return MergeOutcome::Declined;
            };
            if p.start && p.payload.starts_with("Pause ") {
                self.open = Some(Open {
                    gc_id: p.gc_id,
                    raw: vec![line.to_string()],
                    to_space_exhausted: false,
                });
                return MergeOutcome::Incomplete;
            }
            return MergeOutcome::Declined;
        };

        let Some(p) = parts(line) else {
            // Non-unified output interleaved with a unified pause.
            return MergeOutcome::Entangled;
        };

        if p.safepoint {
            return MergeOutcome::Entangled;
        }

        if p.start && p.payload.starts_with("Pause ") {
            // A new pause began before this one's end line: truncated log.
            return MergeOutcome::Declined;
        }

        let same_collection = open.gc_id.is_none() || p.gc_id.is_none() || open.gc_id == p.gc_id;
        if !same_collection {
            return MergeOutcome::Entangled;
        }

        if p.payload.trim_end() == "To-space exhausted" {
            open.raw.push(line.to_string());
            open.to_space_exhausted = true;
            return MergeOutcome::Incomplete;
        }

        if p.payload.starts_with("Pause ") {
            let canonical = if open.to_space_exhausted {
                fold_to_space(line)
            } else {
                line.to_string()
            };
            self.open = None;
            return MergeOutcome::Complete(vec![canonical]);
        }

        // Phase and heap detail under the same collection id; the end
        // line summarizes them.
        open.raw.push(line.to_string());
        MergeOutcome::Incomplete
    }

    fn is_active(&self) -> bool {
        self.open.is_some()
    }

    fn drain(&mut self) -> Drain {
        Drain {
            emit: self.open.take().map(|o| o.raw).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_end_merge() {
        let mut g = UnifiedGrammar::new();
        let begin = "[0.230s][info][gc,start] GC(9) Pause Young (Normal) (G1 Evacuation Pause)";
        let phase = "[0.233s][info][gc,phases] GC(9)   Other: 0.3ms";
        let end = "[0.234s][info][gc] GC(9) Pause Young (Normal) (G1 Evacuation Pause) 24M->4M(256M) 3.456ms";

        assert_eq!(g.offer(begin, Some(phase)), MergeOutcome::Incomplete);
        assert_eq!(g.offer(phase, Some(end)), MergeOutcome::Incomplete);
        let MergeOutcome::Complete(out) = g.offer(end, None) else {
            panic!()
        };
        assert_eq!(out, vec![end.to_string()]);
        assert!(!g.is_active());
    }

    #[test]
    fn test_to_space_marker_folds_into_end_line() {
        let mut g = UnifiedGrammar::new();
        let begin = "[12.1s][info][gc,start] GC(42) Pause Young (Normal) (G1 Evacuation Pause)";
        let marker = "[12.2s][info][gc] GC(42) To-space exhausted";
        let end = "[12.2s][info][gc] GC(42) Pause Young (Normal) (G1 Evacuation Pause) 250M->250M(256M) 85.2ms";

        assert_eq!(g.offer(begin, Some(marker)), MergeOutcome::Incomplete);
        assert_eq!(g.offer(marker, Some(end)), MergeOutcome::Incomplete);
        let MergeOutcome::Complete(out) = g.offer(end, None) else {
            panic!()
        };
        assert!(out[0].contains("Pause Young (To-space Exhausted) (Normal)"));
    }

    #[test]
    fn test_unrelated_id_entangles() {
        let mut g = UnifiedGrammar::new();
        let begin = "[0.230s][info][gc,start] GC(9) Pause Young (Normal) (G1 Evacuation Pause)";
        let other = "[0.231s][info][gc] GC(8) Concurrent Mark Cycle 89.437ms";
        assert_eq!(g.offer(begin, Some(other)), MergeOutcome::Incomplete);
        assert_eq!(g.offer(other, None), MergeOutcome::Entangled);
    }

    #[test]
    fn test_new_start_truncates_previous() {
        let mut g = UnifiedGrammar::new();
        let begin1 = "[0.230s][info][gc,start] GC(9) Pause Young (Normal) (G1 Evacuation Pause)";
        let begin2 = "[0.530s][info][gc,start] GC(10) Pause Young (Normal) (G1 Evacuation Pause)";
        assert_eq!(g.offer(begin1, Some(begin2)), MergeOutcome::Incomplete);
        assert_eq!(g.offer(begin2, None), MergeOutcome::Declined);
        let drained = g.drain();
        assert_eq!(drained.emit, vec![begin1.to_string()]);
    }

    #[test]
    fn test_plain_end_line_passes_through() {
        let mut g = UnifiedGrammar::new();
        let end = "[0.234s][info][gc] GC(9) Pause Young (Normal) (G1 Evacuation Pause) 24M->4M(256M) 3.456ms";
        assert_eq!(g.offer(end, None), MergeOutcome::Declined);
    }
}
