//! Bracket-balance merging for the classic generational collectors.
//!
//! Serial, Parallel, and CMS logs glue one stop-the-world event together
//! with nested brackets; when the JVM's buffered writes race a concurrent
//! phase report, the event is flushed in pieces and the opening fragment
//! ends with unbalanced brackets (`... 0.0230987 secs]2.830: [CMS`). The
//! merge concatenates fragments until the brackets balance again.
//!
//! A complete, self-balanced line arriving mid-merge is part of the glued
//! text when it carries this family's own concurrent-phase marker (the
//! classifier's composite shapes expect it inline); anything else is
//! entangled output from an unrelated stream and is re-emitted after the
//! merge, in original order.

use super::grammar::{Drain, FamilyGrammar, MergeOutcome};
use crate::classify::scan::{take_timestamp_prefix, take_unified_decorations};

pub struct BracketGrammar {
    name: &'static str,
    /// A fragment must contain one of these to open a merge.
    markers: &'static [&'static str],
    /// Self-balanced lines containing one of these are still appended.
    inline_markers: &'static [&'static str],
    raw: Vec<String>,
    buffer: String,
    balance: i32,
}

pub fn cms_grammar() -> BracketGrammar {
    BracketGrammar::new(
        "cms",
        &["[ParNew", "[CMS", "[GC", "[Full GC"],
        &["[CMS-concurrent-", "CMS: abort preclean"],
    )
}

pub fn serial_grammar() -> BracketGrammar {
    BracketGrammar::new("serial", &["[DefNew", "[Tenured"], &[])
}

pub fn parallel_grammar() -> BracketGrammar {
    BracketGrammar::new("parallel", &["PSYoungGen", "ParOldGen"], &[])
}

fn bracket_balance(s: &str) -> i32 {
    let mut balance = 0;
    for b in s.bytes() {
        match b {
            b'[' => balance += 1,
            b']' => balance -= 1,
            _ => {}
        }
    }
    balance
}

/// A line that starts its own event: timestamped, datestamped, or a
/// unified decoration. Continuation fragments start mid-token instead.
fn is_fresh_event(line: &str) -> bool {
    take_timestamp_prefix(line, None).is_some() || line.starts_with('[')
}

/// A lookahead line that proves the opener was a truncated log rather
/// than the head of a split event: a self-contained bracketed event or a
/// unified-logging line. Prose lines (stopped-time sentences) interleave
/// with splits and prove nothing.
fn signals_truncation(next: &str) -> bool {
    let bracketed = take_timestamp_prefix(next, None)
        .is_some_and(|(_, rest)| rest.starts_with('['))
        && bracket_balance(next) >= 0;
    bracketed || take_unified_decorations(next).is_some()
}

impl BracketGrammar {
    fn new(
        name: &'static str,
        markers: &'static [&'static str],
        inline_markers: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            markers,
            inline_markers,
            raw: Vec::new(),
            buffer: String::new(),
            balance: 0,
        }
    }

    fn opens(&self, line: &str) -> bool {
        bracket_balance(line) > 0
            && take_timestamp_prefix(line, None).is_some()
            && self.markers.iter().any(|m| line.contains(m))
    }

    fn absorb(&mut self, line: &str) {
        self.raw.push(line.to_string());
        self.buffer.push_str(line);
        self.balance += bracket_balance(line);
    }
}

impl FamilyGrammar for BracketGrammar {
    fn name(&self) -> &'static str {
        self.name
    }

    fn applies(&self, jdk_major: Option<u32>) -> bool {
        jdk_major.is_none_or(|major| major < 9)
    }

    fn offer(&mut self, line: &str, next: Option<&str>) -> MergeOutcome {
        if !self.is_active() {
            if !self.opens(line) {
                return MergeOutcome::Declined;
            }
            // Truncation vs. split: if the lookahead starts a fresh event
            // that this merge could not absorb, the opener is a truncated
            // event on its own, not the head of a split one.
            match next {
                Some(next_line)
                    if signals_truncation(next_line)
                        && !self.inline_markers.iter().any(|m| next_line.contains(m)) =>
                {
                    return MergeOutcome::Declined;
                }
                None => return MergeOutcome::Declined,
                _ => {}
            }
            self.absorb(line);
            return MergeOutcome::Incomplete;
        }

        // Active: a balanced, timestamped line is either this family's
        // inline concurrent-phase report (append) or unrelated output
        // (entangle). Unbalanced or untimestamped text is a fragment.
        let line_balance = bracket_balance(line);
        if line_balance >= 0 && is_fresh_event(line) {
            let inline = self.inline_markers.iter().any(|m| line.contains(m));
            if !inline && line_balance == 0 {
                return MergeOutcome::Entangled;
            }
        }

        self.absorb(line);
        if self.balance <= 0 {
            self.raw.clear();
            self.balance = 0;
            return MergeOutcome::Complete(vec![std::mem::take(&mut self.buffer)]);
        }
        MergeOutcome::Incomplete
    }

    fn is_active(&self) -> bool {
        !self.buffer.is_empty()
    }

    fn drain(&mut self) -> Drain {
        self.buffer.clear();
        self.balance = 0;
        Drain {
            emit: std::mem::take(&mut self.raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance() {
        assert_eq!(bracket_balance("[GC [x] [y]"), 1);
        assert_eq!(bracket_balance("a] b]"), -2);
    }

    #[test]
    fn test_cmf_split_merges() {
        let mut g = cms_grammar();
        let l1 = "25.339: [Full GC 25.339: [CMS25.340: [CMS-concurrent-sweep: 0.001/0.001 secs]";
        let l2 = " (concurrent mode failure): 49136K->12023K(49152K), 0.0779703 secs] 52768K->12023K(63936K), [CMS Perm : 32K->32K(4096K)], 0.0780105 secs]";

        assert_eq!(g.offer(l1, Some(l2)), MergeOutcome::Incomplete);
        assert!(g.is_active());
        let MergeOutcome::Complete(lines) = g.offer(l2, None) else {
            panic!("expected completion");
        };
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("(concurrent mode failure)"));
        assert!(lines[0].starts_with("25.339: [Full GC"));
        assert!(!g.is_active());
    }

    #[test]
    fn test_inline_concurrent_phase_appends() {
        let mut g = cms_grammar();
        let l1 = "2.807: [GC 2.807: [ParNew (promotion failed): 16384K->16384K(16384K), 0.0230987 secs]2.830: [CMS";
        let l2 = "2.851: [CMS-concurrent-mark: 0.012/0.044 secs]";
        let l3 = " (concurrent mode failure): 31755K->11485K(49152K), 0.0841070 secs] 47115K->11485K(65536K), [CMS Perm : 10756K->10740K(21248K)], 0.1077079 secs]";

        assert_eq!(g.offer(l1, Some(l2)), MergeOutcome::Incomplete);
        assert_eq!(g.offer(l2, Some(l3)), MergeOutcome::Incomplete);
        let MergeOutcome::Complete(lines) = g.offer(l3, None) else {
            panic!("expected completion");
        };
        assert!(lines[0].contains("[CMS2.851: [CMS-concurrent-mark: 0.012/0.044 secs]"));
    }

    #[test]
    fn test_unrelated_line_entangles() {
        let mut g = cms_grammar();
        let l1 = "25.339: [Full GC 25.339: [CMS";
        let stopped = "25.400: Total time for which application threads were stopped: 0.0019444 seconds";
        let l3 = " (concurrent mode failure): 49136K->12023K(49152K), 0.07 secs] 52768K->12023K(63936K), 0.08 secs]";

        assert_eq!(g.offer(l1, Some(stopped)), MergeOutcome::Incomplete);
        assert_eq!(g.offer(stopped, Some(l3)), MergeOutcome::Entangled);
        assert!(matches!(g.offer(l3, None), MergeOutcome::Complete(_)));
    }

    #[test]
    fn test_truncated_opener_declined_via_lookahead() {
        let mut g = cms_grammar();
        let opener = "25.339: [Full GC 25.339: [CMS";
        let fresh = "26.001: [GC 26.001: [ParNew: 100K->10K(200K), 0.001 secs] 300K->210K(400K), 0.002 secs]";
        assert_eq!(g.offer(opener, Some(fresh)), MergeOutcome::Declined);
        assert!(!g.is_active());
    }

    #[test]
    fn test_balanced_line_does_not_open() {
        let mut g = parallel_grammar();
        let line = "19810.091: [GC [PSYoungGen: 27808K->632K(28032K)] 160183K->133159K(585088K), 0.0225213 secs]";
        assert_eq!(g.offer(line, None), MergeOutcome::Declined);
    }
}
