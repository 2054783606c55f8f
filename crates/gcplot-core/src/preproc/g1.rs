//! Legacy G1 multi-line assembly.
//!
//! With `-XX:+PrintGCDetails` a single G1 pause spans dozens of indented
//! detail lines; the summary the classifier wants (heap transition, pause
//! duration, worker times) is scattered across them. The grammar absorbs
//! the detail block and synthesizes one canonical pause line.
//!
//! It also joins a `[G1Ergonomics ...humongous allocation]` notice to the
//! pause it provoked, with `"; "` as the separator, so the classifier can
//! attribute the humongous trigger.

use super::grammar::{Drain, FamilyGrammar, MergeOutcome};
use crate::classify::scan::{take_size, take_timestamp_prefix};

enum State {
    Idle,
    /// Absorbing the indented detail block under a pause header.
    Detail {
        opener: String,
        raw: Vec<String>,
        heap: Option<String>,
        other: Option<String>,
        times: Option<String>,
    },
    /// Holding an ergonomics humongous notice for its pause line.
    Humongous { notice: String },
}

pub struct G1Grammar {
    state: State,
}

impl Default for G1Grammar {
    fn default() -> Self {
        Self::new()
    }
}

impl G1Grammar {
    pub fn new() -> Self {
        Self { state: State::Idle }
    }
}

fn is_pause_opener(line: &str) -> bool {
    take_timestamp_prefix(line, None)
        .is_some_and(|(_, rest)| rest.starts_with("[GC pause") || rest.starts_with("[GC remark"))
        && line.trim_end().ends_with("secs]")
}

/// Detail lines are indented under the pause header.
fn is_detail(line: &str) -> bool {
    line.starts_with(' ') && line.trim_start().starts_with('[')
}

fn is_humongous_notice(line: &str) -> bool {
    line.contains("[G1Ergonomics") && line.contains("humongous allocation")
}

/// `Heap: 24.0M(256.0M)->13.2M(256.0M)` -> `24576K->13517K(262144K)`.
fn heap_transition(detail: &str) -> Option<String> {
    let pos = detail.find("Heap: ")?;
    let rest = &detail[pos + "Heap: ".len()..];
    let (before, rest) = take_size(rest)?;
    let rest = rest.strip_prefix('(')?;
    let (_cap_before, rest) = take_size(rest)?;
    let rest = rest.strip_prefix(")->")?;
    let (after, rest) = take_size(rest)?;
    let rest = rest.strip_prefix('(')?;
    let (capacity, _) = take_size(rest)?;
    Some(format!("{before}->{after}({capacity})"))
}

fn synthesize(
    opener: &str,
    heap: Option<&str>,
    other: Option<&str>,
    times: Option<&str>,
) -> String {
    let mut canonical = match (opener.rsplit_once(", "), heap) {
        (Some((head, tail)), Some(heap)) => format!("{head} {heap}, {tail}"),
        _ => opener.to_string(),
    };
    if let Some(other) = other {
        canonical.push(' ');
        canonical.push_str(other);
    }
    if let Some(times) = times {
        canonical.push(' ');
        canonical.push_str(times);
    }
    canonical
}

impl FamilyGrammar for G1Grammar {
    fn name(&self) -> &'static str {
        "g1"
    }

    fn applies(&self, jdk_major: Option<u32>) -> bool {
        jdk_major.is_none_or(|major| major < 9)
    }

    fn offer(&mut self, line: &str, next: Option<&str>) -> MergeOutcome {
        match &mut self.state {
            State::Idle => {
                if is_humongous_notice(line) {
                    match next {
                        Some(n) if is_pause_opener(n) => {
                            self.state = State::Humongous {
                                notice: line.to_string(),
                            };
                            return MergeOutcome::Incomplete;
                        }
                        _ => return MergeOutcome::Declined,
                    }
                }
                if is_pause_opener(line) && next.is_some_and(is_detail) {
                    self.state = State::Detail {
                        opener: line.to_string(),
                        raw: vec![line.to_string()],
                        heap: None,
                        other: None,
                        times: None,
                    };
                    return MergeOutcome::Incomplete;
                }
                MergeOutcome::Declined
            }

            State::Humongous { notice } => {
                if is_pause_opener(line) {
                    let joined = format!("{notice}; {line}");
                    self.state = State::Idle;
                    return MergeOutcome::Complete(vec![joined]);
                }
                // The lookahead promised a pause; anything else means the
                // notice stands alone. The driver drains it back out.
                MergeOutcome::Declined
            }

            State::Detail {
                opener,
                raw,
                heap,
                other,
                times,
            } => {
                if !is_detail(line) {
                    // The block ended one line early (lookahead saw detail
                    // that belonged to an entangled stream). The driver
                    // drains the synthesized pause and re-offers this line.
                    return MergeOutcome::Declined;
                }

                raw.push(line.to_string());
                let trimmed = line.trim_start();
                if trimmed.starts_with("[Eden:") || trimmed.contains("Heap: ") {
                    *heap = heap_transition(line);
                }
                if trimmed.starts_with("[Other:") {
                    *other = Some(trimmed.trim_end().to_string());
                }
                if trimmed.starts_with("[Times:") {
                    *times = Some(trimmed.trim_end().to_string());
                }

                if next.is_none_or(|n| !is_detail(n)) {
                    let canonical =
                        synthesize(opener, heap.as_deref(), other.as_deref(), times.as_deref());
                    self.state = State::Idle;
                    return MergeOutcome::Complete(vec![canonical]);
                }
                MergeOutcome::Incomplete
            }
        }
    }

    fn is_active(&self) -> bool {
        !matches!(self.state, State::Idle)
    }

    fn drain(&mut self) -> Drain {
        let emit = match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle => Vec::new(),
            State::Humongous { notice } => vec![notice],
            State::Detail {
                opener,
                heap,
                other,
                times,
                ..
            } => vec![synthesize(
                &opener,
                heap.as_deref(),
                other.as_deref(),
                times.as_deref(),
            )],
        };
        Drain { emit }
    }
}
