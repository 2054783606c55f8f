//! Raw-log preprocessing: many physical lines in, one canonical line per
//! logical event out.
//!
//! A single forward pass with one-line lookahead. Per-line priority:
//! throwaway boilerplate is dropped (and counted once for diagnostics),
//! then the active — or a newly matched — family grammar gets the line,
//! then the line passes through verbatim. At most one family grammar is
//! active at a time; lines interleaved with an in-progress merge are
//! buffered and flushed in original order once the merge resolves.
//!
//! Malformed input never fails preprocessing: the worst case is a raw
//! line emitted unchanged, to be classified as unrecognized downstream.

mod bracket;
mod g1;
mod grammar;
mod unified;

pub use grammar::{Drain, FamilyGrammar, MergeOutcome};

use tracing::debug;

use crate::classify::scan::take_unified_decorations;
use crate::classify::{ClassifyContext, Classifier, PatternCatalog};
use crate::event::{Event, EventKind};

/// How many leading lines the version sniff inspects before giving up.
const VERSION_SNIFF_WINDOW: usize = 64;

pub struct Preprocessor<'a> {
    classifier: Classifier<'a>,
    grammars: Vec<Box<dyn FamilyGrammar>>,
    entangled: Vec<String>,
    last_unprocessed: Option<String>,
    boilerplate: usize,
    jdk_major: Option<u32>,
}

impl<'a> Preprocessor<'a> {
    pub fn new(catalog: &'a PatternCatalog) -> Self {
        Self {
            classifier: Classifier::new(catalog),
            grammars: vec![
                Box::new(unified::UnifiedGrammar::new()),
                Box::new(g1::G1Grammar::new()),
                Box::new(bracket::cms_grammar()),
                Box::new(bracket::serial_grammar()),
                Box::new(bracket::parallel_grammar()),
            ],
            entangled: Vec::new(),
            last_unprocessed: None,
            boilerplate: 0,
            jdk_major: None,
        }
    }

    /// One canonical line per logical event, in order.
    pub fn preprocess<S: AsRef<str>>(&mut self, lines: &[S]) -> Vec<String> {
        self.sniff_version(lines);

        let mut out = Vec::new();
        for (i, line) in lines.iter().enumerate() {
            let line = line.as_ref().trim_end_matches(['\r', '\n']);
            let next = lines.get(i + 1).map(|s| s.as_ref().trim_end_matches(['\r', '\n']));

            if is_boilerplate(line) {
                self.boilerplate += 1;
                continue;
            }
            self.feed(line, next, &mut out);
        }

        // Stream ended mid-merge: the buffered fragment is diagnostic
        // evidence of a truncated log, not an event.
        if let Some(active) = self.grammars.iter().position(|g| g.is_active()) {
            let drain = self.grammars[active].drain();
            self.last_unprocessed = drain.emit.last().cloned();
        }
        out.append(&mut self.entangled);
        if self.boilerplate > 0 {
            debug!(lines = self.boilerplate, "dropped boilerplate");
        }
        out
    }

    fn feed(&mut self, line: &str, next: Option<&str>, out: &mut Vec<String>) {
        // At most one active grammar; it gets exclusive first refusal.
        if let Some(active) = self.grammars.iter().position(|g| g.is_active()) {
            match self.grammars[active].offer(line, next) {
                MergeOutcome::Incomplete => return,
                MergeOutcome::Complete(lines) => {
                    out.extend(lines);
                    out.append(&mut self.entangled);
                    return;
                }
                MergeOutcome::Entangled => {
                    self.entangled.push(line.to_string());
                    return;
                }
                MergeOutcome::Declined => {
                    let drain = self.grammars[active].drain();
                    out.extend(drain.emit);
                    out.append(&mut self.entangled);
                    // Fall through: re-offer the line from scratch.
                }
            }
        }

        let jdk = self.jdk_major;
        for grammar in self.grammars.iter_mut().filter(|g| g.applies(jdk)) {
            match grammar.offer(line, next) {
                MergeOutcome::Incomplete => return,
                MergeOutcome::Complete(lines) => {
                    out.extend(lines);
                    return;
                }
                MergeOutcome::Declined => continue,
                MergeOutcome::Entangled => unreachable!("inactive grammar cannot entangle"),
            }
        }
        out.push(line.to_string());
    }

    /// Scan forward, without consuming, until a header reveals the JDK
    /// major version; give up at the first event line. The version
    /// toggles which grammar generation applies.
    fn sniff_version(&mut self, lines: &[impl AsRef<str>]) {
        let ctx = ClassifyContext::default();
        for line in lines.iter().take(VERSION_SNIFF_WINDOW) {
            let line = line.as_ref();
            if is_boilerplate(line) {
                continue;
            }
            match self.classifier.classify(line, &ctx) {
                Event::Header(h) => {
                    if h.kind == EventKind::JvmVersion && h.jdk_major.is_some() {
                        self.jdk_major = h.jdk_major;
                        debug!(jdk_major = h.jdk_major, "sniffed JDK version");
                        return;
                    }
                    // Unified decorations imply the JDK 9 grammar even
                    // before a version header shows up.
                    if take_unified_decorations(line).is_some() && self.jdk_major.is_none() {
                        self.jdk_major = Some(9);
                    }
                }
                // Preamble noise; the header may still be ahead.
                Event::Unrecognized(_) | Event::Warning(_) => continue,
                _ => return,
            }
        }
    }

    /// Last raw line of an unfinished merge, for log-completeness
    /// diagnostics. `None` when the log ended cleanly.
    pub fn last_unprocessed(&self) -> Option<&str> {
        self.last_unprocessed.as_deref()
    }

    /// Number of dropped boilerplate lines.
    pub fn boilerplate_lines(&self) -> usize {
        self.boilerplate
    }

    /// JDK major version found by the sniff, if any.
    pub fn jdk_major(&self) -> Option<u32> {
        self.jdk_major
    }
}

/// Heap-layout dumps, FLS statistics, and other decoration the JVM prints
/// around events. Dropped before grammar matching.
fn is_boilerplate(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return true;
    }
    if trimmed.starts_with("{Heap before GC")
        || trimmed.starts_with("Heap before GC")
        || trimmed.starts_with("Heap after GC")
        || trimmed == "}"
        || trimmed.starts_with("Before GC:")
        || trimmed.starts_with("After GC:")
    {
        return true;
    }
    // -XX:+PrintHeapAtGC region lines.
    const REGIONS: &[&str] = &[
        "def new generation",
        "tenured generation",
        "par new generation",
        "concurrent mark-sweep generation",
        "concurrent-mark-sweep perm gen",
        "PSYoungGen",
        "PSOldGen",
        "ParOldGen",
        "PSPermGen",
        "Metaspace",
        "class space",
        "eden space",
        "from space",
        "to space",
        "object space",
        "garbage-first heap",
        "region size",
    ];
    if REGIONS.iter().any(|r| trimmed.starts_with(r))
        && (trimmed.contains("total") || trimmed.contains("used"))
    {
        return true;
    }
    // -XX:PrintFLSStatistics tables.
    if trimmed.starts_with("Statistics for BinaryTreeDictionary")
        || trimmed.starts_with("------")
        || trimmed.starts_with("Total Free Space:")
        || trimmed.starts_with("Max   Chunk Size:")
        || trimmed.starts_with("Number of Blocks:")
        || trimmed.starts_with("Av.  Block  Size:")
        || trimmed.starts_with("Tree      Height:")
    {
        return true;
    }
    // Unified sub-info noise: debug/trace decorations and exit dumps.
    if let Some(u) = take_unified_decorations(line) {
        if matches!(u.level, "debug" | "trace") || u.tags.contains("heap,exit") {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preprocess(lines: &[&str]) -> (Vec<String>, Option<String>) {
        let catalog = PatternCatalog::new();
        let mut pre = Preprocessor::new(&catalog);
        let out = pre.preprocess(lines);
        let last = pre.last_unprocessed().map(str::to_string);
        (out, last)
    }

    #[test]
    fn test_single_lines_pass_through() {
        let lines = [
            "19810.091: [GC [PSYoungGen: 27808K->632K(28032K)] 160183K->133159K(585088K), 0.0225213 secs]",
            "19810.2: Total time for which application threads were stopped: 0.0019444 seconds",
        ];
        let (out, last) = preprocess(&lines);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], lines[0]);
        assert!(last.is_none());
    }

    #[test]
    fn test_blank_and_heap_dump_dropped() {
        let lines = [
            "",
            "{Heap before GC invocations=1 (full 0):",
            " PSYoungGen      total 28032K, used 27808K [0x00000000, 0x00000000, 0x00000000)",
            "  eden space 24576K, 100% used [0x00000000,0x00000000,0x00000000)",
            "}",
            "19810.091: [GC [PSYoungGen: 27808K->632K(28032K)] 160183K->133159K(585088K), 0.0225213 secs]",
        ];
        let catalog = PatternCatalog::new();
        let mut pre = Preprocessor::new(&catalog);
        let out = pre.preprocess(&lines);
        assert_eq!(out.len(), 1);
        assert_eq!(pre.boilerplate_lines(), 5);
    }

    #[test]
    fn test_cms_three_line_merge_is_one_canonical_line() {
        let lines = [
            "2.807: [GC 2.807: [ParNew (promotion failed): 16384K->16384K(16384K), 0.0230987 secs]2.830: [CMS",
            "2.851: [CMS-concurrent-mark: 0.012/0.044 secs]",
            " (concurrent mode failure): 31755K->11485K(49152K), 0.0841070 secs] 47115K->11485K(65536K), [CMS Perm : 10756K->10740K(21248K)], 0.1077079 secs]",
        ];
        let (out, last) = preprocess(&lines);
        assert_eq!(out.len(), 1, "three physical lines, one canonical line");
        assert!(out[0].contains("(promotion failed)"));
        assert!(out[0].contains("(concurrent mode failure)"));
        assert!(last.is_none());
    }

    #[test]
    fn test_entangled_lines_flush_in_order() {
        let lines = [
            "25.339: [Full GC 25.339: [CMS",
            "25.400: Total time for which application threads were stopped: 0.0019444 seconds",
            " (concurrent mode failure): 49136K->12023K(49152K), 0.07 secs] 52768K->12023K(63936K), 0.08 secs]",
            "26.000: [GC 26.000: [ParNew: 100K->10K(200K), 0.001 secs] 300K->210K(400K), 0.002 secs]",
        ];
        let (out, _) = preprocess(&lines);
        assert_eq!(out.len(), 3);
        assert!(out[0].contains("concurrent mode failure"));
        assert!(out[1].contains("application threads were stopped"));
        assert!(out[2].contains("[ParNew"));
    }

    #[test]
    fn test_mid_merge_eof_exposes_last_unprocessed() {
        let lines = ["25.339: [Full GC 25.339: [CMS", " (concurrent mode"];
        let (out, last) = preprocess(&lines);
        assert!(out.is_empty());
        assert!(last.is_some());
    }

    #[test]
    fn test_unified_begin_end_collapse() {
        let lines = [
            "[0.230s][info][gc,start] GC(9) Pause Young (Normal) (G1 Evacuation Pause)",
            "[0.233s][info][gc,phases] GC(9)   Other: 0.3ms",
            "[0.234s][info][gc] GC(9) Pause Young (Normal) (G1 Evacuation Pause) 24M->4M(256M) 3.456ms",
        ];
        let (out, _) = preprocess(&lines);
        assert_eq!(out.len(), 1);
        assert!(out[0].ends_with("3.456ms"));
    }

    #[test]
    fn test_version_sniff_from_banner() {
        let lines = [
            "Java HotSpot(TM) 64-Bit Server VM (25.121-b13) for linux-amd64 JRE (1.8.0_121-b13), built on Dec 12 2016 16:36:53 by \"java_re\" with gcc 4.3.0",
            "Memory: 4k page, physical 16777216k(8237872k free), swap 2097148k(2097148k free)",
        ];
        let catalog = PatternCatalog::new();
        let mut pre = Preprocessor::new(&catalog);
        pre.preprocess(&lines);
        assert_eq!(pre.jdk_major(), Some(8));
    }

    #[test]
    fn test_version_sniff_unified_decorations() {
        let lines = ["[0.003s][info][gc] Using G1"];
        let catalog = PatternCatalog::new();
        let mut pre = Preprocessor::new(&catalog);
        pre.preprocess(&lines);
        assert_eq!(pre.jdk_major(), Some(9));
    }

    #[test]
    fn test_g1_detail_block_collapse_end_to_end() {
        let lines = [
            "5.569: [GC pause (G1 Evacuation Pause) (young), 0.0028339 secs]",
            "   [Parallel Time: 2.3 ms, GC Workers: 4]",
            "   [Other: 0.3 ms]",
            "   [Eden: 12.0M(12.0M)->0.0B(14.0M) Survivors: 2048.0K->2048.0K Heap: 24.0M(256.0M)->13.2M(256.0M)]",
            " [Times: user=0.01 sys=0.00, real=0.00 secs]",
            "5.600: [GC cleanup 18M->17M(64M), 0.0012165 secs]",
        ];
        let (out, _) = preprocess(&lines);
        assert_eq!(out.len(), 2);
        assert!(out[0].contains("24576K->13517K(262144K), 0.0028339 secs]"));
        assert!(out[1].contains("[GC cleanup"));
    }
}
