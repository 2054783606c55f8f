//! The full analysis pipeline: raw lines -> preprocessor -> classifier ->
//! aggregator -> summary.
//!
//! Single-threaded and synchronous; a sequential fold over the line
//! stream. The event store collaborator receives every classified event
//! and later serves the post-hoc bottleneck pass.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::analysis::summary::RunSummary;
use crate::analysis::{Aggregator, Thresholds, Timewarp, bottleneck};
use crate::classify::{ClassifyContext, Classifier, PatternCatalog};
use crate::event::{CollectorFamily, Event};
use crate::preproc::Preprocessor;
use crate::store::EventSink;

#[derive(Clone, Copy, Debug, Default)]
pub struct AnalyzeConfig {
    /// JVM start instant; enables absolute-time rendering and anchors
    /// datestamp-only logs.
    pub jvm_start: Option<DateTime<Utc>>,
    /// Render report timestamps as absolute instants. Requires
    /// `jvm_start`.
    pub absolute_timestamps: bool,
    /// The caller presorted events by timestamp; waive the ordering
    /// check.
    pub reorder: bool,
    pub thresholds: Thresholds,
}

#[derive(Debug)]
pub enum AnalyzeError {
    /// Ordering violation: corrupt input or a missing `reorder` opt-in.
    Timewarp(Timewarp),
    /// Absolute-time rendering was requested without a JVM start date.
    MissingTimeReference,
}

impl std::fmt::Display for AnalyzeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalyzeError::Timewarp(tw) => write!(f, "{tw}"),
            AnalyzeError::MissingTimeReference => {
                write!(f, "absolute timestamps requested but no JVM start date is known")
            }
        }
    }
}

impl std::error::Error for AnalyzeError {}

impl From<Timewarp> for AnalyzeError {
    fn from(tw: Timewarp) -> Self {
        AnalyzeError::Timewarp(tw)
    }
}

/// Run one GC log through the whole pipeline.
///
/// The store is filled as a side effect so the caller can persist or
/// re-query the typed events afterwards.
pub fn analyze_lines<S: AsRef<str>>(
    lines: &[S],
    config: &AnalyzeConfig,
    store: &mut dyn EventSink,
) -> Result<RunSummary, AnalyzeError> {
    if config.absolute_timestamps && config.jvm_start.is_none() {
        return Err(AnalyzeError::MissingTimeReference);
    }

    let catalog = PatternCatalog::new();
    let mut preprocessor = Preprocessor::new(&catalog);
    let canonical = preprocessor.preprocess(lines);
    debug!(
        raw = lines.len(),
        canonical = canonical.len(),
        "preprocessed log"
    );

    let classifier = Classifier::new(&catalog);
    let mut ctx = ClassifyContext {
        family: CollectorFamily::Unknown,
        previous: None,
        jvm_start: config.jvm_start,
    };

    let mut events = Vec::with_capacity(canonical.len());
    for line in &canonical {
        let event = classifier.classify(line, &ctx);
        // Family context carries forward from announcing headers and
        // family-specific events.
        if let Event::Header(h) = &event
            && let Some(family) = h.family
        {
            ctx.family = family;
        }
        if let Some(family) = event.kind().family() {
            ctx.family = family;
        }
        ctx.previous = Some(event.kind());
        events.push(event);
    }

    if config.reorder {
        events.sort_by_key(|e| e.timestamp_ms());
    }

    let mut aggregator = Aggregator::new(config.thresholds, config.reorder);
    for event in &events {
        store.insert(event.clone());
        aggregator.ingest(event)?;
    }
    store.flush();

    let mut summary = RunSummary::from_state(aggregator.state());
    summary.boilerplate_lines = preprocessor.boilerplate_lines();
    summary.last_unprocessed_line = preprocessor.last_unprocessed().map(str::to_string);

    // Post-hoc bottleneck pass over the stored sequence, blocking and
    // safepoint streams separately.
    let stored = store.events();
    let render_start = config.jvm_start.filter(|_| config.absolute_timestamps);
    let blocking: Vec<_> = stored
        .iter()
        .filter(|e| e.is_blocking())
        .filter_map(bottleneck::PauseSample::from_event)
        .collect();
    let safepoints: Vec<_> = stored
        .iter()
        .filter(|e| !e.is_blocking() && e.is_ordered())
        .filter_map(bottleneck::PauseSample::from_event)
        .collect();
    summary.blocking_bottlenecks = bottleneck::detect(
        &blocking,
        config.thresholds.bottleneck_throughput_pct,
        render_start,
    );
    summary.safepoint_bottlenecks = bottleneck::detect(
        &safepoints,
        config.thresholds.bottleneck_throughput_pct,
        render_start,
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::rules::FindingCode;
    use crate::event::EventCategory;
    use crate::store::MemoryStore;

    fn analyze<S: AsRef<str>>(lines: &[S]) -> RunSummary {
        let mut store = MemoryStore::new();
        analyze_lines(lines, &AnalyzeConfig::default(), &mut store).unwrap()
    }

    #[test]
    fn test_end_to_end_parallel_log() {
        let lines = [
            "Java HotSpot(TM) 64-Bit Server VM (25.121-b13) for linux-amd64 JRE (1.8.0_121-b13), built on Dec 12 2016 16:36:53 by \"java_re\" with gcc 4.3.0",
            "Memory: 4k page, physical 16777216k(8237872k free), swap 2097148k(2097148k free)",
            "CommandLine flags: -XX:+UseParallelGC",
            "19810.091: [GC [PSYoungGen: 27808K->632K(28032K)] 160183K->133159K(585088K), 0.0225213 secs]",
            "19815.002: [Full GC (System.gc()) [PSYoungGen: 632K->0K(18944K)] [ParOldGen: 15584K->7779K(43520K)] 16216K->7779K(62464K), [Metaspace: 20427K->20427K(1069056K)], 0.0589214 secs]",
        ];
        let summary = analyze(&lines);

        assert_eq!(summary.events_ingested, 5);
        assert_eq!(summary.jdk_major, Some(8));
        assert!(summary.command_line.as_deref().unwrap().contains("UseParallelGC"));
        assert_eq!(summary.pause_categories["Young"].count, 1);
        assert_eq!(summary.pause_categories["Young"].max_ms, 22);
        assert_eq!(summary.pause_categories["Full"].count, 1);
        assert_eq!(summary.unrecognized_lines, 0);
        assert!(
            summary
                .findings
                .iter()
                .any(|f| f.code == FindingCode::ExplicitGcParallel)
        );
    }

    #[test]
    fn test_idempotent_findings_across_repeats() {
        // A hundred explicit serial full collections produce exactly one
        // explicit-GC finding.
        let mut lines = Vec::new();
        for i in 0..100u64 {
            let ts = 10 + i;
            lines.push(format!(
                "{ts}.000: [Full GC (System.gc()) {ts}.000: [Tenured: 1000K->900K(43712K), 0.05 secs] 2000K->900K(63104K), [Perm : 100K->100K(4096K)], 0.06 secs]"
            ));
        }
        let summary = analyze(&lines);
        let explicit: Vec<_> = summary
            .findings
            .iter()
            .filter(|f| f.code == FindingCode::ExplicitGcSerial)
            .collect();
        assert_eq!(explicit.len(), 1);
    }

    #[test]
    fn test_timewarp_surfaces_and_reorder_recovers() {
        let lines = [
            "100.000: [GC [PSYoungGen: 100K->10K(200K)] 300K->210K(400K), 0.0010000 secs]",
            "50.000: [GC [PSYoungGen: 100K->10K(200K)] 300K->210K(400K), 0.0010000 secs]",
        ];
        let mut store = MemoryStore::new();
        let err = analyze_lines(&lines, &AnalyzeConfig::default(), &mut store);
        assert!(matches!(err, Err(AnalyzeError::Timewarp(_))));

        let mut store = MemoryStore::new();
        let config = AnalyzeConfig {
            reorder: true,
            ..Default::default()
        };
        let summary = analyze_lines(&lines, &config, &mut store).unwrap();
        assert_eq!(summary.events_ingested, 2);
    }

    #[test]
    fn test_cms_merge_to_composite_event() {
        let lines = [
            "2.807: [GC 2.807: [ParNew (promotion failed): 16384K->16384K(16384K), 0.0230987 secs]2.830: [CMS",
            "2.851: [CMS-concurrent-mark: 0.012/0.044 secs]",
            " (concurrent mode failure): 31755K->11485K(49152K), 0.0841070 secs] 47115K->11485K(65536K), [CMS Perm : 10756K->10740K(21248K)], 0.1077079 secs]",
        ];
        let mut store = MemoryStore::new();
        let summary = analyze_lines(&lines, &AnalyzeConfig::default(), &mut store).unwrap();

        let fulls = store.query_by_category(EventCategory::Full);
        assert_eq!(fulls.len(), 1);
        let Event::Pause(p) = &fulls[0] else { panic!() };
        assert_eq!(p.kind, crate::event::EventKind::ConcurrentModeFailure);
        assert_eq!(p.trigger, crate::event::Trigger::PromotionFailed);

        assert!(
            summary
                .findings
                .iter()
                .any(|f| f.code == FindingCode::ConcurrentModeFailure)
        );
        assert!(
            summary
                .findings
                .iter()
                .any(|f| f.code == FindingCode::PromotionFailure)
        );
    }

    #[test]
    fn test_absolute_without_reference_fails() {
        let lines = ["1.0: [GC cleanup 18M->17M(64M), 0.0012165 secs]"];
        let mut store = MemoryStore::new();
        let config = AnalyzeConfig {
            absolute_timestamps: true,
            ..Default::default()
        };
        let err = analyze_lines(&lines, &config, &mut store);
        assert!(matches!(err, Err(AnalyzeError::MissingTimeReference)));
    }

    #[test]
    fn test_unidentified_lines_counted_run_still_completes() {
        let lines = [
            "19810.091: [GC [PSYoungGen: 27808K->632K(28032K)] 160183K->133159K(585088K), 0.0225213 secs]",
            "some completely novel diagnostic output",
        ];
        let summary = analyze(&lines);
        assert_eq!(summary.events_ingested, 2);
        assert_eq!(summary.unrecognized_lines, 1);
    }
}
