//! Aggregation and diagnostics.
//!
//! The aggregator is a sequential fold over the classified event stream:
//! `ingest` updates running statistics, enforces the temporal-ordering
//! invariant, and evaluates the diagnostic rules. Rules are independent
//! boolean predicates; each fires at most once per run, enforced here
//! against the fired-code set, and no inter-rule ordering is guaranteed.

pub mod bottleneck;
pub mod rules;
pub mod summary;

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::event::{
    CollectorFamily, Event, EventCategory, EventKind, MemoryAmount, Trigger,
};

use rules::{DiagnosticRule, Finding, RuleContext};

/// A backward jump between consecutive ordered events. Terminal for the
/// ingest that detects it: either the log is corrupt or the caller needed
/// the reorder opt-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timewarp {
    pub previous_ms: u64,
    pub current_ms: u64,
    pub at_event_index: usize,
}

impl std::fmt::Display for Timewarp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "timewarp at event {}: timestamp {}ms precedes {}ms",
            self.at_event_index, self.current_ms, self.previous_ms
        )
    }
}

impl std::error::Error for Timewarp {}

/// Count/total/max accumulator over microsecond durations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DurationStat {
    pub count: u64,
    pub total_us: u64,
    pub max_us: u64,
}

impl DurationStat {
    pub fn record(&mut self, us: u64) {
        self.count += 1;
        self.total_us += us;
        self.max_us = self.max_us.max(us);
    }

    pub fn total_ms(&self) -> u64 {
        self.total_us / 1000
    }

    pub fn max_ms(&self) -> u64 {
        self.max_us / 1000
    }
}

/// The single worst event for a tracked anomaly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct WorstOffender {
    pub at_event_index: usize,
    pub timestamp_ms: u64,
    /// Magnitude of the anomaly, in microseconds of excess.
    pub excess_us: u64,
}

/// Tolerance for `sys > user` comparisons: one time unit of measurement
/// noise in the JVM's centisecond CPU figures.
const SYS_OVER_USER_TOLERANCE_US: u64 = 1000;

/// Caller-facing tuning knobs consumed from outside the core.
#[derive(Clone, Copy, Debug)]
pub struct Thresholds {
    /// Throughput percentage below which a consecutive pair is a
    /// bottleneck.
    pub bottleneck_throughput_pct: f64,
    /// Parallelism ratio below which a long CMS pause is flagged.
    pub low_parallelism_ratio: f64,
    /// Minimum pause length for the low-parallelism rules, microseconds.
    pub low_parallelism_floor_us: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            bottleneck_throughput_pct: 90.0,
            low_parallelism_ratio: 0.5,
            low_parallelism_floor_us: 10_000,
        }
    }
}

/// Everything accumulated over one run. Owned by the aggregator, mutated
/// only by `ingest`, read once at the end to build the summary.
#[derive(Default)]
pub struct RunState {
    pub events_ingested: usize,
    /// Blocking-pause durations per reporting category.
    pub pauses: BTreeMap<EventCategory, DurationStat>,
    /// Completed concurrent-phase durations.
    pub concurrent_phases: DurationStat,
    pub safepoints: DurationStat,
    pub stopped_time: DurationStat,
    pub application_time_us: u64,
    /// Sub-phase accumulation, counted only when present and positive.
    pub root_scanning: DurationStat,
    pub other_phase: DurationStat,

    pub kinds_seen: HashSet<EventKind>,
    pub triggers_seen: HashSet<Trigger>,
    pub families_seen: HashSet<CollectorFamily>,

    pub last_blocking_ms: Option<u64>,
    pub last_safepoint_ms: Option<u64>,
    pub first_event_ms: Option<u64>,
    pub last_event_ms: Option<u64>,

    pub unrecognized_lines: usize,

    pub sys_over_user_count: usize,
    pub sys_over_user_worst: Option<WorstOffender>,
    pub inverted_parallelism_count: usize,
    pub inverted_parallelism_worst: Option<WorstOffender>,
    pub inverted_serialism_count: usize,
    pub inverted_serialism_worst: Option<WorstOffender>,
    pub negative_real_time_count: usize,

    pub findings: Vec<Finding>,
    fired: HashSet<rules::FindingCode>,

    /// Family context carried across events.
    pub family: CollectorFamily,
    pub jdk_major: Option<u32>,
    pub physical_memory: Option<MemoryAmount>,
    pub command_line: Option<String>,
    pub gc_threads: Option<u32>,
}

pub struct Aggregator {
    reorder: bool,
    thresholds: Thresholds,
    rules: Vec<Box<dyn DiagnosticRule>>,
    state: RunState,
}

impl Aggregator {
    pub fn new(thresholds: Thresholds, reorder: bool) -> Self {
        Self {
            reorder,
            thresholds,
            rules: rules::all_rules(),
            state: RunState {
                family: CollectorFamily::Unknown,
                ..Default::default()
            },
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Fold one event into the run state.
    ///
    /// The ordering check runs first: a backward jump between consecutive
    /// blocking events (or consecutive safepoint-stream events) is a
    /// [`Timewarp`] and nothing else of this event is recorded. With
    /// `reorder` the caller has presorted the stream and the check is
    /// waived; the aggregator itself never reorders.
    pub fn ingest(&mut self, event: &Event) -> Result<(), Timewarp> {
        let index = self.state.events_ingested;
        let ts = event.timestamp_ms();

        if !self.reorder {
            let last = if event.is_blocking() {
                self.state.last_blocking_ms
            } else if matches!(event, Event::Safepoint(_) | Event::StoppedTime(_)) {
                self.state.last_safepoint_ms
            } else {
                None
            };
            if let Some(previous_ms) = last
                && ts < previous_ms
            {
                return Err(Timewarp {
                    previous_ms,
                    current_ms: ts,
                    at_event_index: index,
                });
            }
        }

        self.harvest_context(event);
        self.record_stats(event, ts);
        self.track_worker_anomalies(event, ts, index);
        self.evaluate_rules(event, index);

        self.state.events_ingested += 1;
        Ok(())
    }

    /// Header harvesting and family context updates.
    fn harvest_context(&mut self, event: &Event) {
        if let Event::Header(h) = event {
            if let Some(family) = h.family {
                self.state.family = family;
                self.state.families_seen.insert(family);
            }
            if h.jdk_major.is_some() {
                self.state.jdk_major = h.jdk_major;
            }
            if h.physical_memory.is_some() {
                self.state.physical_memory = h.physical_memory;
            }
            match h.kind {
                EventKind::CommandLineFlags => {
                    self.state.command_line = Some(h.text.clone());
                }
                EventKind::GcThreads => {
                    self.state.gc_threads = h
                        .text
                        .split(": ")
                        .nth(1)
                        .and_then(|n| n.trim().parse().ok());
                }
                _ => {}
            }
        }
        if let Some(family) = event.kind().family() {
            self.state.family = family;
            self.state.families_seen.insert(family);
        }
    }

    fn record_stats(&mut self, event: &Event, ts: u64) {
        let state = &mut self.state;
        state.kinds_seen.insert(event.kind());
        if event.trigger() != Trigger::None {
            state.triggers_seen.insert(event.trigger());
        }

        if !matches!(event, Event::Header(_)) {
            state.first_event_ms = Some(state.first_event_ms.unwrap_or(ts).min(ts));
            state.last_event_ms = Some(state.last_event_ms.unwrap_or(ts).max(ts));
        }

        match event {
            Event::Pause(pause) => {
                state
                    .pauses
                    .entry(pause.kind.category())
                    .or_default()
                    .record(pause.duration_us);
                state.last_blocking_ms = Some(ts);

                if let Some(us) = pause.phases.root_scanning_us.filter(|us| *us > 0) {
                    state.root_scanning.record(us);
                }
                if let Some(us) = pause.phases.other_us.filter(|us| *us > 0) {
                    state.other_phase.record(us);
                }
            }
            Event::Concurrent(c) => {
                if let Some(us) = c.duration_us {
                    state.concurrent_phases.record(us);
                }
            }
            Event::Safepoint(sp) => {
                state.safepoints.record(sp.duration_us);
                state.last_safepoint_ms = Some(ts);
            }
            Event::StoppedTime(st) => {
                if st.kind == EventKind::ApplicationStoppedTime {
                    state.stopped_time.record(st.duration_us);
                } else {
                    state.application_time_us += st.duration_us;
                }
                state.last_safepoint_ms = Some(ts);
            }
            Event::Unrecognized(_) => {
                state.unrecognized_lines += 1;
            }
            Event::Header(_) | Event::Warning(_) => {}
        }
    }

    /// Parallel-worker timing anomalies, each tracking its single worst
    /// offending event.
    fn track_worker_anomalies(&mut self, event: &Event, ts: u64, index: usize) {
        let Event::Pause(pause) = event else { return };
        let Some(times) = pause.worker else { return };
        let state = &mut self.state;

        if times.flagged() {
            state.negative_real_time_count += 1;
            return;
        }
        let real_us = times.real_us as u64;
        let cpu_us = times.user_us + times.sys_us;

        // sys > user beyond measurement noise.
        if times.sys_us > times.user_us + SYS_OVER_USER_TOLERANCE_US {
            state.sys_over_user_count += 1;
            let excess_us = times.sys_us - times.user_us;
            if state
                .sys_over_user_worst
                .is_none_or(|w| excess_us > w.excess_us)
            {
                state.sys_over_user_worst = Some(WorstOffender {
                    at_event_index: index,
                    timestamp_ms: ts,
                    excess_us,
                });
            }
        }

        // Inverted parallelism: wall time exceeding total CPU time means
        // workers sat idle.
        if cpu_us > 0 && real_us > cpu_us {
            state.inverted_parallelism_count += 1;
            let excess_us = real_us - cpu_us;
            if state
                .inverted_parallelism_worst
                .is_none_or(|w| excess_us > w.excess_us)
            {
                state.inverted_parallelism_worst = Some(WorstOffender {
                    at_event_index: index,
                    timestamp_ms: ts,
                    excess_us,
                });
            }
        }

        // Inverted serialism: wall time below the count-weighted ideal
        // `(user+sys)/workers`, which no real schedule can achieve.
        let workers = (state.gc_threads.unwrap_or(1) as u64).max(1);
        let ideal_us = cpu_us / workers;
        if real_us < ideal_us {
            state.inverted_serialism_count += 1;
            let excess_us = ideal_us - real_us;
            if state
                .inverted_serialism_worst
                .is_none_or(|w| excess_us > w.excess_us)
            {
                state.inverted_serialism_worst = Some(WorstOffender {
                    at_event_index: index,
                    timestamp_ms: ts,
                    excess_us,
                });
            }
        }
    }

    fn evaluate_rules(&mut self, event: &Event, index: usize) {
        let ctx = RuleContext {
            event,
            family: self.state.family,
            event_index: index,
            thresholds: &self.thresholds,
        };
        for rule in &self.rules {
            if self.state.fired.contains(&rule.code()) {
                continue;
            }
            if let Some(finding) = rule.evaluate(&ctx) {
                self.state.fired.insert(finding.code);
                self.state.findings.push(finding);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{MemoryRegions, PauseEvent, SafepointEvent, SubPhases, WorkerTimes};

    fn pause(kind: EventKind, ts: u64, us: u64) -> Event {
        Event::Pause(PauseEvent {
            kind,
            timestamp_ms: ts,
            duration_us: us,
            trigger: Trigger::None,
            regions: MemoryRegions::default(),
            worker: None,
            phases: SubPhases::default(),
            gc_id: None,
            perm_gen: false,
        })
    }

    fn aggregator() -> Aggregator {
        Aggregator::new(Thresholds::default(), false)
    }

    #[test]
    fn test_ordered_blocking_events_accepted() {
        let mut agg = aggregator();
        agg.ingest(&pause(EventKind::PsYoung, 1000, 5000)).unwrap();
        agg.ingest(&pause(EventKind::PsYoung, 2000, 5000)).unwrap();
        assert_eq!(agg.state().pauses[&EventCategory::Young].count, 2);
    }

    #[test]
    fn test_timewarp_on_backward_blocking() {
        let mut agg = aggregator();
        agg.ingest(&pause(EventKind::PsYoung, 2000, 5000)).unwrap();
        let err = agg.ingest(&pause(EventKind::PsYoung, 1000, 5000)).unwrap_err();
        assert_eq!(err.previous_ms, 2000);
        assert_eq!(err.current_ms, 1000);
        // Terminal for that ingest: nothing was recorded.
        assert_eq!(agg.state().events_ingested, 1);
    }

    #[test]
    fn test_reorder_waives_ordering() {
        let mut agg = Aggregator::new(Thresholds::default(), true);
        agg.ingest(&pause(EventKind::PsYoung, 2000, 5000)).unwrap();
        agg.ingest(&pause(EventKind::PsYoung, 1000, 5000)).unwrap();
        assert_eq!(agg.state().events_ingested, 2);
    }

    #[test]
    fn test_concurrent_events_exempt_from_ordering() {
        let mut agg = aggregator();
        agg.ingest(&pause(EventKind::PsYoung, 5000, 1000)).unwrap();
        let concurrent = Event::Concurrent(crate::event::ConcurrentEvent {
            kind: EventKind::CmsConcurrentMark,
            timestamp_ms: 1000,
            duration_us: Some(10),
            gc_id: None,
        });
        agg.ingest(&concurrent).unwrap();
    }

    #[test]
    fn test_safepoint_stream_ordering_is_separate() {
        let mut agg = aggregator();
        agg.ingest(&pause(EventKind::PsYoung, 5000, 1000)).unwrap();
        // Safepoint at an earlier timestamp than the blocking stream is
        // fine; the streams are ordered independently.
        let sp = Event::Safepoint(SafepointEvent {
            timestamp_ms: 4000,
            duration_us: 100,
            sync_us: None,
            operation: None,
        });
        agg.ingest(&sp).unwrap();
    }

    #[test]
    fn test_sys_over_user_tolerance() {
        let mut agg = aggregator();
        let mut p = pause(EventKind::PsYoung, 1000, 5000);
        if let Event::Pause(pe) = &mut p {
            // 1ms over user: inside tolerance, not counted.
            pe.worker = Some(WorkerTimes { user_us: 10_000, sys_us: 11_000, real_us: 20_000 });
        }
        agg.ingest(&p).unwrap();
        assert_eq!(agg.state().sys_over_user_count, 0);

        let mut p = pause(EventKind::PsYoung, 2000, 5000);
        if let Event::Pause(pe) = &mut p {
            pe.worker = Some(WorkerTimes { user_us: 10_000, sys_us: 20_000, real_us: 30_000 });
        }
        agg.ingest(&p).unwrap();
        assert_eq!(agg.state().sys_over_user_count, 1);
        assert_eq!(agg.state().sys_over_user_worst.unwrap().excess_us, 10_000);
    }

    #[test]
    fn test_inverted_parallelism_tracks_worst() {
        let mut agg = aggregator();
        for (ts, user, real) in [(1000u64, 10_000u64, 15_000i64), (2000, 10_000, 40_000)] {
            let mut p = pause(EventKind::ParNew, ts, 5000);
            if let Event::Pause(pe) = &mut p {
                pe.worker = Some(WorkerTimes { user_us: user, sys_us: 0, real_us: real });
            }
            agg.ingest(&p).unwrap();
        }
        assert_eq!(agg.state().inverted_parallelism_count, 2);
        let worst = agg.state().inverted_parallelism_worst.unwrap();
        assert_eq!(worst.timestamp_ms, 2000);
        assert_eq!(worst.excess_us, 30_000);
    }

    #[test]
    fn test_negative_real_flagged_not_rejected() {
        let mut agg = aggregator();
        let mut p = pause(EventKind::PsYoung, 1000, 5000);
        if let Event::Pause(pe) = &mut p {
            pe.worker = Some(WorkerTimes { user_us: 10_000, sys_us: 0, real_us: -5000 });
        }
        agg.ingest(&p).unwrap();
        assert_eq!(agg.state().negative_real_time_count, 1);
        assert_eq!(agg.state().events_ingested, 1);
    }

    #[test]
    fn test_subphases_counted_only_when_positive() {
        let mut agg = aggregator();
        let mut p = pause(EventKind::CmsRemark, 1000, 5000);
        if let Event::Pause(pe) = &mut p {
            pe.phases.root_scanning_us = Some(0);
            pe.phases.other_us = Some(400);
        }
        agg.ingest(&p).unwrap();
        assert_eq!(agg.state().root_scanning.count, 0);
        assert_eq!(agg.state().other_phase.count, 1);
    }

    #[test]
    fn test_family_learned_from_events() {
        let mut agg = aggregator();
        agg.ingest(&pause(EventKind::ParNew, 1000, 5000)).unwrap();
        assert_eq!(agg.state().family, CollectorFamily::Cms);
        assert!(agg.state().families_seen.contains(&CollectorFamily::Cms));
    }
}
