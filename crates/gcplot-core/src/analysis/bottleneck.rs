//! Post-hoc bottleneck detection over the stored event sequence.
//!
//! For each consecutive pair in a stream, throughput is
//! `1 - duration / Δtimestamp`: the fraction of the interval the
//! application actually ran. Pairs below the caller's threshold are
//! collected; consecutive flagged pairs that share an endpoint merge into
//! one run, and a gap between runs is an explicit `"…"` marker in the
//! output list. The blocking-pause and safepoint streams are judged
//! separately.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::event::Event;
use crate::fmt::{format_ms, format_timestamp};

/// Gap marker between merged runs.
pub const GAP: &str = "…";

/// One endpoint of a throughput pair, lifted out of the stored event.
#[derive(Clone, Debug)]
pub struct PauseSample {
    pub timestamp_ms: u64,
    pub duration_ms: u64,
    pub label: &'static str,
}

impl PauseSample {
    /// Blocking pauses and safepoint-stream events carry enough to be a
    /// sample; everything else does not participate.
    pub fn from_event(event: &Event) -> Option<PauseSample> {
        if !event.is_ordered() {
            return None;
        }
        Some(PauseSample {
            timestamp_ms: event.timestamp_ms(),
            duration_ms: event.duration_ms()?,
            label: event.kind().name(),
        })
    }

    fn render(&self, jvm_start: Option<DateTime<Utc>>) -> String {
        format!(
            "{} {} ({})",
            format_timestamp(self.timestamp_ms, jvm_start),
            self.label,
            format_ms(self.duration_ms)
        )
    }
}

/// Flat list of rendered endpoints with `"…"` between non-adjacent runs.
///
/// When a JVM start date is supplied the endpoints render as absolute
/// timestamps and are deduplicated by that rendering.
pub fn detect(
    samples: &[PauseSample],
    threshold_pct: f64,
    jvm_start: Option<DateTime<Utc>>,
) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut last_flagged: Option<usize> = None;

    let mut push = |out: &mut Vec<String>, seen: &mut HashSet<String>, sample: &PauseSample| {
        let rendered = sample.render(jvm_start);
        if jvm_start.is_some() && !seen.insert(rendered.clone()) {
            return;
        }
        out.push(rendered);
    };

    for i in 1..samples.len() {
        let earlier = &samples[i - 1];
        let later = &samples[i];
        let interval_ms = later.timestamp_ms.saturating_sub(earlier.timestamp_ms);
        if interval_ms == 0 {
            continue;
        }
        let throughput_pct =
            (1.0 - later.duration_ms as f64 / interval_ms as f64) * 100.0;
        if throughput_pct >= threshold_pct {
            continue;
        }

        if last_flagged != Some(i - 1) {
            if !out.is_empty() {
                out.push(GAP.to_string());
            }
            push(&mut out, &mut seen, earlier);
        }
        push(&mut out, &mut seen, later);
        last_flagged = Some(i);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(ts: u64, dur: u64) -> PauseSample {
        PauseSample {
            timestamp_ms: ts,
            duration_ms: dur,
            label: "young",
        }
    }

    #[test]
    fn test_boundary_exactly_at_threshold_not_flagged() {
        // Events at 10000 and 11000 with 500ms durations: throughput is
        // exactly 50%, which does not undercut a 50% threshold.
        let samples = [sample(10_000, 500), sample(11_000, 500)];
        assert!(detect(&samples, 50.0, None).is_empty());

        // One extra millisecond of pause flips it.
        let samples = [sample(10_000, 500), sample(11_000, 501)];
        let flagged = detect(&samples, 50.0, None);
        assert_eq!(flagged.len(), 2);
    }

    #[test]
    fn test_adjacent_pairs_merge_into_one_run() {
        let samples = [
            sample(10_000, 900),
            sample(11_000, 900),
            sample(12_000, 900),
        ];
        let flagged = detect(&samples, 50.0, None);
        // One run of three endpoints, no gap marker.
        assert_eq!(flagged.len(), 3);
        assert!(!flagged.contains(&GAP.to_string()));
    }

    #[test]
    fn test_gap_marker_between_runs() {
        let samples = [
            sample(10_000, 900),
            sample(11_000, 900),
            // Healthy stretch.
            sample(100_000, 10),
            sample(200_000, 10),
            // Second bad run.
            sample(201_000, 900),
        ];
        let flagged = detect(&samples, 50.0, None);
        assert_eq!(
            flagged.iter().filter(|s| s.as_str() == GAP).count(),
            1
        );
        // 2 endpoints + gap + 2 endpoints.
        assert_eq!(flagged.len(), 5);
    }

    #[test]
    fn test_absolute_rendering_and_dedup() {
        let start = Utc.with_ymd_and_hms(2015, 5, 26, 12, 0, 0).unwrap();
        let samples = [sample(10_000, 900), sample(11_000, 900)];
        let flagged = detect(&samples, 50.0, Some(start));
        assert!(flagged[0].starts_with("2015-05-26T12:00:10.000"));

        // Two samples rendering identically collapse to one entry.
        let samples = [sample(10_000, 900), sample(10_000, 900), sample(11_000, 900)];
        let flagged = detect(&samples, 50.0, Some(start));
        let unique: std::collections::HashSet<_> = flagged.iter().collect();
        assert_eq!(unique.len(), flagged.len());
    }

    #[test]
    fn test_zero_interval_skipped() {
        let samples = [sample(10_000, 500), sample(10_000, 500)];
        assert!(detect(&samples, 99.0, None).is_empty());
    }
}
