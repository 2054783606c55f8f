//! gcplot - JVM GC log analyzer.
//!
//! Reads a collected GC log, runs it through the preprocessing,
//! classification, and aggregation pipeline, and renders the run summary
//! as text or JSON.

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{Level, error, info};
use tracing_subscriber::EnvFilter;

use gcplot_core::analysis::rules::Severity;
use gcplot_core::fmt::{format_bytes, format_ms, format_pct};
use gcplot_core::store::{EventSink, MemoryStore, chunk};
use gcplot_core::util::parse_jvm_start;
use gcplot_core::{AnalyzeConfig, AnalyzeError, RunSummary, Thresholds, analyze_lines};

/// JVM GC log analyzer.
#[derive(Parser)]
#[command(name = "gcplot", about = "JVM GC log analyzer", version)]
struct Args {
    /// Path to the GC log file.
    log: PathBuf,

    /// Throughput percentage below which a consecutive event pair is
    /// reported as a bottleneck.
    #[arg(short, long, default_value = "90.0")]
    threshold: f64,

    /// JVM start instant (ISO 8601, Unix timestamp, or date:time).
    /// Anchors datestamp-only logs and enables absolute timestamps.
    #[arg(long, value_name = "WHEN")]
    jvm_start: Option<String>,

    /// Render report timestamps as absolute instants. Requires --jvm-start
    /// unless the log carries datestamps.
    #[arg(long)]
    absolute: bool,

    /// Input was presorted by timestamp; waive the ordering check.
    #[arg(long)]
    reorder: bool,

    /// Emit the summary as JSON instead of text.
    #[arg(long)]
    json: bool,

    /// Persist the classified events to a compressed chunk file.
    #[arg(long, value_name = "FILE")]
    save_events: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// Initializes the tracing subscriber with the appropriate log level.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("gcplot={}", level).parse().unwrap())
        .add_directive(format!("gcplot_core={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let jvm_start = match args.jvm_start.as_deref().map(parse_jvm_start) {
        Some(Ok(dt)) => Some(dt),
        Some(Err(e)) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
        None => None,
    };

    let content = match fs::read_to_string(&args.log) {
        Ok(content) => content,
        Err(e) => {
            error!("cannot read {}: {e}", args.log.display());
            return ExitCode::FAILURE;
        }
    };
    let lines: Vec<&str> = content.lines().collect();

    let config = AnalyzeConfig {
        jvm_start,
        absolute_timestamps: args.absolute,
        reorder: args.reorder,
        thresholds: Thresholds {
            bottleneck_throughput_pct: args.threshold,
            ..Default::default()
        },
    };

    let mut store = MemoryStore::new();
    let summary = match analyze_lines(&lines, &config, &mut store) {
        Ok(summary) => summary,
        Err(AnalyzeError::Timewarp(tw)) => {
            error!("{tw}; re-run with --reorder if the log was assembled out of order");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = &args.save_events {
        let events = store.events();
        match chunk::write_events(path, &events) {
            Ok(()) => info!("saved {} events to {}", events.len(), path.display()),
            Err(e) => {
                error!("cannot save events to {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    if args.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                error!("cannot serialize summary: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print_report(&summary);
    }
    ExitCode::SUCCESS
}

fn print_report(summary: &RunSummary) {
    println!("gcplot run summary");
    println!("==================");
    if !summary.collector_families.is_empty() {
        println!("collectors:       {}", summary.collector_families.join(", "));
    }
    if let Some(major) = summary.jdk_major {
        println!("jdk:              {major}");
    }
    if let Some(bytes) = summary.physical_memory_bytes {
        println!("physical memory:  {}", format_bytes(bytes));
    }
    println!("events:           {}", summary.events_ingested);
    if summary.unrecognized_lines > 0 {
        println!("unidentified:     {} lines", summary.unrecognized_lines);
    }
    if let Some(line) = &summary.last_unprocessed_line {
        println!("log ends mid-event: {line}");
    }
    println!();

    println!("pauses");
    println!("------");
    for (category, stat) in &summary.pause_categories {
        println!(
            "{:<12} count {:>6}  total {:>10}  max {:>10}",
            category,
            stat.count,
            format_ms(stat.total_ms),
            format_ms(stat.max_ms)
        );
    }
    println!(
        "{:<12} count {:>6}  total {:>10}  max {:>10}",
        "Safepoint",
        summary.safepoints.count,
        format_ms(summary.safepoints.total_ms),
        format_ms(summary.safepoints.max_ms)
    );
    println!("max pause:        {}", format_ms(summary.max_pause_ms));
    println!("total paused:     {}", format_ms(summary.total_pause_ms));
    if let Some(pct) = summary.throughput_pct {
        println!("throughput:       {}", format_pct(pct));
    }
    println!();

    if !summary.findings.is_empty() {
        println!("findings");
        println!("--------");
        for finding in &summary.findings {
            let tag = match finding.severity {
                Severity::Info => "info",
                Severity::Warning => "warn",
                Severity::Critical => "crit",
            };
            println!("[{tag}] {:?}: {}", finding.code, finding.message);
        }
        println!();
    }

    for (name, list) in [
        ("pause bottlenecks", &summary.blocking_bottlenecks),
        ("safepoint bottlenecks", &summary.safepoint_bottlenecks),
    ] {
        if list.is_empty() {
            continue;
        }
        println!("{name}");
        println!("{}", "-".repeat(name.len()));
        for entry in list {
            println!("  {entry}");
        }
        println!();
    }

    if summary.sys_over_user_count > 0 {
        println!(
            "sys > user on {} collections (worst at event {})",
            summary.sys_over_user_count,
            summary
                .sys_over_user_worst
                .map(|w| w.at_event_index)
                .unwrap_or(0)
        );
    }
    if summary.inverted_parallelism_count > 0 {
        println!(
            "inverted parallelism on {} collections",
            summary.inverted_parallelism_count
        );
    }
}
