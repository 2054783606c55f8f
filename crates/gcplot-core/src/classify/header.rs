//! Legacy header, metadata, and VM-warning line shapes.
//!
//! Pre-unified JVMs open the log with a version banner, a `Memory:` line
//! describing the host, and a `CommandLine flags:` dump. These carry no
//! uptime; their timestamp is zero. VM warnings and OutOfMemoryError
//! reports can land anywhere in the stream.

use crate::event::{Event, EventKind, HeaderEvent, MemoryAmount, Unit, WarningEvent};

use super::scan::take_u64;
use super::{ClassifyContext, Matcher};

pub(super) const MATCHERS: &[Matcher] = &[
    vm_warning,
    version_banner,
    command_line_flags,
    memory_line,
    out_of_memory,
];

/// Major JDK version from a version string: `"1.8.0_121-b13"` is 8,
/// `"17.0.1+12"` is 17.
pub(crate) fn parse_jdk_major(version: &str) -> Option<u32> {
    let (first, rest) = take_u64(version)?;
    if first == 1 {
        let rest = rest.strip_prefix('.')?;
        let (minor, _) = take_u64(rest)?;
        return Some(minor as u32);
    }
    Some(first as u32)
}

fn header(kind: EventKind, text: &str) -> Event {
    Event::Header(HeaderEvent {
        kind,
        timestamp_ms: 0,
        text: text.to_string(),
        family: None,
        jdk_major: None,
        physical_memory: None,
    })
}

/// `Java HotSpot(TM) 64-Bit Server VM warning: GC locker is held; pre
/// dump GC was skipped` — tried before the version banner since both
/// share the banner prefix.
fn vm_warning(line: &str, _ctx: &ClassifyContext) -> Option<Event> {
    let pos = line.find(" VM warning: ")?;
    Some(Event::Warning(WarningEvent {
        kind: EventKind::VmWarning,
        timestamp_ms: 0,
        message: line[pos + " VM warning: ".len()..].to_string(),
    }))
}

/// `java.lang.OutOfMemoryError: Java heap space`
fn out_of_memory(line: &str, _ctx: &ClassifyContext) -> Option<Event> {
    let pos = line.find("java.lang.OutOfMemoryError")?;
    Some(Event::Warning(WarningEvent {
        kind: EventKind::OutOfMemoryError,
        timestamp_ms: 0,
        message: line[pos..].to_string(),
    }))
}

/// `Java HotSpot(TM) 64-Bit Server VM (25.121-b13) for linux-amd64 JRE
/// (1.8.0_121-b13), built on Dec 12 2016 16:36:53 by "java_re" with gcc 4.3.0`
fn version_banner(line: &str, _ctx: &ClassifyContext) -> Option<Event> {
    if !(line.starts_with("Java HotSpot(TM)") || line.starts_with("OpenJDK")) {
        return None;
    }
    if !line.contains("VM (") {
        return None;
    }
    let jdk_major = line
        .find("JRE (")
        .and_then(|pos| parse_jdk_major(&line[pos + "JRE (".len()..]));

    let mut event = header(EventKind::JvmVersion, line);
    if let Event::Header(h) = &mut event {
        h.jdk_major = jdk_major;
    }
    Some(event)
}

/// `CommandLine flags: -XX:InitialHeapSize=262144000 -XX:+UseParallelGC ...`
fn command_line_flags(line: &str, _ctx: &ClassifyContext) -> Option<Event> {
    let flags = line.strip_prefix("CommandLine flags: ")?;
    Some(header(EventKind::CommandLineFlags, flags))
}

/// `Memory: 4k page, physical 16777216k(8237872k free), swap 2097148k(2097148k free)`
fn memory_line(line: &str, _ctx: &ClassifyContext) -> Option<Event> {
    let rest = line.strip_prefix("Memory: ")?;
    let physical = rest.find("physical ").and_then(|pos| {
        let (value, after) = take_u64(&rest[pos + "physical ".len()..])?;
        let unit = Unit::from_suffix(after.chars().next()?)?;
        Some(MemoryAmount::new(value, unit))
    });

    let mut event = header(EventKind::MemoryConfig, line);
    if let Event::Header(h) = &mut event {
        h.physical_memory = physical;
    }
    Some(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ClassifyContext {
        ClassifyContext::default()
    }

    #[test]
    fn test_parse_jdk_major() {
        assert_eq!(parse_jdk_major("1.8.0_121-b13"), Some(8));
        assert_eq!(parse_jdk_major("1.7.0_80"), Some(7));
        assert_eq!(parse_jdk_major("17.0.1+12"), Some(17));
        assert_eq!(parse_jdk_major("11.0.2+9"), Some(11));
        assert_eq!(parse_jdk_major("garbage"), None);
    }

    #[test]
    fn test_version_banner() {
        let line = "Java HotSpot(TM) 64-Bit Server VM (25.121-b13) for linux-amd64 JRE (1.8.0_121-b13), built on Dec 12 2016 16:36:53 by \"java_re\" with gcc 4.3.0";
        let Event::Header(h) = version_banner(line, &ctx()).unwrap() else {
            panic!()
        };
        assert_eq!(h.kind, EventKind::JvmVersion);
        assert_eq!(h.jdk_major, Some(8));
    }

    #[test]
    fn test_command_line_flags() {
        let line = "CommandLine flags: -XX:InitialHeapSize=262144000 -XX:+UseParallelGC";
        let event = command_line_flags(line, &ctx()).unwrap();
        assert_eq!(event.kind(), EventKind::CommandLineFlags);
    }

    #[test]
    fn test_vm_warning() {
        let line = "Java HotSpot(TM) 64-Bit Server VM warning: GC locker is held; pre dump GC was skipped";
        let Event::Warning(w) = vm_warning(line, &ctx()).unwrap() else {
            panic!()
        };
        assert_eq!(w.kind, EventKind::VmWarning);
        assert!(w.message.starts_with("GC locker is held"));
    }

    #[test]
    fn test_out_of_memory() {
        let line = "java.lang.OutOfMemoryError: Java heap space";
        let event = out_of_memory(line, &ctx()).unwrap();
        assert_eq!(event.kind(), EventKind::OutOfMemoryError);
    }

    #[test]
    fn test_memory_line_physical() {
        let line = "Memory: 4k page, physical 16777216k(8237872k free), swap 2097148k(2097148k free)";
        let Event::Header(h) = memory_line(line, &ctx()).unwrap() else {
            panic!()
        };
        assert_eq!(
            h.physical_memory,
            Some(MemoryAmount::new(16777216, Unit::Kilobytes))
        );
    }
}
