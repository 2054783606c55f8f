//! Compressed event-chunk file codec.
//!
//! A parsed run can be persisted and re-loaded without reparsing the log.
//!
//! File layout:
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ HEADER (20 bytes, uncompressed)              │
//! │   magic: [u8; 4]        = b"GCP1"            │
//! │   version: u16          = 1                  │
//! │   _reserved: u16        = 0                  │
//! │   event_count: u32                           │
//! │   payload_crc32: u32    (of compressed data) │
//! │   payload_len: u32                           │
//! ├──────────────────────────────────────────────┤
//! │ PAYLOAD                                      │
//! │   zstd(postcard(Vec<Event>))                 │
//! └──────────────────────────────────────────────┘
//! ```

use std::fs;
use std::io;
use std::path::Path;

use tracing::warn;

use crate::event::Event;

const MAGIC: [u8; 4] = *b"GCP1";
const VERSION: u16 = 1;
const HEADER_SIZE: usize = 20;
const ZSTD_LEVEL: i32 = 3;

/// Serialize, compress, and write events to `path`.
pub fn write_events(path: &Path, events: &[Event]) -> io::Result<()> {
    let encoded = postcard::to_allocvec(events)
        .map_err(|e| io::Error::other(format!("postcard encode: {e}")))?;
    let compressed = zstd::encode_all(encoded.as_slice(), ZSTD_LEVEL)?;
    let crc = crc32fast::hash(&compressed);

    let mut data = Vec::with_capacity(HEADER_SIZE + compressed.len());
    data.extend_from_slice(&MAGIC);
    data.extend_from_slice(&VERSION.to_le_bytes());
    data.extend_from_slice(&0u16.to_le_bytes());
    data.extend_from_slice(&(events.len() as u32).to_le_bytes());
    data.extend_from_slice(&crc.to_le_bytes());
    data.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
    data.extend_from_slice(&compressed);

    fs::write(path, data)
}

/// Read a chunk back. Fails on a bad magic, an unsupported version, or a
/// checksum mismatch.
pub fn read_events(path: &Path) -> io::Result<Vec<Event>> {
    let data = fs::read(path)?;
    if data.len() < HEADER_SIZE {
        return Err(io::Error::other("file too small for header"));
    }

    if data[0..4] != MAGIC {
        return Err(io::Error::other(format!(
            "invalid magic: expected GCP1, got {:?}",
            &data[0..4]
        )));
    }
    let version = u16::from_le_bytes([data[4], data[5]]);
    if version != VERSION {
        return Err(io::Error::other(format!("unsupported version: {version}")));
    }
    let event_count = u32::from_le_bytes(data[8..12].try_into().unwrap()) as usize;
    let expected_crc = u32::from_le_bytes(data[12..16].try_into().unwrap());
    let payload_len = u32::from_le_bytes(data[16..20].try_into().unwrap()) as usize;

    if data.len() < HEADER_SIZE + payload_len {
        return Err(io::Error::other("file truncated"));
    }
    let payload = &data[HEADER_SIZE..HEADER_SIZE + payload_len];
    let actual_crc = crc32fast::hash(payload);
    if actual_crc != expected_crc {
        return Err(io::Error::other(format!(
            "checksum mismatch: expected {expected_crc:08x}, got {actual_crc:08x}"
        )));
    }

    let decoded = zstd::decode_all(payload)?;
    let events: Vec<Event> = postcard::from_bytes(&decoded)
        .map_err(|e| io::Error::other(format!("postcard decode: {e}")))?;
    if events.len() != event_count {
        warn!(
            expected = event_count,
            actual = events.len(),
            "event count mismatch in chunk header"
        );
    }
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{
        EventKind, MemoryAmount, MemoryRegion, MemoryRegions, PauseEvent, SubPhases, Trigger,
    };

    fn sample_events() -> Vec<Event> {
        let mut regions = MemoryRegions::default();
        regions.young = Some(MemoryRegion::new(
            MemoryAmount::kilobytes(27808),
            MemoryAmount::kilobytes(632),
            MemoryAmount::kilobytes(28032),
        ));
        vec![
            Event::Pause(PauseEvent {
                kind: EventKind::PsYoung,
                timestamp_ms: 19810091,
                duration_us: 22521,
                trigger: Trigger::AllocationFailure,
                regions,
                worker: None,
                phases: SubPhases::default(),
                gc_id: None,
                perm_gen: false,
            }),
            Event::Unrecognized(crate::event::UnrecognizedEvent {
                timestamp_ms: 5,
                line: "???".to_string(),
            }),
        ]
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.gcp");
        let events = sample_events();

        write_events(&path, &events).unwrap();
        let loaded = read_events(&path).unwrap();
        assert_eq!(loaded, events);
    }

    #[test]
    fn test_corruption_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.gcp");
        write_events(&path, &sample_events()).unwrap();

        let mut data = fs::read(&path).unwrap();
        let last = data.len() - 1;
        data[last] ^= 0xff;
        fs::write(&path, &data).unwrap();

        let err = read_events(&path).unwrap_err();
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn test_bad_magic_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.gcp");
        fs::write(&path, b"NOPEnope nope nope nope").unwrap();
        let err = read_events(&path).unwrap_err();
        assert!(err.to_string().contains("invalid magic"));
    }
}
