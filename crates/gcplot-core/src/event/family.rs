//! Collector families.

use serde::{Deserialize, Serialize};

/// The generational/regional GC algorithm in effect.
///
/// Established by header lines (`Using G1`, version banners, flag dumps) or
/// by the first family-specific event line, and carried forward as context
/// until a later header changes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectorFamily {
    G1,
    Cms,
    Parallel,
    Serial,
    Shenandoah,
    Z,
    Unknown,
}

impl CollectorFamily {
    pub fn name(&self) -> &'static str {
        match self {
            CollectorFamily::G1 => "G1",
            CollectorFamily::Cms => "CMS",
            CollectorFamily::Parallel => "Parallel",
            CollectorFamily::Serial => "Serial",
            CollectorFamily::Shenandoah => "Shenandoah",
            CollectorFamily::Z => "ZGC",
            CollectorFamily::Unknown => "Unknown",
        }
    }

    /// Family announced by a unified-logging `Using <collector>` line.
    pub fn from_announcement(name: &str) -> Option<CollectorFamily> {
        match name.trim() {
            "G1" => Some(CollectorFamily::G1),
            "Concurrent Mark Sweep" => Some(CollectorFamily::Cms),
            "Parallel" => Some(CollectorFamily::Parallel),
            "Serial" => Some(CollectorFamily::Serial),
            "Shenandoah" => Some(CollectorFamily::Shenandoah),
            "The Z Garbage Collector" => Some(CollectorFamily::Z),
            _ => None,
        }
    }

    /// True for collectors with concurrent phases; an explicit serial full
    /// collection under one of these is a heavier finding than under a
    /// stop-the-world collector.
    pub fn is_concurrent_collector(&self) -> bool {
        matches!(
            self,
            CollectorFamily::G1 | CollectorFamily::Cms | CollectorFamily::Shenandoah | CollectorFamily::Z
        )
    }
}

impl Default for CollectorFamily {
    fn default() -> Self {
        CollectorFamily::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_announcement_names() {
        assert_eq!(
            CollectorFamily::from_announcement("Concurrent Mark Sweep"),
            Some(CollectorFamily::Cms)
        );
        assert_eq!(CollectorFamily::from_announcement("G1"), Some(CollectorFamily::G1));
        assert_eq!(CollectorFamily::from_announcement("Epsilon"), None);
    }

    #[test]
    fn test_default_is_unknown() {
        assert_eq!(CollectorFamily::default(), CollectorFamily::Unknown);
    }
}
