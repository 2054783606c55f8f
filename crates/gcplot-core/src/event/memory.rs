//! Memory sizes with explicit units.
//!
//! GC logs report heap figures in whatever unit the JVM picked (`512K`,
//! `24M`, `8G`, or plain bytes). Every size in the event model is a
//! [`MemoryAmount`] so conversion happens in one place; comparison and
//! arithmetic always normalize to a common unit before combining.

use serde::{Deserialize, Serialize};

/// Unit of a memory figure as it appeared in the log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Bytes,
    Kilobytes,
    Megabytes,
    Gigabytes,
}

impl Unit {
    /// Bytes per one unit.
    pub fn byte_factor(self) -> u64 {
        match self {
            Unit::Bytes => 1,
            Unit::Kilobytes => 1024,
            Unit::Megabytes => 1024 * 1024,
            Unit::Gigabytes => 1024 * 1024 * 1024,
        }
    }

    /// Unit letter used by HotSpot logs (`K`, `M`, `G`, `B`).
    pub fn suffix(self) -> char {
        match self {
            Unit::Bytes => 'B',
            Unit::Kilobytes => 'K',
            Unit::Megabytes => 'M',
            Unit::Gigabytes => 'G',
        }
    }

    /// Map a HotSpot unit letter to a unit. Accepts upper and lower case.
    pub fn from_suffix(c: char) -> Option<Unit> {
        match c.to_ascii_uppercase() {
            'B' => Some(Unit::Bytes),
            'K' => Some(Unit::Kilobytes),
            'M' => Some(Unit::Megabytes),
            'G' => Some(Unit::Gigabytes),
            _ => None,
        }
    }
}

/// A value plus the unit it was logged in.
///
/// The original unit is preserved so a round trip through bytes is lossless
/// to the unit's resolution.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct MemoryAmount {
    value: u64,
    unit: Unit,
}

impl MemoryAmount {
    /// Canonical empty amount.
    pub const ZERO: MemoryAmount = MemoryAmount {
        value: 0,
        unit: Unit::Kilobytes,
    };

    pub fn new(value: u64, unit: Unit) -> Self {
        Self { value, unit }
    }

    pub fn kilobytes(value: u64) -> Self {
        Self::new(value, Unit::Kilobytes)
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn unit(&self) -> Unit {
        self.unit
    }

    /// Total size in bytes.
    pub fn bytes(&self) -> u64 {
        self.value.saturating_mul(self.unit.byte_factor())
    }

    /// Whole kilobytes, truncating sub-kilobyte remainders.
    pub fn as_kilobytes(&self) -> u64 {
        self.bytes() / 1024
    }

    /// Re-expresses the amount in `unit`, truncating to that unit's
    /// resolution. Converting back to the original (finer or equal) unit
    /// is lossless.
    pub fn in_unit(&self, unit: Unit) -> MemoryAmount {
        MemoryAmount {
            value: self.bytes() / unit.byte_factor(),
            unit,
        }
    }

    /// Difference in the finer of the two units, clamped at zero.
    ///
    /// Legacy log lines record only combined totals for some collections;
    /// a sibling generation's figures are derived by subtraction, so the
    /// result must stay in a unit neither operand loses precision in.
    pub fn saturating_sub(&self, other: MemoryAmount) -> MemoryAmount {
        let unit = finer_unit(self.unit, other.unit);
        let lhs = self.bytes() / unit.byte_factor();
        let rhs = other.bytes() / unit.byte_factor();
        MemoryAmount {
            value: lhs.saturating_sub(rhs),
            unit,
        }
    }

    /// Sum in the finer of the two units.
    pub fn saturating_add(&self, other: MemoryAmount) -> MemoryAmount {
        let unit = finer_unit(self.unit, other.unit);
        let lhs = self.bytes() / unit.byte_factor();
        let rhs = other.bytes() / unit.byte_factor();
        MemoryAmount {
            value: lhs.saturating_add(rhs),
            unit,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0
    }
}

fn finer_unit(a: Unit, b: Unit) -> Unit {
    if a.byte_factor() <= b.byte_factor() { a } else { b }
}

impl PartialEq for MemoryAmount {
    fn eq(&self, other: &Self) -> bool {
        self.bytes() == other.bytes()
    }
}

impl Eq for MemoryAmount {}

impl PartialOrd for MemoryAmount {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MemoryAmount {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.bytes().cmp(&other.bytes())
    }
}

impl std::fmt::Display for MemoryAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.value, self.unit.suffix())
    }
}

/// Heap generation a memory reading belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Generation {
    Young,
    Old,
    Combined,
    ClassMetadata,
}

/// Occupancy before and after a collection, plus the region capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRegion {
    pub before: MemoryAmount,
    pub after: MemoryAmount,
    pub capacity: MemoryAmount,
}

impl MemoryRegion {
    pub fn new(before: MemoryAmount, after: MemoryAmount, capacity: MemoryAmount) -> Self {
        Self {
            before,
            after,
            capacity,
        }
    }

    /// Derives a generation's figures as `self - other`, pairing before
    /// with before and after with after. Mixing the pairings would
    /// cross-contaminate two sub-events glued into one physical line.
    pub fn sub_paired(&self, other: &MemoryRegion) -> MemoryRegion {
        MemoryRegion {
            before: self.before.saturating_sub(other.before),
            after: self.after.saturating_sub(other.after),
            capacity: self.capacity.saturating_sub(other.capacity),
        }
    }
}

/// Per-generation readings attached to one collection event.
///
/// Generations a line did not report stay `None`; a reported zero-sized
/// region is valid data and is kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRegions {
    pub young: Option<MemoryRegion>,
    pub old: Option<MemoryRegion>,
    pub combined: Option<MemoryRegion>,
    pub class_metadata: Option<MemoryRegion>,
}

impl MemoryRegions {
    pub fn get(&self, generation: Generation) -> Option<MemoryRegion> {
        match generation {
            Generation::Young => self.young,
            Generation::Old => self.old,
            Generation::Combined => self.combined,
            Generation::ClassMetadata => self.class_metadata,
        }
    }

    pub fn set(&mut self, generation: Generation, region: MemoryRegion) {
        match generation {
            Generation::Young => self.young = Some(region),
            Generation::Old => self.old = Some(region),
            Generation::Combined => self.combined = Some(region),
            Generation::ClassMetadata => self.class_metadata = Some(region),
        }
    }

    /// Fills `old` from `combined - young` when a legacy line logged only
    /// the young and combined figures.
    pub fn derive_old_from_combined(&mut self) {
        if self.old.is_none()
            && let (Some(combined), Some(young)) = (self.combined, self.young)
        {
            self.old = Some(combined.sub_paired(&young));
        }
    }

    /// Fills `young` from `combined - old`; the CMS concurrent-mode-failure
    /// composite line logs old and combined but not young.
    pub fn derive_young_from_combined(&mut self) {
        if self.young.is_none()
            && let (Some(combined), Some(old)) = (self.combined, self.old)
        {
            self.young = Some(combined.sub_paired(&old));
        }
    }
}
