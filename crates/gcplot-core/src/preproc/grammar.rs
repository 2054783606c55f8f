//! Multi-line grammar capability.
//!
//! Each collector family that splits one logical event across physical
//! lines implements [`FamilyGrammar`]. At most one grammar is active at a
//! time; the driver enforces the mutual exclusion, so a grammar never has
//! to defend against another family's merge being in flight.

/// Result of offering a line to a grammar.
#[derive(Debug, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Line consumed; the merge is still assembling.
    Incomplete,
    /// Line consumed and the merge is done; emit these canonical lines.
    Complete(Vec<String>),
    /// Line belongs to an unrelated stream interleaved with the merge;
    /// the driver buffers it and flushes once the merge resolves.
    Entangled,
    /// Not this grammar's line. When the grammar was active, the driver
    /// drains it and re-offers the line from scratch.
    Declined,
}

/// What an interrupted or finished grammar hands back.
#[derive(Debug, Default)]
pub struct Drain {
    /// Lines to emit, raw or synthesized, in original order.
    pub emit: Vec<String>,
}

pub trait FamilyGrammar {
    fn name(&self) -> &'static str;

    /// Whether this grammar participates given the sniffed JDK version.
    /// Unified logging replaced the per-collector grammars at JDK 9.
    fn applies(&self, jdk_major: Option<u32>) -> bool;

    /// Offer the current line with one-line lookahead. Called to open a
    /// merge (inactive) and to extend one (active).
    fn offer(&mut self, line: &str, next: Option<&str>) -> MergeOutcome;

    fn is_active(&self) -> bool;

    /// Deactivate, returning whatever was buffered.
    fn drain(&mut self) -> Drain;
}
