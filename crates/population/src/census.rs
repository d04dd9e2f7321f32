//! Expected versus materialized child counts, without generating anything.

use cosmo_hierarchy::{Kind, NodeId};

#[derive(Debug, Clone, PartialEq)]
pub struct CensusEntry {
    pub kind: Kind,
    /// Expected count for the queried volume; may be fractional or astronomically large.
    pub expected: f64,
    /// Children already in the tree that match the definition.
    pub materialized: usize,
}

impl CensusEntry {
    /// Count still to be generated; never negative.
    pub fn deficit(&self) -> f64 {
        (self.expected - self.materialized as f64).max(0.0)
    }
}

/// Per-kind counts for a region or a bounded part of it.
#[derive(Debug, Clone, PartialEq)]
pub struct Census {
    pub region: NodeId,
    /// Queried volume in cubic metres.
    pub volume: f64,
    pub entries: Vec<CensusEntry>,
}

impl Census {
    pub fn entry(&self, kind: &Kind) -> Option<&CensusEntry> {
        self.entries.iter().find(|entry| &entry.kind == kind)
    }

    pub fn total_expected(&self) -> f64 {
        self.entries.iter().map(|entry| entry.expected).sum()
    }

    pub fn total_materialized(&self) -> usize {
        self.entries.iter().map(|entry| entry.materialized).sum()
    }
}
