//! Density-driven lazy population of hierarchy regions.
//!
//! A region never stores how many children it "has". Each kind of content is
//! described by a [`ChildDefinition`] with a density per cubic metre; the
//! expected count for any volume follows from it, and the deficit against the
//! children already materialized is generated on demand through a weighted
//! lottery ([`Population`]).

pub mod census;
pub mod definition;
pub mod engine;

use cosmo_hierarchy::{HierarchyError, Kind};
use thiserror::Error;

pub use census::{Census, CensusEntry};
pub use definition::{ChildDefinition, Constructor, KindEntry, KindTable, Matcher, NodeGenerator};
pub use engine::{Engine, Location, Population, PopulationSettings};

#[derive(Debug, Error)]
pub enum PopulationError {
    #[error("kind `{0}` has no entry in the kind table")]
    UnknownKind(Kind),
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
}
