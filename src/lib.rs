//! Procedural generation and navigation of a hierarchical universe.
//!
//! The member crates do the work: `cosmo_hierarchy` keeps the tree of nested
//! local frames, `cosmo_population` grows it lazily from density tables, and
//! `cosmo_orbits` moves bodies along two-body orbits. This crate wires them
//! to a configuration-driven kind catalog behind the [`Universe`] facade.

pub mod catalog;
pub mod universe;

pub use cosmo_config as config;
pub use cosmo_core as common;
pub use cosmo_hierarchy as hierarchy;
pub use cosmo_orbits as orbits;
pub use cosmo_population as population;

pub use catalog::build_kind_table;
pub use universe::{Universe, UniverseError};
