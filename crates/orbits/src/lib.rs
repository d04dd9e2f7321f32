//! Keplerian two-body orbits: element/state-vector conversion and propagation.
//!
//! All quantities are SI. State vectors are relative to the orbited body and
//! expressed in metres and metres per second; angles are radians.

pub mod elements;
pub mod propagation;
pub mod stumpff;

use thiserror::Error;

pub use elements::{ClassicalElements, Orbit};
pub use propagation::{Propagation, PropagationSettings};

/// Errors raised while constructing an orbit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrbitError {
    #[error("orbital parameter `{name}` is out of range: {value}")]
    InvalidOrbitalParameter { name: &'static str, value: f64 },
    #[error("gravitational parameter must be positive and finite (got {0})")]
    InvalidGravitationalParameter(f64),
    #[error("state vectors describe a degenerate orbit (zero radius or zero angular momentum)")]
    DegenerateState,
}
