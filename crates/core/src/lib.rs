//! Constants and shared primitives for the cosmogen workspace.
//!
//! Magnitudes are carried as `f64`, which spans sub-atomic lengths through the
//! volume of the observable universe without overflow.

pub mod random;

pub use random::{RandomSource, SeededRandom};

/// Physical constants expressed in SI units (unless stated otherwise).
pub mod constants {
    /// Newtonian constant of gravitation (m³ kg⁻¹ s⁻²).
    pub const G: f64 = 6.674_30e-11;
    /// Metres per astronomical unit.
    pub const AU_M: f64 = 1.495_978_707e11;
    /// Gravitational parameter of the Sun (m³/s²).
    pub const MU_SUN: f64 = 1.327_124_400_18e20;
    /// Extent of every node's normalized local frame, in local units.
    pub const LOCAL_SPACE_SIZE: f64 = 1_000_000.0;
    /// Tolerance used when comparing orbital representations.
    pub const ORBIT_TOLERANCE: f64 = 1e-8;
}

/// Minimal vector helpers to avoid ad-hoc `[f64; 3]` math everywhere.
pub mod vector {
    /// Alias for a 3D vector in metres, m/s, or local frame units depending on context.
    pub type Vector3 = [f64; 3];

    /// The zero vector.
    pub const ZERO: Vector3 = [0.0, 0.0, 0.0];

    /// Euclidean norm of a vector.
    #[inline]
    pub fn norm(v: &Vector3) -> f64 {
        dot(v, v).sqrt()
    }

    /// Dot product of two vectors.
    #[inline]
    pub fn dot(a: &Vector3, b: &Vector3) -> f64 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    /// Cross product `a × b`.
    #[inline]
    pub fn cross(a: &Vector3, b: &Vector3) -> Vector3 {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    /// Vector addition.
    #[inline]
    pub fn add(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
    }

    /// Vector subtraction.
    #[inline]
    pub fn sub(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    /// Scale a vector by a scalar.
    #[inline]
    pub fn scale(v: &Vector3, s: f64) -> Vector3 {
        [v[0] * s, v[1] * s, v[2] * s]
    }

    /// Unit vector in the direction of `v`; the zero vector maps to itself.
    #[inline]
    pub fn normalize(v: &Vector3) -> Vector3 {
        let n = norm(v);
        if n == 0.0 { ZERO } else { scale(v, 1.0 / n) }
    }

    /// Euclidean distance between two points.
    #[inline]
    pub fn distance(a: &Vector3, b: &Vector3) -> f64 {
        norm(&sub(a, b))
    }

    /// Component-wise comparison with a mixed absolute/relative tolerance.
    pub fn approx_eq(a: &Vector3, b: &Vector3, tolerance: f64) -> bool {
        let magnitude = norm(a).max(norm(b)).max(1.0);
        distance(a, b) <= tolerance * magnitude
    }
}
