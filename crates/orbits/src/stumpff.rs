//! Stumpff functions used by the universal-variable formulation.
//!
//! Each function has three branches: the trigonometric form for elliptical
//! arguments (`z > 0`), the hyperbolic form for `z < 0`, and a truncated
//! series around the parabolic boundary where the closed forms lose precision.

/// Below this magnitude the closed forms cancel catastrophically.
const SERIES_THRESHOLD: f64 = 1e-6;

/// Stumpff function `C(z)`.
pub fn c(z: f64) -> f64 {
    if z > SERIES_THRESHOLD {
        (1.0 - z.sqrt().cos()) / z
    } else if z < -SERIES_THRESHOLD {
        ((-z).sqrt().cosh() - 1.0) / (-z)
    } else {
        0.5 - z / 24.0 + z * z / 720.0
    }
}

/// Stumpff function `S(z)`.
pub fn s(z: f64) -> f64 {
    if z > SERIES_THRESHOLD {
        let sz = z.sqrt();
        (sz - sz.sin()) / (sz * sz * sz)
    } else if z < -SERIES_THRESHOLD {
        let sz = (-z).sqrt();
        (sz.sinh() - sz) / (sz * sz * sz)
    } else {
        1.0 / 6.0 - z / 120.0 + z * z / 5040.0
    }
}
