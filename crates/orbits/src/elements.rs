//! Orbit determination: classical elements <-> Cartesian state vectors.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use cosmo_core::RandomSource;
use cosmo_core::vector::{self, Vector3};

use crate::OrbitError;

/// Eccentricity and inclination magnitudes treated as zero.
const ANGLE_EPSILON: f64 = 1e-11;
/// Distance from `e = 1` inside which an orbit is handled as parabolic.
const PARABOLIC_TOLERANCE: f64 = 1e-10;

/// Classical (Keplerian) elements. Angles in radians, periapsis in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassicalElements {
    pub periapsis: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub ascending_node: f64,
    pub argument_of_periapsis: f64,
    pub true_anomaly: f64,
}

/// A two-body orbit relative to the body being orbited.
///
/// The classical elements and the epoch state vectors are two views of the same
/// configuration; every constructor fills both, and they are never mutated
/// independently.
#[derive(Debug, Clone, PartialEq)]
pub struct Orbit {
    mu: f64,
    elements: ClassicalElements,
    semi_major_axis: f64,
    semi_latus_rectum: f64,
    apoapsis: f64,
    period: f64,
    position: Vector3,
    velocity: Vector3,
}

impl Orbit {
    /// Build an orbit from classical elements around a body with gravitational parameter `mu`.
    ///
    /// Eccentricity must be non-negative, inclination in `[0, π)`, and the three
    /// remaining angles in `[0, 2π)`. For open orbits the true anomaly must also
    /// lie inside the asymptotes.
    pub fn from_elements(mu: f64, elements: ClassicalElements) -> Result<Self, OrbitError> {
        check_mu(mu)?;
        let ClassicalElements {
            periapsis,
            eccentricity: e,
            inclination,
            ascending_node,
            argument_of_periapsis,
            true_anomaly: nu,
        } = elements;

        check_param("periapsis", periapsis, periapsis.is_finite() && periapsis > 0.0)?;
        check_param("eccentricity", e, e.is_finite() && e >= 0.0)?;
        check_param(
            "inclination",
            inclination,
            (0.0..PI).contains(&inclination),
        )?;
        check_param(
            "ascending_node",
            ascending_node,
            (0.0..TAU).contains(&ascending_node),
        )?;
        check_param(
            "argument_of_periapsis",
            argument_of_periapsis,
            (0.0..TAU).contains(&argument_of_periapsis),
        )?;
        check_param("true_anomaly", nu, (0.0..TAU).contains(&nu))?;

        let denominator = 1.0 + e * nu.cos();
        check_param("true_anomaly", nu, denominator > 0.0)?;

        let p = periapsis * (1.0 + e);
        let (p_hat, q_hat) = perifocal_basis(ascending_node, inclination, argument_of_periapsis);

        let r = p / denominator;
        let position = vector::add(
            &vector::scale(&p_hat, r * nu.cos()),
            &vector::scale(&q_hat, r * nu.sin()),
        );
        let speed_scale = (mu / p).sqrt();
        let velocity = vector::add(
            &vector::scale(&p_hat, -speed_scale * nu.sin()),
            &vector::scale(&q_hat, speed_scale * (e + nu.cos())),
        );

        Ok(Self::assemble(mu, elements, p, position, velocity))
    }

    /// Derive the orbit from a relative position and velocity (Gauss / vis-viva).
    ///
    /// The supplied vectors become the orbit's epoch state unchanged.
    pub fn from_state_vectors(
        mu: f64,
        position: Vector3,
        velocity: Vector3,
    ) -> Result<Self, OrbitError> {
        check_mu(mu)?;
        let r = vector::norm(&position);
        let v = vector::norm(&velocity);
        let h_vec = vector::cross(&position, &velocity);
        let h = vector::norm(&h_vec);
        if !(r.is_finite() && v.is_finite()) || r == 0.0 || h <= ANGLE_EPSILON * r * v {
            return Err(OrbitError::DegenerateState);
        }

        let rv = vector::dot(&position, &velocity);
        let e_vec = vector::scale(
            &vector::sub(
                &vector::scale(&position, v * v - mu / r),
                &vector::scale(&velocity, rv),
            ),
            1.0 / mu,
        );
        let e = vector::norm(&e_vec);
        let p = h * h / mu;

        let h_hat = vector::scale(&h_vec, 1.0 / h);
        let inclination = h_hat[2].clamp(-1.0, 1.0).acos();

        // Line of nodes k × h; equatorial orbits measure from the x axis instead.
        let n_vec = [-h_vec[1], h_vec[0], 0.0];
        let n = vector::norm(&n_vec);
        let (n_hat, ascending_node) = if n > ANGLE_EPSILON * h {
            let n_hat = vector::scale(&n_vec, 1.0 / n);
            (n_hat, wrap_angle(n_hat[1].atan2(n_hat[0])))
        } else {
            ([1.0, 0.0, 0.0], 0.0)
        };

        // Argument of latitude of the epoch position.
        let latitude = vector::dot(&vector::cross(&n_hat, &position), &h_hat)
            .atan2(vector::dot(&n_hat, &position));

        let (argument_of_periapsis, true_anomaly) = if e > ANGLE_EPSILON {
            let nu = (h * rv / (mu * r)).atan2(p / r - 1.0);
            (wrap_angle(latitude - nu), wrap_angle(nu))
        } else {
            (0.0, wrap_angle(latitude))
        };

        let elements = ClassicalElements {
            periapsis: p / (1.0 + e),
            eccentricity: e,
            inclination,
            ascending_node,
            argument_of_periapsis,
            true_anomaly,
        };
        Ok(Self::assemble(mu, elements, p, position, velocity))
    }

    /// Put a body already at `position` (relative to the orbited body) onto an
    /// orbit of the requested eccentricity.
    ///
    /// The orbit plane is the least-inclined plane containing `position`, with
    /// the body at its highest (or lowest) point above the reference plane. A
    /// true anomaly is drawn uniformly and the periapsis back-solved so the body
    /// keeps its current distance. The returned orbit's epoch velocity is the
    /// velocity the body must be given.
    pub fn from_eccentricity_and_position(
        mu: f64,
        eccentricity: f64,
        position: Vector3,
        rng: &mut dyn RandomSource,
    ) -> Result<Self, OrbitError> {
        check_mu(mu)?;
        check_param(
            "eccentricity",
            eccentricity,
            eccentricity.is_finite() && eccentricity >= 0.0,
        )?;
        let r = vector::norm(&position);
        if r == 0.0 || !r.is_finite() {
            return Err(OrbitError::DegenerateState);
        }

        let latitude = (position[2] / r).clamp(-1.0, 1.0).asin();
        let longitude = position[1].atan2(position[0]);
        let (inclination, ascending_node, argument_of_latitude) =
            if latitude.abs() < ANGLE_EPSILON {
                (0.0, 0.0, longitude)
            } else if latitude > 0.0 {
                (latitude, longitude - FRAC_PI_2, FRAC_PI_2)
            } else {
                (-latitude, longitude + FRAC_PI_2, 3.0 * FRAC_PI_2)
            };

        let true_anomaly = if eccentricity < 1.0 {
            rng.uniform_range(0.0, TAU)
        } else {
            // Stay well inside the asymptotes of an open orbit.
            let limit = 0.9 * (-1.0 / eccentricity).acos();
            rng.uniform_range(-limit, limit)
        };
        let true_anomaly = wrap_angle(true_anomaly);

        let p = r * (1.0 + eccentricity * true_anomaly.cos());
        let elements = ClassicalElements {
            periapsis: p / (1.0 + eccentricity),
            eccentricity,
            inclination,
            ascending_node: wrap_angle(ascending_node),
            argument_of_periapsis: wrap_angle(argument_of_latitude - true_anomaly),
            true_anomaly,
        };
        Self::from_elements(mu, elements)
    }

    fn assemble(
        mu: f64,
        elements: ClassicalElements,
        semi_latus_rectum: f64,
        position: Vector3,
        velocity: Vector3,
    ) -> Self {
        let e = elements.eccentricity;
        let semi_major_axis = if (e - 1.0).abs() < PARABOLIC_TOLERANCE {
            // Undefined for a parabola; periapsis stands in for it.
            elements.periapsis
        } else {
            semi_latus_rectum / (1.0 - e * e)
        };
        let (apoapsis, period) = if e < 1.0 {
            (
                semi_major_axis * (1.0 + e),
                TAU * (semi_major_axis.powi(3) / mu).sqrt(),
            )
        } else {
            (f64::INFINITY, f64::INFINITY)
        };
        Self {
            mu,
            elements,
            semi_major_axis,
            semi_latus_rectum,
            apoapsis,
            period,
            position,
            velocity,
        }
    }

    /// Standard gravitational parameter of the orbited body (m³/s²).
    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn elements(&self) -> &ClassicalElements {
        &self.elements
    }

    pub fn eccentricity(&self) -> f64 {
        self.elements.eccentricity
    }

    pub fn inclination(&self) -> f64 {
        self.elements.inclination
    }

    pub fn periapsis(&self) -> f64 {
        self.elements.periapsis
    }

    /// Apoapsis distance; infinite for open orbits.
    pub fn apoapsis(&self) -> f64 {
        self.apoapsis
    }

    /// Semi-major axis; negative for hyperbolic orbits, the periapsis for parabolic ones.
    pub fn semi_major_axis(&self) -> f64 {
        self.semi_major_axis
    }

    pub fn semi_latus_rectum(&self) -> f64 {
        self.semi_latus_rectum
    }

    pub fn ascending_node(&self) -> f64 {
        self.elements.ascending_node
    }

    pub fn argument_of_periapsis(&self) -> f64 {
        self.elements.argument_of_periapsis
    }

    pub fn true_anomaly(&self) -> f64 {
        self.elements.true_anomaly
    }

    /// Orbital period in seconds; infinite for open orbits.
    pub fn period(&self) -> f64 {
        self.period
    }

    /// Epoch position relative to the orbited body (m).
    pub fn position(&self) -> Vector3 {
        self.position
    }

    /// Epoch velocity relative to the orbited body (m/s).
    pub fn velocity(&self) -> Vector3 {
        self.velocity
    }

    /// Mean angular rate (rad/s); zero for open orbits.
    pub fn mean_motion(&self) -> f64 {
        if self.period.is_finite() {
            TAU / self.period
        } else {
            0.0
        }
    }

    /// Specific orbital energy (J/kg).
    pub fn specific_energy(&self) -> f64 {
        let v = vector::norm(&self.velocity);
        0.5 * v * v - self.mu / vector::norm(&self.position)
    }

    /// Specific angular momentum vector `r × v` (m²/s).
    pub fn specific_angular_momentum(&self) -> Vector3 {
        vector::cross(&self.position, &self.velocity)
    }
}

/// Perifocal unit vectors `P` (towards periapsis) and `Q` (90° ahead in the orbit plane).
pub fn perifocal_basis(
    ascending_node: f64,
    inclination: f64,
    argument_of_periapsis: f64,
) -> (Vector3, Vector3) {
    let (sin_o, cos_o) = ascending_node.sin_cos();
    let (sin_i, cos_i) = inclination.sin_cos();
    let (sin_w, cos_w) = argument_of_periapsis.sin_cos();
    let p = [
        cos_o * cos_w - sin_o * sin_w * cos_i,
        sin_o * cos_w + cos_o * sin_w * cos_i,
        sin_w * sin_i,
    ];
    let q = [
        -cos_o * sin_w - sin_o * cos_w * cos_i,
        -sin_o * sin_w + cos_o * cos_w * cos_i,
        cos_w * sin_i,
    ];
    (p, q)
}

/// Wrap an angle into `[0, 2π)`.
pub(crate) fn wrap_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU { 0.0 } else { wrapped }
}

fn check_mu(mu: f64) -> Result<(), OrbitError> {
    if mu.is_finite() && mu > 0.0 {
        Ok(())
    } else {
        Err(OrbitError::InvalidGravitationalParameter(mu))
    }
}

fn check_param(name: &'static str, value: f64, valid: bool) -> Result<(), OrbitError> {
    if valid {
        Ok(())
    } else {
        Err(OrbitError::InvalidOrbitalParameter { name, value })
    }
}
