//! Bounding volumes: physical extent and occupied space for placement.

use std::f64::consts::PI;

use cosmo_core::RandomSource;
use cosmo_core::vector::{self, Vector3, ZERO};

/// Bounding volume centred on its owner. All lengths in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Point,
    Sphere { radius: f64 },
    /// Axis-aligned ellipsoid.
    Ellipsoid { semi_axes: [f64; 3] },
    /// Axis-aligned cube; used for grid cells.
    Cube { half_extent: f64 },
}

impl Shape {
    /// Volume in cubic metres.
    pub fn volume(&self) -> f64 {
        match *self {
            Shape::Point => 0.0,
            Shape::Sphere { radius } => 4.0 / 3.0 * PI * radius.powi(3),
            Shape::Ellipsoid { semi_axes: [a, b, c] } => 4.0 / 3.0 * PI * a * b * c,
            Shape::Cube { half_extent } => (2.0 * half_extent).powi(3),
        }
    }

    /// Radius of the smallest origin-centred sphere enclosing the shape.
    pub fn containing_radius(&self) -> f64 {
        match *self {
            Shape::Point => 0.0,
            Shape::Sphere { radius } => radius,
            Shape::Ellipsoid { semi_axes: [a, b, c] } => a.max(b).max(c),
            Shape::Cube { half_extent } => half_extent * 3.0_f64.sqrt(),
        }
    }

    /// Whether `offset` (metres from the centre) lies inside the shape.
    pub fn contains(&self, offset: &Vector3) -> bool {
        self.fits(offset, 0.0)
    }

    /// Whether a sphere of `radius` centred at `offset` lies entirely inside the shape.
    ///
    /// Ellipsoids are tested against the axes shrunk by `radius`, which is exact
    /// for spheres and slightly conservative otherwise.
    pub fn fits(&self, offset: &Vector3, radius: f64) -> bool {
        match *self {
            Shape::Point => radius == 0.0 && *offset == ZERO,
            Shape::Sphere { radius: r } => vector::norm(offset) + radius <= r,
            Shape::Ellipsoid { semi_axes } => {
                let mut sum = 0.0;
                for axis in 0..3 {
                    let reduced = semi_axes[axis] - radius;
                    if reduced <= 0.0 {
                        return false;
                    }
                    sum += (offset[axis] / reduced).powi(2);
                }
                sum <= 1.0
            }
            Shape::Cube { half_extent } => offset
                .iter()
                .all(|component| component.abs() + radius <= half_extent),
        }
    }

    /// Uniformly distributed point inside the shape, as an offset in metres.
    pub fn sample_interior(&self, rng: &mut dyn RandomSource) -> Vector3 {
        match *self {
            Shape::Point => ZERO,
            Shape::Sphere { radius } => vector::scale(&unit_ball_point(rng), radius),
            Shape::Ellipsoid { semi_axes } => {
                let p = unit_ball_point(rng);
                [p[0] * semi_axes[0], p[1] * semi_axes[1], p[2] * semi_axes[2]]
            }
            Shape::Cube { half_extent } => [
                rng.uniform_range(-half_extent, half_extent),
                rng.uniform_range(-half_extent, half_extent),
                rng.uniform_range(-half_extent, half_extent),
            ],
        }
    }
}

fn unit_ball_point(rng: &mut dyn RandomSource) -> Vector3 {
    let direction = vector::normalize(&[
        rng.normal(0.0, 1.0),
        rng.normal(0.0, 1.0),
        rng.normal(0.0, 1.0),
    ]);
    let direction = if direction == ZERO {
        [1.0, 0.0, 0.0]
    } else {
        direction
    };
    vector::scale(&direction, rng.uniform().cbrt())
}

/// A bounded sub-volume of a region.
///
/// `center` is in the region's local frame; `shape` is in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub center: Vector3,
    pub shape: Shape,
}

impl Bounds {
    pub fn new(center: Vector3, shape: Shape) -> Self {
        Self { center, shape }
    }

    /// Whether `local` (a position in the region's frame) lies inside these bounds.
    pub fn contains_local(&self, local: &Vector3, region_scale: f64) -> bool {
        let offset = vector::scale(&vector::sub(local, &self.center), region_scale);
        self.shape.contains(&offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmo_core::SeededRandom;

    #[test]
    fn samples_stay_inside() {
        let mut rng = SeededRandom::seed_from(11);
        let shapes = [
            Shape::Sphere { radius: 3.0 },
            Shape::Ellipsoid {
                semi_axes: [1.0, 4.0, 2.0],
            },
            Shape::Cube { half_extent: 0.5 },
        ];
        for shape in shapes {
            for _ in 0..500 {
                let p = shape.sample_interior(&mut rng);
                // Tiny slack for points landing on the boundary.
                let shrunk = vector::scale(&p, 1.0 - 1e-12);
                assert!(shape.contains(&shrunk), "{shape:?} produced {p:?}");
            }
        }
    }

    #[test]
    fn footprint_must_clear_the_boundary() {
        let sphere = Shape::Sphere { radius: 10.0 };
        assert!(sphere.fits(&[5.0, 0.0, 0.0], 5.0));
        assert!(!sphere.fits(&[5.0, 0.0, 0.0], 5.1));
        assert!(!Shape::Point.fits(&ZERO, 1.0));
    }
}
