//! Cubic cell partitioning of a region's local frame.
//!
//! Cells are indexed by non-zero integers along each axis: `(0, s]` is cell 1,
//! `[-s, 0)` is cell -1, and so on. Each cell carries its own populated flag so
//! repeated neighbourhood queries do not generate twice.

use std::collections::HashSet;

use cosmo_core::vector::Vector3;

use crate::shape::{Bounds, Shape};

/// Integer cell index; no component is ever zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord(pub [i64; 3]);

/// Cell grid over a region's local frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CellGrid {
    cell_size: f64,
    populated: HashSet<CellCoord>,
}

impl CellGrid {
    /// Grid with cubic cells of `cell_size` local units.
    pub fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            populated: HashSet::new(),
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    /// Cell containing a local-frame position.
    pub fn cell_of(&self, position: &Vector3) -> CellCoord {
        CellCoord([
            axis_index(position[0], self.cell_size),
            axis_index(position[1], self.cell_size),
            axis_index(position[2], self.cell_size),
        ])
    }

    /// Centre of a cell in local-frame units.
    pub fn cell_center(&self, cell: CellCoord) -> Vector3 {
        let center = |index: i64| {
            let offset = if index > 0 { -0.5 } else { 0.5 };
            (index as f64 + offset) * self.cell_size
        };
        [center(cell.0[0]), center(cell.0[1]), center(cell.0[2])]
    }

    /// Bounds of a cell for a region whose local scale is `region_scale` metres per unit.
    pub fn cell_bounds(&self, cell: CellCoord, region_scale: f64) -> Bounds {
        Bounds::new(
            self.cell_center(cell),
            Shape::Cube {
                half_extent: 0.5 * self.cell_size * region_scale,
            },
        )
    }

    pub fn is_populated(&self, cell: CellCoord) -> bool {
        self.populated.contains(&cell)
    }

    /// Flag a cell as populated; returns `false` if it already was.
    pub fn mark_populated(&mut self, cell: CellCoord) -> bool {
        self.populated.insert(cell)
    }

    pub fn populated_cells(&self) -> usize {
        self.populated.len()
    }
}

fn axis_index(x: f64, cell_size: f64) -> i64 {
    let index = x.signum() * (x.abs() / cell_size).ceil();
    if index == 0.0 { 1 } else { index as i64 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_and_boundaries() {
        let grid = CellGrid::new(2.0);
        assert_eq!(grid.cell_of(&[0.0, 0.0, 0.0]), CellCoord([1, 1, 1]));
        assert_eq!(grid.cell_of(&[2.0, -2.0, 2.1]), CellCoord([1, -1, 2]));
        assert_eq!(grid.cell_of(&[-0.1, 3.9, -4.1]), CellCoord([-1, 2, -3]));
    }

    #[test]
    fn centre_maps_back_to_its_cell() {
        let grid = CellGrid::new(1.5);
        for coord in [CellCoord([1, -1, 3]), CellCoord([-4, 2, -1])] {
            assert_eq!(grid.cell_of(&grid.cell_center(coord)), coord);
        }
    }
}
