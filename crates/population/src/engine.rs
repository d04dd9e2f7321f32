//! The weighted-lottery population loop and the entry points that drive it.

use cosmo_core::RandomSource;
use cosmo_core::constants::LOCAL_SPACE_SIZE;
use cosmo_core::vector::{self, Vector3, ZERO};
use cosmo_hierarchy::{Bounds, Hierarchy, HierarchyError, NodeId, Shape};

use crate::census::{Census, CensusEntry};
use crate::definition::{ChildDefinition, KindEntry, KindTable};
use crate::PopulationError;

/// Knobs for the population loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulationSettings {
    /// Consecutive placement failures after which a region counts as saturated.
    pub miss_limit: u32,
    /// Candidate positions tried per lottery draw before it counts as a miss.
    pub placement_samples: u32,
}

impl Default for PopulationSettings {
    fn default() -> Self {
        Self {
            miss_limit: 10,
            placement_samples: 8,
        }
    }
}

/// Which part of a region a query covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Location {
    Whole,
    /// A sub-volume in the region's local frame.
    Within(Bounds),
}

/// Population engine bound to a kind table.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    table: KindTable,
    settings: PopulationSettings,
}

impl Engine {
    pub fn new(table: KindTable, settings: PopulationSettings) -> Self {
        Self { table, settings }
    }

    pub fn table(&self) -> &KindTable {
        &self.table
    }

    pub fn settings(&self) -> &PopulationSettings {
        &self.settings
    }

    fn entry_for(
        &self,
        hierarchy: &Hierarchy,
        region: NodeId,
    ) -> Result<Option<&KindEntry>, PopulationError> {
        let node = hierarchy
            .get(region)
            .ok_or(HierarchyError::UnknownNode(region))?;
        Ok(self.table.get(node.kind()))
    }

    /// Expected and materialized counts per child kind. Generates nothing.
    ///
    /// Kinds without a table entry have no children to expect.
    pub fn census(
        &self,
        hierarchy: &Hierarchy,
        region: NodeId,
        location: Location,
    ) -> Result<Census, PopulationError> {
        let node = hierarchy
            .get(region)
            .ok_or(HierarchyError::UnknownNode(region))?;
        let scale = node.local_scale();
        let volume = match location {
            Location::Whole => node.shape().volume(),
            Location::Within(bounds) => bounds.shape.volume(),
        };
        let existing: Vec<_> = hierarchy
            .children(region)
            .iter()
            .filter_map(|id| hierarchy.get(*id))
            .filter(|child| match location {
                Location::Whole => true,
                Location::Within(bounds) => bounds.contains_local(&child.position(), scale),
            })
            .collect();

        let entries = self
            .table
            .get(node.kind())
            .map(|entry| {
                entry
                    .children
                    .iter()
                    .map(|definition| CensusEntry {
                        kind: definition.kind().clone(),
                        expected: definition.expected_count(volume),
                        materialized: existing
                            .iter()
                            .filter(|child| definition.matches(child))
                            .count(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Census {
            region,
            volume,
            entries,
        })
    }

    /// Start populating the whole region.
    pub fn populate_region<'a>(
        &self,
        hierarchy: &'a mut Hierarchy,
        region: NodeId,
        rng: &'a mut dyn RandomSource,
    ) -> Result<Population<'a>, PopulationError> {
        self.populate(hierarchy, region, Location::Whole, rng)
    }

    /// Start populating a bounded sub-volume of the region.
    pub fn populate_region_within<'a>(
        &self,
        hierarchy: &'a mut Hierarchy,
        region: NodeId,
        bounds: Bounds,
        rng: &'a mut dyn RandomSource,
    ) -> Result<Population<'a>, PopulationError> {
        self.populate(hierarchy, region, Location::Within(bounds), rng)
    }

    /// Compute the deficit for `location` and return the lazy generator for it.
    ///
    /// The region is flagged prepopulated immediately. Nothing is generated
    /// until the returned iterator is pulled.
    pub fn populate<'a>(
        &self,
        hierarchy: &'a mut Hierarchy,
        region: NodeId,
        location: Location,
        rng: &'a mut dyn RandomSource,
    ) -> Result<Population<'a>, PopulationError> {
        let entry = self.entry_for(hierarchy, region)?.cloned().unwrap_or_default();
        if let Some(central) = &entry.central_body {
            self.ensure_central_body(hierarchy, region, central, rng)?;
        }

        let census = self.census(hierarchy, region, location)?;
        hierarchy.mark_prepopulated(region)?;

        let remaining = census
            .entries
            .iter()
            .map(|item| {
                let deficit = item.deficit();
                let whole = deficit.floor();
                if rng.chance(deficit - whole) {
                    whole + 1.0
                } else {
                    whole
                }
            })
            .collect();

        let (center, shape) = match location {
            Location::Whole => (
                ZERO,
                hierarchy.get(region).map_or(Shape::Point, |n| *n.shape()),
            ),
            Location::Within(bounds) => (bounds.center, bounds.shape),
        };
        let orbit_center = hierarchy.get(region).and_then(|n| n.orbit_center());

        Ok(Population {
            hierarchy,
            rng,
            region,
            center,
            shape,
            definitions: entry.children,
            remaining,
            orbit_center,
            misses: 0,
            settings: self.settings,
            finished: false,
        })
    }

    fn ensure_central_body(
        &self,
        hierarchy: &mut Hierarchy,
        region: NodeId,
        central: &ChildDefinition,
        rng: &mut dyn RandomSource,
    ) -> Result<(), PopulationError> {
        let node = hierarchy
            .get(region)
            .ok_or(HierarchyError::UnknownNode(region))?;
        if node.orbit_center().is_some() {
            return Ok(());
        }
        let Some(body) = central.construct(node, ZERO, rng) else {
            return Ok(());
        };
        let id = hierarchy.attach(region, body.with_footprint(central.footprint()), ZERO)?;
        hierarchy.set_orbit_center(region, Some(id))?;
        tracing::trace!(%region, %id, kind = %central.kind(), "placed central body");
        Ok(())
    }

    /// Children of `region`, running population once first if it never ran.
    ///
    /// At most `limit` children are generated and at most `limit` returned.
    pub fn children(
        &self,
        hierarchy: &mut Hierarchy,
        region: NodeId,
        limit: usize,
        rng: &mut dyn RandomSource,
    ) -> Result<Vec<NodeId>, PopulationError> {
        let prepopulated = hierarchy
            .get(region)
            .ok_or(HierarchyError::UnknownNode(region))?
            .is_prepopulated();
        if !prepopulated {
            let generated = self.populate_region(hierarchy, region, rng)?.take(limit).count();
            tracing::debug!(%region, generated, "populated on first access");
        }
        Ok(hierarchy.children(region).iter().copied().take(limit).collect())
    }

    /// Populate the grid cell of `region` containing `position` (local frame).
    ///
    /// Cells are sized for about one expected child. A cell that was already
    /// populated yields nothing.
    pub fn populate_cell(
        &self,
        hierarchy: &mut Hierarchy,
        region: NodeId,
        position: Vector3,
        rng: &mut dyn RandomSource,
    ) -> Result<Vec<NodeId>, PopulationError> {
        let scale = hierarchy
            .get(region)
            .ok_or(HierarchyError::UnknownNode(region))?
            .local_scale();
        let density = self
            .entry_for(hierarchy, region)?
            .map_or(0.0, KindEntry::total_density);
        let cell_size = if density > 0.0 {
            density.recip().cbrt() / scale
        } else {
            2.0 * LOCAL_SPACE_SIZE
        };

        let grid = hierarchy.ensure_grid(region, cell_size)?;
        let cell = grid.cell_of(&position);
        if !grid.mark_populated(cell) {
            return Ok(Vec::new());
        }
        let bounds = grid.cell_bounds(cell, scale);
        tracing::debug!(%region, ?cell, "populating grid cell");
        Ok(self.populate_region_within(hierarchy, region, bounds, rng)?.collect())
    }
}

/// Lazy generator of a region's missing children.
///
/// Each pull draws one definition weighted by its remaining deficit and tries
/// to place it. The sequence ends when every deficit is spent or after
/// `miss_limit` consecutive placement failures. Deficits can be astronomically
/// large, so treat the sequence as effectively unbounded and bound how many
/// items you pull.
pub struct Population<'a> {
    hierarchy: &'a mut Hierarchy,
    rng: &'a mut dyn RandomSource,
    region: NodeId,
    center: Vector3,
    shape: Shape,
    definitions: Vec<ChildDefinition>,
    remaining: Vec<f64>,
    orbit_center: Option<NodeId>,
    misses: u32,
    settings: PopulationSettings,
    finished: bool,
}

impl Population<'_> {
    /// Children still owed per definition, in table order.
    pub fn remaining(&self) -> &[f64] {
        &self.remaining
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn try_place(&mut self, definition: &ChildDefinition) -> Option<NodeId> {
        let footprint = definition.footprint();
        for _ in 0..self.settings.placement_samples.max(1) {
            let region = self.hierarchy.get(self.region)?;
            let scale = region.local_scale();
            let offset = self.shape.sample_interior(&mut *self.rng);
            if !self.shape.fits(&offset, footprint) {
                continue;
            }
            let position = vector::add(&self.center, &vector::scale(&offset, scale.recip()));
            if !region
                .shape()
                .fits(&vector::scale(&position, scale), footprint)
            {
                continue;
            }
            if overlaps(self.hierarchy, self.region, &position, footprint, scale) {
                continue;
            }
            let Some(child) = definition.construct(region, position, &mut *self.rng) else {
                continue;
            };
            // The constructed body may outgrow the footprint it was placed for.
            let needed = child.footprint().max(footprint);
            if needed > footprint
                && (!self.shape.fits(&offset, needed)
                    || !region.shape().fits(&vector::scale(&position, scale), needed)
                    || overlaps(self.hierarchy, self.region, &position, needed, scale))
            {
                tracing::trace!(
                    region = %self.region,
                    kind = %definition.kind(),
                    needed,
                    "constructed child does not fit"
                );
                continue;
            }
            let id = self
                .hierarchy
                .attach(self.region, child.with_footprint(footprint), position)
                .ok()?;
            self.assign_orbit(id, definition);
            tracing::trace!(region = %self.region, %id, kind = %definition.kind(), "generated child");
            return Some(id);
        }
        None
    }

    fn assign_orbit(&mut self, id: NodeId, definition: &ChildDefinition) {
        let Some(center) = self.orbit_center.filter(|center| *center != id) else {
            return;
        };
        let eccentricity = self
            .rng
            .uniform_range(0.0, definition.max_eccentricity());
        if let Err(err) = self
            .hierarchy
            .place_in_orbit(id, center, eccentricity, &mut *self.rng)
        {
            tracing::debug!(%id, %center, error = %err, "child left without orbit");
        }
    }
}

impl Iterator for Population<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while !self.finished {
            let Some(index) = self.rng.weighted_choice(&self.remaining) else {
                self.finished = true;
                break;
            };
            let definition = self.definitions[index].clone();
            match self.try_place(&definition) {
                Some(id) => {
                    self.misses = 0;
                    self.remaining[index] = (self.remaining[index] - 1.0).max(0.0);
                    return Some(id);
                }
                None => {
                    self.misses += 1;
                    if self.misses >= self.settings.miss_limit.max(1) {
                        tracing::debug!(
                            region = %self.region,
                            misses = self.misses,
                            "placement exhausted, treating region as saturated"
                        );
                        self.finished = true;
                    }
                }
            }
        }
        None
    }
}

fn overlaps(
    hierarchy: &Hierarchy,
    region: NodeId,
    position: &Vector3,
    footprint: f64,
    scale: f64,
) -> bool {
    hierarchy
        .children(region)
        .iter()
        .filter_map(|id| hierarchy.get(*id))
        .any(|child| {
            vector::distance(&child.position(), position) * scale < footprint + child.footprint()
        })
}
