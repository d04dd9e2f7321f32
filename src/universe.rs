//! Facade tying a hierarchy, a population engine and a random source together.

use std::path::Path;

use thiserror::Error;

use crate::common::SeededRandom;
use crate::common::vector::Vector3;
use crate::config::{ConfigError, EngineSettings};
use crate::hierarchy::{Hierarchy, HierarchyError, Kind, NodeId, NodeStore};
use crate::orbits::PropagationSettings;
use crate::population::{
    Census, Engine, KindTable, Location, PopulationError, PopulationSettings,
};

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Population(#[from] PopulationError),
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
}

/// A generated universe: the node tree plus everything needed to grow it.
pub struct Universe {
    hierarchy: Hierarchy,
    engine: Engine,
    rng: SeededRandom,
    propagation: PropagationSettings,
}

impl Universe {
    pub fn new(table: KindTable, settings: &EngineSettings) -> Self {
        Self::with_hierarchy(Hierarchy::new(), table, settings)
    }

    /// Universe backed by a persistence store for nodes outside memory.
    pub fn with_store(
        store: Box<dyn NodeStore>,
        table: KindTable,
        settings: &EngineSettings,
    ) -> Self {
        Self::with_hierarchy(Hierarchy::with_store(store), table, settings)
    }

    fn with_hierarchy(hierarchy: Hierarchy, table: KindTable, settings: &EngineSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => SeededRandom::seed_from(seed),
            None => SeededRandom::from_entropy(),
        };
        let population = PopulationSettings {
            miss_limit: settings.miss_limit,
            placement_samples: settings.placement_samples,
        };
        Self {
            hierarchy,
            engine: Engine::new(table, population),
            rng,
            propagation: PropagationSettings {
                tolerance: settings.propagation.tolerance,
                max_iterations: settings.propagation.max_iterations,
            },
        }
    }

    /// Load a kind catalog and optional settings file.
    pub fn from_config(
        kinds: impl AsRef<Path>,
        settings: Option<&Path>,
    ) -> Result<Self, UniverseError> {
        let catalog = crate::config::load_kinds(kinds)?;
        let settings = match settings {
            Some(path) => crate::config::load_settings(path)?,
            None => EngineSettings::default(),
        };
        Ok(Self::new(crate::catalog::build_kind_table(&catalog), &settings))
    }

    /// Replace the random source, e.g. to override a configured seed.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = SeededRandom::seed_from(seed);
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn hierarchy_mut(&mut self) -> &mut Hierarchy {
        &mut self.hierarchy
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn propagation(&self) -> &PropagationSettings {
        &self.propagation
    }

    /// Create a new root node of `kind` from its generator.
    pub fn spawn_root(&mut self, kind: &str) -> Result<NodeId, UniverseError> {
        let node = self
            .engine
            .table()
            .instantiate(&Kind::from(kind), &mut self.rng)?;
        let id = self.hierarchy.insert_root(node);
        tracing::debug!(%id, kind, "spawned root");
        Ok(id)
    }

    pub fn census(&self, region: NodeId, location: Location) -> Result<Census, UniverseError> {
        Ok(self.engine.census(&self.hierarchy, region, location)?)
    }

    /// Pull at most `limit` new children for `location` of `region`.
    pub fn populate(
        &mut self,
        region: NodeId,
        location: Location,
        limit: usize,
    ) -> Result<Vec<NodeId>, UniverseError> {
        let population =
            self.engine
                .populate(&mut self.hierarchy, region, location, &mut self.rng)?;
        Ok(population.take(limit).collect())
    }

    pub fn children(&mut self, region: NodeId, limit: usize) -> Result<Vec<NodeId>, UniverseError> {
        Ok(self
            .engine
            .children(&mut self.hierarchy, region, limit, &mut self.rng)?)
    }

    pub fn populate_cell(
        &mut self,
        region: NodeId,
        position: Vector3,
    ) -> Result<Vec<NodeId>, UniverseError> {
        Ok(self
            .engine
            .populate_cell(&mut self.hierarchy, region, position, &mut self.rng)?)
    }

    /// Advance every orbiting node by `dt` seconds; returns how many moved.
    ///
    /// Nodes are visited in creation order so bodies move before their moons.
    /// A node whose orbit cannot be advanced is logged and left where it was.
    pub fn advance(&mut self, dt: f64) -> Result<usize, UniverseError> {
        let mut orbiting: Vec<NodeId> = self
            .hierarchy
            .ids()
            .filter(|id| {
                self.hierarchy
                    .get(*id)
                    .is_some_and(|node| node.orbit().is_some())
            })
            .collect();
        orbiting.sort();
        let mut moved = 0;
        for id in orbiting {
            match self.hierarchy.advance_orbit_with(id, dt, &self.propagation) {
                Ok(true) => moved += 1,
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(%id, error = %err, "skipping orbit that failed to advance");
                }
            }
        }
        Ok(moved)
    }
}
