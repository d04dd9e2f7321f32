//! Per-kind population recipes.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use cosmo_core::RandomSource;
use cosmo_core::vector::Vector3;
use cosmo_hierarchy::{Kind, Node};

use crate::PopulationError;

/// Builds a child for a parent region at a position in the parent's local
/// frame, or `None` when nothing can exist there.
pub type Constructor =
    Arc<dyn Fn(&Node, Vector3, &mut dyn RandomSource) -> Option<Node> + Send + Sync>;

/// Decides whether an existing child counts toward a definition.
pub type Matcher = Arc<dyn Fn(&Node) -> bool + Send + Sync>;

/// Builds a free-standing node of a kind, used for roots.
pub type NodeGenerator = Arc<dyn Fn(&mut dyn RandomSource) -> Node + Send + Sync>;

/// One kind of content a region may contain.
#[derive(Clone)]
pub struct ChildDefinition {
    kind: Kind,
    footprint: f64,
    density: f64,
    max_eccentricity: f64,
    matcher: Matcher,
    constructor: Constructor,
}

impl ChildDefinition {
    /// `footprint` is the clear radius in metres a child needs; `density` is
    /// the expected count per cubic metre of parent volume.
    pub fn new<F>(kind: impl Into<Kind>, footprint: f64, density: f64, constructor: F) -> Self
    where
        F: Fn(&Node, Vector3, &mut dyn RandomSource) -> Option<Node> + Send + Sync + 'static,
    {
        let kind = kind.into();
        let matched = kind.clone();
        Self {
            kind,
            footprint: footprint.max(0.0),
            density: density.max(0.0),
            max_eccentricity: 0.0,
            matcher: Arc::new(move |node: &Node| *node.kind() == matched),
            constructor: Arc::new(constructor),
        }
    }

    /// Replace the default kind-equality matcher.
    pub fn with_matcher<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&Node) -> bool + Send + Sync + 'static,
    {
        self.matcher = Arc::new(matcher);
        self
    }

    /// Upper bound on the eccentricity drawn when the child is put in orbit.
    pub fn with_max_eccentricity(mut self, eccentricity: f64) -> Self {
        self.max_eccentricity = eccentricity.max(0.0);
        self
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn footprint(&self) -> f64 {
        self.footprint
    }

    pub fn density(&self) -> f64 {
        self.density
    }

    pub fn max_eccentricity(&self) -> f64 {
        self.max_eccentricity
    }

    /// Expected number of children in `volume` cubic metres.
    pub fn expected_count(&self, volume: f64) -> f64 {
        volume * self.density
    }

    pub fn matches(&self, node: &Node) -> bool {
        (self.matcher)(node)
    }

    pub fn construct(
        &self,
        parent: &Node,
        position: Vector3,
        rng: &mut dyn RandomSource,
    ) -> Option<Node> {
        (self.constructor)(parent, position, rng)
    }
}

impl fmt::Debug for ChildDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChildDefinition")
            .field("kind", &self.kind)
            .field("footprint", &self.footprint)
            .field("density", &self.density)
            .field("max_eccentricity", &self.max_eccentricity)
            .finish_non_exhaustive()
    }
}

/// Everything the engine knows about one kind.
#[derive(Clone, Default)]
pub struct KindEntry {
    pub children: Vec<ChildDefinition>,
    /// Body placed at the region's origin that other children orbit.
    pub central_body: Option<ChildDefinition>,
    pub generator: Option<NodeGenerator>,
}

impl KindEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_child(mut self, definition: ChildDefinition) -> Self {
        self.children.push(definition);
        self
    }

    pub fn with_central_body(mut self, definition: ChildDefinition) -> Self {
        self.central_body = Some(definition);
        self
    }

    pub fn with_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn(&mut dyn RandomSource) -> Node + Send + Sync + 'static,
    {
        self.generator = Some(Arc::new(generator));
        self
    }

    /// Sum of child densities; drives grid cell sizing.
    pub fn total_density(&self) -> f64 {
        self.children.iter().map(ChildDefinition::density).sum()
    }
}

impl fmt::Debug for KindEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindEntry")
            .field("children", &self.children)
            .field("central_body", &self.central_body)
            .field("generator", &self.generator.is_some())
            .finish()
    }
}

/// Lookup from kind to its population recipe.
#[derive(Debug, Clone, Default)]
pub struct KindTable {
    entries: HashMap<Kind, KindEntry>,
}

impl KindTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: impl Into<Kind>, entry: KindEntry) {
        self.entries.insert(kind.into(), entry);
    }

    pub fn with(mut self, kind: impl Into<Kind>, entry: KindEntry) -> Self {
        self.insert(kind, entry);
        self
    }

    pub fn get(&self, kind: &Kind) -> Option<&KindEntry> {
        self.entries.get(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &Kind> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a free-standing node of `kind` with its registered generator.
    pub fn instantiate(
        &self,
        kind: &Kind,
        rng: &mut dyn RandomSource,
    ) -> Result<Node, PopulationError> {
        self.entries
            .get(kind)
            .and_then(|entry| entry.generator.as_ref())
            .map(|generate| generate(rng))
            .ok_or_else(|| PopulationError::UnknownKind(kind.clone()))
    }
}
