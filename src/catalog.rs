//! Turns a loaded kind catalog into the population engine's kind table.

use std::collections::HashMap;
use std::sync::Arc;

use crate::common::RandomSource;
use crate::config::{ChildConfig, KindConfig, RangeConfig, ShapeConfig};
use crate::hierarchy::{Node, Shape};
use crate::population::{ChildDefinition, KindEntry, KindTable};

/// Build a kind table whose constructors sample shape and mass uniformly
/// within the configured ranges.
///
/// Child references to kinds missing from `kinds` are skipped; run
/// [`crate::config::validate_kinds`] first to reject them instead.
pub fn build_kind_table(kinds: &[KindConfig]) -> KindTable {
    let by_name: HashMap<&str, Arc<KindConfig>> = kinds
        .iter()
        .map(|kind| (kind.name.as_str(), Arc::new(kind.clone())))
        .collect();

    let mut table = KindTable::new();
    for kind in kinds {
        let mut entry = KindEntry::new();
        if let Some(template) = by_name.get(kind.name.as_str()).cloned() {
            entry = entry.with_generator(move |rng| sample_node(&template, rng));
        }
        for child in &kind.children {
            if let Some(definition) = child_definition(child, &by_name) {
                entry = entry.with_child(definition);
            }
        }
        if let Some(central) = &kind.central_body {
            if let Some(definition) = child_definition(central, &by_name) {
                entry = entry.with_central_body(definition);
            }
        }
        table.insert(kind.name.as_str(), entry);
    }
    table
}

fn child_definition(
    child: &ChildConfig,
    by_name: &HashMap<&str, Arc<KindConfig>>,
) -> Option<ChildDefinition> {
    let template = by_name.get(child.kind.as_str())?.clone();
    Some(
        ChildDefinition::new(
            child.kind.as_str(),
            child.footprint_m,
            child.density_per_m3,
            move |_parent, _position, rng| Some(sample_node(&template, rng)),
        )
        .with_max_eccentricity(child.max_eccentricity),
    )
}

/// Draw one instance of a kind.
pub fn sample_node(kind: &KindConfig, rng: &mut dyn RandomSource) -> Node {
    let shape = match &kind.shape {
        ShapeConfig::Point => Shape::Point,
        ShapeConfig::Sphere { radius_m } => Shape::Sphere {
            radius: sample(radius_m, rng),
        },
        ShapeConfig::Ellipsoid {
            radius_m,
            axis_ratios,
        } => {
            let radius = sample(radius_m, rng);
            Shape::Ellipsoid {
                semi_axes: axis_ratios.map(|ratio| ratio * radius),
            }
        }
    };
    Node::new(kind.name.as_str(), shape, sample(&kind.mass_kg, rng))
        .with_temperature(kind.temperature_k)
        .with_albedo(kind.albedo)
}

fn sample(range: &RangeConfig, rng: &mut dyn RandomSource) -> f64 {
    rng.uniform_range(range.min, range.max)
}
