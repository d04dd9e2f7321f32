use std::fs;
use std::path::Path;

use cosmogen::Universe;
use cosmogen::config::{self, ConfigError, ShapeConfig};
use cosmogen::common::constants::G;
use cosmogen::hierarchy::{Node, NodeId, Shape};
use cosmogen::orbits::{ClassicalElements, Orbit};
use cosmogen::population::Location;
use tempfile::tempdir;

const CATALOG: &str = "configs/kinds.yaml";
const SETTINGS: &str = "configs/settings.yaml";

#[test]
fn bundled_catalog_loads_and_validates() {
    let kinds = config::load_kinds(CATALOG).expect("catalog should load");
    let names: Vec<_> = kinds.iter().map(|k| k.name.as_str()).collect();
    for expected in ["galaxy", "star_system", "star", "planet"] {
        assert!(names.contains(&expected), "missing {expected}");
    }
    let system = kinds.iter().find(|k| k.name == "star_system").unwrap();
    assert_eq!(system.central_body.as_ref().unwrap().kind, "star");
    assert!(matches!(system.shape, ShapeConfig::Sphere { .. }));
}

#[test]
fn bundled_settings_load() {
    let settings = config::load_settings(SETTINGS).unwrap();
    assert_eq!(settings.seed, Some(42));
    assert_eq!(settings.propagation.max_iterations, 64);
}

#[test]
fn settings_fall_back_to_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.toml");
    fs::write(&path, "seed = 7\n").unwrap();
    let settings = config::load_settings(&path).unwrap();
    assert_eq!(settings.seed, Some(7));
    assert_eq!(settings.miss_limit, 10);
    assert_eq!(settings.placement_samples, 8);
    assert_eq!(settings.propagation.tolerance, 1e-8);

    fs::write(&path, "[propagation]\nmax_iterations = 0\n").unwrap();
    assert!(matches!(
        config::load_settings(&path),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn toml_directory_is_read_in_name_order() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("10_belt.toml"),
        r#"
name = "belt"
mass_kg = { min = 1.0e20, max = 1.0e21 }

[shape]
type = "sphere"
radius_m = { min = 1.0e11, max = 1.0e11 }

[[children]]
kind = "rock"
density_per_m3 = 1.0e-30
footprint_m = 1.0e4
"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("20_rock.toml"),
        r#"
name = "rock"
mass_kg = { min = 1.0e12, max = 1.0e15 }
albedo = 0.1

[shape]
type = "point"
"#,
    )
    .unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let kinds = config::load_kinds(dir.path()).unwrap();
    let names: Vec<_> = kinds.iter().map(|k| k.name.as_str()).collect();
    assert_eq!(names, ["belt", "rock"]);
    assert_eq!(kinds[0].children[0].density_per_m3, 1.0e-30);
    assert_eq!(kinds[1].shape, ShapeConfig::Point);
}

#[test]
fn dangling_reference_is_rejected_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("kinds.yaml");
    fs::write(
        &path,
        r#"
- name: cluster
  shape: { type: point }
  mass_kg: { min: 1.0, max: 1.0 }
  children:
    - kind: quasar
      density_per_m3: 1.0
"#,
    )
    .unwrap();
    let err = config::load_kinds(&path).unwrap_err();
    assert!(err.to_string().contains("quasar"), "{err}");
}

#[test]
fn missing_catalog_is_an_io_error() {
    assert!(matches!(
        config::load_kinds(Path::new("configs/does_not_exist.yaml")),
        Err(ConfigError::Io(_))
    ));
}

fn star_system(seed: u64) -> (Universe, NodeId) {
    let mut universe = Universe::from_config(CATALOG, Some(Path::new(SETTINGS))).unwrap();
    universe.reseed(seed);
    let root = universe.spawn_root("star_system").unwrap();
    (universe, root)
}

#[test]
fn configured_star_system_populates_with_orbits() {
    let (mut universe, root) = star_system(42);
    let census = universe.census(root, Location::Whole).unwrap();
    let expected = census.entries[0].expected;
    assert!(expected > 0.5 && expected < 10.0, "expected {expected}");

    let planets = universe.populate(root, Location::Whole, 20).unwrap();
    let hierarchy = universe.hierarchy();
    let star = hierarchy.get(root).unwrap().orbit_center().expect("central star");
    assert_eq!(hierarchy.get(star).unwrap().kind().as_str(), "star");
    assert_eq!(hierarchy.children(root).len(), planets.len() + 1);

    for id in &planets {
        let planet = hierarchy.get(*id).unwrap();
        assert_eq!(planet.kind().as_str(), "planet");
        assert_eq!(planet.albedo(), 0.3);
        let orbit = planet.orbit().expect("planets orbit the star");
        assert_eq!(orbit.orbited, star);
        assert!(orbit.orbit.eccentricity() < 0.1);
        assert!(hierarchy.average_temperature(*id) > 0.0);
    }

    let moved = universe.advance(86_400.0).unwrap();
    assert_eq!(moved, planets.len());
}

#[test]
fn advance_skips_orbits_it_cannot_move() {
    let (mut universe, root) = star_system(42);
    let planets = universe.populate(root, Location::Whole, 20).unwrap();

    let hierarchy = universe.hierarchy_mut();
    let anchor = hierarchy
        .attach(
            root,
            Node::new("anchor", Shape::Sphere { radius: 1.0e6 }, 1.0e24),
            [1.0e5, 0.0, 0.0],
        )
        .unwrap();
    let rock = hierarchy
        .attach(root, Node::new("rock", Shape::Point, 1.0), [1.0e5, 0.0, 0.0])
        .unwrap();
    let orbit = Orbit::from_elements(
        G * 1.0e24,
        ClassicalElements {
            periapsis: 1.0e8,
            eccentricity: 0.1,
            inclination: 0.0,
            ascending_node: 0.0,
            argument_of_periapsis: 0.0,
            true_anomaly: 0.0,
        },
    )
    .unwrap();
    hierarchy.set_orbit(rock, anchor, orbit).unwrap();
    // The anchor drifts off into its own tree; the rock can no longer follow it.
    hierarchy.detach(anchor).unwrap();
    let before = hierarchy.get(rock).unwrap().clone();

    let moved = universe.advance(86_400.0).unwrap();
    assert_eq!(moved, planets.len());
    let after = universe.hierarchy().get(rock).unwrap();
    assert_eq!(after.position(), before.position());
    assert_eq!(after.velocity(), before.velocity());
    assert_eq!(
        after.orbit().unwrap().orbit.position(),
        before.orbit().unwrap().orbit.position()
    );
}

#[test]
fn same_seed_reproduces_the_same_universe() {
    let snapshot = |seed| {
        let (mut universe, root) = star_system(seed);
        universe.populate(root, Location::Whole, 20).unwrap();
        let hierarchy = universe.hierarchy();
        hierarchy
            .children(root)
            .iter()
            .map(|id| {
                let node = hierarchy.get(*id).unwrap();
                (node.kind().to_string(), node.mass(), node.position())
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(snapshot(9), snapshot(9));
}

#[test]
fn unknown_root_kind_is_reported() {
    let mut universe = Universe::from_config(CATALOG, None).unwrap();
    assert!(universe.spawn_root("quasar").is_err());
}
