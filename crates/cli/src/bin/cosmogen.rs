use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use cosmogen::Universe;
use cosmogen::common::constants::MU_SUN;
use cosmogen::hierarchy::NodeId;
use cosmogen::orbits::{ClassicalElements, Orbit};
use cosmogen::population::Location;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Procedural universe generator (lazy population + Keplerian orbits)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Spawn a root region and materialize some of its children
    Populate {
        #[command(flatten)]
        universe: UniverseArgs,

        /// Maximum number of children to generate
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Seconds to advance every orbit after generation
        #[arg(long, default_value_t = 0.0)]
        advance: f64,

        /// Emit JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Report expected child counts of a freshly spawned root region
    Census {
        #[command(flatten)]
        universe: UniverseArgs,

        /// Emit JSON instead of a table
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Build an orbit from classical elements and propagate it
    Orbit {
        /// Periapsis distance in metres
        #[arg(long)]
        periapsis: f64,

        #[arg(long)]
        eccentricity: f64,

        /// Inclination in radians
        #[arg(long, default_value_t = 0.0)]
        inclination: f64,

        /// Longitude of the ascending node in radians
        #[arg(long, default_value_t = 0.0)]
        ascending_node: f64,

        /// Argument of periapsis in radians
        #[arg(long, default_value_t = 0.0)]
        argument_of_periapsis: f64,

        /// True anomaly at epoch in radians
        #[arg(long, default_value_t = 0.0)]
        true_anomaly: f64,

        /// Gravitational parameter in m^3/s^2 (defaults to the Sun)
        #[arg(long, default_value_t = MU_SUN)]
        mu: f64,

        /// Seconds after epoch to propagate to
        #[arg(long, default_value_t = 0.0)]
        time: f64,

        /// Emit JSON instead of text
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct UniverseArgs {
    /// Kind catalog (YAML file, TOML file, or directory of TOML files)
    #[arg(long, default_value = "configs/kinds.yaml")]
    catalog: PathBuf,

    /// Engine settings file
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Kind of the root region
    #[arg(long)]
    root: String,

    /// Seed overriding the settings file
    #[arg(long)]
    seed: Option<u64>,
}

impl UniverseArgs {
    fn build(&self) -> anyhow::Result<(Universe, NodeId)> {
        let mut universe = Universe::from_config(&self.catalog, self.settings.as_deref())
            .with_context(|| format!("loading catalog {}", self.catalog.display()))?;
        if let Some(seed) = self.seed {
            universe.reseed(seed);
        }
        let root = universe
            .spawn_root(&self.root)
            .with_context(|| format!("spawning root `{}`", self.root))?;
        Ok((universe, root))
    }
}

#[derive(Serialize)]
struct ChildReport {
    id: u64,
    kind: String,
    distance_m: f64,
    mass_kg: f64,
    radius_m: f64,
    eccentricity: Option<f64>,
    period_s: Option<f64>,
}

#[derive(Serialize)]
struct PopulateReport {
    root: String,
    radius_m: f64,
    children: Vec<ChildReport>,
}

#[derive(Serialize)]
struct CensusRow {
    kind: String,
    expected: f64,
    materialized: usize,
}

#[derive(Serialize)]
struct CensusReport {
    root: String,
    volume_m3: f64,
    entries: Vec<CensusRow>,
}

#[derive(Serialize)]
struct OrbitReport {
    semi_major_axis_m: f64,
    apoapsis_m: f64,
    period_s: f64,
    time_s: f64,
    position_m: [f64; 3],
    velocity_m_s: [f64; 3],
}

fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cosmogen=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match Cli::parse().command {
        Command::Populate {
            universe,
            limit,
            advance,
            json,
        } => populate(&universe, limit, advance, json),
        Command::Census { universe, json } => census(&universe, json),
        Command::Orbit {
            periapsis,
            eccentricity,
            inclination,
            ascending_node,
            argument_of_periapsis,
            true_anomaly,
            mu,
            time,
            json,
        } => {
            let elements = ClassicalElements {
                periapsis,
                eccentricity,
                inclination,
                ascending_node,
                argument_of_periapsis,
                true_anomaly,
            };
            orbit(mu, elements, time, json)
        }
    }
}

fn populate(args: &UniverseArgs, limit: usize, advance: f64, json: bool) -> anyhow::Result<()> {
    let (mut universe, root) = args.build()?;
    let generated = universe.populate(root, Location::Whole, limit)?;
    tracing::info!(root = %root, generated = generated.len(), "population pass finished");
    if advance != 0.0 {
        let moved = universe.advance(advance)?;
        tracing::info!(moved, seconds = advance, "advanced orbits");
    }

    let hierarchy = universe.hierarchy();
    let Some(root_node) = hierarchy.get(root) else {
        bail!("root {root} vanished from the hierarchy");
    };
    let mut children = Vec::new();
    for id in hierarchy.children(root) {
        let Some(node) = hierarchy.get(*id) else {
            continue;
        };
        let orbit = node.orbit().map(|o| &o.orbit);
        children.push(ChildReport {
            id: id.0,
            kind: node.kind().to_string(),
            distance_m: hierarchy.distance(root, *id)?,
            mass_kg: node.mass(),
            radius_m: node.shape().containing_radius(),
            eccentricity: orbit.map(Orbit::eccentricity),
            period_s: orbit.map(Orbit::period).filter(|p| p.is_finite()),
        });
    }
    let report = PopulateReport {
        root: root_node.kind().to_string(),
        radius_m: root_node.shape().containing_radius(),
        children,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!(
        "{} (radius {:.3e} m): {} children",
        report.root,
        report.radius_m,
        report.children.len()
    );
    println!(
        "{:>6}  {:<16} {:>12} {:>12} {:>12} {:>8}",
        "id", "kind", "distance_m", "mass_kg", "radius_m", "ecc"
    );
    for child in &report.children {
        println!(
            "{:>6}  {:<16} {:>12.4e} {:>12.4e} {:>12.4e} {:>8}",
            child.id,
            child.kind,
            child.distance_m,
            child.mass_kg,
            child.radius_m,
            child
                .eccentricity
                .map(|e| format!("{e:.4}"))
                .unwrap_or_else(|| "-".into())
        );
    }
    Ok(())
}

fn census(args: &UniverseArgs, json: bool) -> anyhow::Result<()> {
    let (universe, root) = args.build()?;
    let census = universe.census(root, Location::Whole)?;
    let report = CensusReport {
        root: args.root.clone(),
        volume_m3: census.volume,
        entries: census
            .entries
            .iter()
            .map(|entry| CensusRow {
                kind: entry.kind.to_string(),
                expected: entry.expected,
                materialized: entry.materialized,
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("{} volume {:.4e} m^3", report.root, report.volume_m3);
    for row in &report.entries {
        println!(
            "  {:<16} expected {:>12.4e}  materialized {}",
            row.kind, row.expected, row.materialized
        );
    }
    Ok(())
}

fn orbit(mu: f64, elements: ClassicalElements, time: f64, json: bool) -> anyhow::Result<()> {
    let orbit = Orbit::from_elements(mu, elements)?;
    let (position, velocity) = orbit.state_at(time);
    let report = OrbitReport {
        semi_major_axis_m: orbit.semi_major_axis(),
        apoapsis_m: orbit.apoapsis(),
        period_s: orbit.period(),
        time_s: time,
        position_m: position,
        velocity_m_s: velocity,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("semi-major axis: {:.6e} m", report.semi_major_axis_m);
    println!("apoapsis:        {:.6e} m", report.apoapsis_m);
    println!("period:          {:.6e} s", report.period_s);
    println!(
        "position @ {:.3e} s: [{:.6e}, {:.6e}, {:.6e}] m",
        time, position[0], position[1], position[2]
    );
    println!(
        "velocity @ {:.3e} s: [{:.6e}, {:.6e}, {:.6e}] m/s",
        time, velocity[0], velocity[1], velocity[2]
    );
    Ok(())
}
