//! Configuration models and loaders for cosmogen.
//!
//! Two kinds of document are read: engine settings (a single record) and a
//! kind catalog (a YAML list, a single TOML kind, or a directory of TOML
//! kinds read in file-name order).

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Engine-wide tuning knobs.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct EngineSettings {
    /// Fixed seed for reproducible universes; entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_miss_limit")]
    pub miss_limit: u32,
    #[serde(default = "default_placement_samples")]
    pub placement_samples: u32,
    #[serde(default)]
    pub propagation: PropagationConfig,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            seed: None,
            miss_limit: default_miss_limit(),
            placement_samples: default_placement_samples(),
            propagation: PropagationConfig::default(),
        }
    }
}

/// Universal-variable solver settings.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct PropagationConfig {
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
        }
    }
}

fn default_miss_limit() -> u32 {
    10
}

fn default_placement_samples() -> u32 {
    8
}

fn default_tolerance() -> f64 {
    1e-8
}

fn default_max_iterations() -> u32 {
    64
}

/// Inclusive sampling range.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct RangeConfig {
    pub min: f64,
    pub max: f64,
}

impl RangeConfig {
    pub fn fixed(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }
}

/// Bounding shape of a kind, sampled per instance.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ShapeConfig {
    #[serde(rename = "point")]
    Point,
    #[serde(rename = "sphere")]
    Sphere { radius_m: RangeConfig },
    /// Ellipsoid whose largest semi-axis is drawn from `radius_m`; the others
    /// follow `axis_ratios`.
    #[serde(rename = "ellipsoid")]
    Ellipsoid {
        radius_m: RangeConfig,
        axis_ratios: [f64; 3],
    },
}

/// One entry of the kind catalog.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct KindConfig {
    pub name: String,
    pub shape: ShapeConfig,
    pub mass_kg: RangeConfig,
    #[serde(default)]
    pub temperature_k: f64,
    #[serde(default)]
    pub albedo: f64,
    /// Body placed at the origin of each region of this kind for children to orbit.
    #[serde(default)]
    pub central_body: Option<ChildConfig>,
    #[serde(default)]
    pub children: Vec<ChildConfig>,
}

/// A kind of content a region may contain.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChildConfig {
    pub kind: String,
    #[serde(default)]
    pub density_per_m3: f64,
    #[serde(default)]
    pub footprint_m: f64,
    #[serde(default)]
    pub max_eccentricity: f64,
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Load engine settings from a YAML or TOML file.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<EngineSettings, ConfigError> {
    let path = path.as_ref();
    let settings: EngineSettings = if is_toml(path) {
        toml::from_str(&std::fs::read_to_string(path)?)?
    } else {
        serde_yaml::from_reader(File::open(path)?)?
    };
    if settings.propagation.tolerance <= 0.0 || settings.propagation.max_iterations == 0 {
        return Err(ConfigError::Invalid(
            "propagation needs a positive tolerance and at least one iteration".into(),
        ));
    }
    Ok(settings)
}

/// Load and validate a kind catalog.
pub fn load_kinds<P: AsRef<Path>>(path: P) -> Result<Vec<KindConfig>, ConfigError> {
    let kinds: Vec<KindConfig> = load_records(path)?;
    validate_kinds(&kinds)?;
    Ok(kinds)
}

/// Check ranges, densities and cross-references of a catalog.
pub fn validate_kinds(kinds: &[KindConfig]) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    for kind in kinds {
        if !names.insert(kind.name.as_str()) {
            return Err(invalid(&kind.name, "is defined more than once"));
        }
    }

    for kind in kinds {
        check_range(&kind.name, "mass_kg", &kind.mass_kg)?;
        match &kind.shape {
            ShapeConfig::Point => {}
            ShapeConfig::Sphere { radius_m } => check_range(&kind.name, "radius_m", radius_m)?,
            ShapeConfig::Ellipsoid {
                radius_m,
                axis_ratios,
            } => {
                check_range(&kind.name, "radius_m", radius_m)?;
                if axis_ratios.iter().any(|r| !(*r > 0.0 && *r <= 1.0)) {
                    return Err(invalid(&kind.name, "axis_ratios must lie in (0, 1]"));
                }
            }
        }
        if !(0.0..=1.0).contains(&kind.albedo) || kind.temperature_k < 0.0 {
            return Err(invalid(
                &kind.name,
                "needs an albedo in [0, 1] and a non-negative temperature",
            ));
        }
        for child in kind.children.iter().chain(kind.central_body.iter()) {
            if !names.contains(child.kind.as_str()) {
                return Err(invalid(
                    &kind.name,
                    &format!("references unknown kind `{}`", child.kind),
                ));
            }
            if !(child.density_per_m3 >= 0.0 && child.density_per_m3.is_finite()) {
                return Err(invalid(&kind.name, "child density must be finite and non-negative"));
            }
            if !(child.footprint_m >= 0.0) || !(child.max_eccentricity >= 0.0) {
                return Err(invalid(
                    &kind.name,
                    "child footprint and eccentricity must be non-negative",
                ));
            }
        }
    }
    Ok(())
}

fn check_range(kind: &str, field: &str, range: &RangeConfig) -> Result<(), ConfigError> {
    if range.min < 0.0 || range.min > range.max || !range.max.is_finite() {
        return Err(invalid(
            kind,
            &format!("{field} range [{}, {}] is invalid", range.min, range.max),
        ));
    }
    Ok(())
}

fn invalid(kind: &str, message: &str) -> ConfigError {
    ConfigError::Invalid(format!("kind `{kind}` {message}"))
}

fn is_toml(path: &Path) -> bool {
    path.extension().map(|ext| ext == "toml").unwrap_or(false)
}

fn load_records<T, P>(path: P) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.is_dir() {
        read_dir_records(path)
    } else if is_toml(path) {
        let contents = std::fs::read_to_string(path)?;
        let record: T = toml::from_str(&contents)?;
        Ok(vec![record])
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

fn read_dir_records<T>(dir: &Path) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut records = Vec::new();
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_toml(path))
        .collect();
    entries.sort();
    for path in entries {
        let contents = std::fs::read_to_string(&path)?;
        let record: T = toml::from_str(&contents)?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(name: &str, children: Vec<ChildConfig>) -> KindConfig {
        KindConfig {
            name: name.into(),
            shape: ShapeConfig::Point,
            mass_kg: RangeConfig::fixed(1.0),
            temperature_k: 0.0,
            albedo: 0.0,
            central_body: None,
            children,
        }
    }

    fn child(kind: &str, density: f64) -> ChildConfig {
        ChildConfig {
            kind: kind.into(),
            density_per_m3: density,
            footprint_m: 0.0,
            max_eccentricity: 0.0,
        }
    }

    #[test]
    fn rejects_dangling_child_kind() {
        let kinds = vec![kind("system", vec![child("comet", 1.0)])];
        assert!(matches!(validate_kinds(&kinds), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_negative_density() {
        let kinds = vec![kind("system", vec![child("rock", -1.0)]), kind("rock", vec![])];
        assert!(matches!(validate_kinds(&kinds), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn accepts_consistent_catalog() {
        let kinds = vec![kind("system", vec![child("rock", 1e-3)]), kind("rock", vec![])];
        assert!(validate_kinds(&kinds).is_ok());
    }
}
