// fleet_sim/src/simulation/config/structs.rs

use bevy::prelude::Resource;
use figment::value::Value;
use fleet_core::detection::DEFAULT_AMBIENT_LUMINOSITY;
use fleet_core::discovery::HostInfo;
use serde::Deserialize;
use std::path::PathBuf;

// =========================================================================
// == Top-Level Configuration Resource ==
// =========================================================================

/// # ScenarioConfig
/// The root of a scenario TOML file.
#[derive(Resource, Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub simulation: SimulationSection,

    #[serde(default)]
    pub world: WorldSection,

    /// `[[hosts]]`: what device discovery reports. Setup waits until every
    /// device listed here has been declared.
    #[serde(default)]
    pub hosts: Vec<HostInfo>,

    /// `[[declarations]]`: kept as raw values so that a bad entry is rejected
    /// on its own when it is declared, not while loading the whole file.
    #[serde(default)]
    pub declarations: Vec<Value>,
}

// =========================================================================
// == Configuration Sub-Structs ==
// =========================================================================

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct SimulationSection {
    /// Seed for the detection PRNG. Omit for a random seed.
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct WorldSection {
    /// Scene brightness before any fire or led is taken into account, 0..=100.
    #[serde(default = "default_ambient_luminosity")]
    pub ambient_luminosity: f64,
    /// Directory walked for extra `*.toml` device declarations.
    #[serde(default)]
    pub devices_dir: Option<PathBuf>,
}

fn default_ambient_luminosity() -> f64 {
    DEFAULT_AMBIENT_LUMINOSITY
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            ambient_luminosity: DEFAULT_AMBIENT_LUMINOSITY,
            devices_dir: None,
        }
    }
}

/// A device file holds either one declaration or a `[[declarations]]` list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DeviceFile {
    Many { declarations: Vec<Value> },
    One(Value),
}

impl DeviceFile {
    pub fn into_declarations(self) -> Vec<Value> {
        match self {
            DeviceFile::Many { declarations } => declarations,
            DeviceFile::One(value) => vec![value],
        }
    }
}
