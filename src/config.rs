use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::space::{Sizing, WidthBounds};

/// Run configuration, read from a TOML file. Every field except the gate
/// name has a default matching the reference flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateOptConfig {
    /// Name of the gate netlist template (`<netlist_dir>/<gate>.cir`).
    pub gate: String,
    #[serde(default = "default_netlist_dir")]
    pub netlist_dir: PathBuf,
    /// Quantization resolution per width; the state space is `grid_size^2`.
    #[serde(default = "default_grid_size")]
    pub grid_size: usize,
    #[serde(default = "default_episodes")]
    pub episodes: usize,
    #[serde(default = "default_steps_per_episode")]
    pub steps_per_episode: usize,
    /// Random restart cadence, in episodes (0 disables restarts).
    #[serde(default = "default_reset_every")]
    pub reset_every: usize,
    /// Supply voltage, in volts.
    #[serde(default = "default_vdd")]
    pub vdd: f64,
    /// Channel length, in meters.
    #[serde(default = "default_length")]
    pub length: f64,
    #[serde(default = "default_nmos_bounds")]
    pub nmos: WidthBounds,
    #[serde(default = "default_pmos_bounds")]
    pub pmos: WidthBounds,
    #[serde(default = "default_initial_sizing")]
    pub initial: Sizing,
    /// Simulator executable.
    #[serde(default = "default_command")]
    pub command: String,
    /// Wall-clock limit per simulation, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl GateOptConfig {
    pub fn template_path(&self) -> PathBuf {
        crate::paths::gate_template(&self.netlist_dir, &self.gate)
    }

    pub fn param_file(&self) -> PathBuf {
        crate::paths::param_file(&self.netlist_dir)
    }
}

fn default_netlist_dir() -> PathBuf {
    PathBuf::from("netlists")
}

fn default_grid_size() -> usize {
    20
}

fn default_episodes() -> usize {
    100
}

fn default_steps_per_episode() -> usize {
    25
}

fn default_reset_every() -> usize {
    10
}

fn default_vdd() -> f64 {
    1.8
}

fn default_length() -> f64 {
    0.15e-6
}

fn default_nmos_bounds() -> WidthBounds {
    WidthBounds {
        min: 0.2e-6,
        max: 5.0e-6,
    }
}

fn default_pmos_bounds() -> WidthBounds {
    WidthBounds {
        min: 0.2e-6,
        max: 8.0e-6,
    }
}

fn default_initial_sizing() -> Sizing {
    Sizing {
        w_n: 0.5e-6,
        w_p: 1.0e-6,
    }
}

fn default_command() -> String {
    String::from("ngspice")
}

fn default_timeout_secs() -> u64 {
    60
}

pub fn parse_config(path: impl AsRef<Path>) -> Result<GateOptConfig> {
    let contents = fs::read_to_string(path)?;
    let data = toml::from_str(&contents)?;
    Ok(data)
}
