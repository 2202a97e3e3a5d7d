// ─────────────────────────────────────────────────────────────────────
// SCPN Kinetic — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Position of this rank's patch inside the global patch grid.
///
/// The debug recorder writes one scalar per patch into 3D arrays shaped
/// by `n_patches`; a 1D or 2D decomposition uses trailing dimensions of 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchLayout {
    pub n_patches: [usize; 3],
    pub coords: [usize; 3],
    /// Only the master rank creates debug files; the others open handles.
    pub master: bool,
}

impl Default for PatchLayout {
    fn default() -> Self {
        PatchLayout {
            n_patches: [1, 1, 1],
            coords: [0, 0, 0],
            master: true,
        }
    }
}

/// Global simulation parameters consumed by the collision core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationParams {
    /// Timestep in units of 1/omega_0.
    pub timestep: f64,
    /// Reference angular frequency omega_0 (rad/s). Must be positive
    /// whenever any collision record is present: it converts SI cross
    /// sections and lengths into code units.
    #[serde(rename = "referenceAngularFrequency_SI")]
    pub reference_angular_frequency_si: f64,
    /// Number of cells covered by one spatial bin (cluster).
    pub cells_per_bin: f64,
    /// Spatial dimensionality of the particle arrays (1 to 3).
    #[serde(default = "default_dim")]
    pub dim: usize,
    #[serde(default)]
    pub patch: PatchLayout,
    /// Directory receiving the per-group debug files.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_dim() -> usize {
    3
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

/// One `Collisions` record of the input deck.
///
/// Species are given by name and resolved against the species list when the
/// collision groups are built. An absent or non-positive `coulomb_log`
/// selects the automatic Coulomb logarithm, which in turn requires the
/// per-bin Debye length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollisionsSpec {
    pub species1: Vec<String>,
    pub species2: Vec<String>,
    #[serde(default)]
    pub coulomb_log: Option<f64>,
    #[serde(default)]
    pub debug_every: Option<u64>,
    #[serde(default)]
    pub ionizing: Option<bool>,
}

impl CollisionsSpec {
    /// Effective Coulomb logarithm: non-positive means "automatic".
    pub fn coulomb_log_or_auto(&self) -> f64 {
        self.coulomb_log.unwrap_or(0.0)
    }

    pub fn debug_cadence(&self) -> u64 {
        self.debug_every.unwrap_or(0)
    }

    pub fn is_ionizing(&self) -> bool {
        self.ionizing.unwrap_or(false)
    }
}

/// Top-level deck fragment owned by the collision core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollisionConfig {
    #[serde(flatten)]
    pub params: SimulationParams,
    #[serde(default, rename = "Collisions")]
    pub collisions: Vec<CollisionsSpec>,
}

impl CollisionConfig {
    /// Load from a JSON deck file.
    pub fn from_file(path: &str) -> crate::error::KineticResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }
}
