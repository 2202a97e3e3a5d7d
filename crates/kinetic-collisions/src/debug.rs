// ─────────────────────────────────────────────────────────────────────
// SCPN Kinetic — Collision Debug Recorder
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Per-timestep collision statistics file, one per collision group.
//!
//! With the `hdf5-output` feature the recorder writes the
//! `Collisions<id>.h5` layout: root attributes, one `t<itime:08>` group
//! per debug step, and datasets `s`, `coulomb_log`, `debyelength` shaped
//! over the patch grid with this rank's scalar at its patch coordinate.
//! Without the feature it falls back to `Collisions<id>.json`, one JSON
//! object per debug step with the same logical content.

use crate::kernel::PairStats;
use kinetic_types::config::PatchLayout;
use kinetic_types::error::KineticResult;
#[cfg(not(feature = "hdf5-output"))]
use std::io::Write;
use std::path::{Path, PathBuf};

/// Running sums of the per-pair statistics of one debug step.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct DebugAccumulator {
    sum_s: f64,
    sum_log_l: f64,
    pairs: f64,
}

impl DebugAccumulator {
    pub fn add(&mut self, stats: PairStats) {
        self.sum_s += stats.s;
        self.sum_log_l += stats.log_l;
        self.pairs += 1.0;
    }

    pub fn has_pairs(&self) -> bool {
        self.pairs > 0.0
    }

    pub fn mean_s(&self) -> f64 {
        self.sum_s / self.pairs
    }

    pub fn mean_log_l(&self) -> f64 {
        self.sum_log_l / self.pairs
    }
}

/// Root attributes of a collision debug file.
#[derive(Debug, Clone)]
pub struct DebugAttributes {
    /// Comma-joined resolved species indices of each group.
    pub species1: String,
    pub species2: String,
    pub coulomb_log: f64,
    pub debug_every: u64,
}

/// Owns the path and handle of one group's debug file.
#[derive(Debug, Clone)]
pub struct DebugFile {
    path: PathBuf,
    layout: PatchLayout,
}

fn timestep_group(itime: u64) -> String {
    format!("t{itime:08}")
}

#[cfg(not(feature = "hdf5-output"))]
impl DebugFile {
    /// Create the file with its root attributes, or open it when it
    /// already exists (restart). Only the master rank creates.
    pub fn new(
        dir: &Path,
        group_id: usize,
        attrs: &DebugAttributes,
        layout: &PatchLayout,
    ) -> KineticResult<Self> {
        let path = dir.join(format!("Collisions{group_id}.json"));
        if layout.master && !path.exists() {
            let header = serde_json::json!({
                "Version": env!("CARGO_PKG_VERSION"),
                "species1": attrs.species1,
                "species2": attrs.species2,
                "coulomb_log": attrs.coulomb_log,
                "debug_every": attrs.debug_every,
            });
            let mut file = std::fs::File::create(&path)?;
            writeln!(file, "{header}")?;
        }
        Ok(DebugFile {
            path,
            layout: layout.clone(),
        })
    }

    /// Timestep groups only exist in the HDF5 layout.
    pub fn create_timestep(&self, _itime: u64) -> KineticResult<()> {
        Ok(())
    }

    pub fn write_step(
        &self,
        itime: u64,
        s_mean: f64,
        log_l_mean: f64,
        debye_mean_si: Option<f64>,
    ) -> KineticResult<()> {
        if !self.layout.master {
            return Ok(());
        }
        let record = serde_json::json!({
            "t": timestep_group(itime),
            "s": s_mean,
            "coulomb_log": log_l_mean,
            "debyelength": debye_mean_si,
        });
        let mut file = std::fs::OpenOptions::new().append(true).open(&self.path)?;
        writeln!(file, "{record}")?;
        Ok(())
    }
}

#[cfg(feature = "hdf5-output")]
impl DebugFile {
    pub fn new(
        dir: &Path,
        group_id: usize,
        attrs: &DebugAttributes,
        layout: &PatchLayout,
    ) -> KineticResult<Self> {
        use hdf5::types::VarLenUnicode;

        let path = dir.join(format!("Collisions{group_id}.h5"));
        if layout.master && !path.exists() {
            let file = hdf5::File::create(&path)?;
            let write_str = |name: &str, value: &str| -> KineticResult<()> {
                let value: VarLenUnicode = value.parse().unwrap_or_default();
                file.new_attr::<VarLenUnicode>()
                    .create(name)?
                    .write_scalar(&value)?;
                Ok(())
            };
            write_str("Version", env!("CARGO_PKG_VERSION"))?;
            write_str("species1", &attrs.species1)?;
            write_str("species2", &attrs.species2)?;
            file.new_attr::<f64>()
                .create("coulomb_log")?
                .write_scalar(&attrs.coulomb_log)?;
            file.new_attr::<u64>()
                .create("debug_every")?
                .write_scalar(&attrs.debug_every)?;
        }
        Ok(DebugFile {
            path,
            layout: layout.clone(),
        })
    }

    /// Create the `t<itime:08>` group; invoked by the driver before the
    /// groups collide, so `write_step` only opens and appends.
    pub fn create_timestep(&self, itime: u64) -> KineticResult<()> {
        if !self.layout.master {
            return Ok(());
        }
        let file = hdf5::File::open_rw(&self.path)?;
        file.create_group(&timestep_group(itime))?;
        Ok(())
    }

    pub fn write_step(
        &self,
        itime: u64,
        s_mean: f64,
        log_l_mean: f64,
        debye_mean_si: Option<f64>,
    ) -> KineticResult<()> {
        if !self.layout.master {
            return Ok(());
        }
        let file = hdf5::File::open_rw(&self.path)?;
        let group = file.group(&timestep_group(itime))?;
        let write_patch_scalar = |name: &str, value: f64| -> KineticResult<()> {
            let mut arr = ndarray::Array3::<f64>::zeros(self.layout.n_patches);
            arr[self.layout.coords] = value;
            group.new_dataset_builder().with_data(&arr).create(name)?;
            Ok(())
        };
        write_patch_scalar("s", s_mean)?;
        write_patch_scalar("coulomb_log", log_l_mean)?;
        if let Some(debye) = debye_mean_si {
            write_patch_scalar("debyelength", debye)?;
        }
        Ok(())
    }
}
