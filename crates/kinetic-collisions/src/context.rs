// ─────────────────────────────────────────────────────────────────────
// SCPN Kinetic — Collision Context
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Per-process state shared by all collision groups within one timestep.
//!
//! Owns the Debye-length table so that it is computed once per timestep
//! and then read by every group, instead of living in process-global
//! statics.

use crate::debye::debye_length_squared_per_bin;
use crate::group::CollisionGroup;
use kinetic_types::config::SimulationParams;
use kinetic_types::constants::C_SI;
use kinetic_types::error::KineticResult;
use kinetic_types::species::Species;
use ndarray::Array1;

#[derive(Debug, Clone)]
pub struct CollisionContext {
    debye_length_required: bool,
    debye_length_squared: Option<Array1<f64>>,
}

impl CollisionContext {
    pub fn new(debye_length_required: bool) -> Self {
        CollisionContext {
            debye_length_required,
            debye_length_squared: None,
        }
    }

    /// A context for the given groups: the Debye length is required as
    /// soon as any group runs with an automatic Coulomb logarithm.
    pub fn for_groups(groups: &[CollisionGroup]) -> Self {
        Self::new(groups.iter().any(|g| g.requires_debye_length()))
    }

    pub fn debye_length_required(&self) -> bool {
        self.debye_length_required
    }

    /// Recompute the per-bin Debye table if any group needs it. Called
    /// once per timestep, before the groups collide.
    pub fn prepare_step(
        &mut self,
        species: &[Species],
        params: &SimulationParams,
    ) -> KineticResult<()> {
        if self.debye_length_required {
            self.debye_length_squared = Some(debye_length_squared_per_bin(species, params)?);
        }
        Ok(())
    }

    pub fn bin_debye_length_squared(&self, ibin: usize) -> Option<f64> {
        self.debye_length_squared.as_ref().map(|t| t[ibin])
    }

    /// Mean Debye length over the bins, in meters, for the debug file.
    pub fn mean_debye_length_si(&self, params: &SimulationParams) -> Option<f64> {
        self.debye_length_squared.as_ref().map(|t| {
            t.iter().map(|d2| d2.sqrt()).sum::<f64>() / (t.len() as f64) * C_SI
                / params.reference_angular_frequency_si
        })
    }
}
