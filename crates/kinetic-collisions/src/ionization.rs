// ─────────────────────────────────────────────────────────────────────
// SCPN Kinetic — Collisional Ionization
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Electron-impact ionization hook of the collision loop.
//!
//! The hook is driven once per bin in a fixed order: `prepare1`, then
//! `prepare2` for every pair during density accumulation, `prepare3`, then
//! `apply` for every pair in the scatter loop, then `finish`.
//!
//! The ionizing variant uses the Lotz cross section with hydrogenic
//! binding potentials, converted from SI to code units through the
//! reference angular frequency. Electrons freed during a bin step are
//! buffered and spliced into the electron species by `finish`, so the pair
//! indexing of the bin being processed stays valid.

use kinetic_types::config::SimulationParams;
use kinetic_types::constants::{C_SI, ME_C2_EV, R_E_SI, RYDBERG_EV};
use kinetic_types::error::KineticResult;
use kinetic_types::species::{Particles, Species};
use rand::Rng;
use std::f64::consts::PI;

/// Lotz cross-section prefactor (m^2 eV^2).
const LOTZ_PREFACTOR_SI: f64 = 4.5e-18;

/// Ionization capability of one collision group.
#[derive(Debug, Clone)]
pub enum Ionization {
    NoOp,
    Impact(ImpactIonization),
}

impl Ionization {
    pub fn new(ionizing: bool, atomic_number: u32, params: &SimulationParams) -> Self {
        if ionizing {
            Ionization::Impact(ImpactIonization::new(
                atomic_number,
                params.dim,
                params.reference_angular_frequency_si,
            ))
        } else {
            Ionization::NoOp
        }
    }

    /// Start of a bin step; `group1_atomic_number` identifies which side
    /// of the pair stream carries the electrons.
    pub fn prepare1(&mut self, group1_atomic_number: u32) {
        if let Ionization::Impact(hook) = self {
            hook.prepare1(group1_atomic_number);
        }
    }

    /// Per-pair accumulation during the density pass.
    pub fn prepare2(
        &mut self,
        species: &[Species],
        p1: (usize, usize),
        p2: (usize, usize),
        is_unique: bool,
    ) {
        if let Ionization::Impact(hook) = self {
            hook.prepare2(species, p1, p2, is_unique);
        }
    }

    /// Freeze the per-bin ionization rate normalization.
    pub fn prepare3(&mut self, timestep: f64, n_cluster_per_cell: f64) {
        if let Ionization::Impact(hook) = self {
            hook.prepare3(timestep, n_cluster_per_cell);
        }
    }

    /// Per-pair ionization attempt during the scatter loop.
    pub fn apply(
        &mut self,
        species: &mut [Species],
        p1: (usize, usize),
        p2: (usize, usize),
        rng: &mut impl Rng,
    ) {
        if let Ionization::Impact(hook) = self {
            hook.apply(species, p1, p2, rng);
        }
    }

    /// End of the bin step: inject the freed electrons.
    pub fn finish(&mut self, species: &mut [Species], ibin: usize) -> KineticResult<()> {
        match self {
            Ionization::NoOp => Ok(()),
            Ionization::Impact(hook) => hook.finish(species, ibin),
        }
    }
}

#[derive(Debug, Clone)]
struct FreedElectron {
    species: usize,
    position: [f64; 3],
    momentum: [f64; 3],
    weight: f64,
    charge: f64,
}

/// Electron-impact ionization state, one instance per collision group.
#[derive(Debug, Clone)]
pub struct ImpactIonization {
    atomic_number: u32,
    dim: usize,
    /// omega0 / (4 pi re c): turns sigma_SI * n * v * dt (code units)
    /// into the dimensionless probability argument.
    sigma_rate: f64,
    electron_first: bool,
    ion_weight_sum: f64,
    rate: f64,
    freed: Vec<FreedElectron>,
}

impl ImpactIonization {
    pub fn new(atomic_number: u32, dim: usize, omega0: f64) -> Self {
        ImpactIonization {
            atomic_number,
            dim,
            sigma_rate: omega0 / (4.0 * PI * R_E_SI * C_SI),
            electron_first: false,
            ion_weight_sum: 0.0,
            rate: 0.0,
            freed: Vec::new(),
        }
    }

    fn prepare1(&mut self, group1_atomic_number: u32) {
        self.electron_first = group1_atomic_number == 0;
        self.ion_weight_sum = 0.0;
        self.rate = 0.0;
    }

    fn prepare2(
        &mut self,
        species: &[Species],
        p1: (usize, usize),
        p2: (usize, usize),
        is_unique: bool,
    ) {
        // the ion side on side 2 may be a duplicate; side 1 never is
        let (ion, counted) = if self.electron_first {
            (p2, is_unique)
        } else {
            (p1, true)
        };
        if counted {
            self.ion_weight_sum += species[ion.0].particles.weight(ion.1);
        }
    }

    fn prepare3(&mut self, timestep: f64, n_cluster_per_cell: f64) {
        let n_ion = self.ion_weight_sum * n_cluster_per_cell;
        self.rate = timestep * n_ion * self.sigma_rate;
    }

    fn apply(
        &mut self,
        species: &mut [Species],
        p1: (usize, usize),
        p2: (usize, usize),
        rng: &mut impl Rng,
    ) {
        let ((es, ei), (is_, ii)) = if self.electron_first {
            (p1, p2)
        } else {
            (p2, p1)
        };

        let charge_state = species[is_].particles.charge(ii);
        if charge_state >= self.atomic_number as f64 {
            return; // fully stripped
        }

        let pe = species[es].particles.momentum_vec(ei);
        let p2e = pe[0] * pe[0] + pe[1] * pe[1] + pe[2] * pe[2];
        let gamma = (1.0 + p2e).sqrt();
        let electron_mass = species[es].mass;
        let energy_ev = electron_mass * (gamma - 1.0) * ME_C2_EV;

        // hydrogenic estimate of the next binding potential
        let potential_ev = RYDBERG_EV * (charge_state + 1.0) * (charge_state + 1.0);
        if energy_ev <= potential_ev {
            return;
        }

        let sigma =
            LOTZ_PREFACTOR_SI * (energy_ev / potential_ev).ln() / (energy_ev * potential_ev);
        let v = p2e.sqrt() / gamma;
        let prob = 1.0 - (-self.rate * sigma * v).exp();
        if rng.gen::<f64>() >= prob {
            return;
        }

        let w_e = species[es].particles.weight(ei);
        let w_i = species[is_].particles.weight(ii);
        let u: f64 = rng.gen();

        // weight-fair acceptance, mirroring the scatter deflection rule
        if u * w_i < w_e {
            *species[is_].particles.charge_mut(ii) += 1.0;
            // the freed electron co-moves with its parent ion, which in
            // per-species momentum units means equal momentum components
            let mut position = [0.0; 3];
            for axis in 0..self.dim {
                position[axis] = species[is_].particles.position(axis, ii);
            }
            self.freed.push(FreedElectron {
                species: es,
                position,
                momentum: species[is_].particles.momentum_vec(ii),
                weight: w_i,
                charge: species[es].particles.charge(ei),
            });
        }
        if u * w_e < w_i {
            // the incident electron pays the binding energy
            let gamma_new = gamma - potential_ev / (electron_mass * ME_C2_EV);
            if gamma_new <= 1.0 {
                species[es].particles.set_momentum_vec(ei, [0.0; 3]);
            } else {
                let scale = ((gamma_new * gamma_new - 1.0) / p2e).sqrt();
                species[es]
                    .particles
                    .set_momentum_vec(ei, [pe[0] * scale, pe[1] * scale, pe[2] * scale]);
            }
        }
    }

    fn finish(&mut self, species: &mut [Species], ibin: usize) -> KineticResult<()> {
        if self.freed.is_empty() {
            return Ok(());
        }
        let freed = std::mem::take(&mut self.freed);
        let mut by_species: Vec<(usize, Particles)> = Vec::new();
        for e in freed {
            let idx = match by_species.iter().position(|(s, _)| *s == e.species) {
                Some(idx) => idx,
                None => {
                    by_species.push((e.species, Particles::new()));
                    by_species.len() - 1
                }
            };
            by_species[idx]
                .1
                .push(e.position, e.momentum, e.weight, e.charge);
        }
        for (s, batch) in by_species {
            species[s].insert_in_bin(ibin, &batch)?;
        }
        Ok(())
    }
}
