// ─────────────────────────────────────────────────────────────────────
// SCPN Kinetic — Collision Group
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! One collision relation between two species groups: validated
//! configuration, the per-timestep `collide` sweep over the spatial bins,
//! and the input-deck factory.

use crate::context::CollisionContext;
use crate::debug::{DebugAccumulator, DebugAttributes, DebugFile};
use crate::ionization::Ionization;
use crate::kernel::{scatter_pair, BinCoefficients, KernelCoefficients};
use crate::pairing::{accumulate_densities, BinPairing};
use kinetic_types::config::{CollisionsSpec, SimulationParams};
use kinetic_types::error::{KineticError, KineticResult};
use kinetic_types::species::Species;
use rand::Rng;

/// Immutable configuration of one collision relation.
#[derive(Debug)]
pub struct CollisionGroup {
    id: usize,
    species_group1: Vec<usize>,
    species_group2: Vec<usize>,
    /// Fixed Coulomb logarithm; non-positive selects automatic mode.
    coulomb_log: f64,
    intra: bool,
    debug_every: u64,
    atomic_number: u32,
    ionization: Ionization,
    recorder: Option<DebugFile>,
}

fn join_indices(group: &[usize]) -> String {
    group
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl CollisionGroup {
    /// Build one validated collision group over resolved species indices.
    /// `group1 == group2` selects intra collisions; otherwise the groups
    /// must be disjoint.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: usize,
        group1: Vec<usize>,
        group2: Vec<usize>,
        species: &[Species],
        coulomb_log: f64,
        debug_every: u64,
        ionizing: bool,
        params: &SimulationParams,
    ) -> KineticResult<Self> {
        if group1.is_empty() {
            return Err(KineticError::ConfigError("no valid `species1`".to_string()));
        }
        if group2.is_empty() {
            return Err(KineticError::ConfigError("no valid `species2`".to_string()));
        }
        for &idx in group1.iter().chain(group2.iter()) {
            if idx >= species.len() {
                return Err(KineticError::ConfigError(format!(
                    "species index {idx} out of range"
                )));
            }
        }

        let intra = group1 == group2;
        if !intra {
            for &i0 in &group1 {
                if group2.contains(&i0) {
                    return Err(KineticError::ConfigError(format!(
                        "species #{i0} cannot collide with itself"
                    )));
                }
            }
        }

        let mut atomic_number = 0u32;
        if ionizing {
            if intra {
                return Err(KineticError::ConfigError(
                    "cannot ionize with intra-collisions".to_string(),
                ));
            }
            for (g, group) in [(1usize, &group1), (2usize, &group2)] {
                let first = &species[group[0]];
                for &idx in &group[1..] {
                    let s = &species[idx];
                    if s.mass != first.mass {
                        return Err(KineticError::ConfigError(format!(
                            "species in group `species{g}` must all have the same mass for ionization"
                        )));
                    }
                    if s.atomic_number != first.atomic_number {
                        return Err(KineticError::ConfigError(if s.atomic_number == 0
                            || first.atomic_number == 0
                        {
                            format!(
                                "species in group `species{g}` cannot mix electrons and ions for ionization"
                            )
                        } else {
                            format!(
                                "species in group `species{g}` must all have the same atomic number for ionization"
                            )
                        }));
                    }
                }
            }
            let z0 = species[group1[0]].atomic_number;
            let z1 = species[group2[0]].atomic_number;
            if z0 != 0 && z1 != 0 {
                return Err(KineticError::ConfigError(
                    "ionization requires electrons (zero atomic_number)".to_string(),
                ));
            }
            atomic_number = z0.max(z1);
            if atomic_number == 0 {
                return Err(KineticError::ConfigError(
                    "ionization requires ions (atomic_number > 0)".to_string(),
                ));
            }
        }

        let ionization = Ionization::new(ionizing, atomic_number, params);
        let recorder = if debug_every > 0 {
            let attrs = DebugAttributes {
                species1: join_indices(&group1),
                species2: join_indices(&group2),
                coulomb_log,
                debug_every,
            };
            Some(DebugFile::new(
                &params.output_dir,
                id,
                &attrs,
                &params.patch,
            )?)
        } else {
            None
        };

        Ok(CollisionGroup {
            id,
            species_group1: group1,
            species_group2: group2,
            coulomb_log,
            intra,
            debug_every,
            atomic_number,
            ionization,
            recorder,
        })
    }

    /// Parse and validate all `Collisions` records of the input deck.
    pub fn create_all(
        specs: &[CollisionsSpec],
        species: &[Species],
        params: &SimulationParams,
    ) -> KineticResult<Vec<CollisionGroup>> {
        if !specs.is_empty() && params.reference_angular_frequency_si <= 0.0 {
            return Err(KineticError::ConfigError(
                "`referenceAngularFrequency_SI` must be defined and positive to compute collisions"
                    .to_string(),
            ));
        }

        let resolve = |names: &[String], field: &str, n: usize| -> KineticResult<Vec<usize>> {
            let mut indices = Vec::with_capacity(names.len());
            for name in names {
                match species.iter().position(|s| &s.name == name) {
                    Some(idx) => indices.push(idx),
                    None => {
                        return Err(KineticError::ConfigError(format!(
                            "collisions #{n}: unknown species `{name}` in `{field}`"
                        )))
                    }
                }
            }
            Ok(indices)
        };

        let mut groups = Vec::with_capacity(specs.len());
        for (n, spec) in specs.iter().enumerate() {
            let group1 = resolve(&spec.species1, "species1", n)?;
            let group2 = resolve(&spec.species2, "species2", n)?;
            let group = CollisionGroup::new(
                n,
                group1,
                group2,
                species,
                spec.coulomb_log_or_auto(),
                spec.debug_cadence(),
                spec.is_ionizing(),
                params,
            )
            .map_err(|err| match err {
                KineticError::ConfigError(msg) => {
                    KineticError::ConfigError(format!("collisions #{n}: {msg}"))
                }
                other => other,
            })?;

            if group.intra {
                log::info!(
                    "collisions #{n}: intra collisions within species ({})",
                    join_indices(&group.species_group1)
                );
            } else {
                log::info!(
                    "collisions #{n}: between species ({}) and ({})",
                    join_indices(&group.species_group1),
                    join_indices(&group.species_group2)
                );
            }
            log::info!("collisions #{n}: Coulomb logarithm {}", group.coulomb_log);
            if group.debug_every > 0 {
                log::info!(
                    "collisions #{n}: debug every {} timesteps",
                    group.debug_every
                );
            }
            if group.atomic_number > 0 {
                log::info!(
                    "collisions #{n}: collisional ionization with atomic number {}",
                    group.atomic_number
                );
            }
            groups.push(group);
        }
        Ok(groups)
    }

    /// Patch clone: shared configuration, fresh ionization state, fresh
    /// debug file handle.
    pub fn with_fresh_handles(&self, params: &SimulationParams) -> KineticResult<Self> {
        let ionizing = matches!(self.ionization, Ionization::Impact(_));
        let recorder = if self.debug_every > 0 {
            let attrs = DebugAttributes {
                species1: join_indices(&self.species_group1),
                species2: join_indices(&self.species_group2),
                coulomb_log: self.coulomb_log,
                debug_every: self.debug_every,
            };
            Some(DebugFile::new(
                &params.output_dir,
                self.id,
                &attrs,
                &params.patch,
            )?)
        } else {
            None
        };
        Ok(CollisionGroup {
            id: self.id,
            species_group1: self.species_group1.clone(),
            species_group2: self.species_group2.clone(),
            coulomb_log: self.coulomb_log,
            intra: self.intra,
            debug_every: self.debug_every,
            atomic_number: self.atomic_number,
            ionization: Ionization::new(ionizing, self.atomic_number, params),
            recorder,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn is_intra(&self) -> bool {
        self.intra
    }

    /// True when this group runs with the automatic Coulomb logarithm and
    /// therefore needs the per-bin Debye length.
    pub fn requires_debye_length(&self) -> bool {
        self.coulomb_log <= 0.0
    }

    fn is_debug_step(&self, itime: u64) -> bool {
        self.debug_every > 0 && itime % self.debug_every == 0
    }

    /// Create the debug timestep group; invoked by the driver before
    /// `collide` on debug steps.
    pub fn create_timestep(&self, itime: u64) -> KineticResult<()> {
        if self.is_debug_step(itime) {
            if let Some(recorder) = &self.recorder {
                recorder.create_timestep(itime)?;
            }
        }
        Ok(())
    }

    fn check_binning(&self, species: &[Species]) -> KineticResult<usize> {
        let nbins = species[self.species_group1[0]].nbins();
        for &idx in self.species_group1.iter().chain(self.species_group2.iter()) {
            if species[idx].nbins() != nbins {
                return Err(KineticError::PhysicsViolation(format!(
                    "species `{}` has {} bins, expected {}",
                    species[idx].name,
                    species[idx].nbins(),
                    nbins
                )));
            }
        }
        Ok(nbins)
    }

    /// Run the collisions of this group for one timestep.
    ///
    /// Particles are mutated in place; groups sharing a species must be
    /// run sequentially. The RNG stream drives the bin shuffles and the
    /// per-pair draws, so a fixed seed reproduces the step.
    pub fn collide(
        &mut self,
        species: &mut [Species],
        ctx: &CollisionContext,
        params: &SimulationParams,
        itime: u64,
        rng: &mut impl Rng,
    ) -> KineticResult<()> {
        let nbins = self.check_binning(species)?;
        let debug = self.is_debug_step(itime);
        let n_cluster_per_cell = 1.0 / params.cells_per_bin;
        let kc = KernelCoefficients::new(params);
        let mut acc = DebugAccumulator::default();

        for ibin in 0..nbins {
            let pairing = match BinPairing::build(
                species,
                &self.species_group1,
                &self.species_group2,
                self.intra,
                ibin,
                rng,
            ) {
                Some(pairing) => pairing,
                None => continue,
            };

            self.ionization
                .prepare1(species[pairing.sg1[0]].atomic_number);
            let densities = accumulate_densities(
                species,
                &pairing,
                self.intra,
                n_cluster_per_cell,
                &mut self.ionization,
            );
            let bc = BinCoefficients::new(&kc, params.timestep, &densities);
            self.ionization
                .prepare3(params.timestep, n_cluster_per_cell);

            for i in 0..pairing.npairs {
                let (pa, pb) = pairing.pair(i);
                let stats = scatter_pair(
                    &kc,
                    &bc,
                    self.coulomb_log,
                    ctx.bin_debye_length_squared(ibin),
                    species,
                    pa,
                    pb,
                    rng,
                );
                self.ionization.apply(species, pa, pb, rng);
                if debug {
                    if let Some(stats) = stats {
                        acc.add(stats);
                    }
                }
            }

            self.ionization.finish(species, ibin)?;
        }

        if debug {
            if let Some(recorder) = &self.recorder {
                let (s_mean, log_l_mean) = if acc.has_pairs() {
                    (acc.mean_s(), acc.mean_log_l())
                } else {
                    (0.0, 0.0)
                };
                recorder.write_step(
                    itime,
                    s_mean,
                    log_l_mean,
                    ctx.mean_debye_length_si(params),
                )?;
            }
        }
        Ok(())
    }
}

/// Driver helper: refresh the Debye table, then run every group in listed
/// order (groups sharing a species must not be reordered).
pub fn run_collisions(
    groups: &mut [CollisionGroup],
    species: &mut [Species],
    ctx: &mut CollisionContext,
    params: &SimulationParams,
    itime: u64,
    rng: &mut impl Rng,
) -> KineticResult<()> {
    ctx.prepare_step(species, params)?;
    for group in groups.iter_mut() {
        group.create_timestep(itime)?;
        group.collide(species, ctx, params, itime, rng)?;
    }
    Ok(())
}
