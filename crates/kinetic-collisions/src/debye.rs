// ─────────────────────────────────────────────────────────────────────
// SCPN Kinetic — Debye Length
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Per-bin plasma Debye length, shared by all collision groups that run
//! with an automatic Coulomb logarithm.
//!
//! The inverse Debye length squared is sum over species of
//! density * <q>^2 / T, with the temperature taken as <v.p>/3
//! (p^2/gamma is used in place of v.p).

use kinetic_types::config::SimulationParams;
use kinetic_types::constants::{C_SI, R_E_SI};
use kinetic_types::error::{KineticError, KineticResult};
use kinetic_types::species::Species;
use ndarray::Array1;

/// Compute `debye_length_squared[bin]` in code length units over all
/// species. Bins whose accumulated inverse sum is non-positive (empty or
/// fully cold bins) are left at zero; the collision kernel falls back to
/// the clamped Coulomb logarithm there.
pub fn debye_length_squared_per_bin(
    species: &[Species],
    params: &SimulationParams,
) -> KineticResult<Array1<f64>> {
    if species.is_empty() {
        return Err(KineticError::PhysicsViolation(
            "debye length requires at least one species".to_string(),
        ));
    }
    let nbins = species[0].nbins();
    for s in species {
        if s.nbins() != nbins {
            return Err(KineticError::PhysicsViolation(format!(
                "species `{}` has {} bins, expected {}",
                s.name,
                s.nbins(),
                nbins
            )));
        }
    }

    // minimum interatomic distance prefactor, c / (3 omega re)
    let coeff = C_SI / (3.0 * params.reference_angular_frequency_si * R_E_SI);

    let mut debye2 = Array1::zeros(nbins);
    for ibin in 0..nbins {
        let mut inv_debye2 = 0.0;
        let mut density_max = 0.0;
        for s in species {
            let (bmin, bmax) = s.bin_range(ibin);
            let p = &s.particles;
            let mut density = 0.0;
            let mut charge = 0.0;
            let mut temperature = 0.0;
            for ipart in bmin..bmax {
                let pv = p.momentum_vec(ipart);
                let p2 = pv[0] * pv[0] + pv[1] * pv[1] + pv[2] * pv[2];
                density += p.weight(ipart);
                charge += p.weight(ipart) * p.charge(ipart);
                temperature += p.weight(ipart) * p2 / (1.0 + p2).sqrt();
            }
            if density <= 0.0 {
                continue;
            }
            charge /= density; // average charge
            temperature *= s.mass / (3.0 * density); // T in units of me c^2
            density /= params.cells_per_bin; // in units of critical density
            if temperature > 0.0 {
                inv_debye2 += density * charge * charge / temperature;
            }
            if density > density_max {
                density_max = density;
            }
        }

        if inv_debye2 > 0.0 {
            let mut d2 = 1.0 / inv_debye2;
            // lower limit: minimum interatomic distance
            let rmin2 = (coeff * density_max).powf(-2.0 / 3.0);
            if d2 < rmin2 {
                d2 = rmin2;
            }
            debye2[ibin] = d2;
        }
    }

    let mean_si = debye2.iter().map(|d2| d2.sqrt()).sum::<f64>() / (nbins as f64)
        * C_SI
        / params.reference_angular_frequency_si;
    log::debug!("mean Debye length = {:.3e} m", mean_si);

    Ok(debye2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinetic_types::config::PatchLayout;
    use std::path::PathBuf;

    fn params() -> SimulationParams {
        SimulationParams {
            timestep: 0.05,
            reference_angular_frequency_si: 1.88e15,
            cells_per_bin: 1.0,
            dim: 3,
            patch: PatchLayout::default(),
            output_dir: PathBuf::from("."),
        }
    }

    fn electrons(momenta: &[[f64; 3]]) -> Species {
        let mut s = Species::new("electron", 1.0, 0);
        for &p in momenta {
            s.particles.push([0.0; 3], p, 1.0, -1.0);
        }
        s.rebin_single();
        s
    }

    #[test]
    fn test_single_species_matches_hand_formula() {
        let s = electrons(&[[0.1, 0.0, 0.0], [0.1, 0.0, 0.0]]);
        let d2 = debye_length_squared_per_bin(&[s], &params()).unwrap();

        let p2 = 0.01;
        let temperature = 2.0 * p2 / (1.0f64 + p2).sqrt() / (3.0 * 2.0);
        let expected = temperature / 2.0; // 1 / (n <q>^2 / T), n = 2
        assert!(
            (d2[0] - expected).abs() < 1e-12 * expected,
            "d2 = {}, expected {}",
            d2[0],
            expected
        );
    }

    #[test]
    fn test_empty_bin_stays_zero() {
        let mut s = Species::new("electron", 1.0, 0);
        s.rebin_single();
        let d2 = debye_length_squared_per_bin(&[s], &params()).unwrap();
        assert_eq!(d2[0], 0.0);
    }

    #[test]
    fn test_cold_bin_stays_zero() {
        // particles at rest carry no temperature, the inverse sum is empty
        let s = electrons(&[[0.0; 3], [0.0; 3]]);
        let d2 = debye_length_squared_per_bin(&[s], &params()).unwrap();
        assert_eq!(d2[0], 0.0);
    }

    #[test]
    fn test_low_temperature_floored_to_interatomic_distance() {
        let s = electrons(&[[1e-7, 0.0, 0.0], [1e-7, 0.0, 0.0]]);
        let p = params();
        let d2 = debye_length_squared_per_bin(&[s], &p).unwrap();

        let coeff = C_SI / (3.0 * p.reference_angular_frequency_si * R_E_SI);
        let rmin2 = (coeff * 2.0).powf(-2.0 / 3.0);
        assert!(
            (d2[0] - rmin2).abs() < 1e-12 * rmin2,
            "expected floor {}, got {}",
            rmin2,
            d2[0]
        );
    }

    #[test]
    fn test_two_species_add_inverse_contributions() {
        let e = electrons(&[[0.2, 0.0, 0.0], [0.2, 0.0, 0.0]]);
        let mut ions = Species::new("proton", 1836.0, 1);
        ions.particles.push([0.0; 3], [0.01, 0.0, 0.0], 1.0, 1.0);
        ions.particles.push([0.0; 3], [0.01, 0.0, 0.0], 1.0, 1.0);
        ions.rebin_single();

        let p = params();
        let both = debye_length_squared_per_bin(
            &[e.clone(), ions.clone()],
            &p,
        )
        .unwrap();
        let only_e = debye_length_squared_per_bin(&[e], &p).unwrap();
        let only_i = debye_length_squared_per_bin(&[ions], &p).unwrap();

        let inv_sum = 1.0 / only_e[0] + 1.0 / only_i[0];
        assert!(
            (both[0] - 1.0 / inv_sum).abs() < 1e-10 / inv_sum,
            "inverse contributions must add"
        );
    }

    #[test]
    fn test_mismatched_bin_counts_rejected() {
        let mut a = Species::new("a", 1.0, 0);
        a.rebin_single();
        let mut b = Species::new("b", 1.0, 0);
        b.bmin = vec![0, 0];
        b.bmax = vec![0, 0];
        let err = debye_length_squared_per_bin(&[a, b], &params()).unwrap_err();
        match err {
            KineticError::PhysicsViolation(msg) => assert!(msg.contains("bins")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
