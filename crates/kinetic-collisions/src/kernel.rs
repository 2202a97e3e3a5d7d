// ─────────────────────────────────────────────────────────────────────
// SCPN Kinetic — Collision Kernel
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Per-pair relativistic Coulomb scatter: center-of-momentum transform,
//! collision strength, Nanbu deflection sampling, weight-asymmetric
//! acceptance and back-transform.
//!
//! Momenta are in units of m*c of the owning species throughout, which is
//! why the back-transform of particle 2 carries the mass ratio m1/m2.

use crate::pairing::BinDensities;
use kinetic_types::config::SimulationParams;
use kinetic_types::constants::{C_SI, H_OVER_2MEC2, R_E_SI};
use kinetic_types::species::Species;
use rand::Rng;
use std::f64::consts::PI;

/// Relative p_perp below which the deflection rotation switches to the
/// axis-aligned limit.
const P_PERP_FLOOR: f64 = 1e-10;

/// Minimum Coulomb logarithm in automatic mode.
const MIN_COULOMB_LOG: f64 = 2.0;

/// Per-run constants derived from the reference angular frequency.
#[derive(Debug, Clone, Copy)]
pub(crate) struct KernelCoefficients {
    /// h omega0 / (2 me c^2): quantum minimum impact parameter prefactor.
    pub coeff1: f64,
    /// re omega0 / c: classical minimum impact parameter prefactor.
    pub coeff2: f64,
}

impl KernelCoefficients {
    pub fn new(params: &SimulationParams) -> Self {
        let omega = params.reference_angular_frequency_si;
        KernelCoefficients {
            coeff1: H_OVER_2MEC2 * omega,
            coeff2: R_E_SI * omega / C_SI,
        }
    }
}

/// Per-bin precomputed factors of the collision strength and its
/// low-temperature cap.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BinCoefficients {
    pub coeff3: f64,
    pub coeff4: f64,
    pub n1_23: f64,
    pub n2_23: f64,
}

impl BinCoefficients {
    pub fn new(kc: &KernelCoefficients, timestep: f64, d: &BinDensities) -> Self {
        let pair_rate = timestep * d.n1 * d.n2 / d.n12;
        BinCoefficients {
            coeff3: pair_rate * kc.coeff2,
            coeff4: (3.0 * kc.coeff2).powf(-1.0 / 3.0) * pair_rate,
            n1_23: d.n1.powf(2.0 / 3.0),
            n2_23: d.n2.powf(2.0 / 3.0),
        }
    }
}

/// Mean collision strength and Coulomb log of one pair, for the debug
/// recorder.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PairStats {
    pub s: f64,
    pub log_l: f64,
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Lorentz transform of a particle pair into their center-of-momentum
/// frame. Quantities named `com_*` describe the COM itself in the lab
/// frame; `*_com` quantities are particle properties in the COM frame.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ComTransform {
    pub m12: f64,
    pub gamma1: f64,
    pub gamma2: f64,
    pub gamma12_inv: f64,
    pub com_v: [f64; 3],
    pub com_gamma: f64,
    term1: f64,
    pub p_com: [f64; 3],
    pub p2_com: f64,
    pub p_com_abs: f64,
    pub gamma1_com: f64,
    pub gamma2_com: f64,
}

impl ComTransform {
    pub fn new(p1: [f64; 3], p2: [f64; 3], m12: f64) -> Self {
        let gamma1 = (1.0 + dot(p1, p1)).sqrt();
        let gamma2 = (1.0 + dot(p2, p2)).sqrt();
        let gamma12_inv = 1.0 / (m12 * gamma1 + gamma2);

        let com_v = [
            (m12 * p1[0] + p2[0]) * gamma12_inv,
            (m12 * p1[1] + p2[1]) * gamma12_inv,
            (m12 * p1[2] + p2[2]) * gamma12_inv,
        ];
        let vsquare = dot(com_v, com_v);
        let com_gamma = (1.0 - vsquare).powf(-0.5);
        // (gamma - 1)/v^2 tends to 1/2 as v -> 0
        let term1 = if vsquare > 0.0 {
            (com_gamma - 1.0) / vsquare
        } else {
            0.5
        };

        let vcv1 = dot(com_v, p1) / gamma1;
        let vcv2 = dot(com_v, p2) / gamma2;
        let term2 = (term1 * vcv1 - com_gamma) * gamma1;
        let p_com = [
            p1[0] + term2 * com_v[0],
            p1[1] + term2 * com_v[1],
            p1[2] + term2 * com_v[2],
        ];
        let p2_com = dot(p_com, p_com);

        ComTransform {
            m12,
            gamma1,
            gamma2,
            gamma12_inv,
            com_v,
            com_gamma,
            term1,
            p_com,
            p2_com,
            p_com_abs: p2_com.sqrt(),
            gamma1_com: (1.0 - vcv1) * com_gamma * gamma1,
            gamma2_com: (1.0 - vcv2) * com_gamma * gamma2,
        }
    }

    /// Lab-frame momentum of particle 1 for COM momentum `newp`.
    pub fn boost_back_p1(&self, newp: [f64; 3]) -> [f64; 3] {
        let vcp = dot(self.com_v, newp);
        let term6 = self.term1 * vcp + self.gamma1_com * self.com_gamma;
        [
            newp[0] + self.com_v[0] * term6,
            newp[1] + self.com_v[1] * term6,
            newp[2] + self.com_v[2] * term6,
        ]
    }

    /// Lab-frame momentum of particle 2, whose COM momentum is the
    /// mass-ratio-scaled opposite of particle 1's.
    pub fn boost_back_p2(&self, newp: [f64; 3]) -> [f64; 3] {
        let vcp = dot(self.com_v, newp);
        let term6 = -self.m12 * self.term1 * vcp + self.gamma2_com * self.com_gamma;
        [
            -self.m12 * newp[0] + self.com_v[0] * term6,
            -self.m12 * newp[1] + self.com_v[1] * term6,
            -self.m12 * newp[2] + self.com_v[2] * term6,
        ]
    }
}

/// Rotate the COM momentum by the deflection angles (chi, phi).
pub(crate) fn rotate_deflection(
    p: [f64; 3],
    p_abs: f64,
    cos_x: f64,
    sin_x: f64,
    phi: f64,
) -> [f64; 3] {
    let sin_x_cos_phi = sin_x * phi.cos();
    let sin_x_sin_phi = sin_x * phi.sin();
    let p_perp = (p[0] * p[0] + p[1] * p[1]).sqrt();
    if p_perp > P_PERP_FLOOR * p_abs {
        let inv_p_perp = 1.0 / p_perp;
        [
            (p[0] * p[2] * sin_x_cos_phi - p[1] * p_abs * sin_x_sin_phi) * inv_p_perp
                + p[0] * cos_x,
            (p[1] * p[2] * sin_x_cos_phi + p[0] * p_abs * sin_x_sin_phi) * inv_p_perp
                + p[1] * cos_x,
            -p_perp * sin_x_cos_phi + p[2] * cos_x,
        ]
    } else {
        // limit px -> 0, py = 0
        [
            p_abs * sin_x_cos_phi,
            p_abs * sin_x_sin_phi,
            p_abs * cos_x,
        ]
    }
}

/// Nanbu's deflection-cosine sampler, Phys. Rev. E 55, 4642 (1997), with
/// the polynomial fit of Perez et al. for the intermediate regime.
pub fn cos_chi_from(s: f64, u: f64) -> f64 {
    if s < 0.1 {
        // the floor on U keeps cos(chi) positive in the small-angle regime
        return 1.0 + s * u.max(1e-4).ln();
    }
    if s < 3.0 {
        let inv_a = 0.00569578
            + (0.95602 + (-0.508139 + (0.479139 + (-0.12789 + 0.0238957 * s) * s) * s) * s) * s;
        let a = 1.0 / inv_a;
        return inv_a * ((-a).exp() + 2.0 * u * a.sinh()).ln();
    }
    if s < 6.0 {
        let a = 3.0 * (-s).exp();
        return (1.0 / a) * ((-a).exp() + 2.0 * u * a.sinh()).ln();
    }
    2.0 * u - 1.0
}

/// Draw cos(chi) for collision strength `s`.
pub fn cos_chi(s: f64, rng: &mut impl Rng) -> f64 {
    cos_chi_from(s, rng.gen::<f64>())
}

/// Automatic Coulomb logarithm from the screening length and the minimum
/// impact parameter, clamped from below.
pub(crate) fn auto_coulomb_log(debye2: f64, b_min: f64) -> f64 {
    let log_l = 0.5 * (1.0 + debye2 / (b_min * b_min)).ln();
    log_l.max(MIN_COULOMB_LOG)
}

/// Unequal-weight acceptance rule: the deflection applies to the particle
/// of weight `w_self` with probability min(1, w_other / w_self).
pub(crate) fn deflection_applies(u: f64, w_self: f64, w_other: f64) -> bool {
    u < w_other / w_self
}

/// Scatter one macro-particle pair in place.
///
/// Returns the pair statistics for the debug recorder, or `None` for a
/// degenerate pair with no relative momentum (nothing to scatter; the
/// original operator would divide by p_com^2 here).
#[allow(clippy::too_many_arguments)]
pub(crate) fn scatter_pair(
    kc: &KernelCoefficients,
    bc: &BinCoefficients,
    fixed_coulomb_log: f64,
    debye2: Option<f64>,
    species: &mut [Species],
    (is1, i1): (usize, usize),
    (is2, i2): (usize, usize),
    rng: &mut impl Rng,
) -> Option<PairStats> {
    let m1 = species[is1].mass;
    let m2 = species[is2].mass;
    let m12 = m1 / m2;

    let p1 = species[is1].particles.momentum_vec(i1);
    let p2 = species[is2].particles.momentum_vec(i2);
    let w1 = species[is1].particles.weight(i1);
    let w2 = species[is2].particles.weight(i2);
    let qqm = species[is1].particles.charge(i1) * species[is2].particles.charge(i2) / m1;
    let qqm2 = qqm * qqm;

    let com = ComTransform::new(p1, p2, m12);
    if com.p2_com <= 0.0 {
        return None;
    }

    let term3 = com.com_gamma * com.gamma12_inv;
    let term4 = com.gamma1_com * com.gamma2_com;
    let term5 = term4 / com.p2_com + m12;

    let log_l = if fixed_coulomb_log > 0.0 {
        fixed_coulomb_log
    } else {
        let b_min = (kc.coeff1 / (m1 * com.p_com_abs))
            .max((kc.coeff2 * qqm * term3 * term5).abs());
        auto_coulomb_log(debye2.unwrap_or(0.0), b_min)
    };

    // collision strength s, similar to the number of real collisions
    let mut s = bc.coeff3 * log_l * qqm2 * term3 * com.p_com_abs * term5 * term5
        / (com.gamma1 * com.gamma2);

    // low-temperature correction
    let v_rel = com.p_com_abs / (term3 * term4);
    let s_max = bc.coeff4 * (m12 + 1.0) * v_rel / (m12 * bc.n1_23).max(bc.n2_23);
    if s > s_max {
        s = s_max;
    }

    let cos_x = cos_chi(s, rng);
    let sin_x = (1.0 - cos_x * cos_x).max(0.0).sqrt();
    let phi = 2.0 * PI * rng.gen::<f64>();
    let new_p_com = rotate_deflection(com.p_com, com.p_com_abs, cos_x, sin_x, phi);

    // One U decides both sides, conserving energy and momentum in
    // expectation when the weights differ.
    let u: f64 = rng.gen();
    if deflection_applies(u, w1, w2) {
        let p = com.boost_back_p1(new_p_com);
        species[is1].particles.set_momentum_vec(i1, p);
    }
    if deflection_applies(u, w2, w1) {
        let p = com.boost_back_p2(new_p_com);
        species[is2].particles.set_momentum_vec(i2, p);
    }

    Some(PairStats { s, log_l })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinetic_types::config::{PatchLayout, SimulationParams};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::path::PathBuf;

    fn params() -> SimulationParams {
        SimulationParams {
            timestep: 0.1,
            reference_angular_frequency_si: 1.88e15,
            cells_per_bin: 1.0,
            dim: 3,
            patch: PatchLayout::default(),
            output_dir: PathBuf::from("."),
        }
    }

    fn one_particle_species(name: &str, mass: f64, z: u32, p: [f64; 3], w: f64, q: f64) -> Species {
        let mut s = Species::new(name, mass, z);
        s.particles.push([0.0; 3], p, w, q);
        s.rebin_single();
        s
    }

    // ── Nanbu sampler ────────────────────────────────────────────────

    #[test]
    fn test_cos_chi_small_s_branch() {
        // s = 0.05, U = 0.5: cos(chi) = 1 + s ln U
        let c = cos_chi_from(0.05, 0.5);
        assert!((c - (1.0 + 0.05 * 0.5f64.ln())).abs() < 1e-15);
        assert!((c - 0.965343).abs() < 1e-6);
    }

    #[test]
    fn test_cos_chi_small_s_u_floor() {
        // U below 1e-4 is floored, keeping cos(chi) positive for s < 0.1
        let c = cos_chi_from(0.05, 1e-9);
        assert!((c - (1.0 + 0.05 * 1e-4f64.ln())).abs() < 1e-15);
        assert!(c > 0.0);
    }

    #[test]
    fn test_cos_chi_polynomial_branch() {
        // s = 2, U = 0.5: 1/A = 2.43671, cos(chi) = 0.19970
        let c = cos_chi_from(2.0, 0.5);
        assert!((c - 0.19970).abs() < 1e-3, "cos_chi = {c}");
    }

    #[test]
    fn test_cos_chi_isotropic_branch() {
        assert!((cos_chi_from(10.0, 0.25) - (-0.5)).abs() < 1e-15);
        assert!((cos_chi_from(6.0, 1.0) - 1.0).abs() < 1e-15);
    }

    #[test]
    fn test_cos_chi_continuous_across_branch_boundaries() {
        for (lo, hi) in [(0.0999, 0.1001), (2.999, 3.001), (5.999, 6.001)] {
            for u in [0.1, 0.5, 0.9] {
                let a = cos_chi_from(lo, u);
                let b = cos_chi_from(hi, u);
                assert!(
                    (a - b).abs() < 2e-2,
                    "discontinuity at s = {lo}..{hi}, u = {u}: {a} vs {b}"
                );
            }
        }
    }

    // ── Coulomb logarithm ────────────────────────────────────────────

    #[test]
    fn test_auto_coulomb_log_clamped() {
        // debye^2 = 4 bmin^2: 0.5 ln 5 = 0.8047, clamped to 2
        let b_min = 1e-8;
        assert!((auto_coulomb_log(4.0 * b_min * b_min, b_min) - 2.0).abs() < 1e-15);
    }

    #[test]
    fn test_auto_coulomb_log_unclamped() {
        let b_min = 1e-8;
        let expected = 0.5 * (1.0f64 + 1e6).ln();
        assert!((auto_coulomb_log(1e6 * b_min * b_min, b_min) - expected).abs() < 1e-12);
    }

    // ── Acceptance rule ──────────────────────────────────────────────

    #[test]
    fn test_acceptance_rule_weights_one_and_three() {
        // W1 = 1, W2 = 3, U = 0.5: particle 1 deflected, particle 2 not
        assert!(deflection_applies(0.5, 1.0, 3.0));
        assert!(!deflection_applies(0.5, 3.0, 1.0));
        // equal weights: exactly one branch can never be missed
        assert!(deflection_applies(0.999999, 2.0, 2.0));
    }

    // ── COM transform round trips ────────────────────────────────────

    #[test]
    fn test_boost_round_trip_recovers_lab_momenta() {
        let p1 = [0.3, -0.2, 0.7];
        let p2 = [-0.1, 0.05, -0.4];
        let m12 = 1.0 / 1836.0;
        let com = ComTransform::new(p1, p2, m12);

        let back1 = com.boost_back_p1(com.p_com);
        let back2 = com.boost_back_p2(com.p_com);
        for axis in 0..3 {
            assert!(
                (back1[axis] - p1[axis]).abs() < 1e-10,
                "p1 axis {axis}: {} vs {}",
                back1[axis],
                p1[axis]
            );
            assert!(
                (back2[axis] - p2[axis]).abs() < 1e-10,
                "p2 axis {axis}: {} vs {}",
                back2[axis],
                p2[axis]
            );
        }
    }

    #[test]
    fn test_com_momenta_balance() {
        // in the COM frame the two real momenta m1 p1 and m2 p2 cancel;
        // in per-species units particle 2 carries -m12 * p_com
        let p1 = [0.5, 0.1, -0.3];
        let p2 = [-0.2, 0.4, 0.6];
        let m12 = 0.25;
        let com = ComTransform::new(p1, p2, m12);

        let vcv2 = dot(com.com_v, p2) / com.gamma2;
        let term2 = (com.term1 * vcv2 - com.com_gamma) * com.gamma2;
        let p2_com = [
            p2[0] + term2 * com.com_v[0],
            p2[1] + term2 * com.com_v[1],
            p2[2] + term2 * com.com_v[2],
        ];
        for axis in 0..3 {
            assert!(
                (p2_com[axis] + m12 * com.p_com[axis]).abs() < 1e-12,
                "COM momenta do not balance on axis {axis}"
            );
        }
    }

    // ── Deflection rotation ──────────────────────────────────────────

    #[test]
    fn test_zero_angle_rotation_is_identity() {
        let p = [0.3, 0.2, 0.9];
        let p_abs = dot(p, p).sqrt();
        let rotated = rotate_deflection(p, p_abs, 1.0, 0.0, 1.234);
        assert_eq!(rotated, p);
    }

    #[test]
    fn test_rotation_preserves_momentum_magnitude() {
        let p = [0.3, -0.6, 0.05];
        let p_abs = dot(p, p).sqrt();
        for (cos_x, phi) in [(0.9f64, 0.3f64), (-0.4, 2.0), (0.0, 5.5)] {
            let sin_x = (1.0 - cos_x * cos_x).sqrt();
            let r = rotate_deflection(p, p_abs, cos_x, sin_x, phi);
            let r_abs = dot(r, r).sqrt();
            assert!(
                (r_abs - p_abs).abs() < 1e-12,
                "|p| changed: {r_abs} vs {p_abs}"
            );
            let cos_actual = dot(r, p) / (p_abs * p_abs);
            assert!(
                (cos_actual - cos_x).abs() < 1e-12,
                "deflection angle wrong: {cos_actual} vs {cos_x}"
            );
        }
    }

    #[test]
    fn test_axis_aligned_momentum_takes_fallback_path() {
        // p_perp = 0 exactly: the standard rotation would divide by zero
        let p = [0.0, 0.0, 1.5];
        let r = rotate_deflection(p, 1.5, 0.8, 0.6, 0.0);
        assert!((r[0] - 1.5 * 0.6).abs() < 1e-15);
        assert!(r[1].abs() < 1e-15);
        assert!((r[2] - 1.5 * 0.8).abs() < 1e-15);
    }

    // ── Full pair scatter ────────────────────────────────────────────

    #[test]
    fn test_equal_weight_pair_conserves_momentum_and_energy() {
        let p = params();
        let kc = KernelCoefficients::new(&p);
        let d = BinDensities {
            n1: 0.1,
            n2: 0.1,
            n12: 0.1,
        };
        let bc = BinCoefficients::new(&kc, p.timestep, &d);

        let mut rng = StdRng::seed_from_u64(42);
        let mut species = vec![
            one_particle_species("electron", 1.0, 0, [0.4, -0.1, 0.2], 1.0, -1.0),
            one_particle_species("proton", 1836.0, 1, [0.001, 0.002, -0.001], 1.0, 1.0),
        ];

        for _ in 0..200 {
            let p1 = species[0].particles.momentum_vec(0);
            let p2 = species[1].particles.momentum_vec(0);
            let ptot_before: Vec<f64> = (0..3)
                .map(|a| 1.0 * p1[a] + 1836.0 * p2[a])
                .collect();
            let etot_before = 1.0 * (1.0 + dot(p1, p1)).sqrt()
                + 1836.0 * (1.0 + dot(p2, p2)).sqrt();

            scatter_pair(&kc, &bc, 5.0, None, &mut species, (0, 0), (1, 0), &mut rng)
                .expect("non-degenerate pair");

            let q1 = species[0].particles.momentum_vec(0);
            let q2 = species[1].particles.momentum_vec(0);
            for a in 0..3 {
                let ptot = 1.0 * q1[a] + 1836.0 * q2[a];
                assert!(
                    (ptot - ptot_before[a]).abs() < 1e-9,
                    "momentum axis {a} drifted: {ptot} vs {}",
                    ptot_before[a]
                );
            }
            let etot = 1.0 * (1.0 + dot(q1, q1)).sqrt() + 1836.0 * (1.0 + dot(q2, q2)).sqrt();
            assert!(
                (etot - etot_before).abs() < 1e-9,
                "energy drifted: {etot} vs {etot_before}"
            );
        }
    }

    #[test]
    fn test_degenerate_pair_is_skipped() {
        let p = params();
        let kc = KernelCoefficients::new(&p);
        let d = BinDensities {
            n1: 0.1,
            n2: 0.1,
            n12: 0.1,
        };
        let bc = BinCoefficients::new(&kc, p.timestep, &d);

        let mut rng = StdRng::seed_from_u64(1);
        let mut species = vec![
            one_particle_species("a", 1.0, 0, [0.0; 3], 1.0, -1.0),
            one_particle_species("b", 1.0, 0, [0.0; 3], 1.0, -1.0),
        ];
        let stats = scatter_pair(&kc, &bc, 5.0, None, &mut species, (0, 0), (1, 0), &mut rng);
        assert!(stats.is_none());
        assert_eq!(species[0].particles.momentum_vec(0), [0.0; 3]);
        assert_eq!(species[1].particles.momentum_vec(0), [0.0; 3]);
    }

    #[test]
    fn test_stats_report_fixed_coulomb_log() {
        let p = params();
        let kc = KernelCoefficients::new(&p);
        let d = BinDensities {
            n1: 0.2,
            n2: 0.1,
            n12: 0.1,
        };
        let bc = BinCoefficients::new(&kc, p.timestep, &d);

        let mut rng = StdRng::seed_from_u64(7);
        let mut species = vec![
            one_particle_species("electron", 1.0, 0, [0.5, 0.0, 0.0], 1.0, -1.0),
            one_particle_species("proton", 1836.0, 1, [0.0; 3], 1.0, 1.0),
        ];
        let stats = scatter_pair(&kc, &bc, 3.5, None, &mut species, (0, 0), (1, 0), &mut rng)
            .expect("non-degenerate pair");
        assert!((stats.log_l - 3.5).abs() < 1e-15);
        assert!(stats.s > 0.0 && stats.s.is_finite());
    }

    #[test]
    fn test_auto_log_without_table_falls_back_to_clamp() {
        let p = params();
        let kc = KernelCoefficients::new(&p);
        let d = BinDensities {
            n1: 0.1,
            n2: 0.1,
            n12: 0.1,
        };
        let bc = BinCoefficients::new(&kc, p.timestep, &d);

        let mut rng = StdRng::seed_from_u64(3);
        let mut species = vec![
            one_particle_species("electron", 1.0, 0, [0.5, 0.1, 0.0], 1.0, -1.0),
            one_particle_species("proton", 1836.0, 1, [0.0; 3], 1.0, 1.0),
        ];
        let stats = scatter_pair(&kc, &bc, 0.0, None, &mut species, (0, 0), (1, 0), &mut rng)
            .expect("non-degenerate pair");
        assert!((stats.log_l - 2.0).abs() < 1e-15);
    }
}
