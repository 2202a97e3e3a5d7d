// ─────────────────────────────────────────────────────────────────────
// SCPN Kinetic — Pair Sampler
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Shuffle-and-pair of the macro-particles of one spatial bin, and the
//! aggregate densities entering the collision strength.
//!
//! The shuffle does not move particles; it is a temporary re-indexing of
//! the bin. Group 1 is always the more numerous side, so every group-1
//! particle collides exactly once per timestep while group-2 particles may
//! be paired repeatedly.

use crate::ionization::Ionization;
use kinetic_types::species::Species;
use rand::seq::SliceRandom;
use rand::Rng;

/// Pair indexing of one bin. Index values are flat offsets into the
/// concatenated per-species bin ranges of each group.
#[derive(Debug, Clone)]
pub struct BinPairing {
    /// Oriented species groups (group 1 holds at least as many particles).
    pub sg1: Vec<usize>,
    pub sg2: Vec<usize>,
    np1: Vec<usize>,
    np2: Vec<usize>,
    bmin1: Vec<usize>,
    bmin2: Vec<usize>,
    pub npart1: usize,
    pub npart2: usize,
    pub npairs: usize,
    /// Number of pairs whose group-2 particle is not a duplicate.
    pub n2max: usize,
    index1: Vec<usize>,
    index2: Vec<usize>,
}

/// Bin densities in units of the critical density.
#[derive(Debug, Clone, Copy)]
pub struct BinDensities {
    pub n1: f64,
    pub n2: f64,
    /// Hybrid density sum(min(W1, W2)) weighting the pair statistics.
    pub n12: f64,
}

impl BinPairing {
    /// Build the pair indexing of bin `ibin`, or `None` when either side
    /// of the collision has no particles there.
    pub fn build(
        species: &[Species],
        group1: &[usize],
        group2: &[usize],
        intra: bool,
        ibin: usize,
        rng: &mut impl Rng,
    ) -> Option<Self> {
        let gather = |grp: &[usize]| {
            let mut bmin = Vec::with_capacity(grp.len());
            let mut np = Vec::with_capacity(grp.len());
            let mut total = 0usize;
            for &is in grp {
                let (lo, hi) = species[is].bin_range(ibin);
                bmin.push(lo);
                np.push(hi - lo);
                total += hi - lo;
            }
            (bmin, np, total)
        };
        let (bmin_a, np_a, npart_a) = gather(group1);
        let (bmin_b, np_b, npart_b) = gather(group2);

        // ensure group 1 has more macro-particles; one exchange suffices
        let (sg1, bmin1, np1, npart1, sg2, bmin2, np2, npart2) = if npart_b > npart_a {
            (
                group2.to_vec(),
                bmin_b,
                np_b,
                npart_b,
                group1.to_vec(),
                bmin_a,
                np_a,
                npart_a,
            )
        } else {
            (
                group1.to_vec(),
                bmin_a,
                np_a,
                npart_a,
                group2.to_vec(),
                bmin_b,
                np_b,
                npart_b,
            )
        };

        if npart1 == 0 || npart2 == 0 {
            return None;
        }

        let mut index1: Vec<usize> = (0..npart1).collect();
        index1.shuffle(rng);

        let (npairs, n2max, index2) = if intra {
            // half as many pairs as macro-particles, the second half of
            // the shuffled index array wrapping onto the first
            let npairs = (npart1 + 1) / 2;
            let index2: Vec<usize> = (0..npairs)
                .map(|i| index1[(i + npairs) % npart1])
                .collect();
            index1.truncate(npairs);
            (npairs, npart1 - npairs, index2)
        } else {
            let index2: Vec<usize> = (0..npart1).map(|i| i % npart2).collect();
            (npart1, npart2, index2)
        };

        Some(BinPairing {
            sg1,
            sg2,
            np1,
            np2,
            bmin1,
            bmin2,
            npart1,
            npart2,
            npairs,
            n2max,
            index1,
            index2,
        })
    }

    fn decode(mut idx: usize, np: &[usize], bmin: &[usize], group: &[usize]) -> (usize, usize) {
        let mut ispec = 0;
        while idx >= np[ispec] {
            idx -= np[ispec];
            ispec += 1;
        }
        (group[ispec], bmin[ispec] + idx)
    }

    /// Resolve pair `i` into ((species, particle), (species, particle))
    /// absolute indices.
    pub fn pair(&self, i: usize) -> ((usize, usize), (usize, usize)) {
        (
            Self::decode(self.index1[i], &self.np1, &self.bmin1, &self.sg1),
            Self::decode(self.index2[i], &self.np2, &self.bmin2, &self.sg2),
        )
    }

    /// Whether pair `i` holds a non-duplicated group-2 particle.
    pub fn is_unique2(&self, i: usize) -> bool {
        i < self.n2max
    }
}

/// Single pass over the pairs: weight sums for the three densities, and
/// the ionization hook's own accumulation.
pub fn accumulate_densities(
    species: &[Species],
    pairing: &BinPairing,
    intra: bool,
    n_cluster_per_cell: f64,
    hook: &mut Ionization,
) -> BinDensities {
    let mut n1 = 0.0;
    let mut n2 = 0.0;
    let mut n12 = 0.0;
    for i in 0..pairing.npairs {
        let ((s1, i1), (s2, i2)) = pairing.pair(i);
        let w1 = species[s1].particles.weight(i1);
        let w2 = species[s2].particles.weight(i2);
        let unique = pairing.is_unique2(i);
        n1 += w1;
        if unique {
            // avoid counting duplicated group-2 particles twice
            n2 += w2;
        }
        n12 += w1.min(w2);
        hook.prepare2(species, (s1, i1), (s2, i2), unique);
    }
    if intra {
        // every particle participates as both sides of the collision
        n1 += n2;
        n2 = n1;
    }
    BinDensities {
        n1: n1 * n_cluster_per_cell,
        n2: n2 * n_cluster_per_cell,
        n12: n12 * n_cluster_per_cell,
    }
}
