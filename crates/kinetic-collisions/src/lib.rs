// ─────────────────────────────────────────────────────────────────────
// SCPN Kinetic — Binary Coulomb Collisions
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Monte-Carlo binary Coulomb collisions between weighted relativistic
//! macro-particles, following Nanbu's cumulative small-angle scattering
//! model with the Perez correction for unequal weights and a
//! low-temperature cutoff, optionally coupled with collisional ionization.
//!
//! References:
//! - Nanbu, Phys. Rev. E 55, 4642 (1997)
//! - Perez et al., Phys. Plasmas 19, 083104 (2012)

pub mod context;
pub mod debug;
pub mod debye;
pub mod group;
pub mod ionization;
pub mod kernel;
pub mod pairing;
