// ─────────────────────────────────────────────────────────────────────
// SCPN Kinetic — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Speed of light (m/s)
pub const C_SI: f64 = 299_792_458.0;

/// Classical electron radius (m)
pub const R_E_SI: f64 = 2.8179403267e-15;

/// h / (2 m_e c^2) (s) - converts a reference angular frequency into the
/// quantum minimum impact parameter prefactor.
pub const H_OVER_2MEC2: f64 = 4.046650232e-21;

/// Electron rest energy (eV)
pub const ME_C2_EV: f64 = 510_998.95;

/// Hydrogen ground-state binding energy (eV)
pub const RYDBERG_EV: f64 = 13.605693;
