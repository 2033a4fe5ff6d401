//! # Constants and type definitions for fringe
//!
//! This module centralizes the **physical constants**, **numerical defaults**, and **common
//! type aliases** used throughout the `fringe` library.
//!
//! ## Overview
//!
//! - Physical constants (speed of light) and unit conversions
//! - Default tolerances of the plane-intersection search
//! - Type aliases used across the crate to document units in signatures
//!
//! These definitions are used by all main modules: geometry, lattice bounds, the
//! pseudo-inverse solver, the stage search, the cap filter and the ambiguity evaluator.

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, phase of one full fringe
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Speed of light in m/s
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

// -------------------------------------------------------------------------------------------------
// Search defaults
// -------------------------------------------------------------------------------------------------

/// Default residual threshold below which a plane system is considered consistent.
pub const DEFAULT_TOLERANCE: f64 = 1e-1;

/// Default upper bound on the seed-stage solution norm.
pub const DEFAULT_MAX_SEED_NORM: f64 = 2.0;

/// Default relative singular-value cutoff of the pseudo-inverse (same as `numpy.linalg.pinv`).
pub const DEFAULT_PINV_RCOND: f64 = 1e-15;

/// Number of baselines needed to seed the search.
pub const SEED_BASELINES: usize = 3;

/// Longest accepted baseline in wavelengths; keeps `k_len = 2·floor(2K) + 1` within `u32`.
pub const MAX_BASELINE_LENGTH: f64 = 1e9;

/// Rounding slack allowed when reconstructing the third direction cosine on the horizon.
pub const HORIZON_EPS: f64 = 1e-12;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in meters
pub type Meter = f64;
/// Distance in wavelengths
pub type Wavelength = f64;
/// Frequency in MHz
pub type MegaHertz = f64;

/// Integer fringe offset on a single baseline, in `1..=k_len`.
pub type FringeOffset = u32;

/// Wavelength of an electromagnetic wave given its frequency.
///
/// Arguments
/// -----------------
/// * `frequency`: carrier frequency in MHz.
///
/// Return
/// ----------
/// * The wavelength in meters.
#[inline]
pub fn wavelength_from_frequency(frequency: MegaHertz) -> Meter {
    SPEED_OF_LIGHT * 1e-6 / frequency
}

#[cfg(test)]
mod constants_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_wavelength_from_frequency() {
        assert_relative_eq!(wavelength_from_frequency(299.792458), 1.0, epsilon = 1e-12);
        assert_relative_eq!(
            wavelength_from_frequency(31.0),
            9.670724451612903,
            epsilon = 1e-12
        );
    }
}
