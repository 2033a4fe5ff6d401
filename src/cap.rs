//! # Field-of-view cap
//!
//! Restricts the survivors of the search to the ambiguities that matter operationally:
//! those whose direction falls inside the scan cone around the look direction.
//!
//! The look direction is the unit wave vector
//!
//! ```text
//! k0 = (sin(az)·cos(el), cos(az)·cos(el), sin(el))
//! ```
//!
//! and a survivor point `s` is kept when its planar distance to `k0`,
//! `d = ‖(k0_x, k0_y) − (s_x, s_y)‖₂`, satisfies `d ≤ sin(θ)`.
//!
//! ## Approximation
//!
//! The test is done in the plane of direction cosines, not on the sphere: the cap is
//! the disc of radius `sin(θ)` centred on the projection of `k0`. It matches the
//! spherical cap exactly when `k0` points at zenith and drifts away from it as the
//! look direction approaches the horizon. `θ = π/2` admits the whole visible disc
//! around zenith, `θ = 0` keeps exact matches only.
use nalgebra::Vector3;
use std::f64::consts::FRAC_PI_2;
use tracing::debug;

use crate::constants::{Degree, Radian, RADEG};
use crate::fringe_errors::FringeError;
use crate::search::stage::SurvivorSet;

/// Unit wave vector of the direction `(el, az)`, both in degrees.
pub fn wave_vector(elevation: Degree, azimuth: Degree) -> Vector3<f64> {
    let (sin_el, cos_el) = (elevation * RADEG).sin_cos();
    let (sin_az, cos_az) = (azimuth * RADEG).sin_cos();
    Vector3::new(sin_az * cos_el, cos_az * cos_el, sin_el)
}

/// Look direction and angular cutoff of the scan cone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldOfViewCap {
    k0: Vector3<f64>,
    cutoff: Radian,
    radius: f64,
}

impl FieldOfViewCap {
    /// Build the cap around the look direction `(elevation, azimuth)`.
    ///
    /// Arguments
    /// -----------------
    /// * `elevation`, `azimuth`: look direction in degrees.
    /// * `cutoff`: half-angle `θ` of the cap in radians, within `[0, π/2]`.
    ///
    /// Return
    /// ----------
    /// * The cap, or [`FringeError::InvalidCapParameter`] for non-finite angles or a cutoff
    ///   outside `[0, π/2]`.
    pub fn from_look_direction(
        elevation: Degree,
        azimuth: Degree,
        cutoff: Radian,
    ) -> Result<Self, FringeError> {
        if !elevation.is_finite() || !azimuth.is_finite() {
            return Err(FringeError::InvalidCapParameter(format!(
                "look direction must be finite, got el={elevation}, az={azimuth}"
            )));
        }
        if !(0.0..=FRAC_PI_2).contains(&cutoff) {
            return Err(FringeError::InvalidCapParameter(format!(
                "cutoff must lie in [0, π/2] radians, got {cutoff}"
            )));
        }
        Ok(FieldOfViewCap {
            k0: wave_vector(elevation, azimuth),
            cutoff,
            radius: cutoff.sin(),
        })
    }

    /// True look direction `k0`.
    #[inline]
    pub fn k0(&self) -> &Vector3<f64> {
        &self.k0
    }

    #[inline]
    pub fn cutoff(&self) -> Radian {
        self.cutoff
    }

    /// Planar distance `‖k0_xy − s_xy‖₂`.
    #[inline]
    pub fn planar_distance(&self, point: &Vector3<f64>) -> f64 {
        self.k0.xy().metric_distance(&point.xy())
    }

    #[inline]
    pub fn contains(&self, point: &Vector3<f64>) -> bool {
        self.planar_distance(point) <= self.radius
    }

    /// Indices of the survivors inside the cap, in survivor order.
    pub fn filter(&self, survivors: &SurvivorSet) -> Vec<usize> {
        let kept: Vec<usize> = survivors
            .points()
            .enumerate()
            .filter(|(_, p)| self.contains(p))
            .map(|(i, _)| i)
            .collect();
        debug!(
            survivors = survivors.len(),
            kept = kept.len(),
            cutoff = self.cutoff,
            "field-of-view cap applied"
        );
        kept
    }
}

#[cfg(test)]
mod cap_test {
    use super::*;
    use crate::plane_system::{Candidate, Solution};
    use crate::search::stage::Survivor;
    use approx::assert_relative_eq;

    fn survivors(points: &[[f64; 2]]) -> SurvivorSet {
        points
            .iter()
            .map(|p| Survivor {
                candidate: Candidate::new(&[1, 1, 1]),
                solution: Solution {
                    point: Vector3::new(p[0], p[1], 0.0),
                    residual: 0.0,
                },
            })
            .collect()
    }

    #[test]
    fn test_wave_vector() {
        let zenith = wave_vector(90.0, 0.0);
        assert_relative_eq!(zenith, Vector3::new(0.0, 0.0, 1.0), epsilon = 1e-15);

        let east = wave_vector(0.0, 90.0);
        assert_relative_eq!(east, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-15);

        let k = wave_vector(30.0, 45.0);
        assert_relative_eq!(k.norm(), 1.0, epsilon = 1e-15);
        assert_relative_eq!(k.x, k.y, epsilon = 1e-15);
        assert_relative_eq!(k.z, 0.5, epsilon = 1e-15);
    }

    #[test]
    fn test_half_pi_keeps_unit_disc() {
        let cap = FieldOfViewCap::from_look_direction(90.0, 0.0, FRAC_PI_2).unwrap();
        let set = survivors(&[[1.0, 0.0], [1.0, 1.0], [0.0, -1.0], [2.0, 0.0], [0.3, 0.3]]);
        assert_eq!(cap.filter(&set), vec![0, 2, 4]);
    }

    #[test]
    fn test_zero_cutoff_keeps_exact_matches() {
        // el = az = 0 gives k0 = (0, 1, 0) without rounding
        let cap = FieldOfViewCap::from_look_direction(0.0, 0.0, 0.0).unwrap();
        let set = survivors(&[[0.0, 1.0], [1e-9, 1.0], [0.0, 0.0]]);
        assert_eq!(cap.filter(&set), vec![0]);
    }

    #[test]
    fn test_planar_distance() {
        let cap = FieldOfViewCap::from_look_direction(0.0, 0.0, 0.5).unwrap();
        assert_relative_eq!(cap.planar_distance(&Vector3::new(3.0, 5.0, 7.0)), 5.0);
        assert!(cap.contains(&Vector3::new(0.4, 1.0, 0.0)));
        assert!(!cap.contains(&Vector3::new(0.5, 1.0, 0.0)));
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            FieldOfViewCap::from_look_direction(45.0, 0.0, -0.1),
            Err(FringeError::InvalidCapParameter(_))
        ));
        assert!(FieldOfViewCap::from_look_direction(45.0, 0.0, 2.0).is_err());
        assert!(FieldOfViewCap::from_look_direction(f64::NAN, 0.0, 0.1).is_err());
        assert!(FieldOfViewCap::from_look_direction(45.0, 0.0, f64::NAN).is_err());
    }
}
