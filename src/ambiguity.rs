//! # Ambiguity distance evaluation
//!
//! Turns the survivors kept by the [field-of-view cap](crate::cap) into physical
//! ambiguities and measures how distinguishable each one is from the true look direction.
//!
//! ## Model
//!
//! A survivor point `s` is a lattice displacement of the true direction `k0` in the plane
//! of direction cosines. The ambiguous direction is
//!
//! ```text
//! dir_xy = k0_xy − s_xy
//! dir_z  = sqrt(1 − ‖dir_xy‖²)
//! ```
//!
//! and the array response towards a direction is the steering vector over every
//! sub-group `n` (reference included, at its physical position):
//!
//! ```text
//! a_n(dir) = exp(−i·2π·(x_n·dir_x + y_n·dir_y))
//! ```
//!
//! The ambiguity distance is `‖a(k0) − a(dir)‖₂`; a distance close to zero means the
//! array cannot tell the two directions apart.
//!
//! ## Horizon handling
//!
//! When `‖dir_xy‖² > 1` the direction is not a visible one. Values within
//! [`HORIZON_EPS`] of the horizon are clamped to `dir_z = 0`; anything further is
//! rejected with [`FringeError::Domain`]. A rejection only drops that ambiguity, the
//! evaluation goes on with the others.
use nalgebra::{Complex, DVector, Vector2, Vector3};
use tracing::warn;

use crate::cap::FieldOfViewCap;
use crate::constants::{DPI, HORIZON_EPS};
use crate::fringe_errors::FringeError;
use crate::geometry::ArrayGeometry;
use crate::plane_system::Candidate;
use crate::report::{AmbiguityReport, RejectedAmbiguity};
use crate::search::stage::SurvivorSet;

/// Below this distance the difference vector has no usable direction.
const DISTANCE_EPS: f64 = 1e-12;

/// Complex steering response, one entry per sub-group.
pub type SteeringVector = DVector<Complex<f64>>;

/// One ambiguity inside the field of view.
#[derive(Debug, Clone, PartialEq)]
pub struct AmbiguityRecord {
    /// Index of the survivor in the final survivor set.
    pub survivor_index: usize,
    pub candidate: Candidate,
    /// Survivor point `s`.
    pub point: Vector3<f64>,
    /// Ambiguous direction cosines.
    pub direction: Vector3<f64>,
    /// `‖a(k0) − a(dir)‖₂`.
    pub distance: f64,
    /// `(a(k0) − a(dir)) / distance`; `None` when the two responses coincide.
    pub normal: Option<SteeringVector>,
}

/// Steering model of an array for a fixed true look direction.
#[derive(Debug, Clone)]
pub struct AmbiguityEvaluator {
    positions: Vec<Vector2<f64>>,
    k0: Vector3<f64>,
    k0_response: SteeringVector,
}

impl AmbiguityEvaluator {
    pub fn new(geometry: &ArrayGeometry, cap: &FieldOfViewCap) -> Self {
        let positions = geometry.positions().to_vec();
        let k0 = *cap.k0();
        let k0_response = steering_response(&positions, &k0);
        AmbiguityEvaluator {
            positions,
            k0,
            k0_response,
        }
    }

    #[inline]
    pub fn k0(&self) -> &Vector3<f64> {
        &self.k0
    }

    /// Array response towards `k0`.
    #[inline]
    pub fn k0_response(&self) -> &SteeringVector {
        &self.k0_response
    }

    /// Array response towards `direction`; only its planar cosines are used.
    pub fn steering_response(&self, direction: &Vector3<f64>) -> SteeringVector {
        steering_response(&self.positions, direction)
    }

    /// Ambiguous direction `(k0_xy − s_xy, sqrt(1 − ‖k0_xy − s_xy‖²))` of survivor `index`.
    ///
    /// Return
    /// ----------
    /// * The unit direction vector, or [`FringeError::Domain`] when it lies beyond the
    ///   horizon.
    pub fn ambiguous_direction(
        &self,
        index: usize,
        point: &Vector3<f64>,
    ) -> Result<Vector3<f64>, FringeError> {
        let planar = self.k0.xy() - point.xy();
        let radius_sq = planar.norm_squared();
        let z_sq = 1.0 - radius_sq;

        let z = if z_sq >= 0.0 {
            z_sq.sqrt()
        } else if z_sq >= -HORIZON_EPS {
            0.0
        } else {
            return Err(FringeError::Domain { index, radius_sq });
        };
        Ok(Vector3::new(planar.x, planar.y, z))
    }

    /// Build the ambiguity record of one survivor.
    ///
    /// Arguments
    /// -----------------
    /// * `index`: survivor index, carried into the record and into domain errors.
    /// * `candidate`: the survivor's fringe offsets.
    /// * `point`: the survivor's solution point `s`.
    pub fn evaluate_point(
        &self,
        index: usize,
        candidate: &Candidate,
        point: &Vector3<f64>,
    ) -> Result<AmbiguityRecord, FringeError> {
        let direction = self.ambiguous_direction(index, point)?;
        let difference = &self.k0_response - self.steering_response(&direction);
        let distance = difference.norm();
        let normal = (distance > DISTANCE_EPS).then(|| difference.map(|c| c / distance));

        Ok(AmbiguityRecord {
            survivor_index: index,
            candidate: candidate.clone(),
            point: *point,
            direction,
            distance,
            normal,
        })
    }

    /// Evaluate the survivors selected by the cap.
    ///
    /// Arguments
    /// -----------------
    /// * `survivors`: final survivor set of the search.
    /// * `cap_indices`: indices returned by [`FieldOfViewCap::filter`].
    ///
    /// Return
    /// ----------
    /// * The report with one record per visible ambiguity; ambiguities beyond the horizon
    ///   are listed in [`AmbiguityReport::rejected`] and logged.
    /// * [`FringeError::SurvivorIndexOutOfRange`] if an index does not refer to a survivor.
    pub fn evaluate(
        &self,
        survivors: &SurvivorSet,
        cap_indices: &[usize],
    ) -> Result<AmbiguityReport, FringeError> {
        let mut records = Vec::with_capacity(cap_indices.len());
        let mut rejected = Vec::new();

        for &index in cap_indices {
            let survivor =
                survivors
                    .get(index)
                    .ok_or(FringeError::SurvivorIndexOutOfRange {
                        index,
                        len: survivors.len(),
                    })?;

            match self.evaluate_point(index, &survivor.candidate, &survivor.solution.point) {
                Ok(record) => records.push(record),
                Err(FringeError::Domain { index, radius_sq }) => {
                    warn!(
                        survivor = index,
                        radius_sq,
                        "ambiguous direction beyond the horizon, excluded"
                    );
                    rejected.push(RejectedAmbiguity {
                        survivor_index: index,
                        radius_sq,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(AmbiguityReport {
            cap_indices: cap_indices.to_vec(),
            records,
            rejected,
        })
    }
}

/// `exp(−i·2π·(x_n·dir_x + y_n·dir_y))` for every sub-group position `(x_n, y_n)`.
pub fn steering_response(positions: &[Vector2<f64>], direction: &Vector3<f64>) -> SteeringVector {
    SteeringVector::from_iterator(
        positions.len(),
        positions
            .iter()
            .map(|p| Complex::from_polar(1.0, -DPI * (p.x * direction.x + p.y * direction.y))),
    )
}

#[cfg(test)]
mod ambiguity_test {
    use super::*;
    use crate::plane_system::Solution;
    use crate::search::stage::Survivor;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn unit_cross() -> ArrayGeometry {
        let coords = vec![[1.0, 0.0], [0.0, 1.0], [-1.0, 0.0], [0.0, -1.0], [0.0, 0.0]];
        ArrayGeometry::new(&coords, 4).unwrap()
    }

    fn zenith_cap() -> FieldOfViewCap {
        FieldOfViewCap::from_look_direction(90.0, 0.0, FRAC_PI_2).unwrap()
    }

    fn survivor(x: f64, y: f64) -> Survivor {
        Survivor {
            candidate: Candidate::new(&[1, 2, 3, 4]),
            solution: Solution {
                point: Vector3::new(x, y, 0.0),
                residual: 0.0,
            },
        }
    }

    #[test]
    fn test_steering_response_unit_modulus() {
        let evaluator = AmbiguityEvaluator::new(&unit_cross(), &zenith_cap());
        let response = evaluator.steering_response(&Vector3::new(0.3, -0.2, 0.0));
        assert_eq!(response.len(), 5);
        for c in response.iter() {
            assert_relative_eq!(c.norm(), 1.0, epsilon = 1e-15);
        }
        // reference sub-group is at (0, 0)
        assert_relative_eq!(response[4].re, 1.0);
        assert_relative_eq!(response[4].im, 0.0);
        // x = 1, dir_x = 0.3
        assert_relative_eq!(response[0].arg(), -DPI * 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_self_ambiguity_has_no_normal() {
        let evaluator = AmbiguityEvaluator::new(&unit_cross(), &zenith_cap());
        let record = evaluator
            .evaluate_point(0, &Candidate::new(&[3, 3, 3, 3]), &Vector3::zeros())
            .unwrap();
        assert_eq!(record.distance, 0.0);
        assert!(record.normal.is_none());
        assert_relative_eq!(record.direction, *evaluator.k0(), epsilon = 1e-12);
    }

    #[test]
    fn test_lattice_ambiguity_is_unresolvable() {
        // integer positions with an integer displacement: every phase moves by 2π·m
        let evaluator = AmbiguityEvaluator::new(&unit_cross(), &zenith_cap());
        let record = evaluator
            .evaluate_point(0, &Candidate::new(&[1, 2, 3, 4]), &Vector3::new(1.0, 0.0, 0.0))
            .unwrap();
        assert_relative_eq!(record.direction, Vector3::new(-1.0, 0.0, 0.0), epsilon = 1e-12);
        assert!(record.distance < 1e-12);
        assert!(record.normal.is_none());
    }

    #[test]
    fn test_distance_and_normal() {
        let coords = vec![[0.5, 0.0], [0.0, 1.0], [-1.0, 0.0], [0.0, -1.0], [0.0, 0.0]];
        let geometry = ArrayGeometry::new(&coords, 4).unwrap();
        let evaluator = AmbiguityEvaluator::new(&geometry, &zenith_cap());
        let record = evaluator
            .evaluate_point(2, &Candidate::new(&[1, 2, 3, 4]), &Vector3::new(1.0, 0.0, 0.0))
            .unwrap();

        // only the half-wavelength sub-group sees a phase of π: |1 − (−1)| = 2
        assert_relative_eq!(record.distance, 2.0, epsilon = 1e-12);
        let normal = record.normal.unwrap();
        assert_relative_eq!(normal.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(normal[0].re, 1.0, epsilon = 1e-12);
        assert_eq!(record.survivor_index, 2);
    }

    #[test]
    fn test_distance_uses_physical_positions() {
        let coords = vec![[1.3, 0.2], [0.4, 1.7], [-1.1, 0.5], [0.9, -1.2], [0.5, 0.5]];
        let geometry = ArrayGeometry::new(&coords, 4).unwrap();
        let cap = FieldOfViewCap::from_look_direction(70.0, 20.0, FRAC_PI_2).unwrap();
        let evaluator = AmbiguityEvaluator::new(&geometry, &cap);

        let s = Vector3::new(0.3, -0.2, 0.0);
        let record = evaluator
            .evaluate_point(0, &Candidate::new(&[1, 2, 3, 4]), &s)
            .unwrap();

        let k0 = cap.k0();
        let dir = k0.xy() - s.xy();
        let distance_from = |shift: [f64; 2]| {
            coords
                .iter()
                .map(|c| {
                    let (x, y) = (c[0] - shift[0], c[1] - shift[1]);
                    let a = Complex::from_polar(1.0, -DPI * (x * k0.x + y * k0.y));
                    let b = Complex::from_polar(1.0, -DPI * (x * dir.x + y * dir.y));
                    (a - b).norm_sqr()
                })
                .sum::<f64>()
                .sqrt()
        };

        assert_relative_eq!(record.distance, distance_from([0.0, 0.0]), epsilon = 1e-12);
        assert_relative_eq!(record.distance, 3.5643235549837184, epsilon = 1e-9);
        // translating the layout onto the reference changes the distance
        assert!((record.distance - distance_from([0.5, 0.5])).abs() > 1e-3);
    }

    #[test]
    fn test_beyond_horizon_is_domain_error() {
        // el = az = 0: k0 = (0, 1, 0) exactly
        let cap = FieldOfViewCap::from_look_direction(0.0, 0.0, FRAC_PI_2).unwrap();
        let evaluator = AmbiguityEvaluator::new(&unit_cross(), &cap);
        let err = evaluator
            .ambiguous_direction(7, &Vector3::new(1.0, -1.0, 0.0))
            .unwrap_err();
        assert_eq!(
            err,
            FringeError::Domain {
                index: 7,
                radius_sq: 5.0
            }
        );
    }

    #[test]
    fn test_horizon_is_clamped() {
        let evaluator = AmbiguityEvaluator::new(&unit_cross(), &zenith_cap());
        let direction = evaluator
            .ambiguous_direction(0, &Vector3::new(0.0, 1.0 + 1e-14, 0.0))
            .unwrap();
        assert_eq!(direction.z, 0.0);
    }

    #[test]
    fn test_evaluate_skips_rejected() {
        let evaluator = AmbiguityEvaluator::new(&unit_cross(), &zenith_cap());
        let survivors: SurvivorSet = vec![survivor(1.0, 0.0), survivor(2.0, 0.0), survivor(0.0, 1.0)]
            .into_iter()
            .collect();

        let report = evaluator.evaluate(&survivors, &[0, 1, 2]).unwrap();
        assert_eq!(report.cap_indices, vec![0, 1, 2]);
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.records[1].survivor_index, 2);
        assert_eq!(
            report.rejected,
            vec![RejectedAmbiguity {
                survivor_index: 1,
                radius_sq: 4.0
            }]
        );

        assert_eq!(
            evaluator.evaluate(&survivors, &[5]).unwrap_err(),
            FringeError::SurvivorIndexOutOfRange { index: 5, len: 3 }
        );
    }
}
