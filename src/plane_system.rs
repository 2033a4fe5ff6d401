//! # Plane-intersection linear system
//!
//! Every baseline `j` carries a family of parallel ambiguity planes, one per fringe
//! offset `k`. A [`Candidate`] picks one plane per baseline; the point where all the
//! chosen planes meet (if they do) is the [`Solution`] point of that candidate.
//!
//! ## Formulation
//!
//! For a set of baseline indices `I` and a candidate `(k_i)_{i∈I}`:
//!
//! ```text
//! p0(i, k) = (n0_i + 1 − k) / K_i / |R_i| · R_i        plane displacement point
//! b_i      = −(n̂_i · p0(i, k_i))                        displacement vector
//! W        = [n̂_i]ᵀ  (|I| × 3)                          stacked unit normals
//! x        = W⁺·b                                        intersection point
//! r        = ‖W·W⁺·b − b‖₂                               residual ("pinv norm")
//! ```
//!
//! `W` and its Moore–Penrose pseudo-inverse `W⁺` only depend on `I`, so a
//! [`PlaneSystem`] builds them once and then solves any number of candidates through
//! [`PlaneSystem::solve`], which takes `&self` and is safe to call from several threads.
//!
//! When `|I| > 3`, or when the baselines are coplanar (the usual case: `W` has rank 2),
//! the system is over-determined and `x` is the least-squares point. A rank-deficient
//! `W` is never an error: inconsistent plane choices simply show up as a large residual.
use nalgebra::{DMatrix, DVector, Matrix3xX, Vector3};
use smallvec::SmallVec;

use crate::constants::{FringeOffset, DEFAULT_PINV_RCOND};
use crate::fringe_errors::FringeError;
use crate::geometry::{ArrayGeometry, Baseline};
use crate::lattice::LatticeBounds;

/// Ordered fringe offsets, one per baseline considered so far.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Candidate(SmallVec<[FringeOffset; 8]>);

impl Candidate {
    pub fn new(offsets: &[FringeOffset]) -> Self {
        Candidate(SmallVec::from_slice(offsets))
    }

    #[inline]
    pub fn offsets(&self) -> &[FringeOffset] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy of this candidate with one more offset appended.
    pub fn extended(&self, offset: FringeOffset) -> Self {
        let mut next = self.0.clone();
        next.push(offset);
        Candidate(next)
    }

    /// Offsets of every baseline but the last one.
    #[inline]
    pub fn prefix(&self) -> &[FringeOffset] {
        &self.0[..self.0.len().saturating_sub(1)]
    }
}

impl FromIterator<FringeOffset> for Candidate {
    fn from_iter<T: IntoIterator<Item = FringeOffset>>(iter: T) -> Self {
        Candidate(iter.into_iter().collect())
    }
}

/// Intersection point of a candidate's planes and its residual.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    pub point: Vector3<f64>,
    pub residual: f64,
}

impl Default for Solution {
    fn default() -> Self {
        Solution {
            point: Vector3::zeros(),
            residual: f64::INFINITY,
        }
    }
}

impl Solution {
    #[inline]
    pub fn norm(&self) -> f64 {
        self.point.norm()
    }

    /// `true` when the residual is strictly below `tolerance`.
    #[inline]
    pub fn is_consistent(&self, tolerance: f64) -> bool {
        self.residual < tolerance
    }

    /// Projection of the solution point on every baseline phase center (`R_jᵀ·x`).
    ///
    /// Arguments
    /// -----------------
    /// * `phase_centers`: the `3×Sn` matrix returned by [`ArrayGeometry::phase_centers`].
    ///
    /// Return
    /// ----------
    /// * One value per baseline; integer-valued for an exact lattice point.
    pub fn ambiguity_integers(&self, phase_centers: &Matrix3xX<f64>) -> DVector<f64> {
        phase_centers.tr_mul(&self.point)
    }
}

/// Plane displacement point `p0(j, k)` of offset `k` on a baseline.
#[inline]
pub fn displacement_point(baseline: &Baseline, n0: u32, k: FringeOffset) -> Vector3<f64> {
    let shift = (n0 as f64 + 1.0 - k as f64) / baseline.linear_coefficient() / baseline.length();
    baseline.phase_center() * shift
}

/// Pseudo-inverse with singular values below `rcond · σ_max` treated as zero.
fn pseudo_inverse(w: &DMatrix<f64>, rcond: f64) -> Result<DMatrix<f64>, FringeError> {
    let svd = w.clone().svd(true, true);
    let cutoff = rcond * svd.singular_values.max();
    svd.pseudo_inverse(cutoff)
        .map_err(|e| FringeError::PseudoInverse(e.to_string()))
}

/// One-shot least-squares solve of `W·x = b` through the pseudo-inverse.
///
/// Builds `W⁺` for this single right-hand side. Use [`PlaneSystem`] when the same `W`
/// is solved against many displacement vectors.
///
/// Return
/// ----------
/// * `(x, r)` with `x = W⁺·b` and `r = ‖W·W⁺·b − b‖₂`.
pub fn least_squares(
    w: &DMatrix<f64>,
    b: &DVector<f64>,
    rcond: f64,
) -> Result<(DVector<f64>, f64), FringeError> {
    if w.nrows() != b.len() {
        return Err(FringeError::DimensionMismatch {
            rows: w.nrows(),
            len: b.len(),
        });
    }
    let w_pinv = pseudo_inverse(w, rcond)?;
    let x = &w_pinv * b;
    let residual = (w * &x - b).norm();
    Ok((x, residual))
}

/// Stacked plane normals of a baseline set with their pseudo-inverse.
#[derive(Debug, Clone)]
pub struct PlaneSystem {
    indices: Vec<usize>,
    /// `W`, one unit normal per row.
    normals: DMatrix<f64>,
    /// `W⁺`, `3 × |I|`.
    pinv: Matrix3xX<f64>,
    /// `W·W⁺`, `|I| × |I|`.
    projector: DMatrix<f64>,
    /// `b_i` for every admissible offset of every baseline in `I`, indexed `[i][k − 1]`.
    plane_offsets: Vec<Vec<f64>>,
}

impl PlaneSystem {
    /// Build the system of the baselines `indices` with the default pseudo-inverse cutoff.
    pub fn new(
        geometry: &ArrayGeometry,
        bounds: &LatticeBounds,
        indices: &[usize],
    ) -> Result<Self, FringeError> {
        Self::with_rcond(geometry, bounds, indices, DEFAULT_PINV_RCOND)
    }

    /// Build the system of the baselines `indices`.
    ///
    /// Arguments
    /// -----------------
    /// * `geometry`: baselines of the array.
    /// * `bounds`: lattice bounds of the same geometry.
    /// * `indices`: baseline indices `I`; candidate offsets are matched to them in order.
    /// * `rcond`: relative singular-value cutoff of the pseudo-inverse.
    ///
    /// Return
    /// ----------
    /// * The system, or an error if `indices` is empty or refers to a missing baseline.
    pub fn with_rcond(
        geometry: &ArrayGeometry,
        bounds: &LatticeBounds,
        indices: &[usize],
        rcond: f64,
    ) -> Result<Self, FringeError> {
        if indices.is_empty() {
            return Err(FringeError::InvalidGeometry(
                "a plane system needs at least one baseline".into(),
            ));
        }
        if let Some(&j) = indices.iter().find(|&&j| j >= geometry.n_baselines()) {
            return Err(FringeError::InvalidGeometry(format!(
                "baseline {j} out of range for {} baselines",
                geometry.n_baselines()
            )));
        }

        let m = indices.len();
        let normals = DMatrix::from_fn(m, 3, |row, col| {
            geometry.baseline(indices[row]).unit_normal()[col]
        });

        let pinv_full = pseudo_inverse(&normals, rcond)?;
        let projector = &normals * &pinv_full;
        let pinv: Matrix3xX<f64> = pinv_full.fixed_rows::<3>(0).into_owned();

        let plane_offsets: Vec<Vec<f64>> = indices
            .iter()
            .map(|&j| {
                let baseline = geometry.baseline(j);
                let normal = baseline.unit_normal();
                bounds
                    .offsets(j)
                    .map(|k| -normal.dot(&displacement_point(baseline, bounds.n0()[j], k)))
                    .collect::<Vec<f64>>()
            })
            .collect();

        Ok(PlaneSystem {
            indices: indices.to_vec(),
            normals,
            pinv,
            projector,
            plane_offsets,
        })
    }

    /// Baseline indices `I` of this system.
    #[inline]
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Number of planes `|I|`.
    #[inline]
    pub fn n_planes(&self) -> usize {
        self.indices.len()
    }

    /// The stacked normal matrix `W`.
    #[inline]
    pub fn normals(&self) -> &DMatrix<f64> {
        &self.normals
    }

    /// The pseudo-inverse `W⁺`.
    #[inline]
    pub fn pinv(&self) -> &Matrix3xX<f64> {
        &self.pinv
    }

    /// Displacement vector `b` of a candidate.
    ///
    /// Offsets outside `1..=k_len`, and missing offsets of a too-short candidate, have no
    /// plane; they are mapped to a NaN entry, which yields a NaN residual and never
    /// passes a tolerance test.
    pub fn displacement_vector(&self, candidate: &Candidate) -> DVector<f64> {
        DVector::from_iterator(
            self.n_planes(),
            candidate
                .offsets()
                .iter()
                .zip(&self.plane_offsets)
                .map(|(&k, table)| {
                    (k as usize)
                        .checked_sub(1)
                        .and_then(|i| table.get(i).copied())
                        .unwrap_or(f64::NAN)
                })
                .chain(std::iter::repeat(f64::NAN)),
        )
    }

    /// Solve one candidate: `x = W⁺·b`, `r = ‖W·W⁺·b − b‖₂`.
    pub fn solve(&self, candidate: &Candidate) -> Solution {
        let b = self.displacement_vector(candidate);
        let point: Vector3<f64> = &self.pinv * &b;
        let residual = (&self.projector * &b - &b).norm();
        Solution { point, residual }
    }
}
