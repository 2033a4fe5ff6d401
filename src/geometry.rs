//! # Array geometry and baselines
//!
//! Builds the **baseline phase-center vectors** of a sparse array from the planar
//! coordinates of its sub-groups.
//!
//! ## Model
//!
//! One sub-group is designated as the **reference** and sits at the origin of the
//! baseline frame. Every other sub-group `j` defines a baseline
//!
//! ```text
//! R_j = (x_j − x_ref, y_j − y_ref, 0)      [wavelengths]
//! ```
//!
//! from which the search derives
//!
//! * the unit normal `n̂_j = R_j / |R_j|` of the family of ambiguity planes,
//! * the linear coefficient `K_j = |R_j|² / |R_j|` bounding the admissible fringe offsets.
//!
//! Baselines keep the order of the input sub-groups, skipping the reference, and are
//! immutable once built. The sub-group positions themselves are kept as given: the
//! steering model of [`crate::ambiguity`] works on the physical layout, not on the
//! baseline frame.
//!
//! ## Inputs
//!
//! * [`ArrayGeometry::new`] – coordinates already expressed in wavelengths,
//! * [`ArrayGeometry::from_meters`] – physical coordinates plus a carrier frequency,
//! * [`ArrayGeometry::from_csv`] – a CSV file with `x,y` columns in wavelengths.
//!
//! ## Errors
//!
//! Construction fails with [`FringeError::InvalidGeometry`] when fewer than three
//! baselines remain after removing the reference, and with
//! [`FringeError::DegenerateBaseline`] when a sub-group coincides with the reference.
//! Baselines longer than [`MAX_BASELINE_LENGTH`] wavelengths are rejected as invalid:
//! their offset ranges would not fit the offset type.
use camino::Utf8Path;
use nalgebra::{Matrix3xX, Vector2, Vector3};
use serde::Deserialize;
use tracing::debug;

use crate::constants::{
    wavelength_from_frequency, MegaHertz, Meter, Wavelength, MAX_BASELINE_LENGTH, SEED_BASELINES,
};
use crate::fringe_errors::FringeError;

/// One sub-group relative to the reference sub-group.
#[derive(Debug, Clone, PartialEq)]
pub struct Baseline {
    phase_center: Vector3<f64>,
    length: f64,
}

impl Baseline {
    fn new(index: usize, offset: Vector2<f64>) -> Result<Self, FringeError> {
        let phase_center = Vector3::new(offset.x, offset.y, 0.0);
        let length = phase_center.norm();
        if length == 0.0 {
            return Err(FringeError::DegenerateBaseline { index });
        }
        if length > MAX_BASELINE_LENGTH {
            return Err(FringeError::InvalidGeometry(format!(
                "baseline {index} is {length} wavelengths long, above {MAX_BASELINE_LENGTH}"
            )));
        }
        Ok(Baseline {
            phase_center,
            length,
        })
    }

    /// Phase-center vector `R_j` in wavelengths (z-component is zero).
    #[inline]
    pub fn phase_center(&self) -> &Vector3<f64> {
        &self.phase_center
    }

    /// Euclidean length `|R_j|`.
    #[inline]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Unit normal `n̂_j` of the ambiguity planes of this baseline.
    #[inline]
    pub fn unit_normal(&self) -> Vector3<f64> {
        self.phase_center / self.length
    }

    /// Linear coefficient `K_j = |R_j|² / |R_j|`.
    #[inline]
    pub fn linear_coefficient(&self) -> f64 {
        self.phase_center.norm_squared() / self.length
    }
}

#[derive(Debug, Deserialize)]
struct SubgroupRow {
    x: f64,
    y: f64,
}

/// Sub-group layout of a sparse array and the baselines it induces.
#[derive(Debug, Clone)]
pub struct ArrayGeometry {
    /// Sub-group positions as given, in wavelengths (reference included).
    positions: Vec<Vector2<f64>>,
    reference: usize,
    baselines: Vec<Baseline>,
}

impl ArrayGeometry {
    /// Build the geometry from sub-group coordinates expressed in wavelengths.
    ///
    /// Arguments
    /// -----------------
    /// * `coords`: planar coordinates of **all** sub-groups, reference included.
    /// * `reference`: index in `coords` of the reference sub-group.
    ///
    /// Return
    /// ----------
    /// * The geometry with `coords.len() - 1` baselines, or an invalid geometry error.
    ///
    /// See also
    /// ------------
    /// * [`ArrayGeometry::from_meters`] – same input in meters.
    pub fn new(coords: &[[Wavelength; 2]], reference: usize) -> Result<Self, FringeError> {
        if reference >= coords.len() {
            return Err(FringeError::InvalidGeometry(format!(
                "reference sub-group {reference} out of range for {} sub-groups",
                coords.len()
            )));
        }
        if let Some(i) = coords
            .iter()
            .position(|c| !c[0].is_finite() || !c[1].is_finite())
        {
            return Err(FringeError::InvalidGeometry(format!(
                "sub-group {i} has non-finite coordinates"
            )));
        }

        let n_baselines = coords.len() - 1;
        if n_baselines < SEED_BASELINES {
            return Err(FringeError::InvalidGeometry(format!(
                "at least {SEED_BASELINES} baselines are required, got {n_baselines}"
            )));
        }

        let positions: Vec<Vector2<f64>> = coords.iter().map(|c| Vector2::new(c[0], c[1])).collect();
        let origin = positions[reference];

        let baselines = positions
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != reference)
            .map(|(_, p)| p - origin)
            .enumerate()
            .map(|(j, offset)| Baseline::new(j, offset))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            subgroups = positions.len(),
            baselines = baselines.len(),
            reference,
            "array geometry built"
        );

        Ok(ArrayGeometry {
            positions,
            reference,
            baselines,
        })
    }

    /// Build the geometry from physical coordinates.
    ///
    /// Arguments
    /// -----------------
    /// * `coords`: planar coordinates of all sub-groups in meters.
    /// * `frequency`: carrier frequency in MHz.
    /// * `reference`: index of the reference sub-group.
    pub fn from_meters(
        coords: &[[Meter; 2]],
        frequency: MegaHertz,
        reference: usize,
    ) -> Result<Self, FringeError> {
        let lambda = wavelength_from_frequency(frequency);
        if !lambda.is_finite() || lambda <= 0.0 {
            return Err(FringeError::InvalidGeometry(format!(
                "carrier frequency must be positive, got {frequency} MHz"
            )));
        }
        let scaled: Vec<[f64; 2]> = coords
            .iter()
            .map(|c| [c[0] / lambda, c[1] / lambda])
            .collect();
        Self::new(&scaled, reference)
    }

    /// Read sub-group coordinates (wavelengths) from a CSV file with an `x,y` header.
    pub fn from_csv(path: &Utf8Path, reference: usize) -> Result<Self, FringeError> {
        let mut reader = csv::Reader::from_path(path)?;
        let coords = reader
            .deserialize::<SubgroupRow>()
            .map(|row| row.map(|r| [r.x, r.y]))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(&coords, reference)
    }

    /// Number of baselines `Sn`.
    #[inline]
    pub fn n_baselines(&self) -> usize {
        self.baselines.len()
    }

    /// Index of the reference sub-group in the input coordinate list.
    #[inline]
    pub fn reference(&self) -> usize {
        self.reference
    }

    #[inline]
    pub fn baselines(&self) -> &[Baseline] {
        &self.baselines
    }

    #[inline]
    pub fn baseline(&self, j: usize) -> &Baseline {
        &self.baselines[j]
    }

    /// Sub-group positions in wavelengths, reference included, untranslated.
    #[inline]
    pub fn positions(&self) -> &[Vector2<f64>] {
        &self.positions
    }

    /// Baseline phase centers stacked as the columns of a `3×Sn` matrix.
    pub fn phase_centers(&self) -> Matrix3xX<f64> {
        Matrix3xX::from_iterator(
            self.baselines.len(),
            self.baselines.iter().flat_map(|b| b.phase_center.iter().copied()),
        )
    }

    /// Linear coefficients `K_j` of every baseline.
    pub fn linear_coefficients(&self) -> Vec<f64> {
        self.baselines
            .iter()
            .map(Baseline::linear_coefficient)
            .collect()
    }
}
