//! # Ambiguity analysis
//!
//! [`AmbiguityAnalysis`] ties the pipeline together for one array geometry:
//!
//! ```text
//! ArrayGeometry → LatticeBounds → stage search → FieldOfViewCap → AmbiguityEvaluator
//! ```
//!
//! The search does not depend on the look direction, so one [`SearchOutcome`] can be
//! evaluated against as many field-of-view caps as needed.
//!
//! ## Example
//!
//! ```rust
//! use std::f64::consts::FRAC_PI_2;
//! use fringe::prelude::*;
//!
//! let coords = [[1.0, 0.0], [0.0, 1.0], [-1.0, 0.0], [0.0, -1.0], [0.0, 0.0]];
//! let geometry = ArrayGeometry::new(&coords, 4).unwrap();
//! let analysis = AmbiguityAnalysis::new(geometry, SearchParams::default());
//!
//! let outcome = analysis.search().unwrap();
//! let cap = FieldOfViewCap::from_look_direction(60.0, 45.0, FRAC_PI_2).unwrap();
//! let report = analysis.evaluate(&outcome, &cap).unwrap();
//! assert_eq!(report.cap_indices.len(), 3);
//! ```
use tracing::info;

use crate::ambiguity::AmbiguityEvaluator;
use crate::cap::FieldOfViewCap;
use crate::fringe_errors::FringeError;
use crate::geometry::ArrayGeometry;
use crate::report::AmbiguityReport;
use crate::search::engine::{run_search_with_cancel, SearchOutcome};
use crate::search::SearchParams;

/// An array geometry with its search configuration.
#[derive(Debug, Clone)]
pub struct AmbiguityAnalysis {
    geometry: ArrayGeometry,
    params: SearchParams,
}

impl AmbiguityAnalysis {
    pub fn new(geometry: ArrayGeometry, params: SearchParams) -> Self {
        AmbiguityAnalysis { geometry, params }
    }

    #[inline]
    pub fn geometry(&self) -> &ArrayGeometry {
        &self.geometry
    }

    #[inline]
    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    /// Run every stage of the plane-intersection search.
    pub fn search(&self) -> Result<SearchOutcome, FringeError> {
        self.search_with_cancel(|| false)
    }

    /// Same as [`AmbiguityAnalysis::search`], interrupted when `should_cancel` returns `true`.
    pub fn search_with_cancel<F>(&self, should_cancel: F) -> Result<SearchOutcome, FringeError>
    where
        F: Fn() -> bool + Sync,
    {
        info!(params = %self.params, "starting ambiguity search");
        run_search_with_cancel(&self.geometry, &self.params, should_cancel)
    }

    /// Filter the final survivors by `cap` and evaluate the visible ambiguities.
    ///
    /// Arguments
    /// -----------------
    /// * `outcome`: result of [`AmbiguityAnalysis::search`] on this geometry.
    /// * `cap`: look direction and scan cone.
    ///
    /// Return
    /// ----------
    /// * The ambiguity report; directions beyond the horizon are listed as rejected.
    pub fn evaluate(
        &self,
        outcome: &SearchOutcome,
        cap: &FieldOfViewCap,
    ) -> Result<AmbiguityReport, FringeError> {
        let cap_indices = cap.filter(&outcome.survivors);
        AmbiguityEvaluator::new(&self.geometry, cap).evaluate(&outcome.survivors, &cap_indices)
    }
}
