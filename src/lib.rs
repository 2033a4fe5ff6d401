//! # fringe
//!
//! Direction-of-arrival ambiguity search for sparse multi-baseline phased arrays.
//!
//! Given the planar positions of the antenna sub-groups (in wavelengths), the crate finds
//! the integer fringe combinations whose ambiguity planes meet across **every** baseline,
//! keeps those inside the field of view, and measures how close each ambiguous direction
//! is to the true look direction in terms of the array response.
//!
//! ## Pipeline
//!
//! 1. [`geometry`] – baselines `R_j`, unit normals and linear coefficients `K_j`.
//! 2. [`lattice`] – admissible fringe offsets per baseline.
//! 3. [`plane_system`] – pseudo-inverse solve of a plane intersection and its residual.
//! 4. [`search`] – staged pruning search, sequential or on a worker pool.
//! 5. [`cap`] – field-of-view filter.
//! 6. [`ambiguity`] – steering responses and ambiguity distances.
//!
//! [`analysis::AmbiguityAnalysis`] runs the whole chain.
//!
//! ## Features
//!
//! * `progress` – progress bar over the search stages (indicatif).
pub mod ambiguity;
pub mod analysis;
pub mod cap;
pub mod constants;
pub mod fringe_errors;
pub mod geometry;
pub mod lattice;
pub mod plane_system;
pub mod report;
pub mod search;

pub mod prelude {
    pub use crate::ambiguity::{AmbiguityEvaluator, AmbiguityRecord};
    pub use crate::analysis::AmbiguityAnalysis;
    pub use crate::cap::FieldOfViewCap;
    pub use crate::fringe_errors::FringeError;
    pub use crate::geometry::ArrayGeometry;
    pub use crate::lattice::LatticeBounds;
    pub use crate::report::AmbiguityReport;
    pub use crate::search::engine::{run_search, SearchOutcome};
    pub use crate::search::{NormBound, SearchParams};
}
