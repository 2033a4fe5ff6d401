//! # Plane-intersection search parameters
//!
//! This module defines the [`SearchParams`] configuration struct and its builder, which
//! control how the **stage-by-stage plane-intersection search** prunes candidates,
//! how many workers evaluate a stage, and how long a stage may run.
//!
//! ## Pipeline overview
//!
//! 1. **Seed stage** (baselines `0, 1, 2`)
//!    The full Cartesian product of the first three offset ranges is solved.
//!    Candidates are kept when `residual < tolerance` **and** the solution norm lies in
//!    `(0, max_seed_norm]`.
//!
//! 2. **Extension stages** (baselines `0..=ii` for `ii = 3 … Sn − 1`)
//!    Every survivor is extended with each offset of baseline `ii` and re-solved.
//!    Candidates are kept when `residual < tolerance`; the norm bound is re-applied only
//!    under [`NormBound::EveryStage`].
//!
//! 3. **Evaluation**
//!    With `workers > 1`, each stage's candidate list is cut into contiguous chunks
//!    evaluated on a rayon pool; results are written into disjoint slices of a
//!    pre-sized buffer, so the output order never depends on scheduling.
//!
//! ## Example
//!
//! ```rust
//! use fringe::search::{NormBound, SearchParams};
//!
//! let params = SearchParams::builder()
//!     .tolerance(0.05)
//!     .max_seed_norm(2.0)
//!     .norm_bound(NormBound::EveryStage)
//!     .workers(4)
//!     .build()
//!     .unwrap();
//! assert_eq!(params.workers, 4);
//! ```
//!
//! ## See also
//!
//! * [`stage`] – the stage state machine and its transition function.
//! * [`engine`] – the driver running every stage with cancellation and deadlines.
use std::cmp::Ordering::{Equal, Greater};
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_SEED_NORM, DEFAULT_PINV_RCOND, DEFAULT_TOLERANCE};
use crate::fringe_errors::FringeError;

pub mod engine;
pub mod stage;

#[cfg(feature = "progress")]
pub(crate) mod throughput;

/// Stages at which the solution-norm bound `(0, max_seed_norm]` is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NormBound {
    /// Only the seed stage filters on the norm.
    #[default]
    SeedStageOnly,
    /// Every stage filters on the norm.
    EveryStage,
}

/// Configuration of the plane-intersection search.
///
/// Fields
/// -----------------
/// * `tolerance` – residual threshold; a candidate survives when `residual < tolerance`.
/// * `max_seed_norm` – upper bound of the solution norm at the seed stage; the norm must
///   also be strictly positive, which discards the true direction itself.
/// * `norm_bound` – whether the norm bound is re-applied at every extension stage.
/// * `workers` – number of workers evaluating a stage (`1` runs sequentially).
/// * `pinv_rcond` – relative singular-value cutoff of the pseudo-inverse.
/// * `stage_deadline` – optional wall-clock limit per stage.
///
/// Defaults
/// -----------------
/// * `tolerance`: 0.1
/// * `max_seed_norm`: 2.0
/// * `norm_bound`: [`NormBound::SeedStageOnly`]
/// * `workers`: 1
/// * `pinv_rcond`: 1e-15
/// * `stage_deadline`: none
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    pub tolerance: f64,
    pub max_seed_norm: f64,
    pub norm_bound: NormBound,
    pub workers: usize,
    pub pinv_rcond: f64,
    pub stage_deadline: Option<Duration>,
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new [`SearchParamsBuilder`] initialized with the defaults.
    pub fn builder() -> SearchParamsBuilder {
        SearchParamsBuilder::new()
    }

    /// Whether the norm bound applies at a stage including `n_planes` baselines.
    #[inline]
    pub(crate) fn norm_bound_applies(&self, n_planes: usize) -> bool {
        match self.norm_bound {
            NormBound::SeedStageOnly => n_planes == crate::constants::SEED_BASELINES,
            NormBound::EveryStage => true,
        }
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            tolerance: DEFAULT_TOLERANCE,
            max_seed_norm: DEFAULT_MAX_SEED_NORM,
            norm_bound: NormBound::SeedStageOnly,
            workers: 1,
            pinv_rcond: DEFAULT_PINV_RCOND,
            stage_deadline: None,
        }
    }
}

/// Builder for [`SearchParams`], with validation.
#[derive(Debug, Clone, Default)]
pub struct SearchParamsBuilder {
    params: SearchParams,
}

impl SearchParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: SearchParams::default(),
        }
    }

    pub fn tolerance(mut self, v: f64) -> Self {
        self.params.tolerance = v;
        self
    }
    pub fn max_seed_norm(mut self, v: f64) -> Self {
        self.params.max_seed_norm = v;
        self
    }
    pub fn norm_bound(mut self, v: NormBound) -> Self {
        self.params.norm_bound = v;
        self
    }
    pub fn workers(mut self, v: usize) -> Self {
        self.params.workers = v;
        self
    }
    pub fn pinv_rcond(mut self, v: f64) -> Self {
        self.params.pinv_rcond = v;
        self
    }
    pub fn stage_deadline(mut self, v: Duration) -> Self {
        self.params.stage_deadline = Some(v);
        self
    }

    /// Return true iff x > 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn gt0(x: f64) -> bool {
        x.partial_cmp(&0.0) == Some(Greater)
    }

    /// Return true iff x >= 0.0 and comparable (i.e., not NaN).
    #[inline]
    fn ge0(x: f64) -> bool {
        matches!(x.partial_cmp(&0.0), Some(Greater) | Some(Equal))
    }

    /// Finalize the builder and produce a [`SearchParams`] instance.
    ///
    /// Validation rules
    /// -----------------
    /// * `tolerance > 0` – a zero tolerance can never be passed with `residual < tolerance`.
    /// * `max_seed_norm > 0`.
    /// * `workers ≥ 1`.
    /// * `pinv_rcond ≥ 0` and finite.
    /// * `stage_deadline`, when set, is non-zero.
    ///
    /// Return
    /// ----------
    /// * `Ok(SearchParams)` if all values are valid.
    /// * `Err(FringeError::InvalidSearchParameter)` otherwise.
    pub fn build(self) -> Result<SearchParams, FringeError> {
        let p = &self.params;

        if !Self::gt0(p.tolerance) {
            return Err(FringeError::InvalidSearchParameter(
                "tolerance must be > 0".into(),
            ));
        }
        if !Self::gt0(p.max_seed_norm) {
            return Err(FringeError::InvalidSearchParameter(
                "max_seed_norm must be > 0".into(),
            ));
        }
        if p.workers == 0 {
            return Err(FringeError::InvalidSearchParameter(
                "workers must be >= 1".into(),
            ));
        }
        if !Self::ge0(p.pinv_rcond) || !p.pinv_rcond.is_finite() {
            return Err(FringeError::InvalidSearchParameter(
                "pinv_rcond must be finite and >= 0".into(),
            ));
        }
        if p.stage_deadline == Some(Duration::ZERO) {
            return Err(FringeError::InvalidSearchParameter(
                "stage_deadline must be non-zero".into(),
            ));
        }

        Ok(self.params)
    }
}

impl fmt::Display for SearchParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            const PARAM_COL: usize = 40;
            writeln!(f, "Plane-intersection search parameters")?;
            writeln!(f, "------------------------------------")?;

            macro_rules! line {
                ($fmt:expr, $val:expr, $comment:expr) => {{
                    let s = format!($fmt, $val);
                    let pad = if s.len() < PARAM_COL {
                        " ".repeat(PARAM_COL - s.len())
                    } else {
                        " ".to_string()
                    };
                    writeln!(f, "  {}{}# {}", s, pad, $comment)
                }};
            }

            line!(
                "tolerance      = {:.3e}",
                self.tolerance,
                "Residual threshold for consistency"
            )?;
            line!(
                "max_seed_norm  = {:.3}",
                self.max_seed_norm,
                "Upper bound of the solution norm"
            )?;
            line!(
                "norm_bound     = {:?}",
                self.norm_bound,
                "Stages enforcing the norm bound"
            )?;
            line!(
                "workers        = {}",
                self.workers,
                "Workers per stage (1 = sequential)"
            )?;
            line!(
                "pinv_rcond     = {:.1e}",
                self.pinv_rcond,
                "Relative singular-value cutoff"
            )?;
            match self.stage_deadline {
                Some(d) => line!("stage_deadline = {:?}", d, "Wall-clock limit per stage")?,
                None => line!("stage_deadline = {}", "none", "Wall-clock limit per stage")?,
            }
            Ok(())
        } else {
            write!(
                f,
                "SearchParams(tol={:.3e}, max_seed_norm={:.2}, norm_bound={:?}, workers={})",
                self.tolerance, self.max_seed_norm, self.norm_bound, self.workers
            )
        }
    }
}
