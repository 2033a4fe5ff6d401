//! # Stage state machine
//!
//! The plane-intersection search is a sequence of **stages**. A stage includes the
//! baselines `0..n` and holds
//!
//! * `survivors_in` – the previous stage's survivors it was seeded from,
//! * `survivors_out` – its own survivors, i.e. the candidates whose planes meet.
//!
//! [`StageSearch::seed`] builds the first stage (`n = 3`) from the full Cartesian product
//! of the first three offset ranges. [`StageSearch::advance`] is the transition
//! `stage(n) → stage(n + 1)`: every survivor of `stage(n)` is extended with each offset
//! of baseline `n`, the extended candidates are solved against the planes of
//! baselines `0..=n`, and the consistent ones become the survivors of the next stage.
//!
//! `advance` consumes the stage it extends. The only state carried from one stage to
//! the next is its survivor set; candidate buffers are allocated per stage.
//!
//! ## Example
//!
//! ```rust
//! use fringe::geometry::ArrayGeometry;
//! use fringe::search::{stage::StageSearch, SearchParams};
//!
//! let coords = [[1.0, 0.0], [0.0, 1.0], [-1.0, 0.0], [0.0, -1.0], [0.0, 0.0]];
//! let geometry = ArrayGeometry::new(&coords, 4).unwrap();
//! let params = SearchParams::default();
//! let search = StageSearch::new(&geometry, &params).unwrap();
//!
//! let seed = search.seed().unwrap();
//! assert_eq!(seed.candidates_evaluated, 125);
//! let last = search.advance(seed).unwrap();
//! assert!(last.is_terminal(geometry.n_baselines()));
//! ```
use std::ops::Range;
use std::time::{Duration, Instant};

use itertools::Itertools;
use nalgebra::{DVector, Vector3};
use rayon::ThreadPool;
use tracing::{debug, info, warn};

use super::engine::{evaluate, StageControl};
use super::SearchParams;
use crate::constants::SEED_BASELINES;
use crate::fringe_errors::FringeError;
use crate::geometry::ArrayGeometry;
use crate::lattice::LatticeBounds;
use crate::plane_system::{Candidate, PlaneSystem, Solution};

/// A candidate that passed the pruning of its stage, with its solution.
#[derive(Debug, Clone, PartialEq)]
pub struct Survivor {
    pub candidate: Candidate,
    pub solution: Solution,
}

/// Ordered survivors of one stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SurvivorSet {
    survivors: Vec<Survivor>,
}

impl SurvivorSet {
    #[inline]
    pub fn len(&self) -> usize {
        self.survivors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.survivors.is_empty()
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, Survivor> {
        self.survivors.iter()
    }

    #[inline]
    pub fn as_slice(&self) -> &[Survivor] {
        &self.survivors
    }

    #[inline]
    pub fn get(&self, i: usize) -> Option<&Survivor> {
        self.survivors.get(i)
    }

    /// Solution points, in survivor order.
    pub fn points(&self) -> impl Iterator<Item = &Vector3<f64>> + '_ {
        self.survivors.iter().map(|s| &s.solution.point)
    }

    /// Integer ambiguity vector `(R_jᵀ·x)_j` of every survivor.
    pub fn ambiguity_integers(&self, geometry: &ArrayGeometry) -> Vec<DVector<f64>> {
        let phase_centers = geometry.phase_centers();
        self.survivors
            .iter()
            .map(|s| s.solution.ambiguity_integers(&phase_centers))
            .collect()
    }

    /// Same as [`SurvivorSet::ambiguity_integers`], with a leading zero for the reference sub-group.
    pub fn complete_ambiguity_integers(&self, geometry: &ArrayGeometry) -> Vec<DVector<f64>> {
        self.ambiguity_integers(geometry)
            .into_iter()
            .map(|v| v.insert_row(0, 0.0))
            .collect()
    }

    pub fn into_vec(self) -> Vec<Survivor> {
        self.survivors
    }
}

impl FromIterator<Survivor> for SurvivorSet {
    fn from_iter<T: IntoIterator<Item = Survivor>>(iter: T) -> Self {
        SurvivorSet {
            survivors: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a SurvivorSet {
    type Item = &'a Survivor;
    type IntoIter = std::slice::Iter<'a, Survivor>;

    fn into_iter(self) -> Self::IntoIter {
        self.survivors.iter()
    }
}

/// One completed stage of the search.
#[derive(Debug, Clone)]
pub struct Stage {
    /// Baselines included in this stage.
    pub baseline_range: Range<usize>,
    /// Survivors of the previous stage (empty for the seed stage).
    pub survivors_in: SurvivorSet,
    /// Survivors of this stage.
    pub survivors_out: SurvivorSet,
    pub candidates_evaluated: usize,
    pub elapsed: Duration,
}

impl Stage {
    /// Number of baselines included, which is also the stage label (`3 … Sn`).
    #[inline]
    pub fn n_baselines(&self) -> usize {
        self.baseline_range.end
    }

    /// `true` once every baseline of the array is included.
    #[inline]
    pub fn is_terminal(&self, total_baselines: usize) -> bool {
        self.baseline_range.end >= total_baselines
    }
}

/// Full Cartesian product of the offset ranges of the first three baselines.
pub fn seed_candidates(bounds: &LatticeBounds) -> Vec<Candidate> {
    (0..SEED_BASELINES)
        .map(|j| bounds.offsets(j))
        .multi_cartesian_product()
        .map(Candidate::from_iter)
        .collect()
}

/// Every survivor extended with each offset of baseline `j`, survivor-major.
pub fn extend_candidates(survivors: &SurvivorSet, bounds: &LatticeBounds, j: usize) -> Vec<Candidate> {
    survivors
        .iter()
        .cartesian_product(bounds.offsets(j))
        .map(|(s, k)| s.candidate.extended(k))
        .collect()
}

/// Stage transitions over a fixed geometry and parameter set.
pub struct StageSearch<'a> {
    geometry: &'a ArrayGeometry,
    params: &'a SearchParams,
    bounds: LatticeBounds,
    pool: Option<ThreadPool>,
}

impl<'a> StageSearch<'a> {
    /// Prepare the search: lattice bounds and, when `params.workers > 1`, the worker pool.
    pub fn new(geometry: &'a ArrayGeometry, params: &'a SearchParams) -> Result<Self, FringeError> {
        let bounds = LatticeBounds::from_geometry(geometry);
        debug!(
            baselines = geometry.n_baselines(),
            k_len = ?bounds.k_len(),
            seed_candidates = bounds.seed_candidates(),
            "lattice bounds computed"
        );

        let pool = if params.workers > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(params.workers)
                    .thread_name(|i| format!("fringe-worker-{i}"))
                    .build()?,
            )
        } else {
            None
        };

        Ok(StageSearch {
            geometry,
            params,
            bounds,
            pool,
        })
    }

    #[inline]
    pub fn bounds(&self) -> &LatticeBounds {
        &self.bounds
    }

    #[inline]
    pub fn params(&self) -> &SearchParams {
        self.params
    }

    /// Run the seed stage over baselines `0, 1, 2`.
    pub fn seed(&self) -> Result<Stage, FringeError> {
        self.seed_with_cancel(&|| false)
    }

    /// Extend `stage` by one baseline.
    ///
    /// Return
    /// ----------
    /// * The next stage, or [`FringeError::SearchComplete`] if `stage` already includes
    ///   every baseline.
    pub fn advance(&self, stage: Stage) -> Result<Stage, FringeError> {
        self.advance_with_cancel(stage, &|| false)
    }

    /// [`StageSearch::seed`] with a cancellation hook checked between candidate evaluations.
    pub fn seed_with_cancel<F>(&self, should_cancel: &F) -> Result<Stage, FringeError>
    where
        F: Fn() -> bool + Sync,
    {
        let candidates = seed_candidates(&self.bounds);
        self.run_stage(0..SEED_BASELINES, SurvivorSet::default(), candidates, should_cancel)
    }

    /// [`StageSearch::advance`] with a cancellation hook checked between candidate evaluations.
    pub fn advance_with_cancel<F>(&self, stage: Stage, should_cancel: &F) -> Result<Stage, FringeError>
    where
        F: Fn() -> bool + Sync,
    {
        let next = stage.baseline_range.end;
        if next >= self.geometry.n_baselines() {
            return Err(FringeError::SearchComplete {
                baselines: self.geometry.n_baselines(),
            });
        }

        let survivors_in = stage.survivors_out;
        let candidates = extend_candidates(&survivors_in, &self.bounds, next);
        self.run_stage(0..next + 1, survivors_in, candidates, should_cancel)
    }

    fn run_stage<F>(
        &self,
        baseline_range: Range<usize>,
        survivors_in: SurvivorSet,
        candidates: Vec<Candidate>,
        should_cancel: &F,
    ) -> Result<Stage, FringeError>
    where
        F: Fn() -> bool + Sync,
    {
        let started = Instant::now();
        let label = baseline_range.end;
        let indices: Vec<usize> = baseline_range.clone().collect();
        let system =
            PlaneSystem::with_rcond(self.geometry, &self.bounds, &indices, self.params.pinv_rcond)?;

        let control = StageControl::new(label, started, self.params.stage_deadline, should_cancel);
        let solutions = evaluate(&system, &candidates, self.pool.as_ref(), &control)?;

        let candidates_evaluated = candidates.len();
        let survivors_out: SurvivorSet = candidates
            .into_iter()
            .zip(solutions)
            .filter(|(_, solution)| self.keep(label, solution))
            .map(|(candidate, solution)| Survivor {
                candidate,
                solution,
            })
            .collect();

        let elapsed = started.elapsed();
        info!(
            stage = label,
            candidates = candidates_evaluated,
            survivors = survivors_out.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "stage completed"
        );
        if survivors_out.is_empty() {
            warn!(stage = label, "no consistent plane intersection left");
        }

        Ok(Stage {
            baseline_range,
            survivors_in,
            survivors_out,
            candidates_evaluated,
            elapsed,
        })
    }

    fn keep(&self, n_planes: usize, solution: &Solution) -> bool {
        if !solution.is_consistent(self.params.tolerance) {
            return false;
        }
        if self.params.norm_bound_applies(n_planes) {
            let norm = solution.norm();
            norm > 0.0 && norm <= self.params.max_seed_norm
        } else {
            true
        }
    }
}
