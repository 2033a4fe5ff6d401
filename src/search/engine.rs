//! # Search driver
//!
//! Runs the whole plane-intersection search, stage after stage, and evaluates the
//! candidates of each stage either sequentially or on a worker pool.
//!
//! ## Execution model
//! -----------------
//! * Stages are strictly sequential: a stage starts only after every worker of the
//!   previous one has joined.
//! * Inside a stage, the candidate list is cut into `workers` contiguous chunks. Each
//!   worker solves its chunk and writes into the matching slice of a pre-sized
//!   solution buffer. Slices never overlap, so no lock is taken, and the buffer order
//!   is the candidate order whatever the scheduling. Sequential and parallel runs are
//!   therefore bit-identical.
//! * `W` and `W⁺` are built once per stage and shared read-only by all workers.
//!
//! ## Cancellation and deadlines
//! -----------------
//! [`run_search_with_cancel`] calls a user-provided `should_cancel()` before each
//! candidate evaluation; when it returns `true` the current stage fails with
//! [`FringeError::Cancelled`]. A per-stage deadline
//! ([`SearchParams::stage_deadline`]) is checked at the same points.
//!
//! ## Error semantics
//! -----------------
//! * Any worker error (cancellation, deadline) aborts the stage; the partial buffer is
//!   dropped and the error is returned to the caller at the join point.
//! * A panicking worker is caught at the join point and reported as
//!   [`FringeError::WorkerPanicked`]; the stage results are discarded.
//!
//! ## Example
//! -----------------
//! ```rust
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use fringe::geometry::ArrayGeometry;
//! use fringe::search::{engine::run_search_with_cancel, SearchParams};
//!
//! let coords = [[1.0, 0.0], [0.0, 1.0], [-1.0, 0.0], [0.0, -1.0], [0.0, 0.0]];
//! let geometry = ArrayGeometry::new(&coords, 4).unwrap();
//! let params = SearchParams::builder().workers(2).max_seed_norm(2.2).build().unwrap();
//!
//! let stop = AtomicBool::new(false);
//! let outcome = run_search_with_cancel(&geometry, &params, || stop.load(Ordering::Relaxed)).unwrap();
//! assert_eq!(outcome.survivors_per_stage(), vec![12, 12]);
//! ```
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use comfy_table::{presets::UTF8_FULL, Cell, CellAlignment, ContentArrangement, Row, Table};
use rayon::prelude::*;
use rayon::ThreadPool;

#[cfg(feature = "progress")]
use super::throughput::{fmt_dur, fmt_rate, ThroughputMeter};
use super::stage::{Stage, StageSearch, SurvivorSet};
use super::SearchParams;
use crate::fringe_errors::FringeError;
use crate::geometry::ArrayGeometry;
use crate::lattice::LatticeBounds;
use crate::plane_system::{Candidate, PlaneSystem, Solution};

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

/// Per-stage checks run between candidate evaluations.
pub(crate) struct StageControl<'c, F> {
    stage: usize,
    started: Instant,
    deadline: Option<Duration>,
    should_cancel: &'c F,
}

impl<'c, F> StageControl<'c, F>
where
    F: Fn() -> bool + Sync,
{
    pub(crate) fn new(
        stage: usize,
        started: Instant,
        deadline: Option<Duration>,
        should_cancel: &'c F,
    ) -> Self {
        StageControl {
            stage,
            started,
            deadline,
            should_cancel,
        }
    }

    #[inline]
    fn check(&self) -> Result<(), FringeError> {
        if (self.should_cancel)() {
            return Err(FringeError::Cancelled { stage: self.stage });
        }
        if let Some(limit) = self.deadline {
            if self.started.elapsed() > limit {
                return Err(FringeError::StageDeadlineExceeded {
                    stage: self.stage,
                    limit,
                });
            }
        }
        Ok(())
    }
}

fn solve_chunk<F>(
    system: &PlaneSystem,
    candidates: &[Candidate],
    out: &mut [Solution],
    control: &StageControl<'_, F>,
) -> Result<(), FringeError>
where
    F: Fn() -> bool + Sync,
{
    for (candidate, slot) in candidates.iter().zip(out.iter_mut()) {
        control.check()?;
        *slot = system.solve(candidate);
    }
    Ok(())
}

/// Solve every candidate of a stage, in candidate order.
///
/// Arguments
/// -----------------
/// * `system`: the stage's plane system (`W`, `W⁺`).
/// * `candidates`: the stage's candidates.
/// * `pool`: worker pool; `None` evaluates on the calling thread.
/// * `control`: cancellation hook and deadline of the stage.
///
/// Return
/// ----------
/// * One [`Solution`] per candidate, at the candidate's index.
pub(crate) fn evaluate<F>(
    system: &PlaneSystem,
    candidates: &[Candidate],
    pool: Option<&ThreadPool>,
    control: &StageControl<'_, F>,
) -> Result<Vec<Solution>, FringeError>
where
    F: Fn() -> bool + Sync,
{
    let mut solutions = vec![Solution::default(); candidates.len()];

    match pool {
        None => solve_chunk(system, candidates, &mut solutions, control)?,
        Some(pool) => {
            let workers = pool.current_num_threads().max(1);
            let chunk = candidates.len().div_ceil(workers).max(1);

            let joined = panic::catch_unwind(AssertUnwindSafe(|| {
                pool.install(|| {
                    solutions
                        .par_chunks_mut(chunk)
                        .zip(candidates.par_chunks(chunk))
                        .try_for_each(|(out, batch)| solve_chunk(system, batch, out, control))
                })
            }));

            match joined {
                Ok(result) => result?,
                Err(_) => {
                    return Err(FringeError::WorkerPanicked {
                        stage: control.stage,
                    })
                }
            }
        }
    }

    Ok(solutions)
}

/// Summary of one completed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageReport {
    /// Number of baselines included (stage label, `3 … Sn`).
    pub n_baselines: usize,
    pub candidates: usize,
    pub survivors: usize,
    pub elapsed: Duration,
}

impl From<&Stage> for StageReport {
    fn from(stage: &Stage) -> Self {
        StageReport {
            n_baselines: stage.n_baselines(),
            candidates: stage.candidates_evaluated,
            survivors: stage.survivors_out.len(),
            elapsed: stage.elapsed,
        }
    }
}

/// Result of a complete search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub bounds: LatticeBounds,
    pub stages: Vec<StageReport>,
    /// Survivors of the terminal stage.
    pub survivors: SurvivorSet,
}

impl SearchOutcome {
    /// Survivor count of every stage, from the seed stage (3 baselines) to `Sn`.
    pub fn survivors_per_stage(&self) -> Vec<usize> {
        self.stages.iter().map(|s| s.survivors).collect()
    }

    /// Total number of candidates solved over all stages.
    pub fn total_candidates(&self) -> usize {
        self.stages.iter().map(|s| s.candidates).sum()
    }
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic);

            table.set_header(vec![
                Cell::new("Baselines"),
                Cell::new("Candidates"),
                Cell::new("Survivors"),
                Cell::new("Elapsed"),
            ]);

            for s in &self.stages {
                table.add_row(Row::from(vec![
                    Cell::new(s.n_baselines).set_alignment(CellAlignment::Right),
                    Cell::new(s.candidates).set_alignment(CellAlignment::Right),
                    Cell::new(s.survivors).set_alignment(CellAlignment::Right),
                    Cell::new(format!("{:?}", s.elapsed)).set_alignment(CellAlignment::Right),
                ]));
            }

            writeln!(f, "k_len = {:?}", self.bounds.k_len())?;
            write!(f, "{table}")
        } else {
            write!(
                f,
                "SearchOutcome(stages={}, candidates={}, survivors={:?})",
                self.stages.len(),
                self.total_candidates(),
                self.survivors_per_stage()
            )
        }
    }
}

/// Run every stage of the search.
///
/// See also
/// ------------
/// * [`run_search_with_cancel`] – same, with a cancellation hook.
pub fn run_search(
    geometry: &ArrayGeometry,
    params: &SearchParams,
) -> Result<SearchOutcome, FringeError> {
    run_search_with_cancel(geometry, params, || false)
}

/// Run every stage of the search, polling `should_cancel` between candidate evaluations.
///
/// Arguments
/// -----------------
/// * `geometry`: the array geometry (at least 3 baselines).
/// * `params`: validated search parameters.
/// * `should_cancel`: returns `true` to interrupt the search; shared by all workers.
///
/// Return
/// ----------
/// * The per-stage reports and the survivors of the terminal stage, or the first error.
pub fn run_search_with_cancel<F>(
    geometry: &ArrayGeometry,
    params: &SearchParams,
    should_cancel: F,
) -> Result<SearchOutcome, FringeError>
where
    F: Fn() -> bool + Sync,
{
    let search = StageSearch::new(geometry, params)?;
    let n_baselines = geometry.n_baselines();

    #[cfg(feature = "progress")]
    let pb = {
        let pb = ProgressBar::new((n_baselines - 2) as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{bar:40.cyan/blue} stage {pos}/{len} | ETA {eta_precise} | {msg}",
        ) {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(200));
        pb
    };
    #[cfg(feature = "progress")]
    let mut meter = ThroughputMeter::new(0.5);

    let mut stage = search.seed_with_cancel(&should_cancel)?;
    let mut stages = vec![StageReport::from(&stage)];

    loop {
        #[cfg(feature = "progress")]
        {
            let report = stages[stages.len() - 1];
            let rate = meter.record(report.candidates, report.elapsed);
            let mut msg = format!(
                "stage {}: {} candidates in {}",
                report.n_baselines,
                report.candidates,
                fmt_dur(report.elapsed)
            );
            if let Some(rate) = rate {
                msg.push_str(&format!(" ({})", fmt_rate(rate)));
            }
            msg.push_str(&format!(", survivors: {}", report.survivors));
            if !stage.is_terminal(n_baselines) {
                let next = stage.survivors_out.len()
                    * search.bounds().k_len()[stage.n_baselines()] as usize;
                if let Some(eta) = meter.estimate(next) {
                    msg.push_str(&format!(", next ~{}", fmt_dur(eta)));
                }
            }
            pb.set_message(msg);
            pb.inc(1);
        }

        if stage.is_terminal(n_baselines) {
            break;
        }
        stage = search.advance_with_cancel(stage, &should_cancel)?;
        stages.push(StageReport::from(&stage));
    }

    #[cfg(feature = "progress")]
    pb.finish_and_clear();

    Ok(SearchOutcome {
        bounds: search.bounds().clone(),
        stages,
        survivors: stage.survivors_out,
    })
}
