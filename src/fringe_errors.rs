use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FringeError {
    #[error("Invalid array geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid array geometry: baseline {index} has zero length")]
    DegenerateBaseline { index: usize },

    #[error("Invalid search parameter: {0}")]
    InvalidSearchParameter(String),

    #[error("Invalid field-of-view cap parameter: {0}")]
    InvalidCapParameter(String),

    #[error(
        "Direction cosines outside the visible hemisphere for ambiguity {index} (x² + y² = {radius_sq})"
    )]
    Domain { index: usize, radius_sq: f64 },

    #[error("Pseudo-inverse computation failed: {0}")]
    PseudoInverse(String),

    #[error("Dimension mismatch: matrix has {rows} rows but right-hand side has {len} entries")]
    DimensionMismatch { rows: usize, len: usize },

    #[error("Survivor index {index} out of range for {len} survivors")]
    SurvivorIndexOutOfRange { index: usize, len: usize },

    #[error("Unable to build the worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("A worker panicked while evaluating stage {stage}; stage results discarded")]
    WorkerPanicked { stage: usize },

    #[error("All {baselines} baselines are already included; no stage left to run")]
    SearchComplete { baselines: usize },

    #[error("Search cancelled during stage {stage}")]
    Cancelled { stage: usize },

    #[error("Stage {stage} exceeded its deadline of {limit:?}")]
    StageDeadlineExceeded { stage: usize, limit: Duration },

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl PartialEq for FringeError {
    fn eq(&self, other: &Self) -> bool {
        use FringeError::*;
        match (self, other) {
            (InvalidGeometry(a), InvalidGeometry(b)) => a == b,
            (DegenerateBaseline { index: a }, DegenerateBaseline { index: b }) => a == b,
            (InvalidSearchParameter(a), InvalidSearchParameter(b)) => a == b,
            (InvalidCapParameter(a), InvalidCapParameter(b)) => a == b,
            (
                Domain {
                    index: a,
                    radius_sq: ra,
                },
                Domain {
                    index: b,
                    radius_sq: rb,
                },
            ) => a == b && ra == rb,
            (PseudoInverse(a), PseudoInverse(b)) => a == b,
            (DimensionMismatch { rows: a, len: la }, DimensionMismatch { rows: b, len: lb }) => {
                a == b && la == lb
            }
            (
                SurvivorIndexOutOfRange { index: a, len: la },
                SurvivorIndexOutOfRange { index: b, len: lb },
            ) => a == b && la == lb,
            (WorkerPanicked { stage: a }, WorkerPanicked { stage: b }) => a == b,
            (SearchComplete { baselines: a }, SearchComplete { baselines: b }) => a == b,
            (Cancelled { stage: a }, Cancelled { stage: b }) => a == b,
            (
                StageDeadlineExceeded { stage: a, limit: la },
                StageDeadlineExceeded { stage: b, limit: lb },
            ) => a == b && la == lb,

            // Not comparable: equal when the variant matches
            (ThreadPool(_), ThreadPool(_)) => true,
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,

            _ => false,
        }
    }
}
