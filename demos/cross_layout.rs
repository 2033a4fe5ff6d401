use std::f64::consts::FRAC_PI_4;

use fringe::fringe_errors::FringeError;
use fringe::prelude::*;

/// Ambiguities of a five-element cross with unequal arms, looking 60° up towards
/// azimuth 30° with a 45° scan cone.
fn main() -> Result<(), FringeError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let coords = [[0.0, 2.0], [0.0, -2.5], [-2.0, 0.0], [2.5, 0.0], [0.0, 0.0]];
    let geometry = ArrayGeometry::new(&coords, 4)?;
    let params = SearchParams::builder()
        .tolerance(0.1)
        .workers(std::thread::available_parallelism().map_or(1, |n| n.get()))
        .build()?;
    println!("{params:#}");

    let analysis = AmbiguityAnalysis::new(geometry, params);
    let outcome = analysis.search()?;
    println!("{outcome:#}");

    let cap = FieldOfViewCap::from_look_direction(60.0, 30.0, FRAC_PI_4)?;
    let report = analysis.evaluate(&outcome, &cap)?;
    println!("{report:#}");
    println!("{report}");
    Ok(())
}
