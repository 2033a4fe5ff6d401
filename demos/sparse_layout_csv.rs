use std::env;
use std::f64::consts::FRAC_PI_2;

use camino::Utf8PathBuf;
use fringe::fringe_errors::FringeError;
use fringe::prelude::*;

/// Read a layout from CSV (`x,y` in wavelengths, reference first), run the analysis
/// for a zenith look direction and write one CSV row per ambiguity.
///
/// Usage: `cargo run --example sparse_layout_csv [layout.csv] [out.csv]`
fn main() -> Result<(), FringeError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut args = env::args().skip(1);
    let layout = args
        .next()
        .map(Utf8PathBuf::from)
        .unwrap_or_else(|| Utf8PathBuf::from("demos/data/sparse_layout.csv"));
    let output = args
        .next()
        .map(Utf8PathBuf::from)
        .unwrap_or_else(|| Utf8PathBuf::from("ambiguities.csv"));

    let geometry = ArrayGeometry::from_csv(&layout, 0)?;
    println!(
        "{} baselines, k_len = {:?}",
        geometry.n_baselines(),
        LatticeBounds::from_geometry(&geometry).k_len()
    );

    let params = SearchParams::builder().tolerance(0.15).workers(4).build()?;
    let analysis = AmbiguityAnalysis::new(geometry, params);
    let outcome = analysis.search()?;
    println!("{outcome:#}");

    let cap = FieldOfViewCap::from_look_direction(90.0, 0.0, FRAC_PI_2)?;
    let report = analysis.evaluate(&outcome, &cap)?;
    println!("{report}");
    if let Some(worst) = report.closest() {
        println!(
            "closest ambiguity: survivor {} at distance {:.4}",
            worst.survivor_index, worst.distance
        );
    }

    report.write_csv(&output)?;
    println!("written to {output}");
    Ok(())
}
