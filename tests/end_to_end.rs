mod common;

use std::f64::consts::FRAC_PI_2;
use std::fs;

use approx::assert_relative_eq;
use fringe::constants::wavelength_from_frequency;
use fringe::prelude::*;
use fringe::report::AmbiguityRow;

use common::{random_coords, scratch_path};

#[test]
fn test_csv_geometry_to_csv_report() {
    let layout = scratch_path("layout.csv");
    fs::write(
        &layout,
        "x,y\n1.0,0.0\n0.0,1.0\n-1.0,0.0\n0.0,-1.0\n0.0,0.0\n",
    )
    .unwrap();

    let geometry = ArrayGeometry::from_csv(&layout, 4).unwrap();
    assert_eq!(geometry.n_baselines(), 4);

    let params = SearchParams::builder().max_seed_norm(2.2).build().unwrap();
    let analysis = AmbiguityAnalysis::new(geometry, params);
    let outcome = analysis.search().unwrap();
    let cap = FieldOfViewCap::from_look_direction(60.0, 45.0, FRAC_PI_2).unwrap();
    let report = analysis.evaluate(&outcome, &cap).unwrap();
    assert_eq!(report.len(), 3);

    let out = scratch_path("ambiguities.csv");
    report.write_csv(&out).unwrap();
    let rows: Vec<AmbiguityRow> = AmbiguityReport::read_csv(&out).unwrap();
    assert_eq!(rows.len(), 3);
    for (row, record) in rows.iter().zip(&report.records) {
        assert_eq!(row.survivor_index, record.survivor_index);
        assert_eq!(row.offsets.split(';').count(), 4);
        assert_relative_eq!(row.distance, record.distance);
    }

    fs::remove_file(&layout).unwrap();
    fs::remove_file(&out).unwrap();
}

#[test]
fn test_meters_and_wavelengths_agree() {
    let frequency = 430.0;
    let lambda = wavelength_from_frequency(frequency);
    let coords = random_coords(42, 5, 1.3);
    let in_meters: Vec<[f64; 2]> = coords.iter().map(|c| [c[0] * lambda, c[1] * lambda]).collect();

    let a = ArrayGeometry::new(&coords, 5).unwrap();
    let b = ArrayGeometry::from_meters(&in_meters, frequency, 5).unwrap();
    for (ra, rb) in a.baselines().iter().zip(b.baselines()) {
        assert_relative_eq!(*ra.phase_center(), *rb.phase_center(), epsilon = 1e-12);
    }
    assert_eq!(LatticeBounds::from_geometry(&a), LatticeBounds::from_geometry(&b));
}

#[test]
fn test_one_outcome_many_caps() {
    let coords = random_coords(8, 5, 1.4);
    let geometry = ArrayGeometry::new(&coords, 5).unwrap();
    let params = SearchParams::builder().tolerance(0.3).build().unwrap();
    let analysis = AmbiguityAnalysis::new(geometry, params);
    let outcome = analysis.search().unwrap();

    let narrow = FieldOfViewCap::from_look_direction(70.0, 10.0, 0.2).unwrap();
    let wide = FieldOfViewCap::from_look_direction(70.0, 10.0, 1.2).unwrap();
    let narrow_report = analysis.evaluate(&outcome, &narrow).unwrap();
    let wide_report = analysis.evaluate(&outcome, &wide).unwrap();

    assert!(narrow_report.cap_indices.len() <= wide_report.cap_indices.len());
    assert!(narrow_report
        .cap_indices
        .iter()
        .all(|i| wide_report.cap_indices.contains(i)));
    for report in [&narrow_report, &wide_report] {
        assert_eq!(report.records.len() + report.rejected.len(), report.cap_indices.len());
        for r in &report.records {
            assert_relative_eq!(r.direction.norm(), 1.0, epsilon = 1e-9);
            assert!(r.distance >= 0.0);
        }
    }
}
