#![allow(dead_code)]

use approx::assert_relative_eq;
use fringe::geometry::ArrayGeometry;
use fringe::search::stage::SurvivorSet;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Four unit baselines along ±x and ±y, reference at the origin (index 4).
pub fn unit_cross() -> ArrayGeometry {
    let coords = [[1.0, 0.0], [0.0, 1.0], [-1.0, 0.0], [0.0, -1.0], [0.0, 0.0]];
    ArrayGeometry::new(&coords, 4).unwrap()
}

/// Sub-group coordinates of a random sparse layout; the reference is the last entry.
///
/// Every non-reference sub-group lies in the annulus `[0.6, radius]` around the
/// reference: every baseline admits at least three offsets and the ranges stay small.
pub fn random_coords(seed: u64, n_baselines: usize, radius: f64) -> Vec<[f64; 2]> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut coords: Vec<[f64; 2]> = (0..n_baselines)
        .map(|_| {
            let r = rng.random_range(0.6..radius);
            let phi = rng.random_range(0.0..std::f64::consts::TAU);
            [r * phi.cos(), r * phi.sin()]
        })
        .collect();
    coords.push([0.0, 0.0]);
    coords
}

pub fn random_layout(seed: u64, n_baselines: usize, radius: f64) -> ArrayGeometry {
    let coords = random_coords(seed, n_baselines, radius);
    ArrayGeometry::new(&coords, n_baselines).unwrap()
}

/// Same candidates, same points, same residuals, bit for bit.
pub fn assert_same_survivors(a: &SurvivorSet, b: &SurvivorSet) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b.iter()) {
        assert_eq!(x.candidate, y.candidate);
        assert_eq!(x.solution.point, y.solution.point);
        assert_eq!(x.solution.residual.to_bits(), y.solution.residual.to_bits());
    }
}

/// Same survivors up to rounding.
pub fn assert_survivors_close(a: &SurvivorSet, b: &SurvivorSet, epsilon: f64) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b.iter()) {
        assert_eq!(x.candidate, y.candidate);
        assert_relative_eq!(x.solution.point, y.solution.point, epsilon = epsilon);
    }
}

/// Unique scratch path in the system temporary directory.
pub fn scratch_path(name: &str) -> camino::Utf8PathBuf {
    let dir = std::env::temp_dir().join(format!("fringe-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    camino::Utf8PathBuf::from_path_buf(dir.join(name)).unwrap()
}
