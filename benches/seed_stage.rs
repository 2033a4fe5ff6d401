use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use fringe::geometry::ArrayGeometry;
use fringe::lattice::LatticeBounds;
use fringe::plane_system::PlaneSystem;
use fringe::search::stage::{seed_candidates, StageSearch};
use fringe::search::SearchParams;

/// Random layout with `n` baselines inside a disc of `radius` wavelengths.
fn layout(seed: u64, n: usize, radius: f64) -> ArrayGeometry {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut coords: Vec<[f64; 2]> = (0..n)
        .map(|_| {
            let r = rng.random_range(0.6..radius);
            let phi = rng.random_range(0.0..std::f64::consts::TAU);
            [r * phi.cos(), r * phi.sin()]
        })
        .collect();
    coords.push([0.0, 0.0]);
    ArrayGeometry::new(&coords, n).unwrap()
}

/// Raw solver throughput: one pseudo-inverse, every seed candidate.
fn bench_plane_solve(c: &mut Criterion) {
    let geometry = layout(0x5EED, 4, 3.0);
    let bounds = LatticeBounds::from_geometry(&geometry);
    let system = PlaneSystem::new(&geometry, &bounds, &[0, 1, 2]).unwrap();
    let candidates = seed_candidates(&bounds);

    c.bench_function("plane_system/solve_seed_candidates", |b| {
        b.iter(|| {
            for candidate in &candidates {
                black_box(system.solve(black_box(candidate)));
            }
        })
    });
}

/// Complete seed stage, sequential and on four workers.
fn bench_seed_stage(c: &mut Criterion) {
    let geometry = layout(0xC0FFEE, 4, 3.0);

    for workers in [1, 4] {
        let params = SearchParams::builder().workers(workers).build().unwrap();
        c.bench_function(&format!("stage/seed_workers_{workers}"), |b| {
            b.iter_batched(
                || StageSearch::new(&geometry, &params).unwrap(),
                |search| black_box(search.seed().unwrap()),
                BatchSize::LargeInput,
            )
        });
    }
}

criterion_group!(benches, bench_plane_solve, bench_seed_stage);
criterion_main!(benches);
