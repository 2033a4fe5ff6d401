use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use fringe::geometry::ArrayGeometry;
use fringe::search::engine::run_search;
use fringe::search::SearchParams;

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

/// Every stage of an 8-baseline layout, sequential against pooled evaluation.
fn bench_full_search(c: &mut Criterion) {
    let geometry = layout(0xA11CE, 8, 2.5);
    let mut group = c.benchmark_group("full_search");
    group.sample_size(20);

    for workers in [1, 2, 4, 8] {
        let params = SearchParams::builder()
            .tolerance(0.2)
            .workers(workers)
            .build()
            .unwrap();
        group.bench_with_input(BenchmarkId::new("workers", workers), &params, |b, params| {
            b.iter(|| black_box(run_search(&geometry, params).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_full_search);
criterion_main!(benches);
