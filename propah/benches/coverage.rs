use criterion::{criterion_group, criterion_main, Criterion};
use propah::{Antenna, CoverageEstimator};
use terrain::{FlatTerrain, SyntheticTerrain};

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn coverage_radius(c: &mut Criterion) {
    let mut group = c.benchmark_group("Coverage Radius");

    let antenna = Antenna::builder("Palmyra-Hub")
        .location(38.3864, -86.1091)
        .height(30.0)
        .power(1000.0)
        .frequency(5.8)
        .build()
        .unwrap();
    let estimator = CoverageEstimator::default();
    let flat = FlatTerrain::new(200.0);
    let hills = SyntheticTerrain::default();

    group.bench_function("calibrated", |b| {
        b.iter(|| estimator.estimate(&antenna, None).unwrap())
    });
    group.bench_function("flat", |b| {
        b.iter(|| estimator.estimate(&antenna, Some(&flat)).unwrap())
    });
    group.bench_function("synthetic", |b| {
        b.iter(|| estimator.estimate(&antenna, Some(&hills)).unwrap())
    });
}

criterion_group!(benches, coverage_radius);
criterion_main!(benches);
