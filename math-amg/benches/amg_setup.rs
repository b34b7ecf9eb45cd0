//! Benchmark: multigrid setup and application
//!
//! Measures how hierarchy construction, one preconditioner application and
//! TFF factorization scale with the grid size of the 2D Poisson problem.
//!
//! Run with:
//!   cargo bench -p math-amg --bench amg_setup
//!
//! For thread scaling of the parallel strength marking:
//!   RAYON_NUM_THREADS=1 cargo bench -p math-amg --bench amg_setup

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use math_amg::{
    AmgConfig, AmgHierarchy, AmgPreconditioner, AmgTransferConfig, Preconditioner, TffConfig,
    TffPreconditioner, gallery,
};
use ndarray::Array1;
use std::time::Duration;

const SIZES: [usize; 4] = [32, 64, 128, 256];

fn bench_hierarchy(c: &mut Criterion) {
    let mut group = c.benchmark_group("amg_hierarchy_2d");
    group.warm_up_time(Duration::from_secs(2));
    group.measurement_time(Duration::from_secs(5));

    for (name, config) in [
        ("ruge_stuben", AmgTransferConfig::default()),
        ("smoothed_aggregation", AmgTransferConfig::smoothed_aggregation()),
    ] {
        for &n in &SIZES {
            let a = gallery::poisson_2d::<f64>(n, n);
            group.throughput(Throughput::Elements((n * n) as u64));
            group.bench_with_input(BenchmarkId::new(name, n), &a, |b, a| {
                b.iter(|| black_box(AmgHierarchy::build(a, &config)));
            });
        }
    }

    group.finish();
}

fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("amg_apply_2d");
    group.warm_up_time(Duration::from_secs(2));
    group.measurement_time(Duration::from_secs(5));

    for &n in &SIZES {
        let a = gallery::poisson_2d::<f64>(n, n);
        let Ok(amg) = AmgPreconditioner::from_csr(&a, AmgConfig::default()) else {
            continue;
        };
        let r = Array1::from_elem(n * n, 1.0);

        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_with_input(BenchmarkId::new("v_cycle", n), &r, |b, r| {
            b.iter(|| black_box(amg.apply(r)));
        });
    }

    group.finish();
}

fn bench_tff(c: &mut Criterion) {
    let mut group = c.benchmark_group("tff_2d");
    group.warm_up_time(Duration::from_secs(2));
    group.measurement_time(Duration::from_secs(5));

    let config = TffConfig::default();
    for &n in &SIZES[..3] {
        let a = gallery::poisson_2d::<f64>(n, n);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_with_input(BenchmarkId::new("setup", n), &a, |b, a| {
            b.iter(|| black_box(TffPreconditioner::new(a, &[n, n], &config)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_hierarchy, bench_apply, bench_tff);
criterion_main!(benches);
