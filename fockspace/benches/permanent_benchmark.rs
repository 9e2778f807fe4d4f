//! Criterion benchmarks for the permanent kernels and FSArray unranking.

use criterion::{ criterion_group, criterion_main, BenchmarkId, Criterion };
use fockspace::{
    FSArray,
    permanent::{ permanent, permanent_glynn, permanent_par, sub_permanents },
};
use ndarray as nd;
use num_complex::Complex64 as C64;
use rand::{ Rng, SeedableRng, rngs::StdRng };

const SEED: u64 = 42;

fn random_matrix(rows: usize, cols: usize) -> nd::Array2<C64> {
    let mut rng = StdRng::seed_from_u64(SEED);
    nd::Array2::from_shape_simple_fn((rows, cols), || {
        C64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
    })
}

fn permanent_benchmark(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("permanent");
    for n in [8, 12, 16] {
        let a = random_matrix(n, n);
        group.bench_with_input(BenchmarkId::new("ryser", n), &a, |bencher, a| {
            bencher.iter(|| permanent(a));
        });
        group.bench_with_input(BenchmarkId::new("ryser_par", n), &a, |bencher, a| {
            bencher.iter(|| permanent_par(a, None));
        });
        group.bench_with_input(BenchmarkId::new("glynn", n), &a, |bencher, a| {
            bencher.iter(|| permanent_glynn(a));
        });
    }
    group.finish();
}

fn sub_permanent_benchmark(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("sub_permanents");
    for n in [8, 12, 16] {
        let a = random_matrix(n, n - 1);
        group.bench_with_input(BenchmarkId::new("shared_sweep", n), &a, |bencher, a| {
            bencher.iter(|| sub_permanents(a));
        });
    }
    group.finish();
}

fn unrank_benchmark(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("fsarray");
    for (m, n) in [(12, 6), (32, 16)] {
        let array = FSArray::new(m, n).expect("valid array");
        let step = (array.count() / 1000).max(1);
        let param = format!("m{m}_n{n}");
        group.bench_function(BenchmarkId::new("get_find", &param), |bencher| {
            bencher.iter(|| {
                (0..array.count()).step_by(step as usize).take(1000)
                    .filter_map(|i| array.get(i).ok())
                    .filter_map(|s| array.find(&s).ok().flatten())
                    .count()
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    permanent_benchmark,
    sub_permanent_benchmark,
    unrank_benchmark,
);
criterion_main!(benches);
