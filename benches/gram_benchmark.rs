use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fairsvm::{Classifier, Ferm, Kernel, LinearKernel, RbfKernel};
use ndarray::{Array1, Array2};

/// Deterministic two-class sample with an alternating sensitive value
fn sample(n: usize, d: usize) -> (Array2<f64>, Array1<f64>, Vec<f64>) {
    let x = Array2::from_shape_fn((n, d), |(i, j)| {
        let sign = if i % 4 < 2 { 1.0 } else { -1.0 };
        sign + ((i * 7 + j * 13) % 17) as f64 / 17.0 - 0.5
    });
    let y = (0..n)
        .map(|i| if i % 4 < 2 { 1.0 } else { -1.0 })
        .collect::<Array1<f64>>();
    let sensitive = (0..n).map(|i| (i % 2) as f64).collect();
    (x, y, sensitive)
}

fn bench_gram(c: &mut Criterion) {
    let mut group = c.benchmark_group("gram");

    for size in [50, 200, 500].iter() {
        let (x, _, _) = sample(*size, 10);
        group.bench_with_input(BenchmarkId::new("linear", size), &x, |b, x| {
            let kernel = LinearKernel::new();
            b.iter(|| black_box(kernel.gram(x.view())))
        });
        group.bench_with_input(BenchmarkId::new("rbf", size), &x, |b, x| {
            let kernel = RbfKernel::new(0.1);
            b.iter(|| black_box(kernel.gram(x.view())))
        });
    }

    group.finish();
}

fn bench_ferm_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("ferm_fit");
    group.sample_size(10);

    for size in [40, 120].iter() {
        let (x, y, sensitive) = sample(*size, 5);
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                let mut svm = Ferm::new()
                    .with_gamma(0.1)
                    .with_sensible_feature(sensitive.clone());
                svm.fit(x.view(), y.view()).ok();
                black_box(svm)
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_gram, bench_ferm_fit);
criterion_main!(benches);
