use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;
use twobody_kernel::{
    eccentric_to_true, mean_to_eccentric, mean_to_eccentric_vector, mean_to_hyperbolic,
    mean_to_parabolic, true_to_eccentric,
};

const POLL_ITERS: u64 = 1024;
const MULTIPLIER: f64 = std::f64::consts::TAU / POLL_ITERS as f64;

#[inline(always)]
fn poll_kepler(ecc: f64, solve: impl Fn(f64, f64) -> f64) {
    for i in 0..POLL_ITERS {
        let angle = i as f64 * MULTIPLIER - std::f64::consts::PI;
        black_box(solve(black_box(angle), ecc));
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("kepler@mean_anomaly");
    group.throughput(Throughput::Elements(POLL_ITERS));

    for ecc in [0.1, 0.5, 0.9, 0.99] {
        group.bench_function(format!("elliptic e = {ecc}"), |b| {
            b.iter(|| poll_kepler(ecc, |m, e| mean_to_eccentric(m, e).unwrap_or(f64::NAN)))
        });
    }
    for ecc in [1.1, 2.0, 10.0] {
        group.bench_function(format!("hyperbolic e = {ecc}"), |b| {
            b.iter(|| poll_kepler(ecc, |m, e| mean_to_hyperbolic(m, e).unwrap_or(f64::NAN)))
        });
    }
    group.bench_function("parabolic", |b| {
        b.iter(|| poll_kepler(1.0, |m, _| mean_to_parabolic(m)))
    });

    group.finish();

    let mut group = c.benchmark_group("half_angle");
    group.throughput(Throughput::Elements(POLL_ITERS));

    group.bench_function("true to eccentric", |b| {
        b.iter(|| poll_kepler(0.3, true_to_eccentric))
    });
    group.bench_function("eccentric to true", |b| {
        b.iter(|| poll_kepler(0.3, eccentric_to_true))
    });

    group.finish();

    let mean_anomalies: Vec<f64> = (0..POLL_ITERS).map(|i| i as f64 * MULTIPLIER).collect();
    let eccentricities = vec![0.5; mean_anomalies.len()];

    let mut group = c.benchmark_group("vectorized");
    group.throughput(Throughput::Elements(POLL_ITERS));
    group.bench_function("mean to eccentric", |b| {
        b.iter(|| {
            mean_to_eccentric_vector(black_box(&mean_anomalies), black_box(&eccentricities))
        })
    });
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
