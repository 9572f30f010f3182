use criterion::{criterion_group, criterion_main, Criterion};
use glam::DVec3;
use std::hint::black_box;
use twobody_kernel::{
    lambert::{izzo, vallado},
    LambertOptions,
};

const EARTH_MU: f64 = 398600.4418;

fn criterion_benchmark(c: &mut Criterion) {
    let r1 = DVec3::new(15945.34, 0.0, 0.0);
    let r2 = DVec3::new(12214.83399, 10249.46731, 0.0);
    let tof = 76.0 * 60.0;

    let mut group = c.benchmark_group("lambert");

    group.bench_function("izzo", |b| {
        b.iter(|| izzo(EARTH_MU, black_box(r1), black_box(r2), tof, &LambertOptions::IZZO))
    });
    group.bench_function("vallado", |b| {
        b.iter(|| {
            vallado(
                EARTH_MU,
                black_box(r1),
                black_box(r2),
                tof,
                &LambertOptions::VALLADO,
            )
        })
    });

    let long = 10.0 * 3600.0;
    let multi_rev = LambertOptions {
        revs: 2,
        ..LambertOptions::IZZO
    };
    group.bench_function("izzo multi-revolution", |b| {
        b.iter(|| izzo(EARTH_MU, black_box(r1), black_box(r2), long, &multi_rev))
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
