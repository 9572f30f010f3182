use criterion::{criterion_group, criterion_main, Criterion};
use glam::DVec3;
use std::hint::black_box;
use twobody_kernel::{
    Cowell, Danby, Farnocchia, Gooding, Markley, Mikkola, Pimienta, Propagator, RecSeries,
    StateVectors, Vallado,
};

const EARTH_MU: f64 = 398600.4418;

fn iss() -> StateVectors {
    StateVectors {
        position: DVec3::new(859.07256, -4137.20368, 5295.56871),
        velocity: DVec3::new(7.37289205, 2.08223573, 0.439999794),
    }
}

fn bench_propagators(
    c: &mut Criterion,
    group: &str,
    state: &StateVectors,
    tof: f64,
    propagators: &[(&str, &dyn Propagator)],
) {
    let mut group = c.benchmark_group(group);

    for (name, propagator) in propagators {
        group.bench_function(*name, |b| {
            b.iter(|| propagator.propagate(EARTH_MU, black_box(state), black_box(tof)))
        });
    }

    group.finish();
}

fn criterion_benchmark(c: &mut Criterion) {
    let farnocchia = Farnocchia::default();
    let vallado = Vallado::default();
    let danby = Danby::default();
    let gooding = Gooding::default();
    let recseries = RecSeries::default();
    let cowell = Cowell::new();

    bench_propagators(
        c,
        "propagate@elliptic",
        &iss(),
        3600.0,
        &[
            ("farnocchia", &farnocchia),
            ("vallado", &vallado),
            ("mikkola", &Mikkola),
            ("markley", &Markley),
            ("pimienta", &Pimienta),
            ("gooding", &gooding),
            ("danby", &danby),
            ("recseries", &recseries),
            ("cowell", &cowell),
        ],
    );

    let hyperbola = StateVectors {
        position: DVec3::new(7000.0, 0.0, 0.0),
        velocity: DVec3::new(0.0, (EARTH_MU * 2.5 / 7000.0).sqrt(), 0.0),
    };

    bench_propagators(
        c,
        "propagate@hyperbolic",
        &hyperbola,
        3600.0,
        &[
            ("farnocchia", &farnocchia),
            ("vallado", &vallado),
            ("mikkola", &Mikkola),
            ("danby", &danby),
        ],
    );
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
