use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use magmod::legendre::{legendre, LegendreTerms};

/// Degrees of the WMM, CHAOS core and EMM static models.
const DEGREES: [i32; 3] = [12, 20, 720];

fn bench_degrees(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let samples = 256usize;

    for degree in DEGREES {
        c.bench_function(&format!("legendre/degree_{degree}"), |b| {
            b.iter_batched(
                || {
                    (0..samples)
                        .map(|_| rng.random_range(-90.0..=90.0))
                        .collect::<Vec<f64>>()
                },
                |latitudes| {
                    for lat in latitudes {
                        black_box(legendre(black_box(lat), degree).unwrap());
                    }
                },
                BatchSize::LargeInput,
            )
        });
    }
}

/// Poles and the equator, where the recurrences degenerate.
fn bench_special_latitudes(c: &mut Criterion) {
    c.bench_function("legendre/poles_and_equator_degree_120", |b| {
        b.iter(|| {
            for (sin_lat, cos_lat) in [(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0)] {
                black_box(LegendreTerms::new(black_box(sin_lat), cos_lat, 120));
            }
        })
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_degrees, bench_special_latitudes
);
criterion_main!(benches);
