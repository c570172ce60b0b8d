//! Rope Solver Benchmarks
//!
//! Measures one simulation tick at various solver iteration counts and
//! chain lengths, plus curve sampling for tube geometry.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cursor_tether::rope::{RopeConfig, RopeCurve, RopePhysics};
use glam::Vec3;

const DT: f32 = 1.0 / 60.0;

fn rope(length: f32, solver_iterations: u32) -> RopePhysics {
    let config = RopeConfig {
        length,
        solver_iterations,
        ..Default::default()
    };
    let mut rope = RopePhysics::from_config(&config).unwrap();
    // Settle so the benchmark measures steady-state ticks
    for _ in 0..120 {
        rope.update(DT);
    }
    rope
}

fn bench_update_iterations(c: &mut Criterion) {
    let mut group = c.benchmark_group("rope_update_iterations");

    for iterations in [50u32, 200, 500] {
        let mut physics = rope(2.0, iterations);
        group.throughput(Throughput::Elements(physics.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(iterations),
            &iterations,
            |b, _| b.iter(|| physics.update(black_box(DT))),
        );
    }

    group.finish();
}

fn bench_update_length(c: &mut Criterion) {
    let mut group = c.benchmark_group("rope_update_length");

    for length in [1.0f32, 2.0, 8.0] {
        let mut physics = rope(length, 500);
        group.throughput(Throughput::Elements(physics.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(length), &length, |b, _| {
            b.iter(|| physics.update(black_box(DT)))
        });
    }

    group.finish();
}

fn bench_moving_endpoints(c: &mut Criterion) {
    let mut physics = rope(2.0, 500);
    let start = physics.first_point().pos;
    let end = physics.last_point().pos;
    let mut phase = 0.0f32;

    c.bench_function("rope_update_moving_endpoints", |b| {
        b.iter(|| {
            phase += 0.05;
            let sway = Vec3::new(phase.sin() * 0.5, 0.0, 0.0);
            physics.set_endpoints(start + sway, end - sway);
            physics.update(black_box(DT));
        })
    });
}

fn bench_curve_sampling(c: &mut Criterion) {
    let physics = rope(2.0, 500);
    let curve = RopeCurve::new(&physics);

    c.bench_function("rope_curve_tube_samples", |b| {
        b.iter(|| black_box(curve.tube_samples()))
    });
    c.bench_function("rope_curve_spaced_64", |b| {
        b.iter(|| black_box(curve.spaced_points(64)))
    });
}

criterion_group!(
    benches,
    bench_update_iterations,
    bench_update_length,
    bench_moving_endpoints,
    bench_curve_sampling
);
criterion_main!(benches);
