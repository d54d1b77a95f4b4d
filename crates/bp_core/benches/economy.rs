//! Economy benchmarks for bp_core.
//!
//! Run with: `cargo bench -p bp_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use bp_core::components::StructureKind;
use bp_core::math::Vec3Fixed;
use bp_test_utils::fixtures::{contested_world, empty_world, place};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

/// Economy tick over a crowded map.
pub fn tick_benchmark(c: &mut Criterion) {
    c.bench_function("economy_tick_200_miners", |b| {
        b.iter_batched(
            || contested_world(100, 150),
            |mut world| {
                world.run_frame();
                black_box(world.state_hash())
            },
            BatchSize::SmallInput,
        );
    });
}

/// Placing into a cluster recalculates every neighbor.
pub fn placement_benchmark(c: &mut Criterion) {
    c.bench_function("place_into_cluster_of_50", |b| {
        b.iter_batched(
            || {
                let mut world = empty_world();
                for i in 0..50 {
                    place(&mut world, StructureKind::Drill, Vec3Fixed::from_units(i * 20, 0, 0));
                }
                world
            },
            |mut world| {
                black_box(place(&mut world, StructureKind::Leech, Vec3Fixed::from_units(500, 0, 0)))
            },
            BatchSize::SmallInput,
        );
    });

    let world = contested_world(100, 150);
    c.bench_function("predict_efficiency_delta", |b| {
        b.iter(|| {
            black_box(world.predict_efficiency_delta(
                black_box(Vec3Fixed::from_units(0, 75, 0)),
                bp_core::teams::Team::Humans,
            ))
        });
    });
}

criterion_group!(benches, tick_benchmark, placement_benchmark);
criterion_main!(benches);
