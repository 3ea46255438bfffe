// Benchmarks for terrain sampling, A* search, and full path queries.
//
// Run with: cargo bench -p gridnav_core

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use glam::{DVec2, DVec3};
use gridnav_core::config::PathConfig;
use gridnav_core::navigator::Navigator;
use gridnav_core::sampler::TerrainSampler;
use gridnav_core::scene::{RampAxis, SceneOracle, Solid};
use gridnav_core::types::WorldBox;
use std::sync::Arc;

/// A `side x side` cell field: flat ground, a raised plateau reached by a
/// ramp, and a wall with a single gap.
fn terrain(side: i32) -> (SceneOracle, WorldBox) {
    let extent = f64::from(side) * 100.0;
    let third = (f64::from(side) / 3.0).floor() * 100.0;
    let scene = SceneOracle::new()
        .with(Solid::cuboid(
            DVec3::new(-50.0, -50.0, -100.0),
            DVec3::new(extent + 50.0, extent + 50.0, 0.0),
        ))
        .with(Solid::ramp(
            DVec2::new(third + 50.0, -50.0),
            DVec2::new(third + 150.0, third + 50.0),
            -100.0,
            RampAxis::X,
            0.0,
            50.0,
        ))
        .with(Solid::cuboid(
            DVec3::new(third + 150.0, -50.0, -100.0),
            DVec3::new(2.0 * third + 50.0, third + 50.0, 50.0),
        ))
        .with(Solid::cuboid(
            DVec3::new(-50.0, 2.0 * third + 40.0, 0.0),
            DVec3::new(extent - 250.0, 2.0 * third + 60.0, 300.0),
        ));
    let region = WorldBox::new(
        DVec3::new(-10.0, -10.0, -50.0),
        DVec3::new(extent - 90.0, extent - 90.0, 400.0),
    );
    (scene, region)
}

fn bench_sampling(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample_region");
    group.sample_size(10);
    for side in [16, 32, 64] {
        let (scene, region) = terrain(side);
        let sampler = TerrainSampler::default();
        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |b, _| {
            b.iter(|| sampler.sample_region(black_box(&scene), black_box(&region)))
        });
    }
    group.finish();
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_path");
    for side in [16, 32, 64] {
        let (scene, region) = terrain(side);
        let Ok(graph) = TerrainSampler::default().sample_region(&scene, &region) else {
            continue;
        };
        let navigator = Navigator::new(Arc::new(graph), PathConfig::default());
        let far = f64::from(side - 2) * 100.0;
        let from = DVec3::ZERO;
        let to = DVec3::new(far, far, 0.0);

        group.bench_with_input(BenchmarkId::new("corner_to_corner", side), &side, |b, _| {
            b.iter(|| navigator.find_path(black_box(from), black_box(to)))
        });
        group.bench_with_input(BenchmarkId::new("budget_split", side), &side, |b, _| {
            b.iter(|| navigator.find_path_within(black_box(from), black_box(to), 1500.0))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sampling, bench_queries);
criterion_main!(benches);
