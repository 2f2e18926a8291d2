//! Benchmarks for lattice rebuilds
//!
//! Author: Moroya Sakamoto

use alice_warp::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Engine with a probe on every `stride`-th interior cell, all displaced
fn dense_engine(grid_size: usize, stride: usize) -> WarpEngine {
    let grid = GridConfig {
        grid_size,
        ..Default::default()
    };
    let mut cells = Vec::new();
    for row in (stride..grid_size).step_by(stride) {
        for col in (stride..grid_size).step_by(stride) {
            cells.push(grid.point(row, col));
        }
    }
    let mut engine: WarpEngine = WarpEngine::new(EngineConfig::default());
    engine.initialize(
        Some(&grid),
        Some(ProbeSet::from_positions(cells)),
        Some(CenterAnchor::at_center(&grid)),
    );
    let ids = engine.root_probes().to_vec();
    if let Some(probes) = engine.probes_mut() {
        for (i, id) in ids.into_iter().enumerate() {
            let angle = i as f32 * 0.7;
            probes.translate(id, Vec3::new(angle.cos(), angle.sin(), 0.0) * 0.3);
        }
    }
    engine.tick();
    engine
}

fn bench_rebuild(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebuild");

    for &n in &[8usize, 32, 128] {
        let mut engine = dense_engine(n, 3);
        group.throughput(Throughput::Elements(((n + 1) * (n + 1)) as u64));
        group.bench_with_input(BenchmarkId::new("forced_tick", n), &n, |b, _| {
            b.iter(|| {
                engine.force_rebuild();
                black_box(engine.tick())
            })
        });
    }

    group.finish();
}

fn bench_idle_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("idle_tick");

    for &n in &[8usize, 128] {
        let mut engine = dense_engine(n, 3);
        group.bench_with_input(BenchmarkId::new("motion_scan", n), &n, |b, _| {
            b.iter(|| black_box(engine.tick()))
        });
    }

    group.finish();
}

fn bench_zoom(c: &mut Criterion) {
    c.bench_function("zoom_enter_unwind", |b| {
        let mut engine =
            WarpEngine::with_defaults(GridConfig::default(), EngineConfig::default())
                .expect("default config is valid");
        b.iter(|| {
            black_box(engine.enter(0).ok());
            black_box(engine.unwind().ok());
        })
    });
}

fn bench_heatmap(c: &mut Criterion) {
    let engine = dense_engine(128, 3);
    c.bench_function("heatmap_sample_128", |b| {
        b.iter(|| black_box(Heatmap::sample(&engine)))
    });
}

criterion_group!(benches, bench_rebuild, bench_idle_tick, bench_zoom, bench_heatmap);
criterion_main!(benches);
