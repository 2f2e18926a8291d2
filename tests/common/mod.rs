//! Common test helpers for ALICE-WARP integration tests
//!
//! Author: Moroya Sakamoto

#![allow(dead_code)]

use alice_warp::prelude::*;

// ============================================================================
// Standard engines
// ============================================================================

/// 8x8 engine with the default root ring and a center anchor
pub fn default_engine() -> WarpEngine {
    WarpEngine::with_defaults(GridConfig::default(), EngineConfig::default())
        .expect("default config is valid")
}

/// 8x8 engine with custom tuning
pub fn engine_with(config: EngineConfig) -> WarpEngine {
    WarpEngine::with_defaults(GridConfig::default(), config).expect("config is valid")
}

/// 8x8 engine whose root probes sit on the given cells, no anchor
pub fn engine_on_cells(cells: &[(usize, usize)]) -> WarpEngine {
    let grid = GridConfig::default();
    let probes = ProbeSet::from_positions(cells.iter().map(|&(r, c)| grid.point(r, c)));
    let mut engine: WarpEngine = WarpEngine::new(EngineConfig::default());
    let ready = engine.initialize(Some(&grid), Some(probes), None);
    assert!(ready.is_ready(), "engine failed to initialize: {:?}", ready);
    engine
}

// ============================================================================
// Probe helpers
// ============================================================================

/// Move a probe by `delta` through the engine's probe source
pub fn push(engine: &mut WarpEngine, id: ProbeId, delta: Vec3) {
    assert!(
        engine.probes_mut().expect("engine ready").translate(id, delta),
        "unknown probe {}",
        id
    );
}

/// Copy of the current lattice points
pub fn snapshot(engine: &WarpEngine) -> Vec<Vec3> {
    engine.lattice().expect("engine ready").current_points().to_vec()
}

/// Per-point displacement field
pub fn displacement_field(engine: &WarpEngine) -> Vec<Vec3> {
    let lattice = engine.lattice().expect("engine ready");
    lattice
        .current_points()
        .iter()
        .zip(lattice.original_points())
        .map(|(c, o)| *c - *o)
        .collect()
}

// ============================================================================
// Assertion helpers
// ============================================================================

/// Assert two vectors are close within tolerance
pub fn assert_vec_close(a: Vec3, b: Vec3, tol: f32, msg: &str) {
    assert!(
        (a - b).length() < tol,
        "{}: {:?} vs {:?} (diff={}, tol={})",
        msg,
        a,
        b,
        (a - b).length(),
        tol
    );
}

/// Assert two point sets match element-wise
pub fn assert_points_close(a: &[Vec3], b: &[Vec3], tol: f32, msg: &str) {
    assert_eq!(a.len(), b.len(), "{}: length mismatch", msg);
    for (i, (p, q)) in a.iter().zip(b).enumerate() {
        assert_vec_close(*p, *q, tol, &format!("{} at point {}", msg, i));
    }
}

/// Assert every boundary point sits at its original position
pub fn assert_boundary_fixed(engine: &WarpEngine) {
    let lattice = engine.lattice().expect("engine ready");
    let n = lattice.size();
    for row in 0..=n {
        for col in 0..=n {
            if row == 0 || col == 0 || row == n || col == n {
                assert_eq!(
                    lattice.current(row, col),
                    lattice.original(row, col),
                    "boundary point ({}, {}) moved",
                    row,
                    col
                );
            }
        }
    }
}
