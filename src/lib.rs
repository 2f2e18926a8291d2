//! # ALICE-WARP
//!
//! **A.L.I.C.E. - Adaptive Lattice Influence & Compensation Engine**
//!
//! Simulates how a square reference lattice bends when movable anchor
//! points ("probes") are pulled away from their resting positions. Used to
//! model localized visual-field distortion in vision-testing exercises.
//!
//! ## Features
//!
//! - **Lattice**: `(N+1)²` original/current point grid with a fixed boundary
//! - **Registry**: stable-id probe bookkeeping across zoom levels
//! - **Solver**: bounded, additive, smoothstep-tapered displacement field,
//!   clipped by neighboring probes and a center anchor
//! - **Scheduler**: dirty-flag driven, at most one rebuild per tick
//! - **Zoom**: nested probe sessions whose deformation persists across
//!   navigation
//!
//! ## Example
//!
//! ```rust
//! use alice_warp::prelude::*;
//!
//! let mut engine = WarpEngine::with_defaults(GridConfig::default(), EngineConfig::default()).unwrap();
//!
//! // Pull the first root probe to the right and let the engine catch up
//! let probe = engine.root_probes()[0];
//! engine.probes_mut().unwrap().translate(probe, Vec3::new(0.5, 0.0, 0.0));
//! engine.tick();
//!
//! let cell = engine.grid_index(probe).unwrap();
//! let moved = engine.displacement(cell.row, cell.col);
//! assert!((moved.x - 0.5).abs() < 1e-6);
//!
//! // Zoom into it, then back out
//! engine.advance_into(0).unwrap();
//! engine.tick();
//! engine.unwind().unwrap();
//! ```
//!
//! ## Author
//!
//! Moroya Sakamoto

#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod error;
pub mod heatmap;
pub mod host;
pub mod lattice;
pub mod probes;
pub mod registry;
pub mod scheduler;
pub mod solver;
pub mod types;
pub mod zoom;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude - commonly used types and functions
pub mod prelude {
    pub use crate::config::{
        ContributionPolicy, EngineConfig, GridConfig, OccupancyPolicy, SpawnAnchor, WarpConfig,
    };
    pub use crate::engine::{Readiness, TickOutcome, WarpEngine};
    pub use crate::error::WarpError;
    pub use crate::heatmap::{ColorMap, Heatmap};
    pub use crate::host::{CenterAnchor, GridHost, ProbeSource, RenderSink};
    pub use crate::lattice::Lattice;
    pub use crate::probes::ProbeSet;
    pub use crate::registry::{ProbeRecord, ProbeRegistry};
    pub use crate::scheduler::{RebuildScheduler, SchedulerState};
    pub use crate::solver::{adaptive_weight, DeformationSolver, RebuildStats};
    pub use crate::types::{Direction, GridIndex, Handle, ProbeId, EPSILON};
    pub use crate::zoom::{IterationManager, Transition};
    pub use glam::Vec3;
}

// Re-exports for convenience
pub use engine::WarpEngine;
pub use error::WarpError;
pub use lattice::Lattice;

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_basic_workflow() {
        let mut engine =
            WarpEngine::with_defaults(GridConfig::default(), EngineConfig::default()).unwrap();
        assert!(matches!(engine.tick(), TickOutcome::Rebuilt(_)));

        let probe = engine.root_probes()[3];
        let d = Vec3::new(0.0, 0.4, 0.0);
        engine.probes_mut().unwrap().translate(probe, d);
        let TickOutcome::Rebuilt(stats) = engine.tick() else {
            panic!("expected a rebuild");
        };
        assert_eq!(stats.contributors, 1);

        let cell = engine.grid_index(probe).unwrap();
        assert!((engine.displacement(cell.row, cell.col) - d).length() < 1e-6);
        assert_eq!(engine.tick(), TickOutcome::Idle);
    }

    #[test]
    fn test_zoom_round_trip() {
        let mut engine =
            WarpEngine::with_defaults(GridConfig::default(), EngineConfig::default()).unwrap();
        engine.tick();
        let before = engine.lattice().unwrap().current_points().to_vec();

        engine.advance_into(2).unwrap();
        assert_eq!(engine.level(), 2);
        engine.tick();
        engine.unwind().unwrap();
        engine.tick();

        assert_eq!(engine.lattice().unwrap().current_points(), &before[..]);
    }
}
