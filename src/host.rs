//! Collaborator contracts
//!
//! The engine consumes a [`GridHost`], a [`ProbeSource`] and an optional
//! [`CenterAnchor`], and exposes its lattice through [`RenderSink`].
//!
//! Author: Moroya Sakamoto

use crate::config::GridConfig;
use crate::types::{GridIndex, ProbeId};
use glam::Vec3;

// ── Grid Host ────────────────────────────────────────────────

/// Supplies lattice geometry once at initialization
pub trait GridHost {
    /// Cells per side
    fn grid_size(&self) -> usize;
    /// Cell edge length
    fn cell_size(&self) -> f32;
    /// Lattice center in world space
    fn center_position(&self) -> Vec3;
    /// Total edge length
    fn total_width(&self) -> f32 {
        self.grid_size() as f32 * self.cell_size()
    }

    /// Snapshot the host geometry
    fn grid_config(&self) -> GridConfig {
        GridConfig {
            grid_size: self.grid_size(),
            cell_size: self.cell_size(),
            center: self.center_position(),
        }
    }
}

impl GridHost for GridConfig {
    fn grid_size(&self) -> usize {
        self.grid_size
    }

    fn cell_size(&self) -> f32 {
        self.cell_size
    }

    fn center_position(&self) -> Vec3 {
        self.center
    }

    fn total_width(&self) -> f32 {
        GridConfig::total_width(self)
    }

    fn grid_config(&self) -> GridConfig {
        *self
    }
}

// ── Probe Source ─────────────────────────────────────────────

/// Ordered collection of probe handles with live positions.
///
/// The input layer moves probes; the engine only reads positions, except
/// that zoom sessions ask the source to spawn new probes and a hard reset
/// retires them.
///
/// Ids must be dense slots counted up from 0: the registry keeps one entry
/// per slot and refuses ids at or beyond
/// [`MAX_PROBE_SLOTS`](crate::registry::MAX_PROBE_SLOTS).
pub trait ProbeSource {
    /// Live ids in creation order
    fn ids(&self) -> Vec<ProbeId>;

    /// Live position, `None` for unknown or retired ids
    fn position(&self, id: ProbeId) -> Option<Vec3>;

    /// Create a probe resting at `position`
    fn spawn(&mut self, position: Vec3) -> ProbeId;

    /// Drop a probe for good
    fn retire(&mut self, id: ProbeId);

    /// Number of live probes
    fn len(&self) -> usize {
        self.ids().len()
    }

    /// True when no probe is live
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Center Anchor ────────────────────────────────────────────

/// The single non-displaceable point that always blocks propagation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterAnchor {
    /// World position
    pub position: Vec3,
    /// Inactive anchors are ignored by occupancy checks
    pub active: bool,
}

impl CenterAnchor {
    /// Active anchor at `position`
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            active: true,
        }
    }

    /// Active anchor at the lattice center
    pub fn at_center(grid: &GridConfig) -> Self {
        Self::new(grid.center)
    }
}

// ── Render Sink ──────────────────────────────────────────────

/// Read-only view a presentation layer polls after each rebuild.
///
/// Out-of-range coordinates yield `Vec3::ZERO`.
pub trait RenderSink {
    /// Cells per side
    fn grid_size(&self) -> usize;

    /// Deformed position of a lattice point
    fn current_point(&self, row: usize, col: usize) -> Vec3;

    /// Undeformed position of a lattice point
    fn original_point(&self, row: usize, col: usize) -> Vec3;

    /// `current - original` at a lattice point
    fn displacement(&self, row: usize, col: usize) -> Vec3 {
        self.current_point(row, col) - self.original_point(row, col)
    }

    /// Deformed points of one row, left to right
    fn row_polyline(&self, row: usize) -> Vec<Vec3> {
        (0..=self.grid_size())
            .map(|col| self.current_point(row, col))
            .collect()
    }

    /// Deformed points of one column, bottom to top
    fn col_polyline(&self, col: usize) -> Vec<Vec3> {
        (0..=self.grid_size())
            .map(|row| self.current_point(row, col))
            .collect()
    }

    /// Deformed position of a lattice index
    fn point_at(&self, index: GridIndex) -> Vec3 {
        self.current_point(index.row, index.col)
    }
}
