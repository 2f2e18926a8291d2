//! Lattice model: the `(N+1) x (N+1)` grid of original and current points
//!
//! Points are stored row-major. `original` is fixed at construction;
//! `current` is rewritten on every rebuild.
//!
//! Author: Moroya Sakamoto

use crate::config::GridConfig;
use crate::host::RenderSink;
use crate::types::GridIndex;
use glam::Vec3;

/// Reference lattice with its deformed counterpart
#[derive(Debug, Clone)]
pub struct Lattice {
    grid: GridConfig,
    original: Vec<Vec3>,
    current: Vec<Vec3>,
}

impl Lattice {
    /// Build the lattice; `current` starts equal to `original`.
    pub fn build(grid: GridConfig) -> Self {
        let side = grid.grid_size + 1;
        let mut original = Vec::with_capacity(side * side);
        for row in 0..side {
            for col in 0..side {
                original.push(grid.point(row, col));
            }
        }
        let current = original.clone();
        Self {
            grid,
            original,
            current,
        }
    }

    /// Geometry the lattice was built from
    #[inline]
    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    /// Cells per side (`N`)
    #[inline]
    pub fn size(&self) -> usize {
        self.grid.grid_size
    }

    /// Points per side (`N + 1`)
    #[inline]
    pub fn side(&self) -> usize {
        self.grid.grid_size + 1
    }

    #[inline(always)]
    fn slot(&self, row: usize, col: usize) -> Option<usize> {
        let side = self.side();
        (row < side && col < side).then_some(row * side + col)
    }

    /// `current = original` everywhere
    pub fn reset(&mut self) {
        self.current.copy_from_slice(&self.original);
    }

    /// Original point, `Vec3::ZERO` when out of range
    #[inline]
    pub fn original(&self, row: usize, col: usize) -> Vec3 {
        self.slot(row, col)
            .map_or(Vec3::ZERO, |i| self.original[i])
    }

    /// Current point, `Vec3::ZERO` when out of range
    #[inline]
    pub fn current(&self, row: usize, col: usize) -> Vec3 {
        self.slot(row, col)
            .map_or(Vec3::ZERO, |i| self.current[i])
    }

    /// Add a displacement to an interior point.
    ///
    /// Boundary and out-of-range points are left alone; returns whether the
    /// point was written.
    #[inline]
    pub fn displace(&mut self, index: GridIndex, delta: Vec3) -> bool {
        if index.is_boundary(self.size()) {
            return false;
        }
        match self.slot(index.row, index.col) {
            Some(i) => {
                self.current[i] += delta;
                true
            }
            None => false,
        }
    }

    /// Row-major original points
    #[inline]
    pub fn original_points(&self) -> &[Vec3] {
        &self.original
    }

    /// Row-major current points
    #[inline]
    pub fn current_points(&self) -> &[Vec3] {
        &self.current
    }

    /// Largest `|current - original|` over the lattice
    pub fn max_displacement(&self) -> f32 {
        self.current
            .iter()
            .zip(&self.original)
            .map(|(c, o)| (*c - *o).length())
            .fold(0.0, f32::max)
    }
}

impl RenderSink for Lattice {
    fn grid_size(&self) -> usize {
        self.size()
    }

    fn current_point(&self, row: usize, col: usize) -> Vec3 {
        self.current(row, col)
    }

    fn original_point(&self, row: usize, col: usize) -> Vec3 {
        self.original(row, col)
    }
}
