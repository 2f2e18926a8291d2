//! Cell occupancy and propagation limits
//!
//! One occupant per cell, first writer wins: the active center anchor is
//! placed first, then active probes in registration order. Hidden probes
//! never occupy a cell.
//!
//! Author: Moroya Sakamoto

use crate::config::OccupancyPolicy;
use crate::registry::ProbeRegistry;
use crate::types::{Direction, GridIndex, Handle, ProbeId};

/// What sits in a lattice cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occupant {
    /// Anchor or probe
    pub handle: Handle,
    /// Iteration level; 0 for the anchor
    pub level: u8,
}

/// Dense `(N+1)²` occupancy map for one rebuild
#[derive(Debug, Clone)]
pub struct OccupancyGrid {
    n: usize,
    cells: Vec<Option<Occupant>>,
}

impl OccupancyGrid {
    /// Empty map for an `n`-cell lattice
    pub fn empty(n: usize) -> Self {
        Self {
            n,
            cells: vec![None; (n + 1) * (n + 1)],
        }
    }

    /// Map of the anchor cell (if any) plus every active registered probe
    pub fn build(n: usize, registry: &ProbeRegistry, anchor_cell: Option<GridIndex>) -> Self {
        let mut grid = Self::empty(n);
        if let Some(cell) = anchor_cell {
            grid.insert(
                cell,
                Occupant {
                    handle: Handle::Anchor,
                    level: 0,
                },
            );
        }
        for rec in registry.records().filter(|r| r.active) {
            grid.insert(
                rec.grid_index,
                Occupant {
                    handle: Handle::Probe(rec.id),
                    level: rec.level,
                },
            );
        }
        grid
    }

    #[inline(always)]
    fn slot(&self, cell: GridIndex) -> Option<usize> {
        (cell.row <= self.n && cell.col <= self.n).then(|| cell.row * (self.n + 1) + cell.col)
    }

    /// Place an occupant; returns `false` if the cell was taken or out of range
    pub fn insert(&mut self, cell: GridIndex, occupant: Occupant) -> bool {
        match self.slot(cell) {
            Some(i) if self.cells[i].is_none() => {
                self.cells[i] = Some(occupant);
                true
            }
            _ => false,
        }
    }

    /// Occupant of a cell
    #[inline]
    pub fn get(&self, cell: GridIndex) -> Option<Occupant> {
        self.slot(cell).and_then(|i| self.cells[i])
    }

    /// True if the cell holds the anchor or a probe other than `own`
    #[inline]
    pub fn is_foreign(&self, cell: GridIndex, own: ProbeId) -> bool {
        match self.get(cell) {
            Some(o) => o.handle != Handle::Probe(own),
            None => false,
        }
    }

    /// Whether the cell's occupant stops a probe at `own_level`.
    ///
    /// The anchor always blocks. Another probe blocks when `policy` lets
    /// its level take precedence; higher-level probes are written through.
    #[inline]
    pub fn blocks(
        &self,
        cell: GridIndex,
        own: ProbeId,
        own_level: u8,
        policy: OccupancyPolicy,
    ) -> bool {
        match self.get(cell) {
            Some(Occupant {
                handle: Handle::Anchor,
                ..
            }) => true,
            Some(Occupant {
                handle: Handle::Probe(id),
                level,
            }) => id != own && policy.blocks(level, own_level),
            None => false,
        }
    }

    /// Distance to the first blocker along `dir`, capped at `radius`.
    ///
    /// Blockers are the anchor, probes allowed to block by `policy`, and the
    /// lattice boundary row or column. The returned distance is the
    /// blocker's own cell, so falloff reaches zero exactly there and the
    /// last free cell before it keeps a partial weight.
    pub fn nearest_occupant_distance(
        &self,
        from: GridIndex,
        dir: Direction,
        radius: usize,
        own: ProbeId,
        own_level: u8,
        policy: OccupancyPolicy,
    ) -> usize {
        for d in 1..=radius {
            let Some(cell) = from.step(dir, d, self.n) else {
                return d - 1;
            };
            if cell.is_boundary(self.n) || self.blocks(cell, own, own_level, policy) {
                return d;
            }
        }
        radius
    }
}
