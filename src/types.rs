//! Core value types shared by the lattice, registry and solver
//!
//! Author: Moroya Sakamoto

use serde::{Deserialize, Serialize};
use std::fmt;

/// Movement threshold (world units) below which a probe counts as at rest.
pub const EPSILON: f32 = 0.001;

// ── Grid Index ───────────────────────────────────────────────

/// Integer lattice coordinate `(row, col)`, both in `[0, N]`.
///
/// Rows run along +Y, columns along +X.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridIndex {
    /// Row (Y axis)
    pub row: usize,
    /// Column (X axis)
    pub col: usize,
}

impl GridIndex {
    /// Create a grid index
    #[inline]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Step `distance` cells in `dir`, or `None` when that leaves `[0, n]`.
    #[inline]
    pub fn step(self, dir: Direction, distance: usize, n: usize) -> Option<GridIndex> {
        let (dr, dc) = dir.offset();
        let row = offset_axis(self.row, dr, distance, n)?;
        let col = offset_axis(self.col, dc, distance, n)?;
        Some(GridIndex { row, col })
    }

    /// Apply a signed `(d_row, d_col)` offset, or `None` outside `[0, n]`.
    #[inline]
    pub fn offset(self, d_row: isize, d_col: isize, n: usize) -> Option<GridIndex> {
        let row = self.row as isize + d_row;
        let col = self.col as isize + d_col;
        if row < 0 || col < 0 || row as usize > n || col as usize > n {
            return None;
        }
        Some(GridIndex::new(row as usize, col as usize))
    }

    /// True for indices on the outer ring (row or col equal to 0 or `n`).
    #[inline]
    pub fn is_boundary(self, n: usize) -> bool {
        self.row == 0 || self.col == 0 || self.row >= n || self.col >= n
    }
}

#[inline]
fn offset_axis(value: usize, sign: isize, distance: usize, n: usize) -> Option<usize> {
    match sign {
        0 => Some(value),
        s if s > 0 => {
            let v = value.checked_add(distance)?;
            (v <= n).then_some(v)
        }
        _ => value.checked_sub(distance),
    }
}

impl fmt::Display for GridIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

// ── Handles ──────────────────────────────────────────────────

/// Stable identity of a probe inside a [`crate::host::ProbeSource`].
///
/// Ids are dense arena slots and are never reused by [`crate::probes::ProbeSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProbeId(pub u32);

impl ProbeId {
    /// Arena slot of this id
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "probe#{}", self.0)
    }
}

/// Anything that can occupy a lattice cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    /// A registered or unregistered probe
    Probe(ProbeId),
    /// The privileged center anchor
    Anchor,
}

// ── Direction ────────────────────────────────────────────────

/// The four cardinal half-axes used for propagation limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Decreasing column (-X)
    Left,
    /// Increasing column (+X)
    Right,
    /// Increasing row (+Y)
    Up,
    /// Decreasing row (-Y)
    Down,
}

impl Direction {
    /// All four directions
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    /// `(d_row, d_col)` unit offset
    #[inline(always)]
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
            Direction::Up => (1, 0),
            Direction::Down => (-1, 0),
        }
    }
}

/// Per-direction propagation limits, in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Limits {
    /// Cells toward -X
    pub left: usize,
    /// Cells toward +X
    pub right: usize,
    /// Cells toward +Y
    pub up: usize,
    /// Cells toward -Y
    pub down: usize,
}

impl Limits {
    /// Same limit in every direction
    pub const fn uniform(r: usize) -> Self {
        Self {
            left: r,
            right: r,
            up: r,
            down: r,
        }
    }

    /// Limit for one direction
    #[inline]
    pub fn get(&self, dir: Direction) -> usize {
        match dir {
            Direction::Left => self.left,
            Direction::Right => self.right,
            Direction::Up => self.up,
            Direction::Down => self.down,
        }
    }

    /// Set the limit for one direction
    #[inline]
    pub fn set(&mut self, dir: Direction, value: usize) {
        match dir {
            Direction::Left => self.left = value,
            Direction::Right => self.right = value,
            Direction::Up => self.up = value,
            Direction::Down => self.down = value,
        }
    }
}
