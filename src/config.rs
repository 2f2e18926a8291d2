//! Grid and engine configuration
//!
//! All structs deserialize with `#[serde(default)]`, so a config file only
//! needs the fields it overrides.
//!
//! ```rust
//! use alice_warp::config::WarpConfig;
//!
//! let cfg = WarpConfig::from_json_str(r#"{ "grid": { "grid_size": 12 } }"#).unwrap();
//! assert_eq!(cfg.grid.grid_size, 12);
//! assert_eq!(cfg.engine.root_radius, 2);
//! ```
//!
//! Author: Moroya Sakamoto

use crate::error::{Result, WarpError};
use crate::types::{GridIndex, EPSILON};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

// ── Grid ─────────────────────────────────────────────────────

/// Lattice geometry (the data a grid host supplies once at startup)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Number of cells per side; the lattice has `grid_size + 1` points per side
    pub grid_size: usize,
    /// Edge length of one cell in world units
    pub cell_size: f32,
    /// World position of the lattice center
    pub center: Vec3,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            grid_size: 8,
            cell_size: 1.0,
            center: Vec3::ZERO,
        }
    }
}

impl GridConfig {
    /// Total edge length of the lattice
    #[inline]
    pub fn total_width(&self) -> f32 {
        self.grid_size as f32 * self.cell_size
    }

    /// Half of [`Self::total_width`]
    #[inline]
    pub fn half_width(&self) -> f32 {
        self.total_width() * 0.5
    }

    /// World position of lattice point `(0, 0)`
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.center - Vec3::new(self.half_width(), self.half_width(), 0.0)
    }

    /// Undeformed world position of a lattice point
    #[inline]
    pub fn point(&self, row: usize, col: usize) -> Vec3 {
        self.center
            + Vec3::new(
                col as f32 * self.cell_size - self.half_width(),
                row as f32 * self.cell_size - self.half_width(),
                0.0,
            )
    }

    /// Nearest lattice cell to a world position, clamped to `[0, N]`
    pub fn cell_of(&self, p: Vec3) -> GridIndex {
        let origin = self.origin();
        let n = self.grid_size as f32;
        let col = ((p.x - origin.x) / self.cell_size).round().clamp(0.0, n);
        let row = ((p.y - origin.y) / self.cell_size).round().clamp(0.0, n);
        // NaN clamps to NaN and casts to 0
        GridIndex::new(row as usize, col as usize)
    }

    /// Lattice center cell
    #[inline]
    pub fn center_cell(&self) -> GridIndex {
        self.cell_of(self.center)
    }

    /// Reject geometry the lattice cannot be built from
    pub fn validate(&self) -> Result<()> {
        if self.grid_size < 2 {
            return Err(WarpError::InvalidConfig(format!(
                "grid_size must be at least 2, got {}",
                self.grid_size
            )));
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(WarpError::InvalidConfig(format!(
                "cell_size must be positive and finite, got {}",
                self.cell_size
            )));
        }
        if !self.center.is_finite() {
            return Err(WarpError::InvalidConfig("center must be finite".to_string()));
        }
        Ok(())
    }
}

// ── Policies ─────────────────────────────────────────────────

/// Which registered probes contribute displacement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionPolicy {
    /// Every registered probe, hidden or not (fully accumulative)
    #[default]
    AllRegistered,
    /// Only probes active in the current zoom session
    ActiveOnly,
}

/// Which active probes stop another probe's propagation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancyPolicy {
    /// Occupants at the same or a lower iteration level block
    #[default]
    SameOrLowerLevel,
    /// Only occupants at a strictly lower level block
    LowerLevelOnly,
}

impl OccupancyPolicy {
    /// Whether an occupant at `occupant_level` blocks a probe at `own_level`
    #[inline]
    pub fn blocks(self, occupant_level: u8, own_level: u8) -> bool {
        match self {
            OccupancyPolicy::SameOrLowerLevel => occupant_level <= own_level,
            OccupancyPolicy::LowerLevelOnly => occupant_level < own_level,
        }
    }
}

/// Resting position given to probes spawned by a zoom session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnAnchor {
    /// The cell's deformed position at spawn time
    #[default]
    Current,
    /// The cell's undeformed position
    Original,
}

// ── Engine ───────────────────────────────────────────────────

/// Solver, scheduler and zoom tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Movement threshold in world units
    pub epsilon: f32,
    /// Influence radius of level-1 probes, in cells
    pub root_radius: usize,
    /// Influence radius of nested probes and of an open session's parent
    pub nested_radius: usize,
    /// Cell distance between the center and the default root probes
    pub root_spacing: usize,
    /// Deepest zoom level (1 = no zoom)
    pub max_depth: usize,
    /// Contribution policy
    pub contribution: ContributionPolicy,
    /// Occupancy policy
    pub occupancy: OccupancyPolicy,
    /// Where nested probes come to rest
    pub spawn_anchor: SpawnAnchor,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            epsilon: EPSILON,
            root_radius: 2,
            nested_radius: 1,
            root_spacing: 2,
            max_depth: 2,
            contribution: ContributionPolicy::default(),
            occupancy: OccupancyPolicy::default(),
            spawn_anchor: SpawnAnchor::default(),
        }
    }
}

impl EngineConfig {
    /// Influence radius for a probe registered at `level`
    #[inline]
    pub fn radius_for_level(&self, level: u8) -> usize {
        if level <= 1 {
            self.root_radius
        } else {
            self.nested_radius
        }
    }

    /// Reject tuning the solver cannot work with
    pub fn validate(&self) -> Result<()> {
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(WarpError::InvalidConfig(format!(
                "epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        if self.root_radius == 0 || self.nested_radius == 0 {
            return Err(WarpError::InvalidConfig(
                "influence radii must be at least 1".to_string(),
            ));
        }
        if self.root_spacing == 0 {
            return Err(WarpError::InvalidConfig(
                "root_spacing must be at least 1".to_string(),
            ));
        }
        if self.max_depth == 0 || self.max_depth > u8::MAX as usize {
            return Err(WarpError::InvalidConfig(format!(
                "max_depth must be in 1..=255, got {}",
                self.max_depth
            )));
        }
        Ok(())
    }
}

// ── File ─────────────────────────────────────────────────────

/// Complete configuration as stored on disk
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpConfig {
    /// Lattice geometry
    pub grid: GridConfig,
    /// Engine tuning
    pub engine: EngineConfig,
}

impl WarpConfig {
    /// Parse from a JSON string and validate
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: WarpConfig = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from a JSON file and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let cfg: WarpConfig = serde_json::from_reader(reader)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Pretty JSON representation
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate both halves
    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        self.engine.validate()
    }
}
