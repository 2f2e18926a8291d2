//! Deformation solver
//!
//! A full rebuild resets the lattice and then adds, for every displaced
//! probe, `displacement * row_weight * col_weight` to each interior point
//! of a rectangular region around the probe's cell. The region extends in
//! each half-axis up to the nearest blocker (see [`occupancy`]) or the
//! influence radius, whichever is closer, and the weights follow the
//! smoothstep falloff in [`falloff`].
//!
//! Properties that fall out of this:
//! - the probe's own cell receives the full displacement,
//! - each half-axis tapers independently, so asymmetric neighbors give an
//!   asymmetric bulge,
//! - cells holding the anchor or a blocking probe receive nothing, while
//!   probes of a deeper level are written through and ride the field,
//! - overlapping regions sum linearly.
//!
//! Author: Moroya Sakamoto

pub mod falloff;
pub mod occupancy;

pub use falloff::{adaptive_weight, smoothstep_falloff};
pub use occupancy::{Occupant, OccupancyGrid};

use crate::config::{ContributionPolicy, EngineConfig, OccupancyPolicy};
use crate::host::{CenterAnchor, ProbeSource};
use crate::lattice::Lattice;
use crate::registry::{ProbeRecord, ProbeRegistry};
use crate::types::{Direction, GridIndex, Handle, Limits};
use glam::Vec3;

/// Counters from one rebuild
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RebuildStats {
    /// Probes whose displacement exceeded epsilon
    pub contributors: usize,
    /// Lattice writes with nonzero weight
    pub touched: usize,
}

/// Weights one probe applies to the lattice
#[derive(Debug, Clone, PartialEq)]
pub struct Stencil {
    /// Probe cell
    pub center: GridIndex,
    /// Propagation limits per half-axis
    pub limits: Limits,
    /// Interior cells with nonzero weight
    pub weights: Vec<(GridIndex, f32)>,
}

/// Stateless rebuild over lattice, registry and probe positions
#[derive(Debug, Clone, Copy)]
pub struct DeformationSolver {
    epsilon: f32,
    contribution: ContributionPolicy,
    occupancy: OccupancyPolicy,
}

impl Default for DeformationSolver {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl DeformationSolver {
    /// Solver with the engine's epsilon and policies
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            epsilon: config.epsilon,
            contribution: config.contribution,
            occupancy: config.occupancy,
        }
    }

    /// Movement threshold
    #[inline]
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Occupancy map for the current registry state
    pub fn occupancy_grid(
        &self,
        lattice: &Lattice,
        registry: &ProbeRegistry,
        anchor: Option<&CenterAnchor>,
    ) -> OccupancyGrid {
        let anchor_cell = anchor
            .filter(|a| a.active)
            .map(|a| registry.grid_index_of(Handle::Anchor, a.position));
        OccupancyGrid::build(lattice.size(), registry, anchor_cell)
    }

    /// Propagation limits of one probe
    pub fn limits(&self, occupancy: &OccupancyGrid, record: &ProbeRecord) -> Limits {
        let mut limits = Limits::default();
        for dir in Direction::ALL {
            let d = occupancy.nearest_occupant_distance(
                record.grid_index,
                dir,
                record.influence_radius,
                record.id,
                record.level,
                self.occupancy,
            );
            limits.set(dir, d.min(record.influence_radius));
        }
        limits
    }

    /// Cells and weights a probe would write, independent of its displacement
    pub fn stencil(&self, occupancy: &OccupancyGrid, record: &ProbeRecord, n: usize) -> Stencil {
        let limits = self.limits(occupancy, record);
        let center = record.grid_index;
        let mut weights = Vec::new();

        if n < 2 {
            return Stencil {
                center,
                limits,
                weights,
            };
        }

        // Region clipped to the open interior (0, N)
        let row_lo = center.row.saturating_sub(limits.down).max(1);
        let row_hi = (center.row + limits.up).min(n - 1);
        let col_lo = center.col.saturating_sub(limits.left).max(1);
        let col_hi = (center.col + limits.right).min(n - 1);

        for row in row_lo..=row_hi {
            let dr = row as isize - center.row as isize;
            let row_weight = adaptive_weight(dr, limits.down, limits.up);
            if row_weight <= 0.0 {
                continue;
            }
            for col in col_lo..=col_hi {
                let cell = GridIndex::new(row, col);
                if occupancy.blocks(cell, record.id, record.level, self.occupancy) {
                    continue;
                }
                let dc = col as isize - center.col as isize;
                let w = row_weight * adaptive_weight(dc, limits.left, limits.right);
                if w > 0.0 {
                    weights.push((cell, w));
                }
            }
        }

        Stencil {
            center,
            limits,
            weights,
        }
    }

    /// Whether a registered probe takes part under the contribution policy
    #[inline]
    fn contributes(&self, record: &ProbeRecord) -> bool {
        match self.contribution {
            ContributionPolicy::AllRegistered => true,
            ContributionPolicy::ActiveOnly => record.active,
        }
    }

    /// Recompute `current` from `original` plus every probe contribution
    pub fn rebuild<S: ProbeSource + ?Sized>(
        &self,
        lattice: &mut Lattice,
        registry: &ProbeRegistry,
        probes: &S,
        anchor: Option<&CenterAnchor>,
    ) -> RebuildStats {
        lattice.reset();
        let occupancy = self.occupancy_grid(lattice, registry, anchor);
        let n = lattice.size();
        let mut stats = RebuildStats::default();

        for record in registry.records() {
            if !self.contributes(&record) {
                continue;
            }
            // Retired or unknown handles read as resting
            let Some(live) = probes.position(record.id) else {
                continue;
            };
            let displacement: Vec3 = live - record.original;
            if displacement.length() <= self.epsilon {
                continue;
            }

            stats.contributors += 1;
            let stencil = self.stencil(&occupancy, &record, n);
            for (cell, w) in stencil.weights {
                if lattice.displace(cell, displacement * w) {
                    stats.touched += 1;
                }
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::probes::ProbeSet;
    use crate::types::ProbeId;

    struct Rig {
        lattice: Lattice,
        registry: ProbeRegistry,
        probes: ProbeSet,
        solver: DeformationSolver,
    }

    impl Rig {
        fn new() -> Self {
            let grid = GridConfig::default();
            let cfg = EngineConfig::default();
            Self {
                lattice: Lattice::build(grid),
                registry: ProbeRegistry::new(grid, &cfg),
                probes: ProbeSet::new(),
                solver: DeformationSolver::new(&cfg),
            }
        }

        fn add(&mut self, row: usize, col: usize, level: u8) -> ProbeId {
            let p = self.lattice.original(row, col);
            let id = self.probes.spawn(p);
            self.registry.register(id, p, level, None);
            id
        }

        fn rebuild(&mut self) -> RebuildStats {
            self.solver
                .rebuild(&mut self.lattice, &self.registry, &self.probes, None)
        }

        fn disp(&self, row: usize, col: usize) -> Vec3 {
            self.lattice.current(row, col) - self.lattice.original(row, col)
        }
    }

    #[test]
    fn test_zero_motion_identity() {
        let mut rig = Rig::new();
        rig.add(4, 4, 1);
        let stats = rig.rebuild();
        assert_eq!(stats.contributors, 0);
        assert_eq!(rig.lattice.current_points(), rig.lattice.original_points());
    }

    #[test]
    fn test_sub_epsilon_motion_ignored() {
        let mut rig = Rig::new();
        let id = rig.add(4, 4, 1);
        rig.probes.translate(id, Vec3::new(0.0005, 0.0, 0.0));
        assert_eq!(rig.rebuild().contributors, 0);
        assert_eq!(rig.disp(4, 4), Vec3::ZERO);
    }

    #[test]
    fn test_full_strength_and_falloff() {
        let mut rig = Rig::new();
        let id = rig.add(4, 4, 1);
        let d = Vec3::new(0.3, -0.2, 0.0);
        rig.probes.translate(id, d);
        rig.rebuild();

        assert!((rig.disp(4, 4) - d).length() < 1e-6);
        // One cell away on each axis: weight 0.5
        for (r, c) in [(4, 5), (4, 3), (5, 4), (3, 4)] {
            assert!((rig.disp(r, c) - d * 0.5).length() < 1e-6);
        }
        // Diagonal: 0.5 * 0.5
        assert!((rig.disp(5, 5) - d * 0.25).length() < 1e-6);
        // At the limit: zero
        assert_eq!(rig.disp(4, 6), Vec3::ZERO);
        assert_eq!(rig.disp(6, 4), Vec3::ZERO);
    }

    #[test]
    fn test_boundary_never_moves() {
        let mut rig = Rig::new();
        let id = rig.add(1, 1, 1);
        rig.probes.translate(id, Vec3::new(1.0, 1.0, 0.0));
        rig.rebuild();
        let n = rig.lattice.size();
        for i in 0..=n {
            for (r, c) in [(0, i), (n, i), (i, 0), (i, n)] {
                assert_eq!(rig.disp(r, c), Vec3::ZERO, "boundary ({r}, {c}) moved");
            }
        }
        assert!(rig.disp(1, 1).length() > 0.0);
    }

    #[test]
    fn test_occupancy_clipping() {
        let mut rig = Rig::new();
        let mover = rig.add(4, 2, 1);
        let _still = rig.add(4, 4, 1);
        rig.probes.translate(mover, Vec3::Y);
        rig.rebuild();

        // Midpoint between them keeps half weight
        assert!((rig.disp(4, 3) - Vec3::Y * 0.5).length() < 1e-6);
        // Stationary probe's cell receives nothing
        assert_eq!(rig.disp(4, 4), Vec3::ZERO);
    }

    #[test]
    fn test_additivity() {
        let mut rig = Rig::new();
        let a = rig.add(4, 3, 1);
        let b = rig.add(4, 5, 1);
        let da = Vec3::new(0.2, 0.0, 0.0);
        let db = Vec3::new(0.0, 0.4, 0.0);

        rig.probes.translate(a, da);
        rig.rebuild();
        let only_a = rig.lattice.current_points().to_vec();

        rig.probes.translate(a, -da);
        rig.probes.translate(b, db);
        rig.rebuild();
        let only_b = rig.lattice.current_points().to_vec();

        rig.probes.translate(a, da);
        rig.rebuild();
        let origin = rig.lattice.original_points();
        for (i, both) in rig.lattice.current_points().iter().enumerate() {
            let expect = origin[i] + (only_a[i] - origin[i]) + (only_b[i] - origin[i]);
            assert!((*both - expect).length() < 1e-5);
        }
        // Shared neighbor above the midpoint really does overlap
        assert!(rig.disp(5, 4).x > 0.0 && rig.disp(5, 4).y > 0.0);
    }

    #[test]
    fn test_anchor_blocks_and_is_skipped() {
        let mut rig = Rig::new();
        let id = rig.add(4, 3, 1);
        rig.probes.translate(id, Vec3::X);
        let anchor = CenterAnchor::at_center(rig.lattice.grid());
        rig.solver
            .rebuild(&mut rig.lattice, &rig.registry, &rig.probes, Some(&anchor));
        assert_eq!(rig.disp(4, 4), Vec3::ZERO);
        // Limit toward the anchor is one cell
        let occ = rig
            .solver
            .occupancy_grid(&rig.lattice, &rig.registry, Some(&anchor));
        let rec = rig.registry.record(id).unwrap();
        assert_eq!(rig.solver.limits(&occ, &rec).right, 1);

        // Inactive anchor is ignored
        let inactive = CenterAnchor {
            active: false,
            ..anchor
        };
        rig.solver
            .rebuild(&mut rig.lattice, &rig.registry, &rig.probes, Some(&inactive));
        assert!((rig.disp(4, 4) - Vec3::X * 0.5).length() < 1e-6);
    }

    #[test]
    fn test_asymmetric_falloff() {
        let mut rig = Rig::new();
        let mover = rig.add(4, 4, 1);
        rig.add(4, 5, 1);
        rig.probes.translate(mover, Vec3::Y);
        rig.rebuild();
        let occ = rig.solver.occupancy_grid(&rig.lattice, &rig.registry, None);
        let rec = rig.registry.record(mover).unwrap();
        let limits = rig.solver.limits(&occ, &rec);
        assert_eq!(limits.right, 1);
        assert_eq!(limits.left, 2);
        assert!((rig.disp(4, 3) - Vec3::Y * 0.5).length() < 1e-6);
        assert_eq!(rig.disp(4, 5), Vec3::ZERO);
    }

    #[test]
    fn test_root_field_writes_through_nested_cell() {
        let mut rig = Rig::new();
        let root = rig.add(4, 2, 1);
        let nested = rig.add(4, 3, 2);
        rig.probes.translate(root, Vec3::Y);
        rig.rebuild();

        let occ = rig.solver.occupancy_grid(&rig.lattice, &rig.registry, None);
        let rec = rig.registry.record(root).unwrap();
        assert_eq!(rig.solver.limits(&occ, &rec).right, 2);
        // The nested probe's cell follows the root bulge
        assert!((rig.disp(4, 3) - Vec3::Y * 0.5).length() < 1e-6);

        // The nested probe itself stops at the root's cell
        rig.probes.translate(root, -Vec3::Y);
        rig.probes.translate(nested, Vec3::X);
        rig.rebuild();
        assert!((rig.disp(4, 3) - Vec3::X).length() < 1e-6);
        assert_eq!(rig.disp(4, 2), Vec3::ZERO);
    }

    #[test]
    fn test_hidden_probe_policy() {
        let mut rig = Rig::new();
        let id = rig.add(4, 4, 1);
        rig.probes.translate(id, Vec3::X);
        rig.registry.set_active(id, false);

        rig.rebuild();
        assert!((rig.disp(4, 4) - Vec3::X).length() < 1e-6);

        rig.solver = DeformationSolver::new(&EngineConfig {
            contribution: ContributionPolicy::ActiveOnly,
            ..Default::default()
        });
        let stats = rig.rebuild();
        assert_eq!(stats.contributors, 0);
        assert_eq!(rig.disp(4, 4), Vec3::ZERO);
    }

    #[test]
    fn test_unknown_probe_is_resting() {
        let mut rig = Rig::new();
        let id = rig.add(4, 4, 1);
        rig.probes.translate(id, Vec3::X);
        rig.probes.retire(id);
        assert_eq!(rig.rebuild().contributors, 0);
    }
}
