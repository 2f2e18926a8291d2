//! Rebuild scheduler
//!
//! `Idle -> Dirty -> Idle`. Each tick compares every registered probe's
//! live position to a cached snapshot; any change beyond epsilon marks the
//! scheduler dirty, and a dirty tick runs exactly one full rebuild.
//! Collaborators that change registration without moving a probe (zoom
//! navigation) call [`RebuildScheduler::force_rebuild`].
//!
//! Author: Moroya Sakamoto

use crate::host::{CenterAnchor, ProbeSource};
use crate::lattice::Lattice;
use crate::registry::ProbeRegistry;
use crate::solver::{DeformationSolver, RebuildStats};
use glam::Vec3;

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    /// Lattice matches the last snapshot
    #[default]
    Idle,
    /// A rebuild is due this tick
    Dirty,
}

/// Dirty-flag controller for full rebuilds
#[derive(Debug, Clone, Default)]
pub struct RebuildScheduler {
    state: SchedulerState,
    // Indexed by ProbeId slot
    last_positions: Vec<Option<Vec3>>,
    rebuilds: u64,
}

impl RebuildScheduler {
    /// Idle scheduler with an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    #[inline]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// True when a rebuild is pending
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.state == SchedulerState::Dirty
    }

    /// Number of rebuilds run so far
    #[inline]
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /// Request a rebuild on the next tick
    #[inline]
    pub fn force_rebuild(&mut self) {
        self.state = SchedulerState::Dirty;
    }

    /// Compare live positions with the snapshot and refresh it.
    ///
    /// Every moved probe's entry is updated in one pass, so a burst of
    /// movement costs one rebuild. Newly seen and newly vanished probes
    /// count as movement. Returns whether anything moved.
    pub fn detect_motion<S: ProbeSource + ?Sized>(
        &mut self,
        registry: &ProbeRegistry,
        probes: &S,
        epsilon: f32,
    ) -> bool {
        let mut moved = false;
        for &id in registry.ids() {
            let slot = id.index();
            if slot >= self.last_positions.len() {
                self.last_positions.resize(slot + 1, None);
            }
            let live = probes.position(id);
            let changed = match (self.last_positions[slot], live) {
                (Some(prev), Some(now)) => (now - prev).length() > epsilon,
                (None, None) => false,
                _ => true,
            };
            if changed {
                self.last_positions[slot] = live;
                moved = true;
            }
        }
        if moved {
            self.state = SchedulerState::Dirty;
        }
        moved
    }

    /// One scheduler tick: detect motion, then rebuild at most once.
    pub fn tick<S: ProbeSource + ?Sized>(
        &mut self,
        solver: &DeformationSolver,
        lattice: &mut Lattice,
        registry: &ProbeRegistry,
        probes: &S,
        anchor: Option<&CenterAnchor>,
    ) -> Option<RebuildStats> {
        self.detect_motion(registry, probes, solver.epsilon());
        if !self.is_dirty() {
            return None;
        }
        let stats = solver.rebuild(lattice, registry, probes, anchor);
        self.rebuilds += 1;
        self.state = SchedulerState::Idle;
        Some(stats)
    }

    /// Put the lattice back to rest and schedule a rebuild
    pub fn reset(&mut self, lattice: &mut Lattice) {
        lattice.reset();
        self.force_rebuild();
    }

    /// Drop snapshot entries; the next tick sees every probe as new
    pub fn clear_snapshot(&mut self) {
        self.last_positions.clear();
        self.force_rebuild();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EngineConfig, GridConfig};
    use crate::probes::ProbeSet;

    fn setup() -> (Lattice, ProbeRegistry, ProbeSet, DeformationSolver) {
        let grid = GridConfig::default();
        let cfg = EngineConfig::default();
        let lattice = Lattice::build(grid);
        let mut registry = ProbeRegistry::new(grid, &cfg);
        let mut probes = ProbeSet::new();
        let p = lattice.original(4, 4);
        let id = probes.spawn(p);
        registry.register(id, p, 1, None);
        (lattice, registry, probes, DeformationSolver::new(&cfg))
    }

    #[test]
    fn test_first_tick_rebuilds_then_idles() {
        let (mut lat, reg, probes, solver) = setup();
        let mut sched = RebuildScheduler::new();
        assert!(sched.tick(&solver, &mut lat, &reg, &probes, None).is_some());
        assert_eq!(sched.state(), SchedulerState::Idle);
        assert!(sched.tick(&solver, &mut lat, &reg, &probes, None).is_none());
        assert_eq!(sched.rebuild_count(), 1);
    }

    #[test]
    fn test_motion_triggers_single_rebuild() {
        let (mut lat, reg, mut probes, solver) = setup();
        let mut sched = RebuildScheduler::new();
        sched.tick(&solver, &mut lat, &reg, &probes, None);

        let id = reg.ids()[0];
        probes.translate(id, Vec3::new(0.5, 0.0, 0.0));
        let stats = sched.tick(&solver, &mut lat, &reg, &probes, None).unwrap();
        assert_eq!(stats.contributors, 1);
        assert!(sched.tick(&solver, &mut lat, &reg, &probes, None).is_none());
        assert_eq!(sched.rebuild_count(), 2);
    }

    #[test]
    fn test_tiny_motion_ignored() {
        let (mut lat, reg, mut probes, solver) = setup();
        let mut sched = RebuildScheduler::new();
        sched.tick(&solver, &mut lat, &reg, &probes, None);
        probes.translate(reg.ids()[0], Vec3::splat(0.0001));
        assert!(sched.tick(&solver, &mut lat, &reg, &probes, None).is_none());
    }

    #[test]
    fn test_force_and_reset() {
        let (mut lat, reg, mut probes, solver) = setup();
        let mut sched = RebuildScheduler::new();
        probes.translate(reg.ids()[0], Vec3::X);
        sched.tick(&solver, &mut lat, &reg, &probes, None);
        let deformed = lat.current_points().to_vec();

        sched.force_rebuild();
        assert!(sched.is_dirty());
        assert!(sched.tick(&solver, &mut lat, &reg, &probes, None).is_some());

        sched.reset(&mut lat);
        assert_eq!(lat.current_points(), lat.original_points());
        sched.reset(&mut lat);
        assert_eq!(lat.current_points(), lat.original_points());
        sched.tick(&solver, &mut lat, &reg, &probes, None);
        assert_eq!(lat.current_points(), &deformed[..]);
    }
}
