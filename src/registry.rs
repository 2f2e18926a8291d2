//! Probe registry
//!
//! Bookkeeping for every probe ever placed, across all zoom levels. Data is
//! kept in parallel arrays indexed by [`ProbeId`] slot, with a separate
//! registration order list so iteration is stable.
//!
//! Probes are never unregistered by zoom navigation; hiding only flips
//! the `active` flag. [`ProbeRegistry::unregister`] exists for hard resets.
//!
//! Author: Moroya Sakamoto

use crate::config::{EngineConfig, GridConfig};
use crate::types::{GridIndex, Handle, ProbeId};
use glam::Vec3;

/// Upper bound on probe id slots; the registry stores one entry per slot.
pub const MAX_PROBE_SLOTS: usize = 1 << 20;

/// Snapshot of one registry entry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeRecord {
    /// Probe identity
    pub id: ProbeId,
    /// Rest position displacement is measured from
    pub original: Vec3,
    /// Cell the probe occupies
    pub grid_index: GridIndex,
    /// Propagation radius in cells
    pub influence_radius: usize,
    /// Iteration level (1 = root)
    pub level: u8,
    /// Whether the probe belongs to the visible session
    pub active: bool,
}

/// Central probe bookkeeping
#[derive(Debug, Clone)]
pub struct ProbeRegistry {
    grid: GridConfig,
    root_radius: usize,
    nested_radius: usize,

    // Parallel arrays, indexed by ProbeId slot
    registered: Vec<bool>,
    original: Vec<Vec3>,
    grid_index: Vec<GridIndex>,
    radius: Vec<usize>,
    level: Vec<u8>,
    active: Vec<bool>,

    order: Vec<ProbeId>,
}

impl ProbeRegistry {
    /// Empty registry over `grid`
    pub fn new(grid: GridConfig, engine: &EngineConfig) -> Self {
        Self {
            grid,
            root_radius: engine.root_radius,
            nested_radius: engine.nested_radius,
            registered: Vec::new(),
            original: Vec::new(),
            grid_index: Vec::new(),
            radius: Vec::new(),
            level: Vec::new(),
            active: Vec::new(),
            order: Vec::new(),
        }
    }

    fn ensure_slot(&mut self, slot: usize) {
        if slot >= self.registered.len() {
            let len = slot + 1;
            self.registered.resize(len, false);
            self.original.resize(len, Vec3::ZERO);
            self.grid_index.resize(len, GridIndex::default());
            self.radius.resize(len, 0);
            self.level.resize(len, 0);
            self.active.resize(len, false);
        }
    }

    /// Register a probe.
    ///
    /// Idempotent by identity: returns `false` and changes nothing when `id`
    /// is already registered. An explicit grid index is trusted as given
    /// (nested probes may rest off a clean cell center); otherwise the
    /// index is the nearest cell to `original`. New probes start active.
    ///
    /// Also refused: a cell already held by another active probe, and ids
    /// at or beyond [`MAX_PROBE_SLOTS`].
    pub fn register(
        &mut self,
        id: ProbeId,
        original: Vec3,
        level: u8,
        explicit_grid_index: Option<GridIndex>,
    ) -> bool {
        if self.is_registered(id) {
            return false;
        }
        let slot = id.index();
        if slot >= MAX_PROBE_SLOTS {
            tracing::warn!("{} refused: ids must stay below {}", id, MAX_PROBE_SLOTS);
            return false;
        }
        let cell = explicit_grid_index.unwrap_or_else(|| self.grid.cell_of(original));
        if let Some(holder) = self.active_at(cell) {
            tracing::warn!("{} refused: cell {} is held by {}", id, cell, holder);
            return false;
        }
        self.ensure_slot(slot);

        let level = level.max(1);
        self.registered[slot] = true;
        self.original[slot] = original;
        self.grid_index[slot] = cell;
        self.radius[slot] = if level == 1 {
            self.root_radius
        } else {
            self.nested_radius
        };
        self.level[slot] = level;
        self.active[slot] = true;
        self.order.push(id);
        true
    }

    /// Remove all bookkeeping for a probe. Returns whether it was registered.
    pub fn unregister(&mut self, id: ProbeId) -> bool {
        if !self.is_registered(id) {
            return false;
        }
        self.registered[id.index()] = false;
        self.active[id.index()] = false;
        self.order.retain(|p| *p != id);
        true
    }

    /// Whether `id` has an entry
    #[inline]
    pub fn is_registered(&self, id: ProbeId) -> bool {
        self.registered.get(id.index()).copied().unwrap_or(false)
    }

    /// Number of registered probes
    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True when nothing is registered
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Registered ids in registration order
    #[inline]
    pub fn ids(&self) -> &[ProbeId] {
        &self.order
    }

    /// Entry for `id`
    pub fn record(&self, id: ProbeId) -> Option<ProbeRecord> {
        if !self.is_registered(id) {
            return None;
        }
        let s = id.index();
        Some(ProbeRecord {
            id,
            original: self.original[s],
            grid_index: self.grid_index[s],
            influence_radius: self.radius[s],
            level: self.level[s],
            active: self.active[s],
        })
    }

    /// Entries in registration order
    pub fn records(&self) -> impl Iterator<Item = ProbeRecord> + '_ {
        self.order.iter().filter_map(move |id| self.record(*id))
    }

    /// Active probe occupying `cell`, if any
    pub fn active_at(&self, cell: GridIndex) -> Option<ProbeId> {
        self.order
            .iter()
            .copied()
            .find(|id| self.active[id.index()] && self.grid_index[id.index()] == cell)
    }

    /// Cached grid index of a registered probe
    #[inline]
    pub fn grid_index(&self, id: ProbeId) -> Option<GridIndex> {
        self.is_registered(id).then(|| self.grid_index[id.index()])
    }

    /// Grid index of any cell occupant.
    ///
    /// Registered probes answer from the cache. The anchor and unregistered
    /// probes are located from `live_position`.
    pub fn grid_index_of(&self, handle: Handle, live_position: Vec3) -> GridIndex {
        match handle {
            Handle::Probe(id) => self
                .grid_index(id)
                .unwrap_or_else(|| self.grid.cell_of(live_position)),
            Handle::Anchor => self.grid.cell_of(live_position),
        }
    }

    /// Stored influence radius, root radius for unknown probes
    #[inline]
    pub fn influence_radius(&self, id: ProbeId) -> usize {
        if self.is_registered(id) {
            self.radius[id.index()]
        } else {
            self.root_radius
        }
    }

    /// Override the influence radius of a registered probe
    pub fn set_influence_radius(&mut self, id: ProbeId, radius: usize) -> bool {
        if !self.is_registered(id) {
            return false;
        }
        self.radius[id.index()] = radius;
        true
    }

    /// Rest position of a registered probe
    #[inline]
    pub fn original_position(&self, id: ProbeId) -> Option<Vec3> {
        self.is_registered(id).then(|| self.original[id.index()])
    }

    /// Iteration level of a registered probe
    #[inline]
    pub fn level(&self, id: ProbeId) -> Option<u8> {
        self.is_registered(id).then(|| self.level[id.index()])
    }

    /// Whether a registered probe is in the visible session
    #[inline]
    pub fn is_active(&self, id: ProbeId) -> bool {
        self.is_registered(id) && self.active[id.index()]
    }

    /// Show or hide a registered probe
    pub fn set_active(&mut self, id: ProbeId, active: bool) -> bool {
        if !self.is_registered(id) {
            return false;
        }
        self.active[id.index()] = active;
        true
    }

    /// `live - original` for a registered probe.
    ///
    /// Unknown probes have no rest position and therefore zero displacement.
    #[inline]
    pub fn displacement(&self, id: ProbeId, live_position: Vec3) -> Vec3 {
        self.original_position(id)
            .map_or(Vec3::ZERO, |o| live_position - o)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ProbeRegistry {
        ProbeRegistry::new(GridConfig::default(), &EngineConfig::default())
    }

    #[test]
    fn test_register_assigns_radius_and_index() {
        let mut reg = registry();
        assert!(reg.register(ProbeId(0), Vec3::new(-2.0, -2.0, 0.0), 1, None));
        assert!(reg.register(ProbeId(3), Vec3::new(0.4, 0.6, 0.0), 2, None));

        let root = reg.record(ProbeId(0)).unwrap();
        assert_eq!(root.grid_index, GridIndex::new(2, 2));
        assert_eq!(root.influence_radius, 2);
        assert!(root.active);

        let nested = reg.record(ProbeId(3)).unwrap();
        assert_eq!(nested.grid_index, GridIndex::new(5, 4));
        assert_eq!(nested.influence_radius, 1);
        assert_eq!(reg.ids(), &[ProbeId(0), ProbeId(3)]);
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut reg = registry();
        assert!(reg.register(ProbeId(1), Vec3::ZERO, 1, None));
        assert!(!reg.register(ProbeId(1), Vec3::ONE, 2, None));
        assert_eq!(reg.original_position(ProbeId(1)), Some(Vec3::ZERO));
        assert_eq!(reg.level(ProbeId(1)), Some(1));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_one_active_probe_per_cell() {
        let mut reg = registry();
        assert!(reg.register(ProbeId(0), Vec3::new(-2.0, 0.0, 0.0), 1, None));
        assert!(!reg.register(ProbeId(1), Vec3::new(-2.1, 0.1, 0.0), 1, None));
        assert!(!reg.is_registered(ProbeId(1)));
        assert_eq!(reg.active_at(GridIndex::new(4, 2)), Some(ProbeId(0)));

        // A hidden holder leaves the cell free
        reg.set_active(ProbeId(0), false);
        assert!(reg.register(ProbeId(1), Vec3::new(-2.0, 0.0, 0.0), 2, None));
        assert_eq!(reg.active_at(GridIndex::new(4, 2)), Some(ProbeId(1)));
    }

    #[test]
    fn test_sparse_ids_are_refused() {
        let mut reg = registry();
        assert!(!reg.register(ProbeId(u32::MAX), Vec3::ZERO, 1, None));
        assert!(!reg.register(ProbeId(MAX_PROBE_SLOTS as u32), Vec3::ZERO, 1, None));
        assert!(reg.is_empty());
        assert_eq!(reg.influence_radius(ProbeId(u32::MAX)), 2);
    }

    #[test]
    fn test_explicit_index_is_trusted() {
        let mut reg = registry();
        reg.register(ProbeId(0), Vec3::new(0.45, 0.0, 0.0), 2, Some(GridIndex::new(4, 5)));
        assert_eq!(reg.grid_index(ProbeId(0)), Some(GridIndex::new(4, 5)));
    }

    #[test]
    fn test_unregistered_fallbacks() {
        let mut reg = registry();
        let live = Vec3::new(1.0, -1.0, 0.0);
        assert_eq!(reg.influence_radius(ProbeId(9)), 2);
        assert_eq!(reg.displacement(ProbeId(9), live), Vec3::ZERO);
        assert_eq!(
            reg.grid_index_of(Handle::Probe(ProbeId(9)), live),
            GridIndex::new(3, 5)
        );
        assert_eq!(reg.grid_index_of(Handle::Anchor, Vec3::ZERO), GridIndex::new(4, 4));

        reg.register(ProbeId(9), live, 1, None);
        assert!(reg.unregister(ProbeId(9)));
        assert!(!reg.unregister(ProbeId(9)));
        assert!(reg.record(ProbeId(9)).is_none());
        assert!(reg.is_empty());
    }

    #[test]
    fn test_grid_index_of_prefers_cache() {
        let mut reg = registry();
        reg.register(ProbeId(0), Vec3::ZERO, 1, None);
        // Live position has drifted two cells; cached index wins
        let live = Vec3::new(2.0, 0.0, 0.0);
        assert_eq!(
            reg.grid_index_of(Handle::Probe(ProbeId(0)), live),
            GridIndex::new(4, 4)
        );
        assert_eq!(reg.displacement(ProbeId(0), live), Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_active_flag() {
        let mut reg = registry();
        reg.register(ProbeId(0), Vec3::ZERO, 1, None);
        assert!(reg.set_active(ProbeId(0), false));
        assert!(!reg.is_active(ProbeId(0)));
        assert!(!reg.set_active(ProbeId(5), true));
        assert!(reg.set_influence_radius(ProbeId(0), 1));
        assert_eq!(reg.influence_radius(ProbeId(0)), 1);
    }
}
