//! Warp engine
//!
//! Owns the lattice, registry, scheduler and zoom stack and exposes the
//! operations a host drives once per frame:
//!
//! ```rust
//! use alice_warp::prelude::*;
//!
//! let mut engine: WarpEngine = WarpEngine::new(EngineConfig::default());
//! let grid = GridConfig::default();
//! let ready = engine.initialize(Some(&grid), Some(ProbeSet::new()), Some(CenterAnchor::at_center(&grid)));
//! assert!(ready.is_ready());
//!
//! let probe = engine.root_probes()[0];
//! engine.probes_mut().unwrap().translate(probe, Vec3::new(0.25, 0.0, 0.0));
//! assert!(matches!(engine.tick(), TickOutcome::Rebuilt(_)));
//! ```
//!
//! Until [`WarpEngine::initialize`] succeeds the engine is disabled: ticks
//! do nothing, render queries return zero vectors and navigation reports
//! [`WarpError::NotReady`].
//!
//! Author: Moroya Sakamoto

use crate::config::{EngineConfig, GridConfig};
use crate::error::{Result, WarpError};
use crate::host::{CenterAnchor, GridHost, ProbeSource, RenderSink};
use crate::lattice::Lattice;
use crate::probes::ProbeSet;
use crate::registry::ProbeRegistry;
use crate::scheduler::RebuildScheduler;
use crate::solver::{DeformationSolver, RebuildStats};
use crate::types::{GridIndex, Handle, ProbeId};
use crate::zoom::{root_layout, IterationManager, Transition, ZoomContext};
use glam::Vec3;

/// Result of [`WarpEngine::initialize`]
#[derive(Debug)]
pub enum Readiness {
    /// Engine is running
    Ready,
    /// Engine stays disabled
    NotReady(WarpError),
}

impl Readiness {
    /// True for [`Readiness::Ready`]
    #[inline]
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }
}

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Engine not initialized
    Disabled,
    /// Nothing moved
    Idle,
    /// One full rebuild ran
    Rebuilt(RebuildStats),
}

struct Core<S> {
    lattice: Lattice,
    registry: ProbeRegistry,
    probes: S,
    anchor: Option<CenterAnchor>,
    solver: DeformationSolver,
    scheduler: RebuildScheduler,
    zoom: IterationManager,
}

/// Probe-driven lattice deformation engine
pub struct WarpEngine<S: ProbeSource = ProbeSet> {
    config: EngineConfig,
    core: Option<Core<S>>,
}

impl<S: ProbeSource> WarpEngine<S> {
    /// Disabled engine with the given tuning
    pub fn new(config: EngineConfig) -> Self {
        Self { config, core: None }
    }

    /// Engine tuning
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Bring the engine up once its collaborators exist.
    ///
    /// A missing grid host or probe source, or an invalid configuration,
    /// leaves the engine disabled. An empty probe source is populated with
    /// the default root layout; otherwise its probes become the root
    /// probes in order. Re-initializing replaces all previous state.
    pub fn initialize(
        &mut self,
        grid: Option<&dyn GridHost>,
        probes: Option<S>,
        anchor: Option<CenterAnchor>,
    ) -> Readiness {
        let Some(host) = grid else {
            return self.disable(WarpError::ConfigurationMissing("grid host"));
        };
        let Some(mut probes) = probes else {
            return self.disable(WarpError::ConfigurationMissing("probe source"));
        };
        let grid = host.grid_config();
        if let Err(e) = grid.validate().and_then(|_| self.config.validate()) {
            return self.disable(e);
        }

        let lattice = Lattice::build(grid);
        let mut registry = ProbeRegistry::new(grid, &self.config);

        if probes.is_empty() {
            for cell in root_layout(&grid, self.config.root_spacing) {
                probes.spawn(lattice.original(cell.row, cell.col));
            }
        }
        let anchor_at = anchor_cell(&registry, anchor.as_ref());
        let mut root = Vec::new();
        for id in probes.ids() {
            let Some(rest) = probes.position(id) else {
                continue;
            };
            if Some(grid.cell_of(rest)) == anchor_at {
                tracing::warn!("{} ignored: it rests on the anchor cell", id);
                continue;
            }
            if registry.register(id, rest, 1, None) {
                root.push(id);
            }
        }

        let mut scheduler = RebuildScheduler::new();
        scheduler.force_rebuild();

        tracing::info!(
            "warp engine ready: {}x{} cells, {} root probes, anchor {}",
            grid.grid_size,
            grid.grid_size,
            root.len(),
            if anchor.is_some() { "on" } else { "off" }
        );

        self.core = Some(Core {
            lattice,
            registry,
            probes,
            anchor,
            solver: DeformationSolver::new(&self.config),
            scheduler,
            zoom: IterationManager::new(root, self.config.max_depth),
        });
        Readiness::Ready
    }

    fn disable(&mut self, reason: WarpError) -> Readiness {
        tracing::warn!("warp engine disabled: {}", reason);
        self.core = None;
        Readiness::NotReady(reason)
    }

    /// Whether [`Self::initialize`] succeeded
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.core.is_some()
    }

    // ── Per-frame ────────────────────────────────────────────

    /// Detect probe motion and rebuild at most once
    pub fn tick(&mut self) -> TickOutcome {
        let Some(core) = self.core.as_mut() else {
            return TickOutcome::Disabled;
        };
        match core.scheduler.tick(
            &core.solver,
            &mut core.lattice,
            &core.registry,
            &core.probes,
            core.anchor.as_ref(),
        ) {
            Some(stats) => {
                tracing::debug!(
                    "rebuild #{}: {} contributors, {} points touched",
                    core.scheduler.rebuild_count(),
                    stats.contributors,
                    stats.touched
                );
                TickOutcome::Rebuilt(stats)
            }
            None => TickOutcome::Idle,
        }
    }

    /// Schedule a rebuild for the next tick
    pub fn force_rebuild(&mut self) {
        if let Some(core) = self.core.as_mut() {
            core.scheduler.force_rebuild();
        }
    }

    /// Put the lattice back to rest and schedule a rebuild
    pub fn reset(&mut self) {
        if let Some(core) = self.core.as_mut() {
            core.scheduler.reset(&mut core.lattice);
        }
    }

    /// Return to level 1 and drop every nested probe.
    ///
    /// Nested probes are unregistered and retired from the source; root
    /// probes get their radius back and keep their live positions.
    pub fn hard_reset(&mut self) -> Result<()> {
        let config = self.config;
        let core = self.core.as_mut().ok_or(WarpError::NotReady)?;
        {
            let mut ctx = ZoomContext {
                lattice: &mut core.lattice,
                registry: &mut core.registry,
                probes: &mut core.probes,
                solver: &core.solver,
                anchor: core.anchor.as_ref(),
                config: &config,
            };
            core.zoom.unwind_all(&mut ctx);
        }
        let nested = core.zoom.take_nested();
        for &id in &nested {
            core.registry.unregister(id);
            core.probes.retire(id);
        }
        for &id in core.zoom.root() {
            core.registry.set_influence_radius(id, config.root_radius);
            core.registry.set_active(id, true);
        }
        core.scheduler.reset(&mut core.lattice);
        core.scheduler.clear_snapshot();
        tracing::info!("warp engine hard reset: {} nested probes dropped", nested.len());
        Ok(())
    }

    // ── Zoom ─────────────────────────────────────────────────

    fn navigate<F>(&mut self, f: F) -> Result<Transition>
    where
        F: FnOnce(&mut IterationManager, &mut ZoomContext<'_, S>) -> Result<Transition>,
    {
        let core = self.core.as_mut().ok_or(WarpError::NotReady)?;
        let mut ctx = ZoomContext {
            lattice: &mut core.lattice,
            registry: &mut core.registry,
            probes: &mut core.probes,
            solver: &core.solver,
            anchor: core.anchor.as_ref(),
            config: &self.config,
        };
        let transition = f(&mut core.zoom, &mut ctx)?;
        core.scheduler.force_rebuild();
        Ok(transition)
    }

    /// First visit into the probe at `slot` of the current session
    pub fn advance_into(&mut self, slot: usize) -> Result<Transition> {
        self.navigate(|zoom, ctx| zoom.advance_into(slot, ctx))
    }

    /// Revisit the probe at `slot` of the current session
    pub fn return_into(&mut self, slot: usize) -> Result<Transition> {
        self.navigate(|zoom, ctx| zoom.return_into(slot, ctx))
    }

    /// Advance or return, whichever applies
    pub fn enter(&mut self, slot: usize) -> Result<Transition> {
        self.navigate(|zoom, ctx| zoom.enter(slot, ctx))
    }

    /// Close the innermost session
    pub fn unwind(&mut self) -> Result<Transition> {
        self.navigate(|zoom, ctx| zoom.unwind(ctx))
    }

    /// Current zoom level; 0 while disabled
    #[inline]
    pub fn level(&self) -> usize {
        self.core.as_ref().map_or(0, |c| c.zoom.level())
    }

    /// Probes of the current session, selectable by slot
    pub fn active_probes(&self) -> &[ProbeId] {
        self.core
            .as_ref()
            .map(|c| c.zoom.active_probes())
            .unwrap_or_default()
    }

    /// Level-1 probes
    pub fn root_probes(&self) -> &[ProbeId] {
        self.core
            .as_ref()
            .map(|c| c.zoom.root())
            .unwrap_or_default()
    }

    /// Zoom stack
    pub fn zoom(&self) -> Option<&IterationManager> {
        self.core.as_ref().map(|c| &c.zoom)
    }

    // ── Registry API ─────────────────────────────────────────

    /// Register a probe the host created itself.
    ///
    /// Refused when its cell is held by the anchor or another active probe.
    pub fn register_probe(
        &mut self,
        id: ProbeId,
        original: Vec3,
        level: u8,
        grid_index: Option<GridIndex>,
    ) -> bool {
        let Some(core) = self.core.as_mut() else {
            return false;
        };
        let cell = grid_index.unwrap_or_else(|| core.lattice.grid().cell_of(original));
        if Some(cell) == anchor_cell(&core.registry, core.anchor.as_ref()) {
            tracing::warn!("{} refused: cell {} holds the anchor", id, cell);
            return false;
        }
        let added = core.registry.register(id, original, level, grid_index);
        if added {
            core.scheduler.force_rebuild();
        }
        added
    }

    /// Drop a probe's bookkeeping
    pub fn unregister_probe(&mut self, id: ProbeId) -> bool {
        let Some(core) = self.core.as_mut() else {
            return false;
        };
        let removed = core.registry.unregister(id);
        if removed {
            core.scheduler.force_rebuild();
        }
        removed
    }

    /// Influence radius; the root radius for unknown probes
    pub fn influence_radius(&self, id: ProbeId) -> usize {
        self.core
            .as_ref()
            .map_or(self.config.root_radius, |c| c.registry.influence_radius(id))
    }

    /// Grid cell of a probe: cached when registered, else from its live position
    pub fn grid_index(&self, id: ProbeId) -> Option<GridIndex> {
        let core = self.core.as_ref()?;
        if let Some(cell) = core.registry.grid_index(id) {
            return Some(cell);
        }
        let live = core.probes.position(id)?;
        Some(core.registry.grid_index_of(Handle::Probe(id), live))
    }

    /// Grid cell of the center anchor
    pub fn anchor_index(&self) -> Option<GridIndex> {
        let core = self.core.as_ref()?;
        let anchor = core.anchor?;
        Some(core.registry.grid_index_of(Handle::Anchor, anchor.position))
    }

    /// `live - original` of a probe; zero when unregistered or unknown
    pub fn probe_displacement(&self, id: ProbeId) -> Vec3 {
        self.core.as_ref().map_or(Vec3::ZERO, |c| {
            c.probes
                .position(id)
                .map_or(Vec3::ZERO, |live| c.registry.displacement(id, live))
        })
    }

    /// Whether a probe belongs to the current session
    pub fn is_probe_active(&self, id: ProbeId) -> bool {
        self.core.as_ref().is_some_and(|c| c.registry.is_active(id))
    }

    // ── Collaborators ────────────────────────────────────────

    /// Probe registry
    pub fn registry(&self) -> Option<&ProbeRegistry> {
        self.core.as_ref().map(|c| &c.registry)
    }

    /// Lattice
    pub fn lattice(&self) -> Option<&Lattice> {
        self.core.as_ref().map(|c| &c.lattice)
    }

    /// Probe source
    pub fn probes(&self) -> Option<&S> {
        self.core.as_ref().map(|c| &c.probes)
    }

    /// Probe source, for the input layer to move probes
    pub fn probes_mut(&mut self) -> Option<&mut S> {
        self.core.as_mut().map(|c| &mut c.probes)
    }

    /// Center anchor
    pub fn anchor(&self) -> Option<&CenterAnchor> {
        self.core.as_ref().and_then(|c| c.anchor.as_ref())
    }

    /// Toggle the anchor's participation in occupancy checks
    pub fn set_anchor_active(&mut self, active: bool) {
        if let Some(core) = self.core.as_mut() {
            if let Some(anchor) = core.anchor.as_mut() {
                if anchor.active != active {
                    anchor.active = active;
                    core.scheduler.force_rebuild();
                }
            }
        }
    }

    /// Lattice geometry
    pub fn grid(&self) -> Option<&GridConfig> {
        self.core.as_ref().map(|c| c.lattice.grid())
    }
}

/// Cell of the anchor when it takes part in occupancy
fn anchor_cell(registry: &ProbeRegistry, anchor: Option<&CenterAnchor>) -> Option<GridIndex> {
    anchor
        .filter(|a| a.active)
        .map(|a| registry.grid_index_of(Handle::Anchor, a.position))
}

impl WarpEngine<ProbeSet> {
    /// Ready engine over `grid` with the default root layout and a center anchor
    pub fn with_defaults(grid: GridConfig, config: EngineConfig) -> Result<Self> {
        let mut engine = Self::new(config);
        match engine.initialize(
            Some(&grid),
            Some(ProbeSet::new()),
            Some(CenterAnchor::at_center(&grid)),
        ) {
            Readiness::Ready => Ok(engine),
            Readiness::NotReady(e) => Err(e),
        }
    }
}

impl<S: ProbeSource> RenderSink for WarpEngine<S> {
    fn grid_size(&self) -> usize {
        self.core.as_ref().map_or(0, |c| c.lattice.size())
    }

    fn current_point(&self, row: usize, col: usize) -> Vec3 {
        self.core
            .as_ref()
            .map_or(Vec3::ZERO, |c| c.lattice.current(row, col))
    }

    fn original_point(&self, row: usize, col: usize) -> Vec3 {
        self.core
            .as_ref()
            .map_or(Vec3::ZERO, |c| c.lattice.original(row, col))
    }
}
