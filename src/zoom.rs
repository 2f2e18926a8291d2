//! Iteration (zoom) manager
//!
//! Keeps a stack of sessions. The bottom session holds the root probes.
//! Selecting a probe opens a nested session around it: on the first visit
//! up to eight new probes are spawned on the neighboring cells not held by
//! the anchor or by any shallower probe, and on later visits the same
//! probes are shown again. Navigation only flips
//! active flags and radii, it never destroys a probe, so displacement left
//! in a session is still there when the session is reopened.
//!
//! ```text
//!   Level1 ──advance_into / return_into──▶ Level2 ──▶ … ──▶ Level{max_depth}
//!      ▲                                      │
//!      └───────────────── unwind ─────────────┘
//! ```
//!
//! Author: Moroya Sakamoto

use crate::config::{EngineConfig, GridConfig, SpawnAnchor};
use crate::error::{Result, WarpError};
use crate::host::{CenterAnchor, ProbeSource};
use crate::lattice::Lattice;
use crate::registry::ProbeRegistry;
use crate::solver::DeformationSolver;
use crate::types::{GridIndex, Handle, ProbeId};
use std::collections::{HashMap, HashSet};

/// The 3x3 neighborhood minus its center
const NEIGHBOR_OFFSETS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Cells of the default root configuration.
///
/// The 3x3 ring around the center cell, scaled by `spacing`, minus any
/// cell on or beyond the lattice boundary.
pub fn root_layout(grid: &GridConfig, spacing: usize) -> Vec<GridIndex> {
    let n = grid.grid_size;
    let center = grid.center_cell();
    let s = spacing.max(1) as isize;
    NEIGHBOR_OFFSETS
        .iter()
        .filter_map(|&(dr, dc)| center.offset(dr * s, dc * s, n))
        .filter(|cell| !cell.is_boundary(n))
        .collect()
}

/// One level of the zoom stack
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Probe the session was opened around; `None` at the root
    pub parent: Option<ProbeId>,
    /// Active probes, selectable by slot; the parent comes last
    pub members: Vec<ProbeId>,
    /// Iteration level (1 = root)
    pub level: u8,
}

/// Outcome of a navigation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// First visit: nested probes were created
    Advanced {
        /// Parent probe
        parent: ProbeId,
        /// Number of probes spawned
        spawned: usize,
    },
    /// Revisit: existing nested probes were shown again
    Returned {
        /// Parent probe
        parent: ProbeId,
    },
    /// Session closed
    Unwound {
        /// Parent of the closed session
        parent: ProbeId,
    },
}

/// Mutable engine state a transition works on
pub struct ZoomContext<'a, S: ProbeSource + ?Sized> {
    /// Lattice (read for spawn positions, rebuilt before spawning)
    pub lattice: &'a mut Lattice,
    /// Registry (radii, active flags, new entries)
    pub registry: &'a mut ProbeRegistry,
    /// Probe source nested probes are spawned into
    pub probes: &'a mut S,
    /// Solver used for the pre-spawn rebuild
    pub solver: &'a DeformationSolver,
    /// Center anchor, if any
    pub anchor: Option<&'a CenterAnchor>,
    /// Radii, depth and spawn policy
    pub config: &'a EngineConfig,
}

/// Zoom session stack
#[derive(Debug, Clone)]
pub struct IterationManager {
    sessions: Vec<Session>,
    children: HashMap<ProbeId, Vec<ProbeId>>,
    max_depth: usize,
}

impl IterationManager {
    /// Stack with a single root session over `root`
    pub fn new(root: Vec<ProbeId>, max_depth: usize) -> Self {
        Self {
            sessions: vec![Session {
                parent: None,
                members: root,
                level: 1,
            }],
            children: HashMap::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Current level (1 = root)
    #[inline]
    pub fn level(&self) -> usize {
        self.sessions.len()
    }

    /// Innermost session
    #[inline]
    pub fn current(&self) -> &Session {
        // The root session is never popped
        &self.sessions[self.sessions.len() - 1]
    }

    /// Root probes
    #[inline]
    pub fn root(&self) -> &[ProbeId] {
        &self.sessions[0].members
    }

    /// Probes of the innermost session
    #[inline]
    pub fn active_probes(&self) -> &[ProbeId] {
        &self.current().members
    }

    /// Nested probes created for `parent`, if it was ever entered
    pub fn children_of(&self, parent: ProbeId) -> Option<&[ProbeId]> {
        self.children.get(&parent).map(Vec::as_slice)
    }

    /// Whether `parent` was entered before
    #[inline]
    pub fn is_visited(&self, parent: ProbeId) -> bool {
        self.children.contains_key(&parent)
    }

    /// Every nested probe ever spawned
    pub fn nested_probes(&self) -> impl Iterator<Item = ProbeId> + '_ {
        self.children.values().flatten().copied()
    }

    fn select(&self, slot: usize) -> Result<ProbeId> {
        let session = self.current();
        let parent = *session.members.get(slot).ok_or(WarpError::UnknownParent {
            slot,
            len: session.members.len(),
        })?;
        if session.parent == Some(parent) {
            return Err(WarpError::ParentAlreadyOpen(parent));
        }
        if self.level() >= self.max_depth {
            return Err(WarpError::DepthLimit(self.max_depth));
        }
        Ok(parent)
    }

    /// Hide the current session except `parent` and shrink the parent's radius
    fn focus<S: ProbeSource + ?Sized>(&self, parent: ProbeId, ctx: &mut ZoomContext<'_, S>) {
        for &m in &self.current().members {
            if m != parent {
                ctx.registry.set_active(m, false);
            }
        }
        ctx.registry
            .set_influence_radius(parent, ctx.config.nested_radius);
    }

    /// Pick `advance_into` or `return_into` depending on history
    pub fn enter<S: ProbeSource + ?Sized>(
        &mut self,
        slot: usize,
        ctx: &mut ZoomContext<'_, S>,
    ) -> Result<Transition> {
        let parent = self.select(slot)?;
        if self.is_visited(parent) {
            self.return_into(slot, ctx)
        } else {
            self.advance_into(slot, ctx)
        }
    }

    /// First visit: spawn nested probes around the probe at `slot`
    pub fn advance_into<S: ProbeSource + ?Sized>(
        &mut self,
        slot: usize,
        ctx: &mut ZoomContext<'_, S>,
    ) -> Result<Transition> {
        let parent = self.select(slot)?;
        if self.is_visited(parent) {
            return Err(WarpError::AlreadyVisited(parent));
        }

        self.focus(parent, ctx);
        // Spawn against the lattice as it looks with the parent's new radius
        ctx.solver
            .rebuild(&mut *ctx.lattice, &*ctx.registry, &*ctx.probes, ctx.anchor);
        let occupancy = ctx
            .solver
            .occupancy_grid(&*ctx.lattice, &*ctx.registry, ctx.anchor);

        let live = ctx.probes.position(parent).unwrap_or_default();
        let center = ctx.registry.grid_index_of(Handle::Probe(parent), live);
        let n = ctx.lattice.size();
        let level = self.level() as u8 + 1;
        // Shallower probes keep their cells even while hidden
        let reserved: HashSet<GridIndex> = ctx
            .registry
            .records()
            .filter(|r| r.level < level)
            .map(|r| r.grid_index)
            .collect();

        let mut spawned = Vec::with_capacity(NEIGHBOR_OFFSETS.len());
        for (dr, dc) in NEIGHBOR_OFFSETS {
            let Some(cell) = center.offset(dr, dc, n) else {
                continue;
            };
            if cell.is_boundary(n)
                || occupancy.is_foreign(cell, parent)
                || reserved.contains(&cell)
            {
                continue;
            }
            let id = self.spawn_at(cell, level, ctx);
            spawned.push(id);
        }

        tracing::info!(
            "zoom: {} opened at level {} with {} nested probes",
            parent,
            level,
            spawned.len()
        );

        let count = spawned.len();
        self.children.insert(parent, spawned.clone());
        let mut members = spawned;
        members.push(parent);
        self.sessions.push(Session {
            parent: Some(parent),
            members,
            level,
        });

        Ok(Transition::Advanced {
            parent,
            spawned: count,
        })
    }

    fn spawn_at<S: ProbeSource + ?Sized>(
        &self,
        cell: GridIndex,
        level: u8,
        ctx: &mut ZoomContext<'_, S>,
    ) -> ProbeId {
        let rest = match ctx.config.spawn_anchor {
            SpawnAnchor::Current => ctx.lattice.current(cell.row, cell.col),
            SpawnAnchor::Original => ctx.lattice.original(cell.row, cell.col),
        };
        let id = ctx.probes.spawn(rest);
        ctx.registry.register(id, rest, level, Some(cell));
        id
    }

    /// Revisit: show the nested probes already created for the probe at `slot`
    pub fn return_into<S: ProbeSource + ?Sized>(
        &mut self,
        slot: usize,
        ctx: &mut ZoomContext<'_, S>,
    ) -> Result<Transition> {
        let parent = self.select(slot)?;
        let Some(nested) = self.children.get(&parent).cloned() else {
            return Err(WarpError::NotVisited(parent));
        };

        self.focus(parent, ctx);
        for &id in &nested {
            ctx.registry.set_active(id, true);
        }

        let level = self.level() as u8 + 1;
        tracing::info!("zoom: {} reopened at level {}", parent, level);

        let mut members = nested;
        members.push(parent);
        self.sessions.push(Session {
            parent: Some(parent),
            members,
            level,
        });
        Ok(Transition::Returned { parent })
    }

    /// Close the innermost session and show the one below it
    pub fn unwind<S: ProbeSource + ?Sized>(
        &mut self,
        ctx: &mut ZoomContext<'_, S>,
    ) -> Result<Transition> {
        if self.sessions.len() <= 1 {
            return Err(WarpError::AtRoot);
        }
        let closed = self.sessions.pop().ok_or(WarpError::AtRoot)?;
        let parent = closed.parent.ok_or(WarpError::AtRoot)?;

        for &m in &closed.members {
            if m != parent {
                ctx.registry.set_active(m, false);
            }
        }
        let parent_level = ctx.registry.level(parent).unwrap_or(1);
        ctx.registry
            .set_influence_radius(parent, ctx.config.radius_for_level(parent_level));
        for &m in &self.current().members {
            ctx.registry.set_active(m, true);
        }

        tracing::info!("zoom: {} closed, back to level {}", parent, self.level());
        Ok(Transition::Unwound { parent })
    }

    /// Unwind to the root; returns how many sessions were closed
    pub fn unwind_all<S: ProbeSource + ?Sized>(&mut self, ctx: &mut ZoomContext<'_, S>) -> usize {
        let mut closed = 0;
        while self.unwind(ctx).is_ok() {
            closed += 1;
        }
        closed
    }

    /// Forget every nested probe and return them. Only valid at the root.
    pub fn take_nested(&mut self) -> Vec<ProbeId> {
        if self.level() > 1 {
            return Vec::new();
        }
        let mut ids: Vec<ProbeId> = self.children.drain().flat_map(|(_, v)| v).collect();
        ids.sort();
        ids
    }
}
