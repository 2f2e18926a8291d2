//! Arena-backed probe storage
//!
//! Default [`ProbeSource`] for hosts that do not bring their own. Slots are
//! never reused, so a [`ProbeId`] stays unambiguous after retirement.
//!
//! Author: Moroya Sakamoto

use crate::host::ProbeSource;
use crate::types::ProbeId;
use glam::Vec3;

/// Probe arena with live positions
#[derive(Debug, Clone, Default)]
pub struct ProbeSet {
    slots: Vec<Option<Vec3>>,
}

impl ProbeSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set populated from resting positions, in order
    pub fn from_positions(positions: impl IntoIterator<Item = Vec3>) -> Self {
        Self {
            slots: positions.into_iter().map(Some).collect(),
        }
    }

    /// Move a probe. Returns `false` for unknown ids.
    pub fn set_position(&mut self, id: ProbeId, position: Vec3) -> bool {
        match self.slots.get_mut(id.index()) {
            Some(Some(p)) => {
                *p = position;
                true
            }
            _ => false,
        }
    }

    /// Move a probe by `delta`. Returns `false` for unknown ids.
    pub fn translate(&mut self, id: ProbeId, delta: Vec3) -> bool {
        match self.slots.get_mut(id.index()) {
            Some(Some(p)) => {
                *p += delta;
                true
            }
            _ => false,
        }
    }
}

impl ProbeSource for ProbeSet {
    fn ids(&self) -> Vec<ProbeId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(i, _)| ProbeId(i as u32))
            .collect()
    }

    #[inline]
    fn position(&self, id: ProbeId) -> Option<Vec3> {
        self.slots.get(id.index()).copied().flatten()
    }

    fn spawn(&mut self, position: Vec3) -> ProbeId {
        let id = ProbeId(self.slots.len() as u32);
        self.slots.push(Some(position));
        id
    }

    fn retire(&mut self, id: ProbeId) {
        if let Some(slot) = self.slots.get_mut(id.index()) {
            *slot = None;
        }
    }

    fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_move_retire() {
        let mut set = ProbeSet::new();
        let a = set.spawn(Vec3::ZERO);
        let b = set.spawn(Vec3::X);
        assert_eq!(set.ids(), vec![a, b]);

        assert!(set.translate(a, Vec3::Y));
        assert_eq!(set.position(a), Some(Vec3::Y));

        set.retire(a);
        assert_eq!(set.position(a), None);
        assert!(!set.set_position(a, Vec3::ONE));
        assert_eq!(set.ids(), vec![b]);

        // Retired slots are not reused
        let c = set.spawn(Vec3::Z);
        assert_eq!(c, ProbeId(2));
        assert_eq!(set.len(), 2);
    }
}
