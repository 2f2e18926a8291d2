//! Adaptive smoothstep falloff
//!
//! Author: Moroya Sakamoto

use crate::types::EPSILON;

/// Inverted cubic smoothstep: `1 - t²(3 - 2t)`.
///
/// 1 at `t = 0`, 0 at `t = 1`, zero slope at both ends.
#[inline(always)]
pub fn smoothstep_falloff(t: f32) -> f32 {
    1.0 - t * t * (3.0 - 2.0 * t)
}

/// Weight of a lattice point `delta` cells from a probe along one axis.
///
/// `limit_neg` applies to negative `delta`, `limit_pos` to positive. The
/// weight is 1 at the probe, tapers to 0 at the limit and is 0 beyond it.
/// A zero limit yields 0 for every nonzero `delta`.
#[inline]
pub fn adaptive_weight(delta: isize, limit_neg: usize, limit_pos: usize) -> f32 {
    if delta == 0 {
        return 1.0;
    }
    let max_dist = if delta < 0 { limit_neg } else { limit_pos } as f32;
    if max_dist < EPSILON {
        return 0.0;
    }
    let t = delta.unsigned_abs() as f32 / max_dist;
    if t > 1.0 {
        return 0.0;
    }
    smoothstep_falloff(t)
}
