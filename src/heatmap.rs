//! Displacement magnitude heatmap
//!
//! Samples `|current - original|` at every lattice point of a
//! [`RenderSink`] and renders it as text or RGBA, for diagnostics and the
//! CLI.
//!
//! Author: Moroya Sakamoto

use crate::host::RenderSink;

/// Characters from rest to strongest displacement
const ASCII_RAMP: &[u8] = b" .:-=+*#%@";

// ── Color Map ────────────────────────────────────────────────

/// Color map for RGBA output
#[derive(Debug, Clone, Copy, Default)]
pub enum ColorMap {
    /// Black (rest) to white (max)
    #[default]
    Grayscale,
    /// Black → red → yellow → white
    Heat,
}

impl ColorMap {
    /// Map a normalized value in `[0, 1]` to RGBA
    pub fn rgba(self, t: f32) -> [u8; 4] {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let byte = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        match self {
            ColorMap::Grayscale => {
                let g = byte(t);
                [g, g, g, 255]
            }
            ColorMap::Heat => [
                byte(t * 3.0),
                byte(t * 3.0 - 1.0),
                byte(t * 3.0 - 2.0),
                255,
            ],
        }
    }
}

// ── Heatmap ──────────────────────────────────────────────────

/// Per-point displacement magnitudes, row-major, row 0 first
#[derive(Debug, Clone, PartialEq)]
pub struct Heatmap {
    /// Magnitudes, `side * side` values
    pub values: Vec<f32>,
    /// Points per side
    pub side: usize,
    /// Largest magnitude
    pub max_val: f32,
}

impl Heatmap {
    /// Sample a lattice view
    pub fn sample<R: RenderSink + ?Sized>(sink: &R) -> Self {
        let side = sink.grid_size() + 1;
        let mut values = Vec::with_capacity(side * side);
        let mut max_val = 0.0f32;
        for row in 0..side {
            for col in 0..side {
                let m = sink.displacement(row, col).length();
                max_val = max_val.max(m);
                values.push(m);
            }
        }
        Self {
            values,
            side,
            max_val,
        }
    }

    /// Magnitude at a lattice point, 0 out of range
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        if row >= self.side || col >= self.side {
            return 0.0;
        }
        self.values[row * self.side + col]
    }

    /// Value scaled to `[0, 1]` by the maximum
    #[inline]
    pub fn normalized(&self, row: usize, col: usize) -> f32 {
        if self.max_val <= 0.0 {
            0.0
        } else {
            self.get(row, col) / self.max_val
        }
    }

    /// Text rendering, highest row first so +Y points up
    pub fn to_ascii(&self) -> String {
        let mut out = String::with_capacity(self.side * (self.side * 2 + 1));
        let top = ASCII_RAMP.len() - 1;
        for row in (0..self.side).rev() {
            for col in 0..self.side {
                let i = (self.normalized(row, col) * top as f32).round() as usize;
                out.push(ASCII_RAMP[i.min(top)] as char);
                out.push(' ');
            }
            out.push('\n');
        }
        out
    }

    /// RGBA8 pixels, one per lattice point, highest row first
    pub fn to_rgba(&self, colormap: ColorMap) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.side * self.side * 4);
        for row in (0..self.side).rev() {
            for col in 0..self.side {
                out.extend_from_slice(&colormap.rgba(self.normalized(row, col)));
            }
        }
        out
    }
}
