// raster.rs — Depth-banded ASCII rasterizer.
//
// Turns transformed points into an S×S glyph grid plus a parallel depth grid.
//
//   for each point p:
//       (gx, gy) = (trunc(p.x), trunc(p.y))
//       if (gx, gy) outside the grid      → clipped, skip
//       if p.z <= depth[gx][gy]           → occluded, skip
//       glyph[gx][gy] = band(p.z); depth[gx][gy] = p.z
//
// The first coordinate (x) selects the grid row and the second (y) the
// column; the presenter maps rows to terminal lines.
//
// Depth bands are a fixed distance heuristic, not a projection:
//
//   z > 60      'X'   near
//   40 ≤ z ≤ 60 'o'   middle
//   z < 40      '.'   far
//
// Greater z is nearer the viewer, so the highest z wins a cell. The final
// grid does not depend on point order except for exact ties, where the
// strict `>` keeps whichever point arrived first.

use std::fmt;

use log::trace;

use crate::grid::Grid;
use crate::point::Point;

/// Side length of the square frame and depth grids.
pub const SCREEN_SIZE: usize = 100;

/// Depth value every cell is reset to before a frame is drawn.
pub const DEPTH_CLEAR: f32 = -1000.0;

/// Points with z above this are drawn as [`Glyph::Near`].
pub const NEAR_THRESHOLD: f32 = 60.0;

/// Points with z below this are drawn as [`Glyph::Far`].
pub const FAR_THRESHOLD: f32 = 40.0;

// ---------------------------------------------------------------------------
// Glyph
// ---------------------------------------------------------------------------

/// What a frame buffer cell shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Glyph {
    #[default]
    Blank,
    Far,
    Mid,
    Near,
}

impl Glyph {
    /// Band a depth value.
    #[inline]
    pub fn classify(z: f32) -> Self {
        if z > NEAR_THRESHOLD {
            Glyph::Near
        } else if z < FAR_THRESHOLD {
            Glyph::Far
        } else {
            Glyph::Mid
        }
    }

    #[inline]
    pub fn as_char(self) -> char {
        match self {
            Glyph::Blank => ' ',
            Glyph::Far => '.',
            Glyph::Mid => 'o',
            Glyph::Near => 'X',
        }
    }

    #[inline]
    pub fn is_blank(self) -> bool {
        self == Glyph::Blank
    }
}

// ---------------------------------------------------------------------------
// FrameBuffer
// ---------------------------------------------------------------------------

/// Per-frame counts from [`FrameBuffer::rasterize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RasterStats {
    /// Points that won their cell at the time they were visited.
    pub plotted: usize,
    /// Points rejected by the depth test.
    pub occluded: usize,
    /// Points whose cell lies outside the grid.
    pub clipped: usize,
}

/// Glyph grid and depth grid. Always the same size, always cleared together.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBuffer {
    glyphs: Grid<Glyph>,
    depth: Grid<f32>,
}

impl FrameBuffer {
    /// A cleared `SCREEN_SIZE × SCREEN_SIZE` buffer.
    pub fn new() -> Self {
        Self::with_size(SCREEN_SIZE)
    }

    /// A cleared `size × size` buffer.
    pub fn with_size(size: usize) -> Self {
        FrameBuffer {
            glyphs: Grid::new(size, size, Glyph::Blank),
            depth: Grid::new(size, size, DEPTH_CLEAR),
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.glyphs.rows()
    }

    /// Blank every glyph and reset every depth to [`DEPTH_CLEAR`].
    pub fn clear(&mut self) {
        self.glyphs.fill(Glyph::Blank);
        self.depth.fill(DEPTH_CLEAR);
    }

    /// Depth-test a single point and write it if it wins its cell.
    /// Does not clear.
    pub fn plot(&mut self, p: &Point, stats: &mut RasterStats) {
        // `as` truncates toward zero and saturates, NaN becomes 0.
        let gx = p.x as i64;
        let gy = p.y as i64;

        let Some(idx) = self.depth.index_of_signed(gx, gy) else {
            trace!("clipped point ({}, {}, {}) -> cell ({gx}, {gy})", p.x, p.y, p.z);
            stats.clipped += 1;
            return;
        };

        if p.z > self.depth.at(idx) {
            *self.glyphs.at_mut(idx) = Glyph::classify(p.z);
            *self.depth.at_mut(idx) = p.z;
            stats.plotted += 1;
        } else {
            stats.occluded += 1;
        }
    }

    /// Clear, then draw every point.
    pub fn rasterize(&mut self, points: &[Point]) -> RasterStats {
        self.clear();
        let mut stats = RasterStats::default();
        for p in points {
            self.plot(p, &mut stats);
        }
        if stats.clipped > 0 {
            trace!("{} of {} points fell outside the grid", stats.clipped, points.len());
        }
        stats
    }

    #[inline]
    pub fn glyph(&self, x: usize, y: usize) -> Option<Glyph> {
        self.glyphs.get(x, y)
    }

    #[inline]
    pub fn depth(&self, x: usize, y: usize) -> Option<f32> {
        self.depth.get(x, y)
    }

    #[inline]
    pub fn glyphs(&self) -> &Grid<Glyph> {
        &self.glyphs
    }

    #[inline]
    pub fn depths(&self) -> &Grid<f32> {
        &self.depth
    }

    /// Non-blank cells as `(x, y, glyph)`.
    pub fn lit_cells(&self) -> impl Iterator<Item = (usize, usize, Glyph)> + '_ {
        self.glyphs.cells().filter(|&(_, _, g)| !g.is_blank())
    }

    /// One line per grid row, `size` characters each.
    pub fn to_text(&self) -> String {
        let n = self.size();
        let mut out = String::with_capacity(n * (n + 1));
        for row in 0..n {
            out.extend(self.glyphs.row(row).iter().map(|g| g.as_char()));
            out.push('\n');
        }
        out
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_chars() {
        assert_eq!(Glyph::Blank.as_char(), ' ');
        assert_eq!(Glyph::Far.as_char(), '.');
        assert_eq!(Glyph::Mid.as_char(), 'o');
        assert_eq!(Glyph::Near.as_char(), 'X');
    }

    #[test]
    fn test_plot_does_not_clear() {
        let mut fb = FrameBuffer::new();
        let mut stats = RasterStats::default();
        fb.plot(&Point::new(1.0, 1.0, 50.0), &mut stats);
        fb.plot(&Point::new(2.0, 2.0, 50.0), &mut stats);
        assert_eq!(stats.plotted, 2);
        assert_eq!(fb.lit_cells().count(), 2);
    }

    #[test]
    fn test_truncation_toward_zero() {
        let mut fb = FrameBuffer::new();
        // -0.7 truncates to 0, not -1.
        let stats = fb.rasterize(&[Point::new(-0.7, 3.9, 10.0)]);
        assert_eq!(stats.clipped, 0);
        assert_eq!(fb.glyph(0, 3), Some(Glyph::Far));
    }

    #[test]
    fn test_nan_does_not_panic() {
        let mut fb = FrameBuffer::new();
        let stats = fb.rasterize(&[Point::new(f32::NAN, f32::INFINITY, 70.0)]);
        assert_eq!(stats.plotted + stats.clipped + stats.occluded, 1);
    }

    #[test]
    fn test_to_text_shape() {
        let mut fb = FrameBuffer::with_size(3);
        fb.rasterize(&[Point::new(1.0, 2.0, 70.0)]);
        assert_eq!(fb.to_text(), "   \n  X\n   \n");
    }
}
