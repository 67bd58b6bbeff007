// tests/test_raster.rs — Integration tests for the depth-banded rasterizer.

use ascii3d::point::Point;
use ascii3d::raster::{FrameBuffer, Glyph, DEPTH_CLEAR, SCREEN_SIZE};

fn single(z: f32) -> FrameBuffer {
    let mut fb = FrameBuffer::new();
    fb.rasterize(&[Point::new(10.0, 20.0, z)]);
    fb
}

// ===== Clearing =====

#[test]
fn new_buffer_is_cleared() {
    let fb = FrameBuffer::new();
    assert_eq!(fb.size(), SCREEN_SIZE);
    assert!(fb.glyphs().as_slice().iter().all(|g| *g == Glyph::Blank));
    assert!(fb.depths().as_slice().iter().all(|d| *d == DEPTH_CLEAR));
}

#[test]
fn clear_resets_both_grids() {
    let mut fb = FrameBuffer::new();
    let pts: Vec<Point> = (0..SCREEN_SIZE)
        .map(|i| Point::new(i as f32, (SCREEN_SIZE - 1 - i) as f32, 30.0 + i as f32))
        .collect();
    fb.rasterize(&pts);
    assert_eq!(fb.lit_cells().count(), SCREEN_SIZE);

    fb.clear();
    for x in 0..SCREEN_SIZE {
        for y in 0..SCREEN_SIZE {
            assert_eq!(fb.glyph(x, y), Some(Glyph::Blank), "glyph at ({x}, {y})");
            assert_eq!(fb.depth(x, y), Some(-1000.0), "depth at ({x}, {y})");
        }
    }
}

#[test]
fn rasterize_clears_previous_frame() {
    let mut fb = FrameBuffer::new();
    fb.rasterize(&[Point::new(1.0, 1.0, 50.0)]);
    fb.rasterize(&[Point::new(2.0, 2.0, 50.0)]);
    assert_eq!(fb.glyph(1, 1), Some(Glyph::Blank));
    assert_eq!(fb.glyph(2, 2), Some(Glyph::Mid));
}

// ===== Depth test =====

#[test]
fn highest_depth_wins_in_either_order() {
    let near = Point::new(5.0, 5.0, 70.0);
    let far = Point::new(5.9, 5.1, 50.0);

    for order in [[near, far], [far, near]] {
        let mut fb = FrameBuffer::new();
        fb.rasterize(&order);
        assert_eq!(fb.glyph(5, 5), Some(Glyph::Near));
        assert_eq!(fb.glyph(5, 5).map(Glyph::as_char), Some('X'));
        assert_eq!(fb.depth(5, 5), Some(70.0));
    }
}

#[test]
fn equal_depth_keeps_first_point() {
    let mut fb = FrameBuffer::new();
    let stats = fb.rasterize(&[Point::new(3.0, 3.0, 45.0), Point::new(3.5, 3.5, 45.0)]);
    assert_eq!(stats.plotted, 1);
    assert_eq!(stats.occluded, 1);
    assert_eq!(fb.depth(3, 3), Some(45.0));
}

#[test]
fn anything_above_clear_depth_is_drawn() {
    let fb = single(-999.0);
    assert_eq!(fb.glyph(10, 20), Some(Glyph::Far));
    let fb = single(-1000.0);
    assert_eq!(fb.glyph(10, 20), Some(Glyph::Blank));
}

// ===== Glyph bands =====

#[test]
fn glyph_bands() {
    let cases = [(65.0, 'X'), (45.0, 'o'), (30.0, '.'), (60.0, 'o'), (40.0, 'o')];
    for (z, want) in cases {
        let got = single(z).glyph(10, 20).map(Glyph::as_char);
        assert_eq!(got, Some(want), "z = {z}");
    }
}

#[test]
fn band_edges_just_outside_thresholds() {
    assert_eq!(Glyph::classify(60.0001), Glyph::Near);
    assert_eq!(Glyph::classify(39.9999), Glyph::Far);
}

// ===== Bounds =====

#[test]
fn out_of_grid_points_are_clipped_and_counted() {
    let mut fb = FrameBuffer::new();
    let stats = fb.rasterize(&[
        Point::new(-1.5, 10.0, 50.0),
        Point::new(10.0, -1.0, 50.0),
        Point::new(100.0, 10.0, 50.0),
        Point::new(10.0, 100.2, 50.0),
        Point::new(99.9, 99.9, 50.0),
    ]);
    assert_eq!(stats.clipped, 4);
    assert_eq!(stats.plotted, 1);
    assert_eq!(fb.lit_cells().collect::<Vec<_>>(), vec![(99, 99, Glyph::Mid)]);
}

#[test]
fn unit_range_cloud_collapses_near_origin() {
    // Untranslated points in [-1.25, 1.25): truncation maps them to cells
    // 0 and 1 on each axis, or off the grid when ≤ -1.
    let mut fb = FrameBuffer::new();
    let pts = [
        Point::new(0.9, 0.2, 0.5),
        Point::new(-0.9, -0.2, 0.1),
        Point::new(1.2, 1.1, -0.3),
        Point::new(-1.2, 0.0, 0.0),
    ];
    let stats = fb.rasterize(&pts);
    assert_eq!(stats.clipped, 1);
    assert_eq!(fb.glyph(0, 0), Some(Glyph::Far));
    assert_eq!(fb.depth(0, 0), Some(0.5));
    assert_eq!(fb.glyph(1, 1), Some(Glyph::Far));
}
