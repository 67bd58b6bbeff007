// ascii3d: a spinning point cloud, transformed on a compute device and drawn
// as depth-banded ASCII art.
//
// Pipeline, one frame:
//
//   transform  compose I · Rx(n) · Ry(n)
//   dispatch   source points × matrix → transformed points  (GPU or host)
//   raster     transformed points → 100×100 glyph + depth grids
//   present    glyph grid → terminal

pub mod point;
pub mod transform;
pub mod grid;
pub mod raster;
pub mod dispatch;
pub mod gpu;
pub mod frame;
pub mod config;
pub mod present;
