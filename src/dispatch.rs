// dispatch.rs — Batch point transform: the backend seam.
//
// Every frame, every source point is multiplied by the frame's matrix and
// the result lands in the transformed collection:
//
//   output[i] = source[i] * M        (row vector × 4x4, see transform.rs)
//
// `TransformBackend` is the one seam the frame driver talks to. Two
// implementations exist:
//
//   HostTransform  — plain loop over `vector_multiply`. Deterministic; the
//                    reference every other backend is checked against.
//   GpuTransform   — wgpu compute kernel (gpu/transform.rs). Flattens the
//                    points and matrix, uploads, dispatches, reads back.
//
// Host ↔ device layout: points are N consecutive `[x, y, z, w]` f32 records,
// the matrix is 16 f32 in row-major order. Because `Point` and `Mat4` are
// `#[repr(C)]` + `Pod`, flattening is a reinterpretation, not a copy.
//
// NEW RUST CONCEPTS:
// - Trait objects vs generics: `FrameDriver<B: TransformBackend>` is generic,
//   so tests can hold a concrete `FrameDriver<HostTransform>`, while the
//   binary picks a backend at runtime through `Box<dyn TransformBackend>`
//   (the blanket impl below makes the box itself a backend).

use std::fmt;

use crate::point::Point;
use crate::transform::{vector_multiply, Mat4};

/// Work-group granularity of the compute dispatch.
pub const WORK_GROUP_SIZE: u32 = 64;

/// Number of work groups needed to cover `count` points.
#[inline]
pub fn work_groups(count: u32) -> u32 {
    count.div_ceil(WORK_GROUP_SIZE)
}

/// Global 1D range: `count` rounded up to a multiple of [`WORK_GROUP_SIZE`].
#[inline]
pub fn global_size(count: u32) -> u32 {
    work_groups(count) * WORK_GROUP_SIZE
}

/// Lay `groups` work groups out as an `(x, y)` grid with neither side above
/// `max_per_dim`. Rows are full except the last:
///
///   groups ≤ max   →  (groups, 1)
///   groups > max   →  (max, ceil(groups / max))
///
/// `None` when even a `max × max` grid is too small.
pub fn dispatch_grid(groups: u32, max_per_dim: u32) -> Option<(u32, u32)> {
    if max_per_dim == 0 {
        return None;
    }
    if groups <= max_per_dim {
        return Some((groups, 1));
    }
    let rows = groups.div_ceil(max_per_dim);
    (rows <= max_per_dim).then_some((max_per_dim, rows))
}

// ---------------------------------------------------------------------------
// Flattening
// ---------------------------------------------------------------------------

/// View points as a flat `[x0, y0, z0, w0, x1, …]` slice.
#[inline]
pub fn flatten_points(points: &[Point]) -> &[f32] {
    bytemuck::cast_slice(points)
}

/// Copy a flat `f32` buffer back into point records.
///
/// Returns `LengthMismatch` if `flat.len() != 4 * out.len()`.
pub fn unflatten_points(flat: &[f32], out: &mut [Point]) -> Result<(), DispatchError> {
    if flat.len() != out.len() * 4 {
        return Err(DispatchError::LengthMismatch {
            expected: out.len() * 4,
            actual: flat.len(),
        });
    }
    bytemuck::cast_slice_mut::<Point, f32>(out).copy_from_slice(flat);
    Ok(())
}

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// Transforms a batch of points by one matrix.
pub trait TransformBackend {
    /// Write `source[i] * matrix` into `output[i]` for every i.
    ///
    /// `output` holds the previous frame's results on entry; backends may use
    /// it as scratch. Blocks until every result is available.
    fn transform(
        &mut self,
        source: &[Point],
        matrix: &Mat4,
        output: &mut [Point],
    ) -> Result<(), DispatchError>;

    /// Short human-readable backend name for logs.
    fn name(&self) -> &str;
}

impl<B: TransformBackend + ?Sized> TransformBackend for Box<B> {
    fn transform(
        &mut self,
        source: &[Point],
        matrix: &Mat4,
        output: &mut [Point],
    ) -> Result<(), DispatchError> {
        (**self).transform(source, matrix, output)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Checks the one precondition every backend shares.
pub(crate) fn check_lengths(source: &[Point], output: &[Point]) -> Result<(), DispatchError> {
    if source.len() != output.len() {
        return Err(DispatchError::LengthMismatch {
            expected: source.len(),
            actual: output.len(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// HostTransform
// ---------------------------------------------------------------------------

/// Single-threaded host reference implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostTransform;

impl HostTransform {
    pub fn new() -> Self {
        HostTransform
    }
}

impl TransformBackend for HostTransform {
    fn transform(
        &mut self,
        source: &[Point],
        matrix: &Mat4,
        output: &mut [Point],
    ) -> Result<(), DispatchError> {
        check_lengths(source, output)?;
        for (src, dst) in source.iter().zip(output.iter_mut()) {
            let mut out = [0.0; 4];
            vector_multiply(&mut out, &src.to_array(), matrix);
            *dst = Point::from_array(out);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "host"
    }
}

// ============================================================
// Error type
// ============================================================

/// A per-frame dispatch failure. Each variant names the step that failed.
#[derive(Debug)]
pub enum DispatchError {
    /// Source and output collections (or a flat buffer) disagree in length.
    LengthMismatch { expected: usize, actual: usize },
    /// Creating a device buffer failed.
    BufferCreation { buffer: &'static str, message: String },
    /// Binding the kernel arguments failed.
    Binding(String),
    /// Recording or submitting the kernel dispatch failed.
    Enqueue(String),
    /// Mapping the output buffer back to host memory failed.
    Readback(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::LengthMismatch { expected, actual } => write!(
                f,
                "length mismatch: expected {expected} elements, got {actual}"
            ),
            DispatchError::BufferCreation { buffer, message } => {
                write!(f, "failed to create {buffer} buffer: {message}")
            }
            DispatchError::Binding(m) => write!(f, "failed to bind kernel arguments: {m}"),
            DispatchError::Enqueue(m) => write!(f, "failed to enqueue kernel: {m}"),
            DispatchError::Readback(m) => write!(f, "failed to read back output buffer: {m}"),
        }
    }
}

impl std::error::Error for DispatchError {}
