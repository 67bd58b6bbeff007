// point.rs — Homogeneous points and the point store.
//
// The store owns two collections of the same length N:
//
//   source       — positions fixed at startup (cube or random cloud)
//   transformed  — overwritten every frame by the transform backend
//
// Both are single contiguous `Vec<Point>` buffers. `Point` is `#[repr(C)]`
// and `Pod`, so a `&[Point]` can be viewed as a flat `&[f32]` of length 4N
// without copying. That is the layout the compute kernel expects.
//
// NEW RUST CONCEPTS:
// - `bytemuck::Pod` derive — proves to the compiler that any bit pattern is
//   a valid `Point`, which is what makes the zero-copy cast sound.
// - `Vec::try_reserve_exact` — fallible allocation; returns `Err` instead of
//   aborting the process when the allocator gives up.
// - `split_mut` returns one shared and one mutable borrow of *different*
//   fields at the same time. The borrow checker allows this because the
//   fields are disjoint.

use std::collections::TryReserveError;
use std::fmt;

// ---------------------------------------------------------------------------
// Point
// ---------------------------------------------------------------------------

/// A homogeneous 3D point `(x, y, z, w)`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Point {
    /// A point with `w = 1.0`.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Point { x, y, z, w: 1.0 }
    }

    #[inline]
    pub fn from_array(v: [f32; 4]) -> Self {
        Point { x: v[0], y: v[1], z: v[2], w: v[3] }
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.x, self.y, self.z, self.w]
    }
}

/// Half-extent of the random point cloud along each axis.
pub const RANDOM_EXTENT: f32 = 1.25;

/// The fixed cube: bottom face at y = 0, top face at y = 1.
const CUBE: [Point; 8] = [
    Point::new(0.5, 0.0, 0.5),
    Point::new(0.5, 0.0, -0.5),
    Point::new(-0.5, 0.0, -0.5),
    Point::new(-0.5, 0.0, 0.5),
    Point::new(0.5, 1.0, 0.5),
    Point::new(0.5, 1.0, -0.5),
    Point::new(-0.5, 1.0, -0.5),
    Point::new(-0.5, 1.0, 0.5),
];

// ---------------------------------------------------------------------------
// PointStore
// ---------------------------------------------------------------------------

/// Source and transformed point collections. Both always have the same length.
#[derive(Debug, Clone)]
pub struct PointStore {
    source: Vec<Point>,
    transformed: Vec<Point>,
}

impl PointStore {
    /// The 8-corner unit cube.
    pub fn cube() -> Self {
        let source = CUBE.to_vec();
        let transformed = source.clone();
        PointStore { source, transformed }
    }

    /// `count` points with x, y, z uniform in `[-1.25, 1.25)` and `w = 1`.
    ///
    /// The sequence depends only on `seed`, so two stores built with the
    /// same arguments are identical.
    pub fn random(count: usize, seed: u64) -> Result<Self, PointStoreError> {
        if count == 0 {
            return Err(PointStoreError::Empty);
        }

        let mut source = Vec::new();
        source
            .try_reserve_exact(count)
            .map_err(|e| PointStoreError::Allocation { count, source: e })?;

        let mut rng = fastrand::Rng::with_seed(seed);
        let mut coord = || 2.0 * RANDOM_EXTENT * (rng.f32() - 0.5);
        for _ in 0..count {
            let x = coord();
            let y = coord();
            let z = coord();
            source.push(Point::new(x, y, z));
        }

        Self::from_points(source)
    }

    /// Build a store from arbitrary source points.
    pub fn from_points(source: Vec<Point>) -> Result<Self, PointStoreError> {
        if source.is_empty() {
            return Err(PointStoreError::Empty);
        }
        let count = source.len();
        let mut transformed = Vec::new();
        transformed
            .try_reserve_exact(count)
            .map_err(|e| PointStoreError::Allocation { count, source: e })?;
        transformed.extend_from_slice(&source);
        Ok(PointStore { source, transformed })
    }

    /// Number of points N.
    #[inline]
    pub fn len(&self) -> usize {
        self.source.len()
    }

    /// Always false: a store holds at least one point.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    #[inline]
    pub fn source(&self) -> &[Point] {
        &self.source
    }

    #[inline]
    pub fn transformed(&self) -> &[Point] {
        &self.transformed
    }

    /// Borrow source (shared) and transformed (mutable) at once.
    #[inline]
    pub fn split_mut(&mut self) -> (&[Point], &mut [Point]) {
        (&self.source, &mut self.transformed)
    }
}

// ============================================================
// Error type
// ============================================================

/// Errors from building a point store.
#[derive(Debug)]
pub enum PointStoreError {
    /// Zero points requested; N must be at least 1.
    Empty,
    /// The allocator could not provide room for `count` points.
    Allocation { count: usize, source: TryReserveError },
}

impl fmt::Display for PointStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointStoreError::Empty => write!(f, "point count must be at least 1"),
            PointStoreError::Allocation { count, .. } => {
                write!(f, "failed to allocate storage for {count} points")
            }
        }
    }
}

impl std::error::Error for PointStoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PointStoreError::Allocation { source, .. } => Some(source),
            _ => None,
        }
    }
}
