// frame.rs — Frame driver.
//
// One call to `advance_frame` is one animation step:
//
//   1. matrix = I · Rx(counter) · Ry(counter)   [· translation row]
//   2. counter += 1
//   3. backend: transformed[i] = source[i] · matrix
//   4. frame buffer: clear, then rasterize transformed points
//
// All state lives in the driver: the point store, the matrix, the frame
// buffer, the counter and the backend. Nothing is global, so two drivers
// built from the same inputs produce the same frame sequence (with a
// deterministic backend).
//
// FAILURE POLICY
// ──────────────
// A failed dispatch does not touch the frame buffer: the previous frame
// stays visible and the error goes back to the caller, which decides
// whether to skip and continue. The counter has already advanced by then,
// so the next frame resumes at the next angle rather than repeating one.
//
// NEW RUST CONCEPTS:
// - Generic struct over a trait (`FrameDriver<B: TransformBackend>`):
//   static dispatch in tests, `Box<dyn TransformBackend>` in the binary.

use log::{trace, warn};

use crate::dispatch::{DispatchError, TransformBackend};
use crate::point::PointStore;
use crate::raster::{FrameBuffer, RasterStats};
use crate::transform::Transform;

/// First value of the frame counter.
pub const INITIAL_COUNTER: i32 = 1;

/// Consecutive failed frames tolerated before a run gives up.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 10;

/// What one frame did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStats {
    /// Angle (degrees) used for this frame.
    pub angle: i32,
    pub raster: RasterStats,
}

/// Owns the animation session.
pub struct FrameDriver<B: TransformBackend> {
    points: PointStore,
    transform: Transform,
    frame: FrameBuffer,
    counter: i32,
    translation: Option<[f32; 3]>,
    backend: B,
}

impl<B: TransformBackend> FrameDriver<B> {
    pub fn new(points: PointStore, backend: B) -> Self {
        FrameDriver {
            points,
            transform: Transform::identity(),
            frame: FrameBuffer::new(),
            counter: INITIAL_COUNTER,
            translation: None,
            backend,
        }
    }

    /// Start the counter at `start` instead of [`INITIAL_COUNTER`].
    pub fn with_counter(mut self, start: i32) -> Self {
        self.counter = start;
        self
    }

    /// Overwrite the translation row after the rotations each frame.
    /// `None` (the default) leaves the matrix as pure rotation.
    pub fn set_translation(&mut self, offset: Option<[f32; 3]>) {
        self.translation = offset;
    }

    /// Compose, dispatch and rasterize one frame.
    pub fn advance_frame(&mut self) -> Result<FrameStats, DispatchError> {
        let angle = self.counter;
        self.compose(angle);
        self.counter = self.counter.wrapping_add(1);

        let (source, transformed) = self.points.split_mut();
        self.backend.transform(source, self.transform.matrix(), transformed)?;

        let raster = self.frame.rasterize(self.points.transformed());
        trace!(
            "frame {angle}: {} plotted, {} occluded, {} clipped",
            raster.plotted, raster.occluded, raster.clipped
        );
        Ok(FrameStats { angle, raster })
    }

    fn compose(&mut self, angle: i32) {
        self.transform.reset();
        self.transform.rotate_x(angle);
        self.transform.rotate_y(angle);
        if let Some([x, y, z]) = self.translation {
            self.transform.translate(x, y, z);
        }
    }

    #[inline]
    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    #[inline]
    pub fn points(&self) -> &PointStore {
        &self.points
    }

    /// The counter value the *next* frame will use.
    #[inline]
    pub fn counter(&self) -> i32 {
        self.counter
    }

    /// The matrix used by the most recent frame.
    #[inline]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

// ---------------------------------------------------------------------------
// Skip policy
// ---------------------------------------------------------------------------

/// Turns per-frame dispatch failures into skipped frames, up to a limit of
/// consecutive failures.
///
/// A deferred policy logs nothing per frame; it keeps the last error for
/// [`report`](Self::report), to be called once stderr is safe to write to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkipPolicy {
    max_consecutive: u32,
    consecutive: u32,
    skipped: u64,
    deferred: bool,
    last_error: Option<String>,
}

impl SkipPolicy {
    pub fn new(max_consecutive: u32) -> Self {
        SkipPolicy {
            max_consecutive,
            consecutive: 0,
            skipped: 0,
            deferred: false,
            last_error: None,
        }
    }

    /// A [`MAX_CONSECUTIVE_FAILURES`] policy that holds its warnings until
    /// [`report`](Self::report).
    pub fn deferred() -> Self {
        SkipPolicy { deferred: true, ..Self::default() }
    }

    /// `Ok(Some)` for a good frame, `Ok(None)` for a skipped one, `Err` once
    /// more than `max_consecutive` frames in a row have failed.
    pub fn record(
        &mut self,
        result: Result<FrameStats, DispatchError>,
    ) -> Result<Option<FrameStats>, DispatchError> {
        match result {
            Ok(stats) => {
                self.consecutive = 0;
                Ok(Some(stats))
            }
            Err(e) => {
                self.consecutive += 1;
                self.skipped += 1;
                if self.consecutive > self.max_consecutive {
                    return Err(e);
                }
                if self.deferred {
                    self.last_error = Some(e.to_string());
                } else {
                    warn!("skipping frame ({} in a row): {e}", self.consecutive);
                }
                Ok(None)
            }
        }
    }

    /// Total frames skipped so far.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Most recent error held back by a deferred policy.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Log one summary of the skipped frames, if any were held back.
    pub fn report(&self) {
        if let Some(e) = &self.last_error {
            warn!("skipped {} frames, last error: {e}", self.skipped);
        }
    }
}

impl Default for SkipPolicy {
    fn default() -> Self {
        Self::new(MAX_CONSECUTIVE_FAILURES)
    }
}
