// config.rs — Startup configuration.
//
// Two layers:
//
//   Args    — what the user typed, parsed by clap. Exactly one shape flag
//             (`--cube` or `--points N`) is enforced by an `ArgGroup`.
//   Config  — the validated settings the rest of the program reads. Can be
//             built without clap (tests, embedding) and is checked again by
//             `Config::validate`, since clap's group rule only covers the
//             command line.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgGroup, Parser, ValueEnum};

use crate::gpu::transform::KernelSource;
use crate::point::{PointStore, PointStoreError};

/// Frames run by a headless timing run when `-i` is not given.
pub const DEFAULT_ITERATIONS: u32 = 1000;

/// Pause between presented frames.
pub const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(10);

/// Initial point set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// The fixed 8-point cube.
    Cube,
    /// `count` uniformly random points from `seed`.
    Random { count: usize, seed: u64 },
}

impl Shape {
    /// Build the point store for this shape.
    pub fn build(&self) -> Result<PointStore, PointStoreError> {
        match *self {
            Shape::Cube => Ok(PointStore::cube()),
            Shape::Random { count, seed } => PointStore::random(count, seed),
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Cube => write!(f, "cube (8 points)"),
            Shape::Random { count, seed } => write!(f, "{count} random points (seed {seed})"),
        }
    }
}

/// Which transform backend runs the per-point transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BackendKind {
    /// wgpu compute kernel on the best available adapter.
    #[default]
    Gpu,
    /// Host reference loop.
    Host,
}

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about = "Spin a point cloud and draw it as ASCII art")]
#[command(group(ArgGroup::new("shape").required(true).args(["cube", "points"])))]
pub struct Args {
    /// Draw the fixed 8-point cube
    #[arg(long)]
    pub cube: bool,

    /// Draw N random points
    #[arg(long, value_name = "N")]
    pub points: Option<usize>,

    /// Frames to run in headless mode (ignored when drawing to the terminal)
    #[arg(short, long, default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: u32,

    /// Run without terminal output and report timing
    #[arg(long)]
    pub headless: bool,

    /// Transform backend
    #[arg(long, value_enum, default_value_t = BackendKind::Gpu)]
    pub backend: BackendKind,

    /// Seed for random point generation
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Translation applied after the rotations each frame
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], allow_negative_numbers = true)]
    pub translate: Option<Vec<f32>>,

    /// Read the WGSL kernel from this file instead of the built-in source
    #[arg(long, value_name = "PATH")]
    pub kernel: Option<PathBuf>,

    /// Delay between drawn frames, in milliseconds
    #[arg(long, default_value_t = 10)]
    pub delay_ms: u64,
}

/// Validated program settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// `None` only for a `Config` that has not been given a shape yet;
    /// `validate` rejects it.
    pub shape: Option<Shape>,
    pub iterations: u32,
    pub headless: bool,
    pub backend: BackendKind,
    pub translation: Option<[f32; 3]>,
    pub kernel: KernelSource,
    pub frame_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            shape: None,
            iterations: DEFAULT_ITERATIONS,
            headless: false,
            backend: BackendKind::Gpu,
            translation: None,
            kernel: KernelSource::Embedded,
            frame_delay: DEFAULT_FRAME_DELAY,
        }
    }
}

impl Config {
    /// Check the invariants clap cannot see and return the chosen shape.
    pub fn validate(&self) -> Result<Shape, ConfigError> {
        match self.shape {
            None => Err(ConfigError::MissingShape),
            Some(Shape::Random { count: 0, .. }) => Err(ConfigError::ZeroPoints),
            Some(shape) => Ok(shape),
        }
    }
}

impl Args {
    /// Validate the arguments once, returning the settings and the shape
    /// they select.
    pub fn into_config(self) -> Result<(Config, Shape), ConfigError> {
        let shape = match (self.cube, self.points) {
            (true, Some(_)) => return Err(ConfigError::ConflictingShapes),
            (true, None) => Shape::Cube,
            (false, Some(count)) => Shape::Random { count, seed: self.seed },
            (false, None) => return Err(ConfigError::MissingShape),
        };

        let translation = match self.translate.as_deref() {
            None => None,
            Some(&[x, y, z]) => Some([x, y, z]),
            Some(other) => return Err(ConfigError::BadTranslation(other.len())),
        };

        let config = Config {
            shape: Some(shape),
            iterations: self.iterations,
            headless: self.headless,
            backend: self.backend,
            translation,
            kernel: self.kernel.map(KernelSource::File).unwrap_or_default(),
            frame_delay: Duration::from_millis(self.delay_ms),
        };
        let shape = config.validate()?;
        Ok((config, shape))
    }
}

impl TryFrom<Args> for Config {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, ConfigError> {
        args.into_config().map(|(config, _)| config)
    }
}

// ============================================================
// Error type
// ============================================================

/// Invalid startup configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Neither `--cube` nor `--points` was given.
    MissingShape,
    /// Both `--cube` and `--points` were given.
    ConflictingShapes,
    /// `--points 0`.
    ZeroPoints,
    /// `--translate` needs exactly three values.
    BadTranslation(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingShape => {
                write!(f, "you must choose either --cube or --points N")
            }
            ConfigError::ConflictingShapes => {
                write!(f, "--cube and --points are mutually exclusive")
            }
            ConfigError::ZeroPoints => write!(f, "--points must be at least 1"),
            ConfigError::BadTranslation(n) => {
                write!(f, "--translate takes 3 values, got {n}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
