// gpu/device.rs — wgpu device abstraction.
//
// Responsibilities:
//   - Enumerate adapters on the primary backends and pick one, preferring a
//     real GPU and falling back to a CPU-class (software) adapter.
//   - Own the device and its single queue for the process lifetime.
//   - Wrap groups of wgpu calls in error scopes so validation and
//     out-of-memory failures come back as values instead of panics.
//
// ADAPTER SELECTION:
// `request_adapter` hides which devices exist and may refuse a software
// adapter outright. We enumerate explicitly and rank:
//
//   DiscreteGpu / IntegratedGpu  — real hardware            <- ideal
//   VirtualGpu / Other           — VM pass-through, layers  <- acceptable
//   Cpu                          — llvmpipe, WARP, lavapipe <- last resort
//
// Running on a software adapter is logged, not rejected.
//
// ERROR SCOPES:
// By default wgpu routes validation errors to an "uncaptured error" handler
// that panics. `push_error_scope` / `pop_error_scope` capture them instead.
// Scopes form a stack; we push OutOfMemory then Validation, and pop in the
// reverse order.
//
// NEW RUST CONCEPTS:
// - `pollster::block_on` — runs an async fn to completion on the current
//   thread. wgpu's adapter/device API is async because on WebGPU it maps to
//   JS Promises; natively we just block.
// - `impl FnOnce() -> T` parameters — `scoped` runs caller code between the
//   push and the pop without the caller seeing either.

use std::fmt;

use log::info;

/// Coarse classification of the selected adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Gpu,
    Cpu,
    Other,
}

impl DeviceClass {
    pub fn from_device_type(ty: wgpu::DeviceType) -> Self {
        match ty {
            wgpu::DeviceType::DiscreteGpu
            | wgpu::DeviceType::IntegratedGpu
            | wgpu::DeviceType::VirtualGpu => DeviceClass::Gpu,
            wgpu::DeviceType::Cpu => DeviceClass::Cpu,
            wgpu::DeviceType::Other => DeviceClass::Other,
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceClass::Gpu => write!(f, "GPU"),
            DeviceClass::Cpu => write!(f, "CPU"),
            DeviceClass::Other => write!(f, "not GPU or CPU"),
        }
    }
}

/// Selection rank: lower is better.
fn adapter_rank(ty: wgpu::DeviceType) -> u8 {
    match ty {
        wgpu::DeviceType::DiscreteGpu | wgpu::DeviceType::IntegratedGpu => 0,
        wgpu::DeviceType::VirtualGpu | wgpu::DeviceType::Other => 1,
        wgpu::DeviceType::Cpu => 2,
    }
}

/// Downlevel defaults, raised to whatever the adapter offers for the limits
/// that bound the point count: groups per dimension, storage binding size
/// and buffer size.
fn compute_limits(adapter: &wgpu::Limits) -> wgpu::Limits {
    let base = wgpu::Limits::downlevel_defaults();
    wgpu::Limits {
        max_compute_workgroups_per_dimension: adapter
            .max_compute_workgroups_per_dimension
            .max(base.max_compute_workgroups_per_dimension),
        max_storage_buffer_binding_size: adapter
            .max_storage_buffer_binding_size
            .max(base.max_storage_buffer_binding_size),
        max_buffer_size: adapter.max_buffer_size.max(base.max_buffer_size),
        ..base
    }
}

/// Cached adapter information for logging and debugging.
#[derive(Debug, Clone)]
pub struct AdapterInfo {
    pub name: String,
    pub device_type: wgpu::DeviceType,
    pub backend: wgpu::Backend,
}

impl AdapterInfo {
    pub fn class(&self) -> DeviceClass {
        DeviceClass::from_device_type(self.device_type)
    }
}

impl fmt::Display for AdapterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}, {:?})", self.name, self.backend, self.device_type)
    }
}

/// The compute context: device, queue and the adapter they came from.
///
/// Create once at startup; it is expensive (instance + device
/// initialization). Every pipeline and buffer in the crate borrows it.
///
/// # Field drop order
/// Rust drops struct fields in declaration order. `_instance` is declared
/// last so the instance outlives `device` and `queue`.
pub struct GpuDevice {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: AdapterInfo,
    _instance: wgpu::Instance,
}

impl GpuDevice {
    /// Create a `GpuDevice` on the best available adapter.
    ///
    /// # Errors
    /// Returns `Err` if no adapter exists at all or the device request fails.
    pub fn new() -> Result<Self, GpuError> {
        pollster::block_on(Self::init_async())
    }

    async fn init_async() -> Result<Self, GpuError> {
        let flags = if cfg!(debug_assertions) {
            wgpu::InstanceFlags::VALIDATION
                | wgpu::InstanceFlags::ALLOW_UNDERLYING_NONCOMPLIANT_ADAPTER
        } else {
            wgpu::InstanceFlags::ALLOW_UNDERLYING_NONCOMPLIANT_ADAPTER
        };

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            flags,
            ..Default::default()
        });

        let adapters = instance.enumerate_adapters(wgpu::Backends::PRIMARY);
        for a in &adapters {
            let info = a.get_info();
            info!("adapter: {} ({:?}, {:?})", info.name, info.backend, info.device_type);
        }

        // min_by_key keeps the first of equal ranks, so enumeration order
        // breaks ties.
        let adapter = adapters
            .into_iter()
            .min_by_key(|a| adapter_rank(a.get_info().device_type))
            .ok_or(GpuError::NoSuitableAdapter)?;

        let raw_info = adapter.get_info();
        let adapter_info = AdapterInfo {
            name: raw_info.name.clone(),
            device_type: raw_info.device_type,
            backend: raw_info.backend,
        };
        if adapter_info.class() != DeviceClass::Gpu {
            info!("GPU not found, using {} adapter", adapter_info.class());
        }
        info!("device is {}: {}", adapter_info.class(), adapter_info);

        let required_limits = compute_limits(&adapter.limits());
        info!(
            "limits: {} groups per dimension, {} MiB storage binding",
            required_limits.max_compute_workgroups_per_dimension,
            required_limits.max_storage_buffer_binding_size >> 20
        );

        let (device, queue): (wgpu::Device, wgpu::Queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("ascii3d"),
                    required_features: wgpu::Features::empty(),
                    required_limits,
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .map_err(GpuError::DeviceRequest)?;

        Ok(GpuDevice {
            device,
            queue,
            adapter_info,
            _instance: instance,
        })
    }

    /// Run `f` with validation and out-of-memory errors captured.
    ///
    /// Returns `f`'s value if no error was raised inside the scope,
    /// otherwise the first captured error.
    pub fn scoped<T>(&self, f: impl FnOnce() -> T) -> Result<T, wgpu::Error> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
        let value = f();
        let validation = pollster::block_on(self.device.pop_error_scope());
        let oom = pollster::block_on(self.device.pop_error_scope());
        match validation.or(oom) {
            Some(e) => Err(e),
            None => Ok(value),
        }
    }
}

impl fmt::Display for GpuDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GpuDevice {{ adapter: {} }}", self.adapter_info)
    }
}

// ============================================================
// Error type
// ============================================================

/// Errors from device initialization and kernel compilation.
#[derive(Debug)]
pub enum GpuError {
    /// No adapter at all on the primary backends.
    NoSuitableAdapter,
    /// wgpu device request failed (driver issue, unsupported limits, etc.).
    DeviceRequest(wgpu::RequestDeviceError),
    /// The kernel source file could not be read.
    KernelSourceNotFound { path: String, source: std::io::Error },
    /// The kernel source failed validation or pipeline creation.
    KernelCompile(String),
    /// More points than one storage binding and dispatch can hold.
    PointCapacity { requested: usize, max: u64 },
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::NoSuitableAdapter => write!(
                f,
                "no compute adapter found (neither GPU nor CPU-class). \
                 Check that a Vulkan, Metal or DX12 driver is installed."
            ),
            GpuError::DeviceRequest(e) => write!(f, "device request failed: {e}"),
            GpuError::KernelSourceNotFound { path, source } => {
                write!(f, "couldn't read kernel source {path}: {source}")
            }
            GpuError::KernelCompile(log) => write!(f, "kernel failed to compile:\n{log}"),
            GpuError::PointCapacity { requested, max } => write!(
                f,
                "{requested} points exceed the device capacity of {max} points per dispatch"
            ),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::DeviceRequest(e) => Some(e),
            GpuError::KernelSourceNotFound { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ============================================================
// Tests
// ============================================================
