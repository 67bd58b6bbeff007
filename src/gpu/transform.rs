// gpu/transform.rs — GPU batch point transform.
//
// Mirrors `HostTransform` in dispatch.rs: `output[i] = source[i] * M`.
//
// PER-FRAME PROTOCOL
// ──────────────────
//   1. flatten   points → N×vec4<f32>, matrix → 4×vec4<f32> (row-major)
//   2. upload    point buffer      STORAGE (read-only in the shader)
//                output buffer     STORAGE | COPY_SRC, seeded with the
//                                  previous frame's transformed points
//                transform buffer  STORAGE (read-only in the shader)
//                params uniform    point count
//   3. bind      the four kernel arguments in fixed order 0..=3
//   4. dispatch  ceil(N / 64) work groups of 64, folded into an (x, y) grid
//                when one dimension can't hold them all
//   5. copy      output → MAP_READ staging buffer, submit, poll(Wait)
//   6. unflatten staging → `output`
//
// Every buffer above is a local of `run`, so it is dropped (and its device
// memory released) on every exit path, error or not. The pipeline, bind
// group layout, device and queue live as long as the `TransformKernel` /
// `GpuTransform` that owns them.
//
// Steps 2–5 each run inside `GpuDevice::scoped`, so a wgpu validation or
// out-of-memory error surfaces as the matching `DispatchError` variant.
//
// CAPACITY
// ────────
// One storage binding holds every point, so N is bounded by the device's
// storage binding and buffer sizes (and, far above that, by a full 2D grid of
// work groups). `GpuTransform::ensure_capacity` checks N once at startup so
// an oversized cloud is rejected before the first frame.
//
// KERNEL SOURCE
// ─────────────
// The WGSL source is embedded with `include_str!`. A replacement file may be
// supplied at startup; it must keep the entry point name and bindings. The
// `{{WG_SIZE}}` placeholder is substituted before compilation in both cases.

use std::borrow::Cow;
use std::path::PathBuf;

use log::{debug, trace};
use wgpu::util::DeviceExt;

use crate::dispatch::{
    check_lengths, dispatch_grid, flatten_points, global_size, unflatten_points, work_groups,
    DispatchError, TransformBackend, WORK_GROUP_SIZE,
};
use crate::gpu::device::{GpuDevice, GpuError};
use crate::point::Point;
use crate::transform::Mat4;

/// Kernel entry point; every replacement source must define it.
pub const KERNEL_ENTRY: &str = "move_points";

const EMBEDDED_KERNEL: &str = include_str!("../shaders/transform.wgsl");

// ---------------------------------------------------------------------------
// Uniform params (must match WGSL struct Params exactly)
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct TransformParams {
    point_count: u32,
    _pad: [u32; 3],
}

/// Largest point count a device with `limits` can bind and dispatch.
pub fn max_points(limits: &wgpu::Limits) -> u64 {
    let point_bytes = std::mem::size_of::<Point>() as u64;
    let by_binding = u64::from(limits.max_storage_buffer_binding_size) / point_bytes;
    let by_buffer = limits.max_buffer_size / point_bytes;

    let per_dim = u64::from(limits.max_compute_workgroups_per_dimension);
    let group = u64::from(WORK_GROUP_SIZE);
    let by_dispatch = per_dim * per_dim * group;
    // The kernel's linear index is a u32; leave room for one padded row.
    let by_index = u64::from(u32::MAX).saturating_sub(per_dim * group);

    by_binding.min(by_buffer).min(by_dispatch).min(by_index)
}

// ---------------------------------------------------------------------------
// Kernel source
// ---------------------------------------------------------------------------

/// Where the WGSL kernel comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KernelSource {
    /// The source compiled into the binary.
    #[default]
    Embedded,
    /// A WGSL file read at startup.
    File(PathBuf),
}

impl KernelSource {
    /// Load the source and substitute the work-group size.
    pub fn load(&self) -> Result<String, GpuError> {
        let template: Cow<'static, str> = match self {
            KernelSource::Embedded => Cow::Borrowed(EMBEDDED_KERNEL),
            KernelSource::File(path) => std::fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|source| GpuError::KernelSourceNotFound {
                    path: path.display().to_string(),
                    source,
                })?,
        };
        Ok(template.replace("{{WG_SIZE}}", &WORK_GROUP_SIZE.to_string()))
    }
}

// ---------------------------------------------------------------------------
// TransformKernel
// ---------------------------------------------------------------------------

/// The compiled `move_points` pipeline.
///
/// Create once; call [`run`](Self::run) every frame.
pub struct TransformKernel {
    pipeline: wgpu::ComputePipeline,
    bgl: wgpu::BindGroupLayout,
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

impl TransformKernel {
    /// Compile the kernel from `source`.
    ///
    /// # Errors
    /// `KernelSourceNotFound` if a source file can't be read, `KernelCompile`
    /// with wgpu's diagnostic if validation or pipeline creation fails.
    pub fn new(gpu: &GpuDevice, source: &KernelSource) -> Result<Self, GpuError> {
        let shader_src = source.load()?;

        let (pipeline, bgl) = gpu
            .scoped(|| {
                let shader = gpu.device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some("transform.wgsl"),
                    source: wgpu::ShaderSource::Wgsl(shader_src.into()),
                });

                let bgl = gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                    label: Some("TransformKernel BGL"),
                    entries: &[
                        // 0 — input points
                        storage_entry(0, true),
                        // 1 — output points
                        storage_entry(1, false),
                        // 2 — transform matrix
                        storage_entry(2, true),
                        // 3 — point count
                        wgpu::BindGroupLayoutEntry {
                            binding: 3,
                            visibility: wgpu::ShaderStages::COMPUTE,
                            ty: wgpu::BindingType::Buffer {
                                ty: wgpu::BufferBindingType::Uniform,
                                has_dynamic_offset: false,
                                min_binding_size: None,
                            },
                            count: None,
                        },
                    ],
                });

                let pipeline_layout =
                    gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                        label: Some("TransformKernel pipeline layout"),
                        bind_group_layouts: &[&bgl],
                        push_constant_ranges: &[],
                    });

                let pipeline =
                    gpu.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                        label: Some(KERNEL_ENTRY),
                        layout: Some(&pipeline_layout),
                        module: &shader,
                        entry_point: KERNEL_ENTRY,
                        compilation_options: wgpu::PipelineCompilationOptions::default(),
                        cache: None,
                    });

                (pipeline, bgl)
            })
            .map_err(|e| GpuError::KernelCompile(e.to_string()))?;

        debug!("compiled {KERNEL_ENTRY} with work-group size {WORK_GROUP_SIZE}");
        Ok(TransformKernel { pipeline, bgl })
    }

    /// Transform `source` by `matrix` on the device, writing into `output`.
    ///
    /// Blocks until the results have been read back.
    pub fn run(
        &self,
        gpu: &GpuDevice,
        source: &[Point],
        matrix: &Mat4,
        output: &mut [Point],
    ) -> Result<(), DispatchError> {
        let max_per_dim = gpu.device.limits().max_compute_workgroups_per_dimension;
        self.run_with_grid_limit(gpu, source, matrix, output, max_per_dim)
    }

    /// [`run`](Self::run) with the work-group grid folded at `max_per_dim`
    /// groups per dimension. `max_per_dim` must not exceed the device limit.
    fn run_with_grid_limit(
        &self,
        gpu: &GpuDevice,
        source: &[Point],
        matrix: &Mat4,
        output: &mut [Point],
        max_per_dim: u32,
    ) -> Result<(), DispatchError> {
        check_lengths(source, output)?;
        if source.is_empty() {
            return Ok(());
        }
        let count = u32::try_from(source.len()).map_err(|_| {
            DispatchError::Enqueue(format!("{} points exceed the dispatch range", source.len()))
        })?;
        let byte_len = std::mem::size_of_val(source) as u64;
        let device = &gpu.device;

        // --- Device buffers ---
        let create_init = |label: &'static str, contents: &[u8], usage: wgpu::BufferUsages| {
            gpu.scoped(|| {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(label),
                    contents,
                    usage,
                })
            })
            .map_err(|e| DispatchError::BufferCreation {
                buffer: label,
                message: e.to_string(),
            })
        };

        let point_buf = create_init(
            "point",
            bytemuck::cast_slice(flatten_points(source)),
            wgpu::BufferUsages::STORAGE,
        )?;
        // Seeded with the previous frame; the kernel overwrites every element.
        let output_buf = create_init(
            "output",
            bytemuck::cast_slice(flatten_points(output)),
            wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
        )?;
        let flat_matrix = matrix.to_flat();
        let transform_buf = create_init(
            "transform",
            bytemuck::cast_slice(&flat_matrix),
            wgpu::BufferUsages::STORAGE,
        )?;
        let params = TransformParams { point_count: count, _pad: [0; 3] };
        let params_buf = create_init(
            "params",
            bytemuck::bytes_of(&params),
            wgpu::BufferUsages::UNIFORM,
        )?;
        let readback_buf = gpu
            .scoped(|| {
                device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("TransformKernel readback"),
                    size: byte_len,
                    usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                })
            })
            .map_err(|e| DispatchError::BufferCreation {
                buffer: "readback",
                message: e.to_string(),
            })?;

        // --- Kernel arguments ---
        let bind_group = gpu
            .scoped(|| {
                device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("TransformKernel BG"),
                    layout: &self.bgl,
                    entries: &[
                        wgpu::BindGroupEntry { binding: 0, resource: point_buf.as_entire_binding() },
                        wgpu::BindGroupEntry { binding: 1, resource: output_buf.as_entire_binding() },
                        wgpu::BindGroupEntry { binding: 2, resource: transform_buf.as_entire_binding() },
                        wgpu::BindGroupEntry { binding: 3, resource: params_buf.as_entire_binding() },
                    ],
                })
            })
            .map_err(|e| DispatchError::Binding(e.to_string()))?;

        // --- Dispatch + copy-out ---
        let groups = work_groups(count);
        let (groups_x, groups_y) = dispatch_grid(groups, max_per_dim).ok_or_else(|| {
            DispatchError::Enqueue(format!(
                "{groups} work groups exceed a {max_per_dim}x{max_per_dim} dispatch grid"
            ))
        })?;
        trace!(
            "dispatching {KERNEL_ENTRY}: {count} points, global size {}, {groups_x}x{groups_y} groups of {WORK_GROUP_SIZE}",
            global_size(count)
        );
        gpu.scoped(|| {
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("TransformKernel dispatch"),
            });
            {
                let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                    label: Some(KERNEL_ENTRY),
                    timestamp_writes: None,
                });
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &bind_group, &[]);
                pass.dispatch_workgroups(groups_x, groups_y, 1);
            }
            encoder.copy_buffer_to_buffer(&output_buf, 0, &readback_buf, 0, byte_len);
            gpu.queue.submit(std::iter::once(encoder.finish()));
        })
        .map_err(|e| DispatchError::Enqueue(e.to_string()))?;

        // --- Readback ---
        let slice = readback_buf.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            // The receiver outlives the poll below; a failed send is harmless.
            let _ = tx.send(r);
        });
        gpu.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|_| DispatchError::Readback("map callback never fired".into()))?
            .map_err(|e| DispatchError::Readback(e.to_string()))?;

        {
            let mapped = slice.get_mapped_range();
            unflatten_points(bytemuck::cast_slice(&mapped), output)?;
        }
        readback_buf.unmap();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GpuTransform
// ---------------------------------------------------------------------------

/// [`TransformBackend`] backed by a compute device.
///
/// Owns the device for the process lifetime. Field order makes the kernel
/// drop before the device it was created on.
pub struct GpuTransform {
    kernel: TransformKernel,
    gpu: GpuDevice,
}

impl GpuTransform {
    /// Acquire a device and compile the kernel.
    pub fn new(source: &KernelSource) -> Result<Self, GpuError> {
        Self::with_device(GpuDevice::new()?, source)
    }

    /// Compile the kernel on an existing device.
    pub fn with_device(gpu: GpuDevice, source: &KernelSource) -> Result<Self, GpuError> {
        let kernel = TransformKernel::new(&gpu, source)?;
        Ok(GpuTransform { kernel, gpu })
    }

    pub fn device(&self) -> &GpuDevice {
        &self.gpu
    }

    /// Reject a point count the device cannot transform in one dispatch.
    pub fn ensure_capacity(&self, count: usize) -> Result<(), GpuError> {
        let max = max_points(&self.gpu.device.limits());
        if count as u64 > max {
            return Err(GpuError::PointCapacity { requested: count, max });
        }
        Ok(())
    }
}

impl TransformBackend for GpuTransform {
    fn transform(
        &mut self,
        source: &[Point],
        matrix: &Mat4,
        output: &mut [Point],
    ) -> Result<(), DispatchError> {
        self.kernel.run(&self.gpu, source, matrix, output)
    }

    fn name(&self) -> &str {
        "gpu"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
