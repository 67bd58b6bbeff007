// benches/gpu_benchmarks.rs — Compute-backend benchmarks.
//
// Mirrors benchmarks.rs. Each host measurement has a GPU counterpart in the
// same group for direct comparison.
//
//   cargo bench --bench gpu_benchmarks
//
//
// CRITERION + GPU CAVEATS
// ────────────────────────
// Criterion measures wall time including buffer creation, bind group setup,
// submit and the blocking readback. Every frame allocates its device buffers
// afresh, so small clouds are dominated by that fixed cost rather than by
// the kernel.
//
// The first iterations may pay pipeline compilation on some drivers, so
// warmup_time is set explicitly.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use ascii3d::dispatch::{HostTransform, TransformBackend};
use ascii3d::frame::FrameDriver;
use ascii3d::gpu::device::GpuDevice;
use ascii3d::gpu::transform::{GpuTransform, KernelSource, TransformKernel};
use ascii3d::point::{Point, PointStore};
use ascii3d::transform::Transform;

const SIZES: [usize; 4] = [8, 1_000, 10_000, 100_000];

// ============================================================
// Transform: host vs GPU
// ============================================================

fn bench_transform(c: &mut Criterion) {
    let gpu = GpuDevice::new().expect("no compute adapter");
    let kernel = TransformKernel::new(&gpu, &KernelSource::Embedded).expect("kernel compile");
    let matrix = Transform::for_frame(45);

    let mut group = c.benchmark_group("transform");
    group.warm_up_time(Duration::from_secs(2));

    for n in SIZES {
        let store = PointStore::random(n, 7).unwrap();
        let mut out = vec![Point::default(); n];
        group.throughput(Throughput::Elements(n as u64));

        group.bench_with_input(BenchmarkId::new("host", n), &n, |b, _| {
            b.iter(|| HostTransform.transform(store.source(), matrix.matrix(), &mut out))
        });

        group.bench_with_input(BenchmarkId::new("gpu", n), &n, |b, _| {
            b.iter(|| kernel.run(&gpu, store.source(), matrix.matrix(), &mut out).unwrap())
        });
    }

    group.finish();
}

// ============================================================
// Full frame: host vs GPU
// ============================================================

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");
    group.warm_up_time(Duration::from_secs(2));

    for n in SIZES {
        group.throughput(Throughput::Elements(n as u64));

        let mut host = FrameDriver::new(PointStore::random(n, 1).unwrap(), HostTransform);
        host.set_translation(Some([50.0, 50.0, 50.0]));
        group.bench_with_input(BenchmarkId::new("host", n), &n, |b, _| {
            b.iter(|| host.advance_frame().unwrap())
        });

        let backend = GpuTransform::new(&KernelSource::Embedded).expect("no compute adapter");
        let mut gpu = FrameDriver::new(PointStore::random(n, 1).unwrap(), backend);
        gpu.set_translation(Some([50.0, 50.0, 50.0]));
        group.bench_with_input(BenchmarkId::new("gpu", n), &n, |b, _| {
            b.iter(|| gpu.advance_frame().unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_transform, bench_frame);
criterion_main!(benches);
