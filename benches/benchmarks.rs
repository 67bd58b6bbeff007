// benches/benchmarks.rs -- Per-stage and full-frame benchmarks on the host.
//
//   cargo bench --bench benchmarks
//
// Point counts span the cube up to a cloud large enough that the transform
// loop dominates the rasterizer.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use ascii3d::dispatch::{HostTransform, TransformBackend};
use ascii3d::frame::FrameDriver;
use ascii3d::point::{Point, PointStore};
use ascii3d::raster::FrameBuffer;
use ascii3d::transform::{Mat4, Transform};

const SIZES: [usize; 4] = [8, 1_000, 10_000, 100_000];

// ============================================================
// Helpers
// ============================================================

/// Cloud already moved into the grid, as the rasterizer sees it.
fn translated_cloud(n: usize) -> Vec<Point> {
    let store = PointStore::random(n, 42).unwrap();
    let mut t = Transform::for_frame(30);
    t.translate(50.0, 50.0, 50.0);
    let mut out = vec![Point::default(); n];
    HostTransform.transform(store.source(), t.matrix(), &mut out).unwrap();
    out
}

// ============================================================
// Per-stage benchmarks
// ============================================================

fn bench_compose(c: &mut Criterion) {
    c.bench_function("compose_frame_matrix", |b| {
        let mut counter = 0;
        b.iter(|| {
            counter += 1;
            Transform::for_frame(counter)
        })
    });

    let a = Transform::for_frame(17);
    let m = Transform::for_frame(91);
    c.bench_function("matrix_multiply", |b| {
        let mut out = Mat4::IDENTITY;
        b.iter(|| ascii3d::transform::matrix_multiply(&mut out, a.matrix(), m.matrix()))
    });
}

fn bench_host_transform(c: &mut Criterion) {
    let matrix = Transform::for_frame(45);
    let mut group = c.benchmark_group("host_transform");

    for n in SIZES {
        let store = PointStore::random(n, 7).unwrap();
        let mut out = vec![Point::default(); n];
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| HostTransform.transform(store.source(), matrix.matrix(), &mut out))
        });
    }

    group.finish();
}

fn bench_rasterize(c: &mut Criterion) {
    let mut group = c.benchmark_group("rasterize");

    for n in SIZES {
        let points = translated_cloud(n);
        let mut fb = FrameBuffer::new();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| fb.rasterize(&points))
        });
    }

    group.finish();
}

// ============================================================
// Full frame
// ============================================================

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_host");

    for n in SIZES {
        let mut driver = FrameDriver::new(PointStore::random(n, 1).unwrap(), HostTransform);
        driver.set_translation(Some([50.0, 50.0, 50.0]));
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| driver.advance_frame().unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_compose, bench_host_transform, bench_rasterize, bench_frame);
criterion_main!(benches);
