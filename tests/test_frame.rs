// tests/test_frame.rs — Integration tests for the frame driver.
//
// All runs use the host reference backend so results are deterministic.

use ascii3d::config::Shape;
use ascii3d::dispatch::HostTransform;
use ascii3d::frame::FrameDriver;
use ascii3d::point::PointStore;
use ascii3d::raster::FrameBuffer;

fn run(shape: Shape, frames: usize, translation: Option<[f32; 3]>) -> Vec<FrameBuffer> {
    let mut driver = FrameDriver::new(shape.build().unwrap(), HostTransform);
    driver.set_translation(translation);
    (0..frames)
        .map(|_| {
            driver.advance_frame().unwrap();
            driver.frame().clone()
        })
        .collect()
}

#[test_log::test]
fn repeated_runs_are_identical() {
    let shape = Shape::Random { count: 2000, seed: 1234 };
    let a = run(shape, 25, Some([50.0, 50.0, 50.0]));
    let b = run(shape, 25, Some([50.0, 50.0, 50.0]));
    assert_eq!(a, b);
}

#[test_log::test]
fn cube_runs_are_identical() {
    assert_eq!(run(Shape::Cube, 10, None), run(Shape::Cube, 10, None));
}

#[test]
fn frames_change_as_the_cloud_spins() {
    let frames = run(Shape::Random { count: 500, seed: 5 }, 40, Some([50.0, 50.0, 50.0]));
    assert_ne!(frames[0], frames[39]);
}

#[test]
fn counter_seed_selects_the_sequence() {
    // Starting at 5 reproduces frames 5.. of a run that started at 1.
    let full = run(Shape::Cube, 8, Some([50.0, 50.0, 50.0]));

    let mut late = FrameDriver::new(PointStore::cube(), HostTransform).with_counter(5);
    late.set_translation(Some([50.0, 50.0, 50.0]));
    for expected in &full[4..] {
        late.advance_frame().unwrap();
        assert_eq!(late.frame(), expected);
    }
}

#[test]
fn default_animation_keeps_store_lengths() {
    let mut driver = FrameDriver::new(PointStore::random(300, 3).unwrap(), HostTransform);
    for _ in 0..5 {
        let stats = driver.advance_frame().unwrap();
        let r = stats.raster;
        assert_eq!(r.plotted + r.occluded + r.clipped, 300);
    }
    assert_eq!(driver.points().source().len(), 300);
    assert_eq!(driver.points().transformed().len(), 300);
}

#[test]
fn source_points_never_change() {
    let store = PointStore::random(100, 77).unwrap();
    let original = store.source().to_vec();
    let mut driver = FrameDriver::new(store, HostTransform);
    for _ in 0..10 {
        driver.advance_frame().unwrap();
    }
    assert_eq!(driver.points().source(), &original[..]);
}
