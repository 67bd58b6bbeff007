// main.rs — ascii3d binary.
//
//   ascii3d --cube                      spin the cube in the terminal, q quits
//   ascii3d --points 5000 --headless    time 1000 frames without drawing
//   ascii3d --cube --backend host       skip the compute device entirely
//
// Exit status is non-zero on any startup error and on a run that exceeds
// the consecutive dispatch failure limit.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};

use ascii3d::config::{Args, BackendKind, Config};
use ascii3d::dispatch::{HostTransform, TransformBackend};
use ascii3d::frame::{FrameDriver, SkipPolicy};
use ascii3d::gpu::transform::GpuTransform;
use ascii3d::present::TerminalPresenter;

fn main() -> Result<()> {
    let args = Args::parse();

    // Interactive runs share stderr with the drawing; keep it quiet unless
    // RUST_LOG asks otherwise.
    let default_filter = if args.headless { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_micros()
        .init();

    let (config, shape) = args.into_config().context("invalid configuration")?;

    let points = shape.build().with_context(|| format!("couldn't create {shape}"))?;
    info!("shape: {shape}");

    let backend: Box<dyn TransformBackend> = match config.backend {
        BackendKind::Gpu => {
            let gpu = GpuTransform::new(&config.kernel)
                .context("couldn't initialise the compute backend")?;
            gpu.ensure_capacity(points.len())
                .context("point cloud is too large for the compute device")?;
            Box::new(gpu)
        }
        BackendKind::Host => Box::new(HostTransform::new()),
    };
    info!("backend: {}", backend.name());

    let mut driver = FrameDriver::new(points, backend);
    driver.set_translation(config.translation);

    if config.headless {
        run_headless(&mut driver, &config)
    } else {
        run_interactive(&mut driver, &config)
    }
}

/// Fixed number of frames, no drawing, timed.
fn run_headless<B: TransformBackend>(driver: &mut FrameDriver<B>, config: &Config) -> Result<()> {
    info!("number of iterations {}", config.iterations);

    let mut policy = SkipPolicy::default();
    let start = Instant::now();
    for _ in 0..config.iterations {
        policy
            .record(driver.advance_frame())
            .context("too many consecutive frame failures")?;
    }
    let elapsed = start.elapsed();

    let secs = elapsed.as_secs_f64();
    let fps = if secs > 0.0 { config.iterations as f64 / secs } else { f64::INFINITY };
    info!(
        "{} frames of {} points in {:.3} s ({:.1} frames/s, {} skipped)",
        config.iterations,
        driver.points().len(),
        secs,
        fps,
        policy.skipped()
    );
    debug!("final frame:\n{}", driver.frame());
    Ok(())
}

/// Draw until the quit key.
fn run_interactive<B: TransformBackend>(driver: &mut FrameDriver<B>, config: &Config) -> Result<()> {
    let mut presenter =
        TerminalPresenter::new(config.frame_delay).context("couldn't set up the terminal")?;
    // Warnings would land on the alternate screen; hold them until it's gone.
    let mut policy = SkipPolicy::deferred();

    let outcome = loop {
        match presenter.present(driver.frame()).context("terminal output failed") {
            Ok(true) => break Ok(()),
            Ok(false) => {}
            Err(e) => break Err(e),
        }
        if let Err(e) = policy.record(driver.advance_frame()) {
            break Err(anyhow::Error::new(e).context("too many consecutive frame failures"));
        }
    };

    drop(presenter);
    policy.report();
    outcome?;
    info!("stopped at frame {}, {} skipped", driver.counter().wrapping_sub(1), policy.skipped());
    Ok(())
}
