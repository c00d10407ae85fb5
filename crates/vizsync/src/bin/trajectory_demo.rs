//! # Trajectory Demo
//!
//! Three producers feed three live plugins on one render thread:
//! - a sensor thread streams a spiral into the trajectory trail
//! - a planner thread sends motion commands through the adapter registry
//! - the main thread moves a waypoint once per second
//!
//! ```bash
//! RUST_LOG=vizsync=debug cargo run --bin trajectory_demo -- render.toml
//! ```

use std::error::Error;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing_subscriber::EnvFilter;
use vizsync::vizsync_core::PluginInstance;
use vizsync::vizsync_viz::{
    MaxPoints, MotionCommand2D, MotionCommandVisualization, TrajectoryVisualization, Vector3, Waypoint,
    WaypointVisualization,
};
use vizsync::{RenderThread, RenderThreadConfig};

const RUN_SECONDS: u32 = 3;
const SENSOR_HZ: u32 = 200;

fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => RenderThreadConfig::load(path)?,
        None => RenderThreadConfig::default(),
    };

    println!("═══════════════════════════════════════════════════════════════════");
    println!("                    VIZSYNC TRAJECTORY DEMO");
    println!("═══════════════════════════════════════════════════════════════════");
    println!("  render thread: {} @ {} fps", config.thread_name, config.target_fps);
    println!();

    let mut rt = RenderThread::spawn(config)?;

    let trail = PluginInstance::new(TrajectoryVisualization::default());
    let points = trail.updater::<Vector3>()?;
    trail.update(MaxPoints(400))?;
    rt.attach(trail)?;

    let motion = PluginInstance::new(MotionCommandVisualization::default());
    let motion_adapters = Arc::clone(motion.adapters());
    rt.attach(motion)?;

    let target = PluginInstance::new(WaypointVisualization::default());
    let waypoints = target.updater::<Waypoint>()?;
    rt.attach(target)?;

    let sensor = thread::Builder::new().name("sensor".into()).spawn(move || {
        for i in 0..SENSOR_HZ * RUN_SECONDS {
            let t = f64::from(i) / f64::from(SENSOR_HZ);
            let radius = 1.0 + 0.2 * t;
            points.update(Vector3::new(radius * (2.0 * t).cos(), radius * (2.0 * t).sin(), 0.1 * t));
            thread::sleep(Duration::from_secs(1) / SENSOR_HZ);
        }
    })?;

    let planner = thread::Builder::new().name("planner".into()).spawn(move || {
        for i in 0..20 * RUN_SECONDS {
            let command = MotionCommand2D {
                translation: 0.5,
                rotation: (f64::from(i) * 0.1).sin(),
            };
            if let Err(err) = motion_adapters.dispatch("updateMotionCommand", &command) {
                tracing::error!("dispatch failed: {err}");
                return;
            }
            thread::sleep(Duration::from_millis(50));
        }
    })?;

    for second in 0..RUN_SECONDS {
        waypoints.update(Waypoint {
            position: Vector3::new(f64::from(second), 2.0, 0.0),
            heading: f64::from(second) * 0.5,
            tol_position: 0.3,
            tol_heading: 0.2,
        });
        thread::sleep(Duration::from_secs(1));
    }

    sensor.join().map_err(|_| "sensor thread panicked")?;
    planner.join().map_err(|_| "planner thread panicked")?;

    rt.tick_now()?;
    let report = rt.inspect(|plugins| {
        let mut lines = Vec::new();
        for plugin in plugins.iter() {
            if let Some(trail) = plugin.downcast_ref::<TrajectoryVisualization>() {
                let strip = trail.artifact();
                lines.push(format!(
                    "{:<28} {:>5} vertices  {:>6} bytes  revision {}",
                    trail.name(),
                    strip.len(),
                    strip.as_bytes().len(),
                    strip.revision()
                ));
            } else if let Some(motion) = plugin.downcast_ref::<MotionCommandVisualization>() {
                lines.push(format!(
                    "{:<28} {:>5} vertices  command {:?}",
                    motion.name(),
                    motion.artifact().path.len(),
                    motion.plugin().command()
                ));
            } else if let Some(target) = plugin.downcast_ref::<WaypointVisualization>() {
                lines.push(format!(
                    "{:<28} ring {:>3} vertices  at {:?}",
                    target.name(),
                    target.artifact().tolerance_ring.len(),
                    target.artifact().position.map(|v| v.position)
                ));
            }
        }
        lines
    })?;

    let stats = rt.stop()?;

    for line in report {
        println!("  {line}");
    }
    println!();
    println!(
        "  frames {}  busy {}  idle {}  merges {}  worst tick {}us",
        stats.frames, stats.busy_ticks, stats.idle_ticks, stats.merges, stats.worst_tick_us
    );
    Ok(())
}
