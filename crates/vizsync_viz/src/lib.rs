//! # VIZSYNC Visualizations
//!
//! Concrete plugins on top of [`vizsync_core`]. Each one accepts typed
//! updates from any thread and keeps a CPU-side vertex artifact that the
//! render thread rebuilds in `finalize`.
//!
//! | Plugin | Inputs | Artifact |
//! |--------|--------|----------|
//! | [`TrajectoryVisualization`] | `Vector3`, `Spline3`, `MaxPoints`, `Rgba`, `ClearTrajectory` | [`LineStrip`] |
//! | [`WaypointVisualization`] | `Waypoint` | [`WaypointMarker`] |
//! | [`MotionCommandVisualization`] | `MotionCommand2D` | [`MotionArrow`] |
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut trail = PluginInstance::new(TrajectoryVisualization::default());
//! let points = trail.updater::<Vector3>()?;
//!
//! std::thread::spawn(move || points.update(Vector3::new(0.0, 1.0, 0.0)));
//!
//! trail.tick();
//! upload(trail.artifact().as_bytes());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod artifact;
pub mod motion_command;
pub mod trajectory;
pub mod types;
pub mod waypoint;

pub use artifact::{Bounds, LineStrip, Vertex};
pub use motion_command::{MotionArrow, MotionCommandSettings, MotionCommandVisualization, MAX_MOTION_SAMPLES};
pub use trajectory::{TrajectorySettings, TrajectoryVisualization};
pub use types::{ClearTrajectory, MaxPoints, MotionCommand2D, Rgba, Spline3, Vector3, Waypoint, MAX_SPLINE_SAMPLES};
pub use waypoint::{WaypointMarker, WaypointSettings, WaypointVisualization, MAX_RING_SEGMENTS};
