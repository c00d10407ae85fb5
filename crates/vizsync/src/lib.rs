//! # VIZSYNC
//!
//! Host side of the visualization handoff: a dedicated render thread that
//! owns plugin instances and ticks them at a fixed rate, while any number of
//! producer threads push typed updates straight into the plugins' gates.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                           HOST                                 │
//! ├────────────────────────────────────────────────────────────────┤
//! │  producer threads ──Updater<T>──┐                              │
//! │  script bridge ──AdapterRegistry┼──► UpdateGate (per plugin)   │
//! │                                 │          │                   │
//! │                       RenderThread: tick() every frame         │
//! │                                 │          ▼                   │
//! │  control thread ──inspect()─────┴──► artifacts (LineStrip ...) │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! let rt = RenderThread::spawn(RenderThreadConfig::default())?;
//!
//! let trail = PluginInstance::new(TrajectoryVisualization::default());
//! let points = trail.updater::<Vector3>()?;
//! rt.attach(trail)?;
//!
//! points.update(Vector3::new(1.0, 0.0, 0.0));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod render_thread;

pub use config::RenderThreadConfig;
pub use error::{HostError, HostResult};
pub use render_thread::{RenderThread, TickStats};

pub use vizsync_core;
pub use vizsync_viz;
