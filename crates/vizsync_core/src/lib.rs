//! # VIZSYNC Core
//!
//! Cross-thread dirty-data handoff between arbitrary producer threads and a
//! single render thread.
//!
//! ## Architecture Rules
//!
//! 1. **Producers never wait on the consumer** - `update` is one short critical section
//! 2. **One pending value per type** - a newer update overwrites the unconsumed one
//! 3. **The artifact belongs to the consumer** - producers hold only an `Arc<UpdateGate>`
//!
//! ```text
//!   Producer 1 ──┐
//!   Producer 2 ──┼──> UpdateGate [slot A | slot B] + dirty ──> tick() ──> Merge<T> ──> Artifact
//!   Producer N ──┘         (one guard, last-write-wins)         (render thread only)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use vizsync_core::{Inputs, Merge, PluginCore, PluginInstance};
//!
//! let mut instance = PluginInstance::new(MyPlugin::default());
//! let points = instance.updater::<Point>().expect("registered");
//!
//! std::thread::spawn(move || points.update(Point::new(1.0, 2.0, 3.0)));
//!
//! // Render thread, once per frame:
//! instance.tick();
//! draw(instance.artifact());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod adapter;
pub mod config;
pub mod error;
pub mod plugin;
pub mod sync;

pub use adapter::{AdapterInfo, AdapterRegistry};
pub use config::ConfigSnapshot;
pub use error::{AdapterError, AdapterResult, ConfigError, ConfigResult, GateError, GateResult};
pub use plugin::{Inputs, Merge, PluginCore, PluginInstance, TickOutcome, Tickable};
pub use sync::{GateStats, SharedState, UpdateGate, Updater};
