//! # Plugin Contract
//!
//! Every visualization implements [`PluginCore`] once and [`Merge<T>`] once per
//! input type it accepts. The host wraps it in a [`PluginInstance`], which owns
//! the visual artifact and runs the consumer-side tick.
//!
//! ## Tick
//!
//! ```text
//! tick()
//!   ├── gate clean?  ──yes──> Idle (no hook runs)
//!   ├── lock gate
//!   │     ├── Merge<A>::apply_update(a)   (registration order)
//!   │     ├── Merge<B>::apply_update(b)
//!   │     └── clear dirty
//!   ├── unlock gate
//!   └── PluginCore::finalize(artifact)    (unlocked, consumer only)
//! ```

mod inputs;
mod instance;

use std::any::Any;

use crate::error::ConfigResult;

pub use inputs::Inputs;
pub use instance::PluginInstance;

/// The capability set every visualization plugin provides.
///
/// Producers never see the plugin itself. They only get [`Updater`] handles
/// to its gate, so the plugin and its artifact are touched exclusively by
/// the render thread.
///
/// [`Updater`]: crate::Updater
pub trait PluginCore: Send + 'static {
    /// The long-lived structure the renderer reads between ticks.
    type Artifact: Send + 'static;

    /// Stable name, used as the key for persisted configuration.
    fn plugin_name(&self) -> &str;

    /// Declares the accepted input types, in merge order, and their
    /// foreign-caller adapters. Called once per instance.
    fn register_inputs(inputs: &mut Inputs<Self>)
    where
        Self: Sized;

    /// Builds the initial, empty artifact. Called once at construction.
    fn create_artifact(&mut self) -> Self::Artifact;

    /// Runs after the merges of a busy tick, outside the gate lock.
    ///
    /// Rebuild derived data here (bounds, index ranges, topology).
    fn finalize(&mut self, _artifact: &mut Self::Artifact) {}

    /// Snapshot of the plugin's persisted settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be encoded.
    fn save_config(&self) -> ConfigResult<toml::Table> {
        Ok(toml::Table::new())
    }

    /// Restores settings previously produced by [`save_config`](Self::save_config).
    ///
    /// # Errors
    ///
    /// Returns an error if a value is malformed or out of range.
    fn load_config(&mut self, _config: &toml::Table) -> ConfigResult<()> {
        Ok(())
    }
}

/// Type-specific merge hook.
///
/// Invoked only by [`PluginInstance::tick`], on the render thread, while the
/// gate lock is held. Never concurrently with another merge on the same
/// instance. Hooks must stay short and must not call back into the gate.
pub trait Merge<T>: PluginCore {
    /// Folds a newly arrived value into the artifact.
    fn apply_update(&mut self, artifact: &mut Self::Artifact, value: T);
}

/// Result of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing was pending. No hook ran.
    Idle,
    /// The gate was dirty. `merged` values were applied, then the artifact
    /// was finalized.
    Updated {
        /// Number of merge hooks invoked.
        merged: usize,
    },
}

impl TickOutcome {
    /// Number of merge hooks invoked during the tick.
    #[must_use]
    pub const fn merged(&self) -> usize {
        match self {
            Self::Idle => 0,
            Self::Updated { merged } => *merged,
        }
    }

    /// Returns true if the tick did nothing.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// Object-safe view of a plugin instance, for hosts that drive many plugins
/// of different types from one render loop.
pub trait Tickable: Send {
    /// The plugin's name.
    fn name(&self) -> &str;

    /// Runs one consumer tick.
    fn tick(&mut self) -> TickOutcome;

    /// Returns whether the next tick will do work.
    fn is_dirty(&self) -> bool;

    /// Ticks run so far, idle ones included.
    fn ticks(&self) -> u64;

    /// Downcasting support.
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcasting support.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn Tickable {
    /// Recovers the concrete instance type.
    #[must_use]
    pub fn downcast_ref<P: PluginCore>(&self) -> Option<&PluginInstance<P>> {
        self.as_any().downcast_ref()
    }

    /// Recovers the concrete instance type mutably.
    #[must_use]
    pub fn downcast_mut<P: PluginCore>(&mut self) -> Option<&mut PluginInstance<P>> {
        self.as_any_mut().downcast_mut()
    }
}
