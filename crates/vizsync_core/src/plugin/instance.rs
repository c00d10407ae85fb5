//! Consumer-side owner of a plugin, its artifact and its gate.

use std::any::Any;
use std::sync::Arc;

use crate::adapter::AdapterRegistry;
use crate::config::ConfigSnapshot;
use crate::error::{ConfigError, ConfigResult, GateResult};
use crate::sync::{UpdateGate, Updater};

use super::inputs::{Inputs, MergeFn};
use super::{PluginCore, TickOutcome, Tickable};

/// A live plugin: the plugin value, its visual artifact and its update gate.
///
/// The instance lives on the render thread. Producers receive [`Updater`]
/// handles or the shared [`AdapterRegistry`]; neither can reach the plugin or
/// the artifact. Because [`tick`](Self::tick) takes `&mut self`, the artifact
/// cannot be read while a tick is in flight and the instance cannot be
/// dropped mid-tick.
pub struct PluginInstance<P: PluginCore> {
    plugin: P,
    artifact: P::Artifact,
    gate: Arc<UpdateGate>,
    merges: Vec<MergeFn<P>>,
    adapters: Arc<AdapterRegistry>,
    ticks: u64,
    busy_ticks: u64,
}

impl<P: PluginCore> PluginInstance<P> {
    /// Registers the plugin's inputs, builds its gate and adapters, and
    /// creates the initial artifact.
    #[must_use]
    pub fn new(mut plugin: P) -> Self {
        let mut inputs = Inputs::new();
        P::register_inputs(&mut inputs);
        let (gate, merges, adapter_specs) = inputs.into_parts();
        let gate = gate.build();

        let mut adapters = AdapterRegistry::new(plugin.plugin_name(), Arc::clone(&gate));
        for (method, register) in adapter_specs {
            if let Err(err) = register(&mut adapters, &method) {
                tracing::warn!(plugin = plugin.plugin_name(), "adapter skipped: {err}");
            }
        }

        let artifact = plugin.create_artifact();

        tracing::debug!(
            plugin = plugin.plugin_name(),
            inputs = gate.slot_count(),
            adapters = adapters.len(),
            "plugin instance created"
        );

        Self {
            plugin,
            artifact,
            gate,
            merges,
            adapters: Arc::new(adapters),
            ticks: 0,
            busy_ticks: 0,
        }
    }

    /// Returns a producer handle for input type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::UnregisteredType`](crate::GateError::UnregisteredType)
    /// if the plugin does not accept `T`.
    pub fn updater<T: Send + 'static>(&self) -> GateResult<Updater<T>> {
        self.gate.updater()
    }

    /// Stores a value from the render thread itself, outside any tick.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::UnregisteredType`](crate::GateError::UnregisteredType)
    /// if the plugin does not accept `T`.
    pub fn update<T: Send + 'static>(&self, value: T) -> GateResult<()> {
        self.gate.update(value)
    }

    /// The gate shared with producers.
    #[must_use]
    pub fn gate(&self) -> &Arc<UpdateGate> {
        &self.gate
    }

    /// Adapters for dynamically typed callers. Read-only, shareable.
    #[must_use]
    pub fn adapters(&self) -> &Arc<AdapterRegistry> {
        &self.adapters
    }

    /// Returns whether the next tick will do work.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.gate.is_dirty()
    }

    /// Forces the next tick to finalize the artifact even without new data.
    pub fn mark_dirty(&self) {
        self.gate.mark_dirty();
    }

    /// Runs one consumer tick.
    ///
    /// Merges every pending value under the gate lock in registration order,
    /// clears the dirty flag, releases the lock, then finalizes the artifact.
    pub fn tick(&mut self) -> TickOutcome {
        self.ticks += 1;
        if !self.gate.is_dirty() {
            return TickOutcome::Idle;
        }

        let Self {
            plugin,
            artifact,
            gate,
            merges,
            ..
        } = self;

        let merged = gate.drain(|index, slot| merges[index](&mut *plugin, &mut *artifact, slot));
        plugin.finalize(artifact);
        self.busy_ticks += 1;

        tracing::trace!(plugin = self.plugin.plugin_name(), merged, "tick");
        TickOutcome::Updated { merged }
    }

    /// The plugin, read-only.
    #[must_use]
    pub fn plugin(&self) -> &P {
        &self.plugin
    }

    /// The plugin, for direct changes from the render thread between ticks.
    ///
    /// Call [`mark_dirty`](Self::mark_dirty) afterwards if the artifact must
    /// be finalized against the new state.
    pub fn plugin_mut(&mut self) -> &mut P {
        &mut self.plugin
    }

    /// The visual artifact. Only reachable between ticks.
    #[must_use]
    pub fn artifact(&self) -> &P::Artifact {
        &self.artifact
    }

    /// The plugin's name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.plugin.plugin_name()
    }

    /// Ticks run so far, idle ones included.
    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ticks that found the gate dirty.
    #[must_use]
    pub fn busy_ticks(&self) -> u64 {
        self.busy_ticks
    }

    /// Writes the plugin's settings into `snapshot` under its name.
    ///
    /// # Errors
    ///
    /// Returns an error if the plugin's settings cannot be encoded.
    pub fn save_config(&self, snapshot: &mut ConfigSnapshot) -> ConfigResult<()> {
        let table = self.plugin.save_config()?;
        snapshot.insert(self.plugin.plugin_name(), table);
        Ok(())
    }

    /// Restores the plugin's settings from `snapshot` and marks the instance
    /// dirty so the next tick finalizes against them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingPlugin`] if the snapshot has no section
    /// for this plugin, or the plugin's own validation error.
    pub fn load_config(&mut self, snapshot: &ConfigSnapshot) -> ConfigResult<()> {
        let name = self.plugin.plugin_name();
        let table = snapshot
            .get(name)
            .ok_or_else(|| ConfigError::MissingPlugin(name.to_owned()))?;
        self.plugin.load_config(table)?;
        self.gate.mark_dirty();
        Ok(())
    }
}

impl<P: PluginCore> Tickable for PluginInstance<P> {
    fn name(&self) -> &str {
        PluginInstance::name(self)
    }

    fn tick(&mut self) -> TickOutcome {
        PluginInstance::tick(self)
    }

    fn is_dirty(&self) -> bool {
        PluginInstance::is_dirty(self)
    }

    fn ticks(&self) -> u64 {
        PluginInstance::ticks(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl<P: PluginCore + std::fmt::Debug> std::fmt::Debug for PluginInstance<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginInstance")
            .field("plugin", &self.plugin)
            .field("gate", &self.gate)
            .field("ticks", &self.ticks)
            .field("busy_ticks", &self.busy_ticks)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::Merge;
    use crate::AdapterError;
    use serde::{Deserialize, Serialize};

    /// Records every hook call into its artifact.
    #[derive(Debug, Default)]
    struct Recorder {
        finalized: u32,
        settings: RecorderSettings,
    }

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct RecorderSettings {
        label: String,
        limit: u32,
    }

    #[derive(Debug, Default)]
    struct Log {
        entries: Vec<String>,
    }

    impl PluginCore for Recorder {
        type Artifact = Log;

        fn plugin_name(&self) -> &str {
            "Recorder"
        }

        fn register_inputs(inputs: &mut Inputs<Self>) {
            inputs.adapter::<i32>("updateInt").accept::<String>();
        }

        fn create_artifact(&mut self) -> Log {
            Log::default()
        }

        fn finalize(&mut self, _artifact: &mut Log) {
            self.finalized += 1;
        }

        fn save_config(&self) -> ConfigResult<toml::Table> {
            crate::config::encode(&self.settings)
        }

        fn load_config(&mut self, config: &toml::Table) -> ConfigResult<()> {
            self.settings = crate::config::decode(config)?;
            Ok(())
        }
    }

    impl Merge<i32> for Recorder {
        fn apply_update(&mut self, artifact: &mut Log, value: i32) {
            artifact.entries.push(format!("int:{value}"));
        }
    }

    impl Merge<String> for Recorder {
        fn apply_update(&mut self, artifact: &mut Log, value: String) {
            artifact.entries.push(format!("string:{value}"));
        }
    }

    #[test]
    fn test_instance_creation() {
        let instance = PluginInstance::new(Recorder::default());
        assert_eq!(instance.name(), "Recorder");
        assert_eq!(instance.gate().slot_count(), 2);
        assert_eq!(instance.adapters().len(), 1);
        assert!(!instance.is_dirty());
        assert!(instance.artifact().entries.is_empty());
    }

    #[test]
    fn test_merge_order_and_flag() {
        let mut instance = PluginInstance::new(Recorder::default());
        instance.update("x".to_string()).unwrap();
        instance.update(5_i32).unwrap();

        let outcome = instance.tick();
        assert_eq!(outcome, TickOutcome::Updated { merged: 2 });
        assert_eq!(instance.artifact().entries, vec!["int:5", "string:x"]);
        assert!(!instance.is_dirty());
        assert_eq!(instance.plugin().finalized, 1);
    }

    #[test]
    fn test_idle_tick_runs_no_hook() {
        let mut instance = PluginInstance::new(Recorder::default());
        assert_eq!(instance.tick(), TickOutcome::Idle);
        assert_eq!(instance.plugin().finalized, 0);
        assert!(instance.artifact().entries.is_empty());
        assert_eq!(instance.ticks(), 1);
        assert_eq!(instance.busy_ticks(), 0);
    }

    #[test]
    fn test_mark_dirty_finalizes_without_merge() {
        let mut instance = PluginInstance::new(Recorder::default());
        instance.mark_dirty();

        assert_eq!(instance.tick(), TickOutcome::Updated { merged: 0 });
        assert_eq!(instance.plugin().finalized, 1);
        assert!(instance.artifact().entries.is_empty());
    }

    #[test]
    fn test_adapter_dispatch_reaches_merge() {
        let mut instance = PluginInstance::new(Recorder::default());
        let adapters = Arc::clone(instance.adapters());

        adapters.dispatch("updateInt", &9_i32).unwrap();
        assert!(matches!(
            adapters.dispatch("updateInt", &"nine"),
            Err(AdapterError::TypeMismatch { .. })
        ));

        instance.tick();
        assert_eq!(instance.artifact().entries, vec!["int:9"]);
    }

    #[test]
    fn test_tickable_downcast() {
        let mut boxed: Box<dyn Tickable> = Box::new(PluginInstance::new(Recorder::default()));
        assert_eq!(boxed.name(), "Recorder");

        let concrete = boxed.downcast_mut::<Recorder>().unwrap();
        concrete.update(1_i32).unwrap();

        assert_eq!(boxed.tick().merged(), 1);
        let concrete = boxed.downcast_ref::<Recorder>().unwrap();
        assert_eq!(concrete.artifact().entries, vec!["int:1"]);
    }

    #[test]
    fn test_config_round_trip_marks_dirty() {
        let mut source = PluginInstance::new(Recorder::default());
        source.plugin_mut().settings = RecorderSettings {
            label: "tracks".into(),
            limit: 12,
        };

        let mut snapshot = ConfigSnapshot::new();
        source.save_config(&mut snapshot).unwrap();

        let mut restored = PluginInstance::new(Recorder::default());
        restored.load_config(&snapshot).unwrap();
        assert_eq!(restored.plugin().settings, source.plugin().settings);
        assert!(restored.is_dirty());
    }

    #[test]
    fn test_load_config_missing_plugin() {
        let mut instance = PluginInstance::new(Recorder::default());
        let err = instance.load_config(&ConfigSnapshot::new()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingPlugin(name) if name == "Recorder"));
        assert!(!instance.is_dirty());
    }
}
