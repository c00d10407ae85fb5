//! # Persisted Plugin Configuration
//!
//! Key/value snapshots of plugin settings, saved and restored as TOML:
//!
//! ```toml
//! [plugins.TrajectoryVisualization]
//! max_points = 1800
//! color = [1.0, 0.0, 0.0, 1.0]
//!
//! [plugins.WaypointVisualization]
//! ring_segments = 32
//! ```
//!
//! Configuration never goes through the update gate. It is applied on the
//! render thread between ticks.

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Settings of several plugins, keyed by plugin name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    #[serde(default)]
    plugins: BTreeMap<String, toml::Table>,
}

impl ConfigSnapshot {
    /// Creates an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a snapshot from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed input.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Encodes the snapshot as TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Serialize`] if a value has no TOML form.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reads a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] or [`ConfigError::Parse`].
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let snapshot = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), plugins = snapshot.len(), "config snapshot loaded");
        Ok(snapshot)
    }

    /// Writes the snapshot to a file, replacing it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] or [`ConfigError::Serialize`].
    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        std::fs::write(path, self.to_toml_string()?)?;
        tracing::debug!(path = %path.display(), plugins = self.len(), "config snapshot saved");
        Ok(())
    }

    /// Stores the settings of `plugin`, replacing earlier ones.
    pub fn insert(&mut self, plugin: impl Into<String>, table: toml::Table) {
        self.plugins.insert(plugin.into(), table);
    }

    /// Settings of `plugin`, if present.
    #[must_use]
    pub fn get(&self, plugin: &str) -> Option<&toml::Table> {
        self.plugins.get(plugin)
    }

    /// Removes and returns the settings of `plugin`.
    pub fn remove(&mut self, plugin: &str) -> Option<toml::Table> {
        self.plugins.remove(plugin)
    }

    /// Plugin names present, sorted.
    pub fn plugin_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.plugins.keys().map(String::as_str)
    }

    /// Number of plugins in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns true if the snapshot holds no plugin.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// Encodes a settings struct as a TOML table.
///
/// # Errors
///
/// Returns [`ConfigError::Serialize`] if encoding fails, or
/// [`ConfigError::InvalidValue`] if `config` is not a struct or map.
pub fn encode<C: Serialize>(config: &C) -> ConfigResult<toml::Table> {
    match toml::Value::try_from(config)? {
        toml::Value::Table(table) => Ok(table),
        other => Err(ConfigError::InvalidValue {
            key: String::from("<root>"),
            reason: format!("expected a table, found {}", other.type_str()),
        }),
    }
}

/// Decodes a settings struct from a TOML table.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] if the table does not match `C`.
pub fn decode<C: DeserializeOwned>(table: &toml::Table) -> ConfigResult<C> {
    Ok(toml::Value::Table(table.clone()).try_into()?)
}
