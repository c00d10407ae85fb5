//! # Render Thread Configuration
//!
//! ```toml
//! thread_name = "vizsync-render"
//! target_fps = 60
//! log_slow_ticks = true
//! slow_tick_budget_us = 2000
//! ```
//!
//! Every key is optional. Missing keys take their default.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vizsync_core::{ConfigError, ConfigResult};

/// Highest accepted frame rate.
pub const MAX_TARGET_FPS: u32 = 1000;

/// Runtime configuration of a [`RenderThread`](crate::RenderThread).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderThreadConfig {
    /// OS name of the consumer thread.
    pub thread_name: String,
    /// Tick passes per second.
    pub target_fps: u32,
    /// Warn when a single plugin tick exceeds the budget.
    pub log_slow_ticks: bool,
    /// Budget of a single plugin tick (microseconds).
    pub slow_tick_budget_us: u64,
}

impl Default for RenderThreadConfig {
    fn default() -> Self {
        Self {
            thread_name: String::from("vizsync-render"),
            target_fps: 60,
            log_slow_ticks: true,
            slow_tick_budget_us: 2_000,
        }
    }
}

impl RenderThreadConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed input, or
    /// [`ConfigError::InvalidValue`] if validation fails.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let config = Self::from_toml_str(&std::fs::read_to_string(path)?)?;
        tracing::debug!(path = %path.display(), ?config, "render thread config loaded");
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad key.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.target_fps == 0 || self.target_fps > MAX_TARGET_FPS {
            return Err(ConfigError::InvalidValue {
                key: "target_fps".into(),
                reason: format!("must be in 1..={MAX_TARGET_FPS}, got {}", self.target_fps),
            });
        }
        if self.thread_name.is_empty() || self.thread_name.contains('\0') {
            return Err(ConfigError::InvalidValue {
                key: "thread_name".into(),
                reason: "must be non-empty and free of NUL bytes".into(),
            });
        }
        Ok(())
    }

    /// Time between two tick passes.
    #[must_use]
    pub fn frame_period(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.target_fps.max(1)))
    }

    /// Budget of a single plugin tick.
    #[must_use]
    pub fn slow_tick_budget(&self) -> Duration {
        Duration::from_micros(self.slow_tick_budget_us)
    }
}
