//! # Core Error Types
//!
//! The handoff itself never fails. Errors only exist at the edges: typed
//! lookups on the gate, foreign-caller dispatch and configuration I/O.

use thiserror::Error;

/// Errors from typed access to an [`UpdateGate`](crate::UpdateGate).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// The plugin never registered an input slot for this type.
    #[error("no input slot registered for type {type_name}")]
    UnregisteredType {
        /// Name of the rejected type.
        type_name: &'static str,
    },
}

/// Result type for gate operations.
pub type GateResult<T> = Result<T, GateError>;

/// Errors from the adapter registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// No adapter is registered under this identifier.
    #[error("unregistered identifier: {0}")]
    UnregisteredIdentifier(String),

    /// The payload handed to an adapter is not of its declared type.
    #[error("type mismatch for {method}: expected {expected}")]
    TypeMismatch {
        /// The adapter identifier.
        method: String,
        /// The type the adapter accepts.
        expected: &'static str,
    },

    /// An adapter with this identifier already exists.
    #[error("duplicate identifier: {0}")]
    DuplicateIdentifier(String),

    /// The adapter's type has no input slot on the bound gate.
    #[error("adapter {method} targets unsupported type {type_name}")]
    UnsupportedType {
        /// The adapter identifier.
        method: String,
        /// The type without a slot.
        type_name: &'static str,
    },
}

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Errors from persisted plugin configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading or writing the snapshot file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot is not valid TOML or does not match the expected shape.
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// The configuration could not be encoded as TOML.
    #[error("serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The snapshot has no section for this plugin.
    #[error("no configuration for plugin {0}")]
    MissingPlugin(String),

    /// A key holds a value the plugin cannot accept.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// The offending key.
        key: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
