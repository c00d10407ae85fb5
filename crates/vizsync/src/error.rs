//! Host error types.

use thiserror::Error;
use vizsync_core::ConfigError;

/// Errors from driving a render thread.
#[derive(Error, Debug)]
pub enum HostError {
    /// The render thread was stopped earlier.
    #[error("render thread already stopped")]
    AlreadyStopped,

    /// The OS refused to start the render thread.
    #[error("failed to spawn render thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The render thread panicked, typically inside a plugin hook.
    #[error("render thread panicked")]
    ThreadPanicked,

    /// The runtime configuration is invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for host operations.
pub type HostResult<T> = Result<T, HostError>;
