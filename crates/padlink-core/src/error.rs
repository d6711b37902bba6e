// ── Core error types ──
//
// Consumer-facing errors. Collaborator and device failures are wrapped
// here; nothing in this crate treats them as fatal -- dispatch logs and
// continues, the bridge reconnects.

use thiserror::Error;

use padlink_device::DeviceError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("device session is not connected")]
    DeviceDisconnected,

    #[error("button {button} out of range (valid: 1..=10)")]
    InvalidButton { button: u8 },

    #[error("collaborator failure for '{target}': {message}")]
    Collaborator { target: String, message: String },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("device error: {0}")]
    Device(#[from] DeviceError),
}

impl CoreError {
    /// Shorthand for per-target collaborator failures.
    pub fn collaborator(target: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Collaborator {
            target: target.into(),
            message: message.to_string(),
        }
    }
}
