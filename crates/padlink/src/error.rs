// ── CLI error type ──

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] padlink_config::ConfigError),

    #[error(transparent)]
    Core(#[from] padlink_core::CoreError),

    #[error("request to daemon failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("daemon returned {status}: {body}")]
    Daemon { status: u16, body: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl CliError {
    /// Conventional exit codes: 2 for configuration problems,
    /// 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 2,
            _ => 1,
        }
    }
}
