// ── Device-layer errors ──
//
// Everything here is a connection-lifecycle failure. None of these are
// fatal to the process: the session loop consumes them into reconnect
// scheduling, and callers above only ever see them through logs.

use thiserror::Error;

/// Errors from the device wire and session layer.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("cannot connect to device at {host}:{port}: {reason}")]
    Connect {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("connect to device timed out after {timeout_secs}s")]
    ConnectTimeout { timeout_secs: u64 },

    #[error("device socket error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no data from device for {idle_secs}s, link presumed dead")]
    Stale { idle_secs: u64 },

    #[error("device closed the connection")]
    Closed,
}
