//! TCP session to the panel with auto-reconnect.
//!
//! Opens a raw TCP connection to the device, decodes inbound frames and
//! streams them through a [`tokio::sync::broadcast`] channel. Handles
//! reconnection with capped exponential backoff, a keep-alive LED query,
//! and a freshness watchdog that forces a reconnect when the link goes
//! silently dead (half-open TCP never reports a socket error).
//!
//! # Example
//!
//! ```rust,ignore
//! use padlink_device::session::{DeviceHandle, SessionConfig, SessionEvent};
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! let handle = DeviceHandle::connect(SessionConfig::new("192.168.1.50", 4999), cancel.clone());
//! let mut rx = handle.subscribe();
//!
//! while let Ok(event) = rx.recv().await {
//!     if let SessionEvent::Frame(frame) = event {
//!         println!("{frame:?}");
//!     }
//! }
//!
//! handle.shutdown();
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::DeviceError;
use crate::frame::{DeviceFrame, decode_frame};
use crate::led::query_led_command;

// ── Channel capacities ───────────────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 256;
const WRITE_CHANNEL_CAPACITY: usize = 32;

const READ_BUF_SIZE: usize = 1024;

// ── SessionConfig ────────────────────────────────────────────────────

/// Connection and liveness tuning for the device session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Device hostname or address.
    pub host: String,

    /// Device TCP port.
    pub port: u16,

    /// Deadline for TCP establishment, independent of the idle timeout.
    pub connect_timeout: Duration,

    /// Reconnect when nothing has been received for this long.
    pub idle_timeout: Duration,

    /// Interval between outbound `led=?` probes.
    pub keepalive_interval: Duration,

    /// Interval between watchdog freshness checks.
    pub health_check_interval: Duration,

    /// Watchdog freshness window: inbound data older than this fails
    /// the connection even when the socket reports no error.
    pub freshness_window: Duration,

    /// First reconnect delay.
    pub backoff_base: Duration,

    /// Upper bound on the reconnect delay.
    pub backoff_max: Duration,
}

impl SessionConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            connect_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(60),
            keepalive_interval: Duration::from_secs(30),
            health_check_interval: Duration::from_secs(60),
            freshness_window: Duration::from_secs(120),
            backoff_base: Duration::from_secs(10),
            backoff_max: Duration::from_secs(300),
        }
    }
}

// ── SessionEvent ─────────────────────────────────────────────────────

/// Lifecycle and data events observed on the session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// TCP established; the attempt counter has been reset.
    Connected,
    /// Connection lost or failed; a reconnect will be scheduled unless
    /// the session is shutting down.
    Disconnected,
    /// Waiting out the backoff delay before attempt `attempt`.
    Reconnecting { attempt: u32, delay: Duration },
    /// A decoded inbound frame.
    Frame(DeviceFrame),
}

// ── DeviceHandle ─────────────────────────────────────────────────────

/// Handle to a running device session.
///
/// Cheaply cloneable. Writes are best-effort: when the session is not
/// connected they are dropped, by contract -- the device protocol has no
/// delivery guarantee anyway.
#[derive(Clone)]
pub struct DeviceHandle {
    event_tx: broadcast::Sender<SessionEvent>,
    write_tx: mpsc::Sender<Vec<u8>>,
    connected: Arc<AtomicBool>,
    cancel: CancellationToken,
}

impl DeviceHandle {
    /// Spawn the session loop and return immediately.
    ///
    /// The first connection attempt happens asynchronously; subscribe
    /// to the event receiver to observe it.
    pub fn connect(config: SessionConfig, cancel: CancellationToken) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (write_tx, write_rx) = mpsc::channel(WRITE_CHANNEL_CAPACITY);
        let connected = Arc::new(AtomicBool::new(false));

        let handle = Self {
            event_tx: event_tx.clone(),
            write_tx,
            connected: Arc::clone(&connected),
            cancel: cancel.clone(),
        };

        tokio::spawn(session_loop(config, event_tx, write_rx, connected, cancel));

        handle
    }

    /// Get a new receiver for session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Whether the session currently holds an established socket.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Best-effort write of raw bytes to the device.
    ///
    /// Silently dropped (debug-logged) when disconnected, shutting
    /// down, or the write queue is full. Never an error to the caller.
    pub fn send(&self, bytes: Vec<u8>) {
        if self.cancel.is_cancelled() || !self.is_connected() {
            tracing::debug!(len = bytes.len(), "dropping write, session not connected");
            return;
        }
        if self.write_tx.try_send(bytes).is_err() {
            tracing::debug!("dropping write, session write queue unavailable");
        }
    }

    /// Best-effort write of a textual device command.
    pub fn send_command(&self, command: &str) {
        self.send(command.as_bytes().to_vec());
    }

    /// Permanently tear the session down. Idempotent; all subsequent
    /// operations become no-ops.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Backoff ──────────────────────────────────────────────────────────

/// `delay = min(max, base × 2^min(attempt, 5))`.
///
/// With base 10s and cap 300s this yields 10, 20, 40, 80, 160, 300,
/// 300, ... -- doubling until the ceiling absorbs the curve.
pub fn backoff_delay(attempt: u32, base: Duration, max: Duration) -> Duration {
    let factor = 1u32 << attempt.min(5);
    base.saturating_mul(factor).min(max)
}

// ── Session loop ─────────────────────────────────────────────────────

/// Main loop: connect → run → on failure, backoff → reconnect.
async fn session_loop(
    config: SessionConfig,
    event_tx: broadcast::Sender<SessionEvent>,
    mut write_rx: mpsc::Receiver<Vec<u8>>,
    connected: Arc<AtomicBool>,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;

    loop {
        if cancel.is_cancelled() {
            break;
        }

        match establish(&config).await {
            Ok(stream) => {
                attempt = 0;
                connected.store(true, Ordering::SeqCst);
                let _ = event_tx.send(SessionEvent::Connected);
                tracing::info!(host = %config.host, port = config.port, "device connected");

                // Anything queued while disconnected is stale by contract.
                while write_rx.try_recv().is_ok() {}

                let reason =
                    run_connected(stream, &config, &event_tx, &mut write_rx, &cancel).await;

                connected.store(false, Ordering::SeqCst);
                let _ = event_tx.send(SessionEvent::Disconnected);

                if cancel.is_cancelled() {
                    break;
                }
                tracing::warn!(error = %reason, "device session ended");
            }
            Err(e) => {
                tracing::warn!(error = %e, attempt, "device connect failed");
            }
        }

        if cancel.is_cancelled() {
            break;
        }

        let delay = backoff_delay(attempt, config.backoff_base, config.backoff_max);
        let _ = event_tx.send(SessionEvent::Reconnecting { attempt, delay });
        tracing::info!(
            delay_ms = delay.as_millis() as u64,
            attempt,
            "waiting before reconnect"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }

        attempt = attempt.saturating_add(1);
    }

    tracing::debug!("device session loop exiting");
}

/// TCP establishment with its own deadline, separate from the idle
/// timeout on the running connection.
async fn establish(config: &SessionConfig) -> Result<TcpStream, DeviceError> {
    let addr = (config.host.as_str(), config.port);

    match tokio::time::timeout(config.connect_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => Ok(stream),
        Ok(Err(e)) => Err(DeviceError::Connect {
            host: config.host.clone(),
            port: config.port,
            reason: e.to_string(),
        }),
        Err(_) => Err(DeviceError::ConnectTimeout {
            timeout_secs: config.connect_timeout.as_secs(),
        }),
    }
}

/// Drive one established connection until it fails or is cancelled.
///
/// The return value is only used for logging; every exit path leads
/// back to the reconnect scheduler.
async fn run_connected(
    mut stream: TcpStream,
    config: &SessionConfig,
    event_tx: &broadcast::Sender<SessionEvent>,
    write_rx: &mut mpsc::Receiver<Vec<u8>>,
    cancel: &CancellationToken,
) -> DeviceError {
    let mut buf = [0u8; READ_BUF_SIZE];
    let mut last_data = Instant::now();

    let mut keepalive = tokio::time::interval(config.keepalive_interval);
    let mut watchdog = tokio::time::interval(config.health_check_interval);
    // Consume the immediate first tick of each interval.
    keepalive.tick().await;
    watchdog.tick().await;

    loop {
        let idle_deadline = last_data + config.idle_timeout;

        tokio::select! {
            biased;

            _ = cancel.cancelled() => return DeviceError::Closed,

            read = stream.read(&mut buf) => match read {
                Ok(0) => return DeviceError::Closed,
                Ok(n) => {
                    last_data = Instant::now();
                    if let Some(frame) = decode_frame(&buf[..n]) {
                        let _ = event_tx.send(SessionEvent::Frame(frame));
                    }
                }
                Err(e) => return DeviceError::Io(e),
            },

            Some(bytes) = write_rx.recv() => {
                if let Err(e) = stream.write_all(&bytes).await {
                    return DeviceError::Io(e);
                }
            }

            _ = keepalive.tick() => {
                tracing::trace!("keep-alive LED query");
                if let Err(e) = stream.write_all(query_led_command().as_bytes()).await {
                    return DeviceError::Io(e);
                }
            }

            // Watchdog: half-open links never error, so staleness has
            // to be detected at the application level.
            _ = watchdog.tick() => {
                if last_data.elapsed() > config.freshness_window {
                    return DeviceError::Stale {
                        idle_secs: last_data.elapsed().as_secs(),
                    };
                }
            }

            _ = tokio::time::sleep_until(idle_deadline) => {
                return DeviceError::Stale {
                    idle_secs: last_data.elapsed().as_secs(),
                };
            }
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────
