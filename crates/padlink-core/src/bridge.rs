// ── Bridge ──
//
// Full lifecycle management for one panel. Owns the device session,
// LED state, button tracking, and dispatch, and routes decoded frames
// between them. Consumers (daemon HTTP surface, accessory layer, CLI)
// only ever talk to the `Bridge`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use padlink_device::{DeviceHandle, SessionConfig, SessionEvent, query_led_command};

use crate::buttons::{ButtonBank, Trigger};
use crate::collaborators::Collaborators;
use crate::dispatch::{run_mapping, select_mappings};
use crate::error::CoreError;
use crate::led_state::LedState;
use crate::model::{ButtonMapping, LedColor, MODE_CYCLE_BUTTON, Mode};

// ── ConnectionState ──────────────────────────────────────────────────

/// Device link state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
}

// ── BridgeConfig ─────────────────────────────────────────────────────

/// Everything the bridge needs: session tuning plus the mapping table.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub session: SessionConfig,
    pub mappings: Vec<ButtonMapping>,
}

/// A button edge held back until the accessory layer attaches.
#[derive(Debug, Clone, Copy)]
struct PendingEvent {
    index: usize,
    pressed: bool,
}

// ── Bridge ───────────────────────────────────────────────────────────

/// The main entry point for consumers. Cheaply cloneable.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    config: BridgeConfig,
    collaborators: Collaborators,
    led: Mutex<LedState>,
    buttons: Mutex<ButtonBank>,
    /// `Some` while the readiness queue is armed; taken exactly once.
    pending: Mutex<Option<Vec<PendingEvent>>>,
    device: Mutex<Option<DeviceHandle>>,
    state_tx: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
}

/// Poisoning cannot leave these small states inconsistent; recover the
/// guard instead of propagating a panic.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Bridge {
    /// Create a bridge from configuration. Does NOT connect -- call
    /// [`connect()`](Self::connect) to open the device session.
    pub fn new(config: BridgeConfig, collaborators: Collaborators) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);

        Self {
            inner: Arc::new(BridgeInner {
                config,
                collaborators,
                led: Mutex::new(LedState::new()),
                buttons: Mutex::new(ButtonBank::new()),
                pending: Mutex::new(Some(Vec::new())),
                device: Mutex::new(None),
                state_tx,
                cancel: CancellationToken::new(),
            }),
        }
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Open the device session and start routing its events. Returns
    /// immediately; watch [`connection_state`](Self::connection_state)
    /// for progress.
    pub fn connect(&self) {
        if self.inner.cancel.is_cancelled() {
            debug!("connect after shutdown is a no-op");
            return;
        }

        let device = DeviceHandle::connect(
            self.inner.config.session.clone(),
            self.inner.cancel.child_token(),
        );
        let events = device.subscribe();
        // Never two live sessions: a repeated connect supersedes the
        // previous one.
        if let Some(old) = lock(&self.inner.device).replace(device) {
            old.shutdown();
        }

        let _ = self.inner.state_tx.send(ConnectionState::Connecting);

        tokio::spawn(route_events(self.clone(), events));
    }

    /// Terminal teardown: stops the session, cancels routing, and
    /// makes every subsequent operation a no-op. Idempotent.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
        if let Some(device) = lock(&self.inner.device).take() {
            device.shutdown();
        }
        let _ = self.inner.state_tx.send(ConnectionState::Disconnected);
        info!("bridge shut down");
    }

    /// Subscribe to connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Whether the device socket is currently established.
    pub fn is_connected(&self) -> bool {
        lock(&self.inner.device)
            .as_ref()
            .is_some_and(DeviceHandle::is_connected)
    }

    // ── LED operations ───────────────────────────────────────────────

    /// Set the panel LED. The in-memory color is the optimistic new
    /// state regardless of whether the write reaches the device.
    pub fn set_led(&self, color: LedColor) {
        let command = lock(&self.inner.led).set(color);
        self.send_command(&command);
    }

    /// Advance the mode-cycle palette and set the LED accordingly.
    pub fn cycle_mode(&self) {
        let command = lock(&self.inner.led).cycle();
        self.send_command(&command);
    }

    pub fn current_mode(&self) -> Mode {
        lock(&self.inner.led).mode()
    }

    pub fn current_color(&self) -> LedColor {
        lock(&self.inner.led).color()
    }

    fn send_command(&self, command: &str) {
        if let Some(device) = lock(&self.inner.device).as_ref() {
            device.send_command(command);
        } else {
            debug!("no device session, dropping command");
        }
    }

    // ── Readiness ────────────────────────────────────────────────────

    /// Signal that the accessory layer has attached its button
    /// endpoints. Drains the readiness queue in FIFO arrival order,
    /// exactly once; the queue is never re-armed.
    pub async fn accessory_ready(&self) {
        let Some(queued) = lock(&self.inner.pending).take() else {
            debug!("accessory readiness signalled twice, ignoring");
            return;
        };

        info!(queued = queued.len(), "accessory layer ready, draining queue");
        for event in queued {
            if let Some(trigger) = lock(&self.inner.buttons).handle_edge(event.index, event.pressed)
            {
                self.dispatch_trigger(trigger).await;
            }
        }
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Execute the configured action(s) for a 1-based button number.
    ///
    /// Identical semantics to a physical press→release: the HTTP
    /// trigger surface and the accessory layer both land here.
    pub async fn execute_button_action(&self, button: u8) -> Result<(), CoreError> {
        if !(1..=MODE_CYCLE_BUTTON).contains(&button) {
            return Err(CoreError::InvalidButton { button });
        }

        // Button 10 is reserved: always cycles the mode, never
        // consults mappings.
        if button == MODE_CYCLE_BUTTON {
            self.cycle_mode();
            return Ok(());
        }

        let mode = self.current_mode();
        let selected = select_mappings(&self.inner.config.mappings, button, mode);
        if selected.is_empty() {
            debug!(button, mode = %mode, "no mapping for button, nothing to do");
            return Ok(());
        }

        debug!(button, mode = %mode, count = selected.len(), "dispatching button action");
        for mapping in selected {
            if let Some(color) = run_mapping(mapping, &self.inner.collaborators).await {
                self.set_led(color);
            }
        }
        Ok(())
    }

    async fn dispatch_trigger(&self, trigger: Trigger) {
        self.inner
            .collaborators
            .accessory
            .report_trigger(trigger.index)
            .await;

        if let Err(e) = self.execute_button_action(trigger.button_number()).await {
            warn!(button = trigger.button_number(), error = %e, "trigger dispatch failed");
        }
    }

    // ── Inbound event handling ───────────────────────────────────────

    async fn handle_session_event(&self, event: SessionEvent) {
        match event {
            SessionEvent::Connected => {
                let _ = self.inner.state_tx.send(ConnectionState::Connected);
                // Refresh LED state right away rather than waiting for
                // the first keep-alive probe.
                self.send_command(query_led_command());
            }
            SessionEvent::Disconnected => {
                let _ = self.inner.state_tx.send(ConnectionState::Disconnected);
            }
            SessionEvent::Reconnecting { attempt, .. } => {
                let _ = self
                    .inner
                    .state_tx
                    .send(ConnectionState::Reconnecting { attempt });
            }
            SessionEvent::Frame(frame) => {
                if let Some(value) = frame.led {
                    lock(&self.inner.led).apply_report(value);
                    let color = self.current_color();
                    self.inner.collaborators.accessory.reflect_led(color).await;
                }

                for edge in frame.edges {
                    self.handle_edge(edge.index, edge.pressed).await;
                }
            }
        }
    }

    async fn handle_edge(&self, index: usize, pressed: bool) {
        if self.inner.cancel.is_cancelled() || !self.is_connected() {
            debug!(index, "ignoring button edge, session not live");
            return;
        }

        // Queue raw edges until the accessory layer attaches, so the
        // state machine runs exactly once per edge.
        {
            let mut pending = lock(&self.inner.pending);
            if let Some(queue) = pending.as_mut() {
                queue.push(PendingEvent { index, pressed });
                debug!(index, pressed, "queued edge before accessory readiness");
                return;
            }
        }

        let trigger = lock(&self.inner.buttons).handle_edge(index, pressed);
        if let Some(trigger) = trigger {
            self.dispatch_trigger(trigger).await;
        }
    }
}

// ── Event routing task ───────────────────────────────────────────────

async fn route_events(bridge: Bridge, mut events: broadcast::Receiver<SessionEvent>) {
    let cancel = bridge.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            event = events.recv() => match event {
                Ok(event) => bridge.handle_session_event(event).await,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "bridge lagged behind session events");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }

    debug!("bridge event routing exiting");
}

// ── Tests ────────────────────────────────────────────────────────────
