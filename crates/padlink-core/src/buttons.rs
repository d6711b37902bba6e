// ── Button state machine ──
//
// One press/release tracker per physical button. The device repeats
// edges under bounce and packet retransmission; this layer guarantees
// exactly one trigger per press→release pair.

use std::time::Instant;

use crate::model::BUTTON_COUNT;

/// Discrete event emitted on a press→release edge. `index` is 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub index: usize,
}

impl Trigger {
    /// 1-based button number as seen in configuration and on the wire.
    pub fn button_number(&self) -> u8 {
        (self.index + 1) as u8
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ButtonState {
    pressed: bool,
    last_press_at: Option<Instant>,
}

/// Fixed-size press/release tracker for the panel's buttons.
#[derive(Debug, Default)]
pub struct ButtonBank {
    states: [ButtonState; BUTTON_COUNT],
}

impl ButtonBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one decoded edge. Returns a trigger only on a release that
    /// follows a press.
    ///
    /// Re-presses while already pressed are idempotent; releases
    /// without a prior press are ignored as duplicate/spurious edges.
    pub fn handle_edge(&mut self, index: usize, pressed: bool) -> Option<Trigger> {
        let Some(state) = self.states.get_mut(index) else {
            tracing::debug!(index, "button index out of range, ignoring edge");
            return None;
        };

        if pressed {
            if !state.pressed {
                state.pressed = true;
                state.last_press_at = Some(Instant::now());
            }
            None
        } else if state.pressed {
            state.pressed = false;
            Some(Trigger { index })
        } else {
            None
        }
    }

    pub fn is_pressed(&self, index: usize) -> bool {
        self.states.get(index).is_some_and(|s| s.pressed)
    }

    pub fn last_press_at(&self, index: usize) -> Option<Instant> {
        self.states.get(index).and_then(|s| s.last_press_at)
    }
}

// ── Tests ────────────────────────────────────────────────────────────
