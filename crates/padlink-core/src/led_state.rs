// ── LED state and mode cycling ──
//
// Exclusive owner of the current LED color and the cycle index. Writes
// return the wire command to transmit; the in-memory color is updated
// unconditionally as the optimistic new state, transmission being
// best-effort by contract.

use padlink_device::{LedValue, set_led_command};

use crate::model::color::{CYCLE_ORDER, LedColor, Mode};

/// Current panel LED state plus the mode-cycle position.
#[derive(Debug)]
pub struct LedState {
    color: LedColor,
    cycle_index: usize,
}

impl Default for LedState {
    fn default() -> Self {
        Self::new()
    }
}

impl LedState {
    pub fn new() -> Self {
        Self {
            color: LedColor::BLACK,
            // One before Red, so the first cycle starts the sequence.
            cycle_index: CYCLE_ORDER.len() - 1,
        }
    }

    pub fn color(&self) -> LedColor {
        self.color
    }

    /// Symbolic mode of the current color.
    pub fn mode(&self) -> Mode {
        self.color.mode()
    }

    /// Apply a device-reported LED value.
    pub fn apply_report(&mut self, value: LedValue) {
        self.color = value.into();
    }

    /// Set a new color locally and return the command to transmit.
    pub fn set(&mut self, color: LedColor) -> String {
        self.color = color;
        set_led_command(color.into())
    }

    /// Advance the palette cycle and set the new color. Returns the
    /// command to transmit.
    pub fn cycle(&mut self) -> String {
        self.cycle_index = (self.cycle_index + 1) % CYCLE_ORDER.len();
        let mode = CYCLE_ORDER[self.cycle_index];
        self.set(mode.palette_color())
    }
}

// ── Tests ────────────────────────────────────────────────────────────
