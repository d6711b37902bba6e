// ── In-process accessory layer ──
//
// Stands in for the home-automation accessory framework: exposes the
// ten buttons as stateless triggers and keeps simple on/off state for
// accessory switch targets. Trigger and LED notifications surface as
// structured log events that downstream integrations tail.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use tracing::{debug, info};

use padlink_core::{AccessoryBridge, CoreError, LedColor, SwitchAction};

/// Accessory layer backed by local state and the log stream.
#[derive(Default)]
pub struct LoggingAccessory {
    switches: Mutex<HashMap<String, bool>>,
}

impl LoggingAccessory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state of a switch target, if it has ever been set.
    pub fn switch_state(&self, target: &str) -> Option<bool> {
        self.switches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(target)
            .copied()
    }
}

#[async_trait]
impl AccessoryBridge for LoggingAccessory {
    async fn report_trigger(&self, index: usize) {
        info!(button = index + 1, "button trigger");
    }

    async fn reflect_led(&self, color: LedColor) {
        debug!(color = %color, mode = %color.mode(), "panel LED changed");
    }

    async fn set_switch(&self, target: &str, action: SwitchAction) -> Result<(), CoreError> {
        let mut switches = self
            .switches
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let current = switches.entry(target.to_string()).or_insert(false);
        let next = match action {
            SwitchAction::On => true,
            SwitchAction::Off => false,
            SwitchAction::Toggle => !*current,
        };
        *current = next;
        info!(switch = %target, on = next, "accessory switch");
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn toggle_flips_state() {
        let accessory = LoggingAccessory::new();
        assert_eq!(accessory.switch_state("fan"), None);

        accessory
            .set_switch("fan", SwitchAction::Toggle)
            .await
            .expect("toggle");
        assert_eq!(accessory.switch_state("fan"), Some(true));

        accessory
            .set_switch("fan", SwitchAction::Toggle)
            .await
            .expect("toggle");
        assert_eq!(accessory.switch_state("fan"), Some(false));

        accessory
            .set_switch("fan", SwitchAction::On)
            .await
            .expect("on");
        assert_eq!(accessory.switch_state("fan"), Some(true));
    }
}
