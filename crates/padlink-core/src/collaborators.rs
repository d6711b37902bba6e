// ── Collaborator seams ──
//
// The dispatch engine hands resolved actions to these traits; the
// binary wires in the real implementations (HTTP bulb service, the
// accessory integration, scene runner). Failures are per-target and
// never abort sibling targets or other mappings.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CoreError;
use crate::model::{LedColor, SwitchAction};

/// Smart-bulb control surface.
#[async_trait]
pub trait BulbControl: Send + Sync {
    async fn turn_on(&self, target: &str) -> Result<(), CoreError>;
    async fn turn_off(&self, target: &str) -> Result<(), CoreError>;
    /// `level` is 0..=100.
    async fn set_brightness(&self, target: &str, level: u8) -> Result<(), CoreError>;
}

/// The accessory layer: receives trigger/LED notifications, owns
/// accessory switch targets.
#[async_trait]
pub trait AccessoryBridge: Send + Sync {
    /// Report a discrete trigger for a 0-based button index.
    async fn report_trigger(&self, index: usize);
    /// Reflect a device-reported LED change.
    async fn reflect_led(&self, color: LedColor);
    /// Flip an accessory switch target.
    async fn set_switch(&self, target: &str, action: SwitchAction) -> Result<(), CoreError>;
}

/// Scene execution.
#[async_trait]
pub trait SceneTrigger: Send + Sync {
    async fn run_scene(&self, name: &str) -> Result<(), CoreError>;
}

/// The full collaborator set handed to the bridge.
#[derive(Clone)]
pub struct Collaborators {
    pub bulbs: Arc<dyn BulbControl>,
    pub accessory: Arc<dyn AccessoryBridge>,
    pub scenes: Arc<dyn SceneTrigger>,
}

// ── Test doubles ─────────────────────────────────────────────────────

/// Call-recording collaborator double used across the crate's tests
/// (kept unconditional so integration tests and downstream crates can
/// use it too).
pub mod doubles {
    use std::sync::Mutex;

    use super::*;

    /// Records every collaborator call as a readable string.
    #[derive(Default)]
    pub struct Recording {
        pub calls: Mutex<Vec<String>>,
    }

    impl Recording {
        fn record(&self, call: String) {
            self.calls
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(call);
        }

        pub fn take(&self) -> Vec<String> {
            std::mem::take(
                &mut *self
                    .calls
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner),
            )
        }
    }

    #[async_trait]
    impl BulbControl for Recording {
        async fn turn_on(&self, target: &str) -> Result<(), CoreError> {
            self.record(format!("bulb.on {target}"));
            Ok(())
        }

        async fn turn_off(&self, target: &str) -> Result<(), CoreError> {
            self.record(format!("bulb.off {target}"));
            Ok(())
        }

        async fn set_brightness(&self, target: &str, level: u8) -> Result<(), CoreError> {
            self.record(format!("bulb.brightness {target} {level}"));
            Ok(())
        }
    }

    #[async_trait]
    impl AccessoryBridge for Recording {
        async fn report_trigger(&self, index: usize) {
            self.record(format!("accessory.trigger {index}"));
        }

        async fn reflect_led(&self, color: LedColor) {
            self.record(format!("accessory.led {color}"));
        }

        async fn set_switch(&self, target: &str, action: SwitchAction) -> Result<(), CoreError> {
            self.record(format!("accessory.switch {target} {action:?}"));
            Ok(())
        }
    }

    #[async_trait]
    impl SceneTrigger for Recording {
        async fn run_scene(&self, name: &str) -> Result<(), CoreError> {
            self.record(format!("scene {name}"));
            Ok(())
        }
    }

    /// Collaborator set backed by a single shared recorder.
    pub fn recording() -> (Arc<Recording>, Collaborators) {
        let recorder = Arc::new(Recording::default());
        let collaborators = Collaborators {
            bulbs: recorder.clone(),
            accessory: recorder.clone(),
            scenes: recorder.clone(),
        };
        (recorder, collaborators)
    }
}
