// padlink-core: domain layer between padlink-device and consumers
// (daemon, CLI, accessory integrations).

pub mod bridge;
pub mod buttons;
pub mod collaborators;
pub mod dispatch;
pub mod error;
pub mod led_state;
pub mod model;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bridge::{Bridge, BridgeConfig, ConnectionState};
pub use buttons::{ButtonBank, Trigger};
pub use collaborators::{AccessoryBridge, BulbControl, Collaborators, SceneTrigger};
pub use error::CoreError;
pub use led_state::LedState;
pub use model::{
    BulbAction, ButtonAction, ButtonMapping, LedColor, Mode, ModeSelector, SwitchAction,
    BUTTON_COUNT, MODE_CYCLE_BUTTON,
};
