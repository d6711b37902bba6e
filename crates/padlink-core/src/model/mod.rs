pub mod color;
pub mod mapping;

pub use color::{LedColor, Mode, CYCLE_ORDER};
pub use mapping::{
    BulbAction, ButtonAction, ButtonMapping, ModeSelector, SwitchAction,
};

/// Number of physical buttons on the panel.
pub const BUTTON_COUNT: usize = 10;

/// The 1-based button reserved for mode cycling. Never available for
/// user action mappings.
pub const MODE_CYCLE_BUTTON: u8 = 10;
