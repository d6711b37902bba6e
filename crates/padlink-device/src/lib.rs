// padlink-device: wire codec and TCP session layer for the wall-panel
// controller. Domain interpretation (modes, mappings) lives in padlink-core.

pub mod error;
pub mod frame;
pub mod led;
pub mod session;

pub use error::DeviceError;
pub use frame::{ButtonEdge, DeviceFrame, decode_frame};
pub use led::{LedValue, query_led_command, set_led_command};
pub use session::{DeviceHandle, SessionConfig, SessionEvent};
