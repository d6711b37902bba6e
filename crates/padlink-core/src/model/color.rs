// ── LED color and mode classification ──
//
// The panel reports brightness-attenuated colors: a "red" LED dimmed to
// half reads (128, 0, 0). Classification therefore normalizes both the
// reported color and the palette entries so the maximum channel is 255
// before comparing. Purple's canonical entry (128, 0, 128) is itself
// attenuated, which is why the palette side needs normalizing too.

use serde::{Deserialize, Serialize};

use padlink_device::LedValue;

/// Current RGB state of the panel LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl LedColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const BLACK: LedColor = LedColor::new(0, 0, 0);

    pub fn is_off(&self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }

    /// Scale all channels so the maximum becomes 255, preserving
    /// ratios with nearest-integer rounding. Off stays off.
    pub fn normalized(&self) -> LedColor {
        let max = self.r.max(self.g).max(self.b);
        if max == 0 {
            return *self;
        }
        let scale = |c: u8| -> u8 {
            let scaled = (u32::from(c) * 255 * 2 + u32::from(max)) / (u32::from(max) * 2);
            scaled.min(255) as u8
        };
        LedColor::new(scale(self.r), scale(self.g), scale(self.b))
    }

    /// Symbolic mode for this color.
    pub fn mode(&self) -> Mode {
        if self.is_off() {
            return Mode::Off;
        }
        let normalized = self.normalized();
        for mode in CYCLE_ORDER {
            if mode.palette_color().normalized() == normalized {
                return mode;
            }
        }
        Mode::Unknown
    }
}

impl From<LedValue> for LedColor {
    fn from(v: LedValue) -> Self {
        LedColor::new(v.r, v.g, v.b)
    }
}

impl From<LedColor> for LedValue {
    fn from(c: LedColor) -> Self {
        LedValue::new(c.r, c.g, c.b)
    }
}

impl std::fmt::Display for LedColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

// ── Mode ─────────────────────────────────────────────────────────────

/// Symbolic name derived from the LED's normalized color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Off,
    Red,
    Green,
    Blue,
    Yellow,
    Purple,
    White,
    Unknown,
}

/// Palette sequence bound to the mode-cycle button, in cycle order.
pub const CYCLE_ORDER: [Mode; 6] = [
    Mode::Red,
    Mode::Green,
    Mode::Blue,
    Mode::Yellow,
    Mode::Purple,
    Mode::White,
];

impl Mode {
    /// Canonical palette color for a named mode. `Off` and `Unknown`
    /// map to black; they never appear in the cycle sequence.
    pub const fn palette_color(&self) -> LedColor {
        match self {
            Mode::Red => LedColor::new(255, 0, 0),
            Mode::Green => LedColor::new(0, 255, 0),
            Mode::Blue => LedColor::new(0, 0, 255),
            Mode::Yellow => LedColor::new(255, 255, 0),
            Mode::Purple => LedColor::new(128, 0, 128),
            Mode::White => LedColor::new(255, 255, 255),
            Mode::Off | Mode::Unknown => LedColor::BLACK,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Off => "off",
            Mode::Red => "red",
            Mode::Green => "green",
            Mode::Blue => "blue",
            Mode::Yellow => "yellow",
            Mode::Purple => "purple",
            Mode::White => "white",
            Mode::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(Mode::Off),
            "red" => Ok(Mode::Red),
            "green" => Ok(Mode::Green),
            "blue" => Ok(Mode::Blue),
            "yellow" => Ok(Mode::Yellow),
            "purple" => Ok(Mode::Purple),
            "white" => Ok(Mode::White),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown mode name '{0}'")]
pub struct UnknownMode(pub String);

// ── Tests ────────────────────────────────────────────────────────────
