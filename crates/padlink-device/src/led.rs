// ── LED value codec ──
//
// The panel reports and accepts its RGB LED as a single 9-digit string:
// three 3-digit zero-padded decimal fields, red-green-blue. Commands to
// the device are carriage-return delimited; the exact framing below is
// what the firmware expects, byte for byte.

use serde::{Deserialize, Serialize};

/// An RGB triple as carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedValue {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl LedValue {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a wire LED value.
    ///
    /// Shorter strings are left-padded with `'0'` to 9 characters and
    /// longer ones truncated to the first 9, matching the firmware's
    /// own lenient handling. Returns `None` if any field is not a
    /// decimal number in 0..=255.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let padded = format!("{text:0>9}");
        let padded = &padded[..9];

        let r = padded[0..3].parse().ok()?;
        let g = padded[3..6].parse().ok()?;
        let b = padded[6..9].parse().ok()?;
        Some(Self { r, g, b })
    }

    /// Encode as the 9-digit wire form, e.g. (255, 0, 128) → `"255000128"`.
    pub fn encode(&self) -> String {
        format!("{:03}{:03}{:03}", self.r, self.g, self.b)
    }
}

impl std::fmt::Display for LedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

// ── Outbound command framing ─────────────────────────────────────────

/// Command setting the panel LED: `\rled=RRRGGGBBB\r`.
pub fn set_led_command(value: LedValue) -> String {
    format!("\rled={}\r", value.encode())
}

/// LED query, doubling as the keep-alive probe: `\rled=?\r`.
pub fn query_led_command() -> &'static str {
    "\rled=?\r"
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_full_width() {
        assert_eq!(LedValue::parse("255000128"), Some(LedValue::new(255, 0, 128)));
        assert_eq!(LedValue::parse("000000000"), Some(LedValue::new(0, 0, 0)));
    }

    #[test]
    fn parse_pads_short_values() {
        // Device drops leading zeros on occasion; "1" means blue=1.
        assert_eq!(LedValue::parse("1"), Some(LedValue::new(0, 0, 1)));
        assert_eq!(LedValue::parse("128"), Some(LedValue::new(0, 0, 128)));
    }

    #[test]
    fn parse_truncates_long_values() {
        assert_eq!(
            LedValue::parse("25500012899"),
            Some(LedValue::new(255, 0, 128))
        );
    }

    #[test]
    fn parse_rejects_non_digits_and_overflow() {
        assert_eq!(LedValue::parse("led=?"), None);
        assert_eq!(LedValue::parse(""), None);
        assert_eq!(LedValue::parse("999000000"), None);
    }

    #[test]
    fn round_trip() {
        for value in [
            LedValue::new(255, 0, 128),
            LedValue::new(0, 0, 0),
            LedValue::new(1, 2, 3),
            LedValue::new(255, 255, 255),
        ] {
            assert_eq!(LedValue::parse(&value.encode()), Some(value));
        }
    }

    #[test]
    fn command_framing_is_exact() {
        assert_eq!(set_led_command(LedValue::new(255, 0, 128)), "\rled=255000128\r");
        assert_eq!(query_led_command(), "\rled=?\r");
    }
}
