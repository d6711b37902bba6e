// ── Button mappings ──
//
// Immutable configuration binding (button, mode) to an action. Many
// mappings may share a button number; the mode selector disambiguates
// at dispatch time.

use serde::{Deserialize, Serialize};

use super::color::Mode;

/// Mapping-side mode matcher: a concrete mode or the `any` wildcard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeSelector {
    Any,
    #[serde(untagged)]
    Exact(Mode),
}

impl ModeSelector {
    pub fn matches_exactly(&self, mode: Mode) -> bool {
        matches!(self, ModeSelector::Exact(m) if *m == mode)
    }

    pub fn is_any(&self) -> bool {
        matches!(self, ModeSelector::Any)
    }
}

impl std::fmt::Display for ModeSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModeSelector::Any => f.write_str("any"),
            ModeSelector::Exact(mode) => mode.fmt(f),
        }
    }
}

/// What a bulb mapping does to its targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulbAction {
    On,
    Off,
    Brightness,
}

/// On/off/toggle for accessory switch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchAction {
    On,
    Off,
    Toggle,
}

/// The closed set of configurable actions. Dispatch is an exhaustive
/// match over this enum; there is no stringly-typed fallthrough.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ButtonAction {
    /// Smart-bulb control against one or more targets.
    Bulb {
        action: BulbAction,
        targets: Vec<String>,
        /// 0..=100; only meaningful for `BulbAction::Brightness`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        brightness: Option<u8>,
    },
    /// Toggle / set an accessory switch.
    Accessory {
        target: String,
        action: SwitchAction,
    },
    /// Run a named scene.
    Scene { name: String },
    /// Set the panel LED to a palette color.
    Led { color: Mode },
}

/// One configured rule: button + mode selector + action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonMapping {
    /// 1-based button number, 1..=9. Button 10 is reserved for mode
    /// cycling and rejected at config load.
    pub button: u8,
    pub mode: ModeSelector,
    #[serde(flatten)]
    pub action: ButtonAction,
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn selector_matching() {
        assert!(ModeSelector::Exact(Mode::Red).matches_exactly(Mode::Red));
        assert!(!ModeSelector::Exact(Mode::Red).matches_exactly(Mode::Blue));
        assert!(!ModeSelector::Any.matches_exactly(Mode::Red));
        assert!(ModeSelector::Any.is_any());
    }

    #[test]
    fn selector_deserializes_any_and_modes() {
        let any: ModeSelector = serde_json::from_str("\"any\"").expect("any");
        assert_eq!(any, ModeSelector::Any);

        let red: ModeSelector = serde_json::from_str("\"red\"").expect("red");
        assert_eq!(red, ModeSelector::Exact(Mode::Red));
    }

    #[test]
    fn mapping_deserializes_tagged_action() {
        let json = r#"{
            "button": 3,
            "mode": "red",
            "type": "bulb",
            "action": "on",
            "targets": ["kitchen", "hall"]
        }"#;

        let mapping: ButtonMapping = serde_json::from_str(json).expect("mapping");
        assert_eq!(mapping.button, 3);
        assert_eq!(mapping.mode, ModeSelector::Exact(Mode::Red));
        assert_eq!(
            mapping.action,
            ButtonAction::Bulb {
                action: BulbAction::On,
                targets: vec!["kitchen".into(), "hall".into()],
                brightness: None,
            }
        );
    }
}
