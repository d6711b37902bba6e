//! Configuration for the padlink daemon and CLI.
//!
//! TOML file + `PADLINK_` environment overlay (sections separated by
//! `__`, e.g. `PADLINK_DEVICE__HOST`), translated to
//! `padlink_core::BridgeConfig`. Button mappings are validated
//! per-entry: a bad mapping is skipped with a warning and never blocks
//! startup or its siblings.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use padlink_core::{
    BridgeConfig, BulbAction, ButtonAction, ButtonMapping, MODE_CYCLE_BUTTON, Mode, ModeSelector,
    SwitchAction,
};
use padlink_device::SessionConfig;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("invalid mapping for button {button}: {reason}")]
    Mapping { button: u8, reason: String },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceSection,

    #[serde(default)]
    pub http: HttpSection,

    #[serde(default)]
    pub bulbs: BulbSection,

    /// Ordered button mappings; order is the dispatch tie-break order.
    #[serde(default, rename = "mapping")]
    pub mappings: Vec<MappingEntry>,
}

/// `[device]`: where the panel lives and how patient to be with it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    #[serde(default = "default_keepalive")]
    pub keepalive_interval_secs: u64,

    #[serde(default = "default_health_check")]
    pub health_check_interval_secs: u64,

    #[serde(default = "default_freshness")]
    pub freshness_window_secs: u64,

    #[serde(default = "default_backoff_base")]
    pub backoff_base_secs: u64,

    #[serde(default = "default_backoff_max")]
    pub backoff_max_secs: u64,
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            keepalive_interval_secs: default_keepalive(),
            health_check_interval_secs: default_health_check(),
            freshness_window_secs: default_freshness(),
            backoff_base_secs: default_backoff_base(),
            backoff_max_secs: default_backoff_max(),
        }
    }
}

fn default_host() -> String {
    "192.168.1.50".into()
}
fn default_port() -> u16 {
    4999
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    60
}
fn default_keepalive() -> u64 {
    30
}
fn default_health_check() -> u64 {
    60
}
fn default_freshness() -> u64 {
    120
}
fn default_backoff_base() -> u64 {
    10
}
fn default_backoff_max() -> u64 {
    300
}

/// `[http]`: local-only trigger endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpSection {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
}

impl Default for HttpSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8787))
}

/// `[bulbs]`: the bulb-service REST endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BulbSection {
    #[serde(default = "default_bulb_url")]
    pub base_url: String,

    #[serde(default = "default_bulb_timeout")]
    pub timeout_secs: u64,
}

impl Default for BulbSection {
    fn default() -> Self {
        Self {
            base_url: default_bulb_url(),
            timeout_secs: default_bulb_timeout(),
        }
    }
}

fn default_bulb_url() -> String {
    "http://127.0.0.1:8080".into()
}
fn default_bulb_timeout() -> u64 {
    10
}

/// One `[[mapping]]` entry as written in TOML, before validation.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MappingEntry {
    pub button: u8,

    #[serde(default = "default_mode")]
    pub mode: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub action: Option<String>,

    #[serde(default)]
    pub targets: Vec<String>,

    /// Singular alternative to `targets`.
    #[serde(default)]
    pub target: Option<String>,

    #[serde(default)]
    pub scene: Option<String>,

    #[serde(default)]
    pub color: Option<String>,

    #[serde(default)]
    pub brightness: Option<u8>,
}

fn default_mode() -> String {
    "any".into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "padlink", "padlink").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("padlink");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file path (still overlaid by `PADLINK_` env).
pub fn load_config_from(path: &std::path::Path) -> Result<Config, ConfigError> {
    // Double underscore separates sections so snake_case field names
    // stay addressable: PADLINK_DEVICE__BACKOFF_BASE_SECS.
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PADLINK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Mapping resolution ──────────────────────────────────────────────

/// Validate and convert one raw mapping entry.
pub fn resolve_mapping(entry: &MappingEntry) -> Result<ButtonMapping, ConfigError> {
    let invalid = |reason: String| ConfigError::Mapping {
        button: entry.button,
        reason,
    };

    if entry.button == MODE_CYCLE_BUTTON {
        return Err(invalid("button 10 is reserved for mode cycling".into()));
    }
    if !(1..MODE_CYCLE_BUTTON).contains(&entry.button) {
        return Err(invalid(format!("button {} out of range 1..=9", entry.button)));
    }

    let mode = if entry.mode.eq_ignore_ascii_case("any") {
        ModeSelector::Any
    } else {
        let parsed: Mode = entry
            .mode
            .parse()
            .map_err(|e| invalid(format!("{e}")))?;
        ModeSelector::Exact(parsed)
    };

    let action = match entry.kind.as_str() {
        "bulb" => resolve_bulb(entry).map_err(invalid)?,
        "accessory" => resolve_accessory(entry).map_err(invalid)?,
        "scene" => {
            let name = entry
                .scene
                .clone()
                .or_else(|| entry.action.clone())
                .ok_or_else(|| invalid("scene mapping needs a scene name".into()))?;
            ButtonAction::Scene { name }
        }
        "led" => {
            let color = entry
                .color
                .as_deref()
                .ok_or_else(|| invalid("led mapping needs a color".into()))?;
            let color: Mode = color.parse().map_err(|e| invalid(format!("{e}")))?;
            ButtonAction::Led { color }
        }
        other => return Err(invalid(format!("unknown action type '{other}'"))),
    };

    Ok(ButtonMapping {
        button: entry.button,
        mode,
        action,
    })
}

fn resolve_bulb(entry: &MappingEntry) -> Result<ButtonAction, String> {
    let action = match entry.action.as_deref() {
        Some("on") => BulbAction::On,
        Some("off") => BulbAction::Off,
        Some("brightness") => BulbAction::Brightness,
        Some(other) => return Err(format!("unknown bulb action '{other}'")),
        None => return Err("bulb mapping needs an action".into()),
    };

    let mut targets = entry.targets.clone();
    if let Some(single) = &entry.target {
        targets.push(single.clone());
    }
    if targets.is_empty() {
        return Err("bulb mapping needs at least one target".into());
    }

    if action == BulbAction::Brightness {
        match entry.brightness {
            Some(level) if level <= 100 => {}
            Some(level) => return Err(format!("brightness {level} out of range 0..=100")),
            None => return Err("brightness mapping needs a level".into()),
        }
    }

    Ok(ButtonAction::Bulb {
        action,
        targets,
        brightness: entry.brightness,
    })
}

fn resolve_accessory(entry: &MappingEntry) -> Result<ButtonAction, String> {
    let target = entry
        .target
        .clone()
        .or_else(|| entry.targets.first().cloned())
        .ok_or_else(|| "accessory mapping needs a target".to_string())?;

    let action = match entry.action.as_deref() {
        Some("on") => SwitchAction::On,
        Some("off") => SwitchAction::Off,
        Some("toggle") | None => SwitchAction::Toggle,
        Some(other) => return Err(format!("unknown accessory action '{other}'")),
    };

    Ok(ButtonAction::Accessory { target, action })
}

/// Resolve every mapping entry, skipping invalid ones with a warning.
/// A configuration mismatch is never fatal and never blocks siblings.
pub fn resolve_mappings(entries: &[MappingEntry]) -> Vec<ButtonMapping> {
    entries
        .iter()
        .filter_map(|entry| match resolve_mapping(entry) {
            Ok(mapping) => Some(mapping),
            Err(e) => {
                warn!(error = %e, "skipping invalid mapping");
                None
            }
        })
        .collect()
}

// ── Translation to runtime config ───────────────────────────────────

impl Config {
    /// Build the bridge's runtime configuration.
    pub fn to_bridge_config(&self) -> BridgeConfig {
        let d = &self.device;
        let mut session = SessionConfig::new(d.host.clone(), d.port);
        session.connect_timeout = Duration::from_secs(d.connect_timeout_secs);
        session.idle_timeout = Duration::from_secs(d.idle_timeout_secs);
        session.keepalive_interval = Duration::from_secs(d.keepalive_interval_secs);
        session.health_check_interval = Duration::from_secs(d.health_check_interval_secs);
        session.freshness_window = Duration::from_secs(d.freshness_window_secs);
        session.backoff_base = Duration::from_secs(d.backoff_base_secs);
        session.backoff_max = Duration::from_secs(d.backoff_max_secs);

        BridgeConfig {
            session,
            mappings: resolve_mappings(&self.mappings),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn entry(button: u8, mode: &str, kind: &str) -> MappingEntry {
        MappingEntry {
            button,
            mode: mode.into(),
            kind: kind.into(),
            action: None,
            targets: Vec::new(),
            target: None,
            scene: None,
            color: None,
            brightness: None,
        }
    }

    #[test]
    fn bulb_mapping_resolves() {
        let mut raw = entry(3, "red", "bulb");
        raw.action = Some("on".into());
        raw.targets = vec!["kitchen".into()];

        let mapping = resolve_mapping(&raw).expect("valid mapping");
        assert_eq!(mapping.button, 3);
        assert_eq!(mapping.mode, ModeSelector::Exact(Mode::Red));
        assert_eq!(
            mapping.action,
            ButtonAction::Bulb {
                action: BulbAction::On,
                targets: vec!["kitchen".into()],
                brightness: None,
            }
        );
    }

    #[test]
    fn reserved_button_is_rejected() {
        let mut raw = entry(10, "any", "scene");
        raw.scene = Some("x".into());
        assert!(resolve_mapping(&raw).is_err());

        let mut raw = entry(0, "any", "scene");
        raw.scene = Some("x".into());
        assert!(resolve_mapping(&raw).is_err());
    }

    #[test]
    fn unknown_action_type_is_rejected() {
        let raw = entry(2, "any", "teleport");
        assert!(matches!(
            resolve_mapping(&raw),
            Err(ConfigError::Mapping { button: 2, .. })
        ));
    }

    #[test]
    fn brightness_requires_a_level_in_range() {
        let mut raw = entry(4, "any", "bulb");
        raw.action = Some("brightness".into());
        raw.targets = vec!["lamp".into()];
        assert!(resolve_mapping(&raw).is_err());

        raw.brightness = Some(150);
        assert!(resolve_mapping(&raw).is_err());

        raw.brightness = Some(75);
        assert!(resolve_mapping(&raw).is_ok());
    }

    #[test]
    fn invalid_mapping_skipped_without_blocking_siblings() {
        let mut good = entry(1, "any", "scene");
        good.scene = Some("evening".into());
        let bad = entry(5, "any", "nope");

        let resolved = resolve_mappings(&[bad, good]);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].button, 1);
    }

    #[test]
    fn load_from_toml_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("tempfile");
        writeln!(
            file,
            r#"
[device]
host = "panel.local"
port = 5000
backoff_base_secs = 5

[http]
bind = "127.0.0.1:9999"

[[mapping]]
button = 3
mode = "red"
type = "bulb"
action = "on"
targets = ["kitchen"]

[[mapping]]
button = 7
mode = "any"
type = "scene"
scene = "movie"
"#
        )
        .expect("write config");

        let config = load_config_from(file.path()).expect("load");
        assert_eq!(config.device.host, "panel.local");
        assert_eq!(config.device.port, 5000);
        assert_eq!(config.device.backoff_base_secs, 5);
        // Untouched fields keep their defaults.
        assert_eq!(config.device.backoff_max_secs, 300);
        assert_eq!(config.http.bind.port(), 9999);

        let bridge = config.to_bridge_config();
        assert_eq!(bridge.session.backoff_base, Duration::from_secs(5));
        assert_eq!(bridge.mappings.len(), 2);
    }

    #[test]
    fn env_overlay_reaches_snake_case_fields() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PADLINK_DEVICE__HOST", "env.panel.local");
            jail.set_env("PADLINK_DEVICE__BACKOFF_BASE_SECS", "7");

            let config = load_config_from(std::path::Path::new("missing.toml"))
                .expect("load from env");
            assert_eq!(config.device.host, "env.panel.local");
            assert_eq!(config.device.backoff_base_secs, 7);
            Ok(())
        });
    }

    #[test]
    fn defaults_without_a_file() {
        let config =
            load_config_from(std::path::Path::new("/nonexistent/padlink.toml")).expect("defaults");
        assert_eq!(config.device.port, 4999);
        assert_eq!(config.http.bind.port(), 8787);
        assert!(config.mappings.is_empty());
    }
}
