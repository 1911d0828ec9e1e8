//! Configuration for stormwatch.
//!
//! Settings are read once at startup from `~/.stormwatch/config.yaml` (or a
//! path given on the command line) and never change afterwards. Every key is
//! optional; a missing default file simply means "use the defaults".
//!
//! ```yaml
//! limit: 500
//! update_time_secs: 60
//! areas: [PA, NM]
//! events: ["Tornado Watch", "Red Flag Warning"]
//! columns: [areaDesc, event, certainty, effective]
//! focus_contents: [effective, description]
//! weights: [30, 70]
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use stormwatch_core::{AlertField, Result, StormError};
use tracing::debug;

/// Default NWS API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.weather.gov/";

/// Largest result cap the alert endpoint accepts.
pub const MAX_LIMIT: u32 = 500;

/// Config file path (`~/.stormwatch/config.yaml`).
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".stormwatch").join("config.yaml"))
}

/// Complete stormwatch configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StormConfig {
    /// Base URL of the alert API
    pub api_base_url: String,

    /// User-Agent sent with every request (the NWS API rejects requests without one)
    pub user_agent: String,

    /// Cap on the number of alerts per fetch
    pub limit: u32,

    /// Seconds to wait after one poll cycle before starting the next
    pub update_time_secs: u64,

    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,

    /// Postal codes to restrict alerts to; empty means all areas
    pub areas: Vec<String>,

    /// Event types to keep; empty means all events
    pub events: Vec<String>,

    /// Fields shown as list columns, in order
    pub columns: Vec<AlertField>,

    /// Fields shown in the detail pane, in order
    pub focus_contents: Vec<AlertField>,

    /// Relative sizes of the alert list and the detail pane
    pub weights: (u16, u16),

    /// How the two panes are arranged
    pub split: SplitDirection,

    /// Color palette
    pub colors: PaletteConfig,

    /// New-alert sound
    pub sound: SoundConfig,
}

impl Default for StormConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            user_agent: default_user_agent(),
            limit: MAX_LIMIT,
            update_time_secs: 60,
            request_timeout_secs: 30,
            areas: Vec::new(),
            events: Vec::new(),
            columns: vec![
                AlertField::AreaDesc,
                AlertField::Event,
                AlertField::Certainty,
                AlertField::Effective,
            ],
            focus_contents: vec![AlertField::Effective, AlertField::Description],
            weights: (30, 70),
            split: SplitDirection::default(),
            colors: PaletteConfig::default(),
            sound: SoundConfig::default(),
        }
    }
}

impl StormConfig {
    /// Load configuration.
    ///
    /// With `explicit` set, that file must exist. Without it, the default path
    /// is tried and defaults are used if it is absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(StormError::config_not_found(path));
                }
                Self::load_from(path)?
            }
            None => match config_path() {
                Some(path) if path.exists() => Self::load_from(&path)?,
                _ => {
                    debug!("No config file found, using defaults");
                    Self::default()
                }
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path, without validating it.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StormError::config_not_found_with_source(path, e),
            _ => StormError::io("reading config", path, e),
        })?;
        let config = Self::parse(&content).map_err(|message| StormError::ConfigInvalid {
            path: path.to_path_buf(),
            message,
        })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let mut config: Self = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
        config.areas = normalize_areas(&config.areas);
        config.sound.asset = expand_home(&config.sound.asset);
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.limit == 0 || self.limit > MAX_LIMIT {
            return Err(StormError::config_validation(format!(
                "limit must be between 1 and {MAX_LIMIT}, got {}",
                self.limit
            )));
        }

        if self.update_time_secs == 0 {
            return Err(StormError::config_validation("update_time_secs must be at least 1"));
        }

        if self.request_timeout_secs == 0 {
            return Err(StormError::config_validation(
                "request_timeout_secs must be at least 1",
            ));
        }

        if self.columns.is_empty() {
            return Err(StormError::config_validation("columns must list at least one field"));
        }

        if self.focus_contents.is_empty() {
            return Err(StormError::config_validation(
                "focus_contents must list at least one field",
            ));
        }

        if self.weights.0 == 0 || self.weights.1 == 0 {
            return Err(StormError::config_validation(format!(
                "weights must both be positive, got ({}, {})",
                self.weights.0, self.weights.1
            )));
        }

        if self.user_agent.trim().is_empty() {
            return Err(StormError::config_validation("user_agent must not be empty"));
        }

        Ok(())
    }

    /// Override the poll interval.
    pub fn with_update_time(mut self, secs: u64) -> Self {
        self.update_time_secs = secs;
        self
    }

    /// Override the per-fetch result cap.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    /// Replace the area filter.
    pub fn with_areas(mut self, areas: Vec<String>) -> Self {
        self.areas = normalize_areas(&areas);
        self
    }

    /// Replace the event filter.
    pub fn with_events(mut self, events: Vec<String>) -> Self {
        self.events = events;
        self
    }

    /// Turn the new-alert sound off.
    pub fn without_sound(mut self) -> Self {
        self.sound.enabled = false;
        self
    }
}

fn default_user_agent() -> String {
    format!("stormwatch/{} (terminal alert monitor)", env!("CARGO_PKG_VERSION"))
}

fn normalize_areas(areas: &[String]) -> Vec<String> {
    areas
        .iter()
        .map(|a| a.trim().to_uppercase())
        .filter(|a| !a.is_empty())
        .collect()
}

/// Expand a leading `~` to the home directory.
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// Arrangement of the alert list and detail pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitDirection {
    /// Panes side by side
    #[default]
    Horizontal,
    /// List above, details below
    Vertical,
}

/// A foreground/background pair, written with terminal color names
/// (`"dark blue"`, `"white, bold"`, `"default"`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColorSpec {
    pub fg: String,
    pub bg: String,
}

impl ColorSpec {
    pub fn new(fg: impl Into<String>, bg: impl Into<String>) -> Self {
        Self {
            fg: fg.into(),
            bg: bg.into(),
        }
    }
}

/// Palette roles.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaletteConfig {
    /// Screen background and pane borders
    pub bg: ColorSpec,
    /// Unselected alert rows
    pub alert: ColorSpec,
    /// The focused alert row
    pub alert_selected: ColorSpec,
    /// Column header row and footer
    pub header: ColorSpec,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            bg: ColorSpec::new("white", "default"),
            alert: ColorSpec::new("default", "default"),
            alert_selected: ColorSpec::new("dark blue", "white"),
            header: ColorSpec::new("white, bold", "dark blue"),
        }
    }
}

/// Sound played when new alerts arrive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SoundConfig {
    /// Whether to notify at all
    pub enabled: bool,
    /// Audio player command; the asset path is passed as its only argument
    pub player: String,
    /// Audio file to play
    pub asset: PathBuf,
}

impl Default for SoundConfig {
    fn default() -> Self {
        let player = if cfg!(target_os = "macos") { "afplay" } else { "paplay" };
        let asset = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".stormwatch")
            .join("bell.wav");
        Self {
            enabled: true,
            player: player.to_string(),
            asset,
        }
    }
}
