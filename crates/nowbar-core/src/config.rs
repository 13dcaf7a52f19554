use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::registry::PlayerFilter;
use crate::selector::PriorityList;

const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub players: PlayersConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 0 = warn, 1 = info, 2 = debug, 3 = trace.
    pub verbosity: u8,
    /// Write diagnostics to a file instead of stderr.
    pub enable_logging: bool,
    /// Log file path; empty uses the data directory.
    pub log_file: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayersConfig {
    /// Track only this player; empty means all.
    pub selected_player: String,
    pub excluded_players: Vec<String>,
    /// Fixed preference order, consulted before playback status.
    pub priority: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub prefix: String,
    pub playing_icon: String,
    pub paused_icon: String,
    pub tooltip: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbosity: 0,
            enable_logging: false,
            log_file: String::new(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            prefix: " ".into(),
            playing_icon: String::new(),
            paused_icon: String::new(),
            tooltip: false,
        }
    }
}

impl AppConfig {
    /// Load the user config file if it exists, otherwise the built-in defaults.
    pub fn load() -> Result<Self, CoreError> {
        let user_path = Self::config_path();
        if user_path.exists() {
            Self::load_from(&user_path)
        } else {
            Self::from_toml_str(DEFAULT_CONFIG)
        }
    }

    /// Load a specific config file. Missing keys fall back to defaults.
    pub fn load_from(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, CoreError> {
        toml::from_str(content).map_err(|e| CoreError::Config(e.to_string()))
    }

    /// Path to user config file (XDG on Linux).
    pub fn config_path() -> PathBuf {
        Self::project_dirs()
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// Where diagnostics go when file logging is enabled.
    pub fn log_path(&self) -> PathBuf {
        if !self.general.log_file.is_empty() {
            return PathBuf::from(&self.general.log_file);
        }
        Self::project_dirs()
            .map(|d| d.data_dir().join("nowbar.log"))
            .unwrap_or_else(|| PathBuf::from("nowbar.log"))
    }

    /// Severity threshold for the configured verbosity.
    pub fn log_level(&self) -> tracing::Level {
        match self.general.verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }

    pub fn player_filter(&self) -> PlayerFilter {
        let selected = Some(self.players.selected_player.clone());
        PlayerFilter::new(selected, self.players.excluded_players.iter().cloned())
    }

    pub fn priority_list(&self) -> PriorityList {
        PriorityList::new(self.players.priority.iter().cloned())
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "nowbar")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("built-in default config is valid TOML")
    }
}
