//! Configuration types for Walltaker.
//!
//! The configuration file is TOML with three required tables (`Base`, `Feed`,
//! `Preferences`) and one optional table (`Presence`). Everything is validated
//! once at load time so the rest of the agent only sees well-typed values.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::platform::path::{executable_dir, expand_and_resolve};

/// Name of the configuration file looked up in every search directory.
pub const CONFIG_FILE_NAME: &str = "walltaker.toml";

/// Discord application used for the presence payload.
pub const DEFAULT_PRESENCE_APPLICATION_ID: &str = "942796233033019504";

/// Base of the deep link advertised through presence.
pub const DEFAULT_PRESENCE_LINK_BASE: &str = "https://wt.pawcorp.org/";

/// Name of the directory used for saved wallpapers when none is configured.
const DEFAULT_DOWNLOAD_DIR_NAME: &str = "download";

/// How the wallpaper is fitted to the screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Scale the image so it is fully visible.
    Fit,
    /// Scale the image so it fills the screen, cropping the overflow.
    #[default]
    Crop,
}

impl FitMode {
    /// Parses a mode name case-insensitively.
    ///
    /// Anything that is not `fit` falls back to [`FitMode::Crop`].
    #[must_use]
    pub fn parse_lenient(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("fit") { Self::Fit } else { Self::Crop }
    }

    /// Returns the other mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Fit => Self::Crop,
            Self::Crop => Self::Fit,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fit => "fit",
            Self::Crop => "crop",
        }
    }
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl<'de> Deserialize<'de> for FitMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: Deserializer<'de> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse_lenient(&raw))
    }
}

/// `[Base]` table.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct BaseSection {
    /// Feed endpoint prefix. The feed id and `.json` are appended to it.
    pub base: String,
}

/// `[Feed]` table.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct FeedSection {
    /// Feed identifier polled at startup.
    pub feed: u64,
}

/// `[Preferences]` table.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Poll interval in seconds.
    pub interval: u64,
    /// Fit or crop. Unknown values mean crop.
    #[serde(default)]
    pub mode: FitMode,
    /// Save every applied wallpaper to the download directory.
    pub save_locally: bool,
    /// Advertise the feed through Discord presence.
    pub discord_presence: bool,
    /// Show a desktop notification when the wallpaper changes.
    pub notifications: bool,
    /// Where saved wallpapers go. Relative paths resolve against the
    /// configuration file's directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<String>,
}

/// Optional `[Presence]` table.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct PresenceSection {
    pub application_id: String,
    pub link_base: String,
}

impl Default for PresenceSection {
    fn default() -> Self {
        Self {
            application_id: DEFAULT_PRESENCE_APPLICATION_ID.to_string(),
            link_base: DEFAULT_PRESENCE_LINK_BASE.to_string(),
        }
    }
}

impl PresenceSection {
    /// Deep link for a feed, as shown to presence viewers.
    #[must_use]
    pub fn link_for(&self, feed: u64) -> String { format!("{}{feed}", self.link_base) }
}

/// The whole configuration file.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct AgentConfig {
    pub base: BaseSection,
    pub feed: FeedSection,
    pub preferences: Preferences,
    #[serde(default)]
    pub presence: PresenceSection,
}

impl AgentConfig {
    /// Parses and validates a configuration document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed TOML or missing keys, and a
    /// validation variant for values that parse but make no sense.
    pub fn from_toml_str(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values serde cannot check on its own.
    ///
    /// # Errors
    ///
    /// Returns an error for a zero interval or a base that is not an HTTP URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.preferences.interval == 0 {
            return Err(ConfigError::InvalidInterval(self.preferences.interval));
        }

        let base = self.base.base.trim();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::InvalidBase(self.base.base.clone()));
        }

        Ok(())
    }

    /// Poll interval as a duration.
    #[must_use]
    pub const fn interval(&self) -> Duration { Duration::from_secs(self.preferences.interval) }

    /// Resolves the directory saved wallpapers are written to.
    ///
    /// Defaults to a `download` directory next to the executable.
    #[must_use]
    pub fn download_dir(&self, config_dir: &Path) -> PathBuf {
        match self.preferences.download_dir.as_deref() {
            Some(dir) if !dir.trim().is_empty() => expand_and_resolve(dir, config_dir),
            _ => executable_dir()
                .unwrap_or_else(|| config_dir.to_path_buf())
                .join(DEFAULT_DOWNLOAD_DIR_NAME),
        }
    }
}

/// Errors that can occur when loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No configuration file was found in any of the expected locations.
    #[error("No configuration file found. Looked in: {}", display_paths(.0))]
    NotFound(Vec<PathBuf>),
    /// The configuration file exists but could not be read.
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The configuration file is not valid TOML or misses required keys.
    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },
    /// `Preferences.interval` must be at least one second.
    #[error("Preferences.interval must be at least 1 second, got {0}")]
    InvalidInterval(u64),
    /// `Base.base` must be an HTTP(S) URL prefix.
    #[error("Base.base must start with http:// or https://, got {0:?}")]
    InvalidBase(String),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>().join(", ")
}

/// Returns the possible configuration file paths in priority order.
///
/// 1. Next to the executable (where release archives ship the file)
/// 2. `$XDG_CONFIG_HOME/walltaker/walltaker.toml` if the variable is set
/// 3. `~/.config/walltaker/walltaker.toml`
/// 4. The platform configuration directory (`~/Library/Application Support`
///    on macOS, `%APPDATA%` on Windows)
#[must_use]
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut push = |path: PathBuf| {
        if !paths.contains(&path) {
            paths.push(path);
        }
    };

    if let Some(dir) = executable_dir() {
        push(dir.join(CONFIG_FILE_NAME));
    }

    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        push(PathBuf::from(xdg_config).join("walltaker").join(CONFIG_FILE_NAME));
    }

    if let Some(home) = dirs::home_dir() {
        push(home.join(".config").join("walltaker").join(CONFIG_FILE_NAME));
    }

    if let Some(config_dir) = dirs::config_dir() {
        push(config_dir.join("walltaker").join(CONFIG_FILE_NAME));
    }

    paths
}

/// Loads the configuration from the first existing file in [`config_paths`].
///
/// # Errors
///
/// Returns `ConfigError::NotFound` when no candidate exists, otherwise any
/// error from [`load_config_from_path`].
pub fn load_config() -> Result<(AgentConfig, PathBuf), ConfigError> {
    let candidates = config_paths();
    for path in &candidates {
        if path.exists() {
            return load_config_from_path(path);
        }
    }
    Err(ConfigError::NotFound(candidates))
}

/// Loads the configuration from a specific path.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated.
pub fn load_config_from_path(path: &Path) -> Result<(AgentConfig, PathBuf), ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ConfigError::NotFound(vec![path.to_path_buf()])
        } else {
            ConfigError::Io { path: path.to_path_buf(), source }
        }
    })?;
    let config = AgentConfig::from_toml_str(&raw, path)?;
    Ok((config, path.to_path_buf()))
}
