//! Desktop wallpaper access.
//!
//! - [`WallpaperSetter`] - seam over the OS call that paints the background
//! - [`cache`] - platform cache invalidation before a change
//! - [`media`] - temporary and saved copies of remote images

pub mod cache;
pub mod media;

use std::path::{Path, PathBuf};

use crate::config::FitMode;

/// Errors that can occur when reading or setting the wallpaper.
#[derive(Debug)]
pub enum WallpaperError {
    /// The current wallpaper could not be read.
    Get(String),
    /// The wallpaper file does not exist.
    FileNotFound(String),
    /// Failed to set the wallpaper.
    Set(String),
    /// Failed to change the fit mode.
    Mode(String),
    /// The setter cannot do this on the current platform.
    Unsupported(&'static str),
}

impl std::fmt::Display for WallpaperError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get(msg) => write!(f, "Failed to read current wallpaper: {msg}"),
            Self::FileNotFound(path) => write!(f, "Wallpaper file not found: {path}"),
            Self::Set(msg) => write!(f, "Failed to set wallpaper: {msg}"),
            Self::Mode(msg) => write!(f, "Failed to set wallpaper mode: {msg}"),
            Self::Unsupported(what) => write!(f, "Unsupported on this platform: {what}"),
        }
    }
}

impl std::error::Error for WallpaperError {}

/// The OS operations the agent needs from the desktop.
///
/// Implementations are blocking; async callers go through
/// `tokio::task::spawn_blocking`.
pub trait WallpaperSetter: Send + Sync {
    /// Identifier (usually a file path) of the current background.
    ///
    /// # Errors
    ///
    /// Returns an error if the desktop cannot be queried.
    fn current(&self) -> Result<String, WallpaperError>;

    /// Paints the background from a local image file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or the OS call fails.
    fn set_from_file(&self, path: &Path) -> Result<(), WallpaperError>;

    /// Switches between fit and crop.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS call fails or the platform has no modes.
    fn set_mode(&self, mode: FitMode) -> Result<(), WallpaperError>;

    /// Whether [`WallpaperSetter::set_from_url`] works without a local copy.
    fn accepts_remote_url(&self) -> bool { false }

    /// Paints the background straight from a remote URL.
    ///
    /// # Errors
    ///
    /// The default implementation always fails with `Unsupported`.
    fn set_from_url(&self, _url: &str) -> Result<(), WallpaperError> {
        Err(WallpaperError::Unsupported("setting a wallpaper from a URL"))
    }
}

/// [`WallpaperSetter`] backed by the `wallpaper` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemWallpaper;

impl WallpaperSetter for SystemWallpaper {
    fn current(&self) -> Result<String, WallpaperError> {
        wallpaper::get().map_err(|e| WallpaperError::Get(e.to_string()))
    }

    fn set_from_file(&self, path: &Path) -> Result<(), WallpaperError> {
        if !path.exists() {
            return Err(WallpaperError::FileNotFound(path.display().to_string()));
        }

        let path_str = path.display().to_string();
        wallpaper::set_from_path(&path_str).map_err(|e| WallpaperError::Set(e.to_string()))
    }

    fn set_mode(&self, mode: FitMode) -> Result<(), WallpaperError> {
        let mode = match mode {
            FitMode::Fit => wallpaper::Mode::Fit,
            FitMode::Crop => wallpaper::Mode::Crop,
        };
        wallpaper::set_mode(mode).map_err(|e| WallpaperError::Mode(e.to_string()))
    }
}

/// The background that was on screen before the agent started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalBackground {
    identifier: String,
}

impl OriginalBackground {
    /// Reads the current background from the desktop.
    ///
    /// # Errors
    ///
    /// Returns an error if the desktop cannot be queried.
    pub fn capture(setter: &dyn WallpaperSetter) -> Result<Self, WallpaperError> {
        let identifier = setter.current()?;
        tracing::info!(wallpaper = %identifier, "detected original wallpaper");
        Ok(Self { identifier })
    }

    #[must_use]
    pub fn identifier(&self) -> &str { &self.identifier }

    /// Local path of the background, without a `file://` scheme.
    #[must_use]
    pub fn path(&self) -> PathBuf {
        let trimmed = self.identifier.trim().trim_matches('\'');
        PathBuf::from(trimmed.strip_prefix("file://").unwrap_or(trimmed))
    }

    /// Puts the captured background back.
    ///
    /// # Errors
    ///
    /// Returns an error if the setter fails.
    pub fn restore(&self, setter: &dyn WallpaperSetter) -> Result<(), WallpaperError> {
        tracing::info!(wallpaper = %self.identifier, "reverting wallpaper");
        setter.set_from_file(&self.path())
    }
}
