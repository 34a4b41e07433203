//! Configuration module for Walltaker.
//!
//! Loads `walltaker.toml` once at startup. The values seed the shared
//! [`RuntimeConfig`](crate::agent::RuntimeConfig); nothing is written back.

pub mod template;
pub mod types;

use std::path::Path;
use std::path::PathBuf;

pub use types::{
    AgentConfig, BaseSection, CONFIG_FILE_NAME, ConfigError, FeedSection, FitMode, Preferences,
    PresenceSection, config_paths, load_config, load_config_from_path,
};

/// Loads the configuration from `custom` if given, otherwise from the first
/// file found in [`config_paths`].
///
/// # Errors
///
/// Returns an error if no file is found or the file is invalid. Every error
/// here is fatal for the agent.
pub fn resolve(custom: Option<&Path>) -> Result<(AgentConfig, PathBuf), ConfigError> {
    let (config, path) = match custom {
        Some(path) => load_config_from_path(path)?,
        None => load_config()?,
    };

    tracing::info!(path = %path.display(), feed = config.feed.feed, "loaded configuration");
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_resolve_custom_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        template::create_config_file(&path).unwrap();

        let (config, loaded_from) = resolve(Some(&path)).unwrap();
        assert_eq!(loaded_from, path);
        assert_eq!(config.feed.feed, 0);
    }

    #[test]
    fn test_resolve_custom_path_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[Base]\nbase = 3\n").unwrap();

        assert!(matches!(resolve(Some(&path)), Err(ConfigError::Parse { .. })));
    }
}
