//! Platform wallpaper cache invalidation.
//!
//! Windows keeps a transcoded copy of the current background under
//! `%APPDATA%\Microsoft\Windows\Themes`. When it is left in place a new
//! wallpaper can render as the previous one, so it is removed before every
//! change. Other platforms have no such cache.

use std::path::{Path, PathBuf};

/// Single transcoded copy of the current wallpaper.
pub const TRANSCODED_WALLPAPER: &str = "TranscodedWallpaper";

/// Directory of per-monitor cached copies.
pub const CACHED_FILES: &str = "CachedFiles";

/// Returns the theme cache directory, or `None` on platforms without one.
#[must_use]
pub fn platform_theme_cache_dir() -> Option<PathBuf> {
    if cfg!(windows) {
        dirs::config_dir().map(|appdata| appdata.join("Microsoft").join("Windows").join("Themes"))
    } else {
        None
    }
}

/// Removes the cached wallpaper copies from `themes_dir`.
///
/// Missing entries are not an error.
///
/// # Returns
///
/// The approximate number of bytes freed.
///
/// # Errors
///
/// Returns an error if an existing entry cannot be removed.
pub fn clear_theme_cache(themes_dir: &Path) -> std::io::Result<u64> {
    let mut bytes_freed = 0u64;

    let transcoded = themes_dir.join(TRANSCODED_WALLPAPER);
    if transcoded.is_file() {
        bytes_freed += transcoded.metadata().map(|m| m.len()).unwrap_or(0);
        std::fs::remove_file(&transcoded)?;
    }

    let cached = themes_dir.join(CACHED_FILES);
    if cached.is_dir() {
        bytes_freed += calculate_dir_size(&cached)?;
        std::fs::remove_dir_all(&cached)?;
    }

    Ok(bytes_freed)
}

/// Calculates the total size of a directory in bytes.
fn calculate_dir_size(path: &Path) -> std::io::Result<u64> {
    let mut total = 0u64;

    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            total += calculate_dir_size(&path)?;
        } else {
            total += entry.metadata().map(|m| m.len()).unwrap_or(0);
        }
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_clear_removes_transcoded_and_cached_files() {
        let themes = TempDir::new().unwrap();
        fs::write(themes.path().join(TRANSCODED_WALLPAPER), [0u8; 10]).unwrap();
        let cached = themes.path().join(CACHED_FILES);
        fs::create_dir_all(cached.join("nested")).unwrap();
        fs::write(cached.join("a.jpg"), [0u8; 5]).unwrap();
        fs::write(cached.join("nested").join("b.jpg"), [0u8; 7]).unwrap();

        let freed = clear_theme_cache(themes.path()).unwrap();

        assert_eq!(freed, 22);
        assert!(!themes.path().join(TRANSCODED_WALLPAPER).exists());
        assert!(!cached.exists());
    }

    #[test]
    fn test_clear_empty_dir_is_noop() {
        let themes = TempDir::new().unwrap();
        assert_eq!(clear_theme_cache(themes.path()).unwrap(), 0);
    }

    #[test]
    fn test_clear_leaves_unrelated_files() {
        let themes = TempDir::new().unwrap();
        fs::write(themes.path().join("slideshow.ini"), "x").unwrap();

        clear_theme_cache(themes.path()).unwrap();

        assert!(themes.path().join("slideshow.ini").exists());
    }

    #[cfg(not(windows))]
    #[test]
    fn test_no_theme_cache_outside_windows() {
        assert!(platform_theme_cache_dir().is_none());
    }
}
