//! Path utilities.
//!
//! Shell-like expansion for user-supplied paths and the few fixed locations
//! the agent relies on (executable directory, lock file).

use std::path::{Path, PathBuf};

/// Name of the single-instance lock file.
const LOCK_FILE_NAME: &str = "walltaker.lock";

/// Expands shell-like paths (tilde) to absolute paths.
///
/// Absolute and relative paths are returned unchanged; use
/// [`expand_and_resolve`] to anchor relative paths.
///
/// ```ignore
/// use walltaker_lib::platform::path::expand;
///
/// let pictures = expand("~/Pictures/walltaker");
/// assert!(!pictures.to_string_lossy().starts_with('~'));
/// ```
#[must_use]
pub fn expand(path: &str) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return PathBuf::new();
    }

    let expanded = shellexpand::tilde(path);
    PathBuf::from(expanded.as_ref())
}

/// Expands tilde paths and resolves relative paths against `base_dir`.
#[must_use]
pub fn expand_and_resolve(path: &str, base_dir: &Path) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return PathBuf::new();
    }

    let expanded = expand(path);
    if expanded.is_absolute() {
        return expanded;
    }

    base_dir.join(expanded)
}

/// Directory containing the running executable.
#[must_use]
pub fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
}

/// Fixed location of the single-instance lock.
///
/// `~/.local/share/walltaker` on Linux, `~/Library/Application Support/walltaker`
/// on macOS, `%LOCALAPPDATA%\walltaker` on Windows. Falls back to the temp dir.
#[must_use]
pub fn lock_file_path() -> PathBuf {
    dirs::data_local_dir()
        .map_or_else(std::env::temp_dir, |dir| dir.join("walltaker"))
        .join(LOCK_FILE_NAME)
}
