//! Configuration template generation.
//!
//! Generates a documented `walltaker.toml` with every available option.

use std::fs;
use std::path::Path;

/// Generates the configuration template.
///
/// Required keys are present with example values; optional keys are
/// commented out and show their defaults.
#[must_use]
pub fn generate_config_template() -> String {
    r##"# Walltaker Configuration File
# ============================
# Edit the values below, then start `walltaker`.

[Base]
# Feed endpoint prefix. The feed id and ".json" are appended to it.
base = "https://walltaker.joi.how/api/links/"

[Feed]
# The link id to follow. Can be changed at runtime with the "id" command.
feed = 0

[Preferences]
# Seconds between two polls of the feed.
interval = 10

# "fit" shows the whole image, "crop" fills the screen. Anything else means crop.
mode = "crop"

# Keep a copy of every wallpaper you receive.
saveLocally = false

# Let Discord friends see your link.
discordPresence = false

# Desktop notification whenever someone sets your wallpaper.
notifications = true

# Where saved wallpapers go (default: a "download" folder next to the executable).
# Relative paths are resolved against this file's directory.
# downloadDir = "~/Pictures/walltaker"

# [Presence]
# applicationId = "942796233033019504"
# linkBase = "https://wt.pawcorp.org/"
"##
    .to_string()
}

/// Writes the template to `path`, creating parent directories.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn create_config_file(path: &Path) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, generate_config_template())
}
