//! Config CLI commands.

use std::path::PathBuf;

use clap::Subcommand;

use crate::config::template::{create_config_file, generate_config_template};
use crate::config::{CONFIG_FILE_NAME, config_paths};
use crate::error::WalltakerError;

/// Config management commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum ConfigCommands {
    /// Write a configuration file with every option documented.
    #[command(
        name = "init",
        after_long_help = r#"Examples:
  walltaker config init                          # Create config at default location
  walltaker config init --force                  # Overwrite existing config
  walltaker config init --path ~/walltaker.toml  # Create at custom path
  walltaker config init --stdout                 # Print template to stdout"#
    )]
    Init {
        /// Overwrite existing configuration file if it exists.
        #[arg(long, short)]
        force: bool,

        /// Custom path for the configuration file.
        /// If not specified, uses the first search path.
        #[arg(long, short, value_name = "PATH")]
        path: Option<PathBuf>,

        /// Print the configuration template to stdout instead of writing to a file.
        #[arg(long)]
        stdout: bool,
    },

    /// Show where the configuration file is looked up, in priority order.
    Path,
}

/// Execute config subcommands.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cmd: &ConfigCommands) -> Result<(), WalltakerError> {
    match cmd {
        ConfigCommands::Init { force, path, stdout } => {
            if *stdout {
                println!("{}", generate_config_template());
                Ok(())
            } else {
                init_config(*force, path.clone()).map(|path| {
                    println!("Configuration file created at: {}", path.display());
                    println!("\nSet [Feed] feed to your link ID before running walltaker.");
                })
            }
        }
        ConfigCommands::Path => {
            show_config_path();
            Ok(())
        }
    }
}

/// Writes the template and returns where it went.
fn init_config(force: bool, custom_path: Option<PathBuf>) -> Result<PathBuf, WalltakerError> {
    let config_path = custom_path.unwrap_or_else(|| {
        config_paths().into_iter().next().unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
    });

    if config_path.exists() && !force {
        return Err(WalltakerError::InvalidArguments(format!(
            "Configuration file already exists at: {}\nUse --force to overwrite.",
            config_path.display()
        )));
    }

    create_config_file(&config_path)?;
    Ok(config_path)
}

fn show_config_path() {
    println!("Configuration file search paths (in priority order):\n");

    let mut found_config = false;
    for (i, path) in config_paths().iter().enumerate() {
        let exists = path.exists();
        let marker = if exists && !found_config {
            found_config = true;
            " (active)"
        } else if exists {
            " (exists)"
        } else {
            ""
        };

        println!("  {}. {}{}", i + 1, path.display(), marker);
    }

    if !found_config {
        println!("\nNo configuration file found.");
        println!("Run 'walltaker config init' to create one.");
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_init_config_writes_template() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join(CONFIG_FILE_NAME);

        let written = init_config(false, Some(path.clone())).unwrap();

        assert_eq!(written, path);
        assert!(std::fs::read_to_string(&path).unwrap().contains("[Preferences]"));
    }

    #[test]
    fn test_init_config_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "keep me").unwrap();

        let err = init_config(false, Some(path.clone())).unwrap_err();
        assert!(err.to_string().contains("--force"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me");

        init_config(true, Some(path.clone())).unwrap();
        assert_ne!(std::fs::read_to_string(&path).unwrap(), "keep me");
    }
}
