//! CLI command definitions using Clap.
//!
//! - `run` - runs the agent (the default when no subcommand is given)
//! - `fetch` - one-off look at a feed
//! - `config_cmd` - configuration file management

use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};

use crate::error::WalltakerError;

pub mod config_cmd;
pub mod fetch;
pub mod run;

pub use config_cmd::ConfigCommands;

/// Application version from Cargo.toml.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Walltaker - lets someone else pick your desktop wallpaper.
#[derive(Parser, Debug)]
#[command(name = "walltaker")]
#[command(author, version = APP_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a custom configuration file.
    ///
    /// Overrides the default configuration file search paths.
    #[arg(long, short, global = true, value_name = "PATH")]
    pub config: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum Commands {
    /// Run the agent.
    ///
    /// Polls the configured feed, applies every new wallpaper and restores the
    /// original one on exit. Reads commands from stdin while running; type
    /// `help` for the list. This is the default when no command is given.
    Run,

    /// Fetch a feed once and print its current assignment.
    Fetch {
        /// Feed ID to fetch instead of the configured one.
        #[arg(long, short, value_name = "ID")]
        feed: Option<u64>,
    },

    /// Configuration file management commands.
    ///
    /// Initialize the configuration file and show where it is looked up.
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions.
    ///
    /// Outputs shell completion script to stdout for the specified shell.
    ///
    /// Usage:
    ///   eval "$(walltaker completions --shell zsh)"
    ///   walltaker completions --shell fish > ~/.config/fish/completions/walltaker.fish
    Completions {
        /// The shell to generate completions for.
        #[arg(long, short, value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// Returns the custom config path if specified via --config flag.
    #[must_use]
    pub fn config_path(&self) -> Option<PathBuf> { self.config.as_ref().map(PathBuf::from) }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command execution fails.
    pub fn execute(&self) -> Result<(), WalltakerError> {
        let config_path = self.config_path();
        if let Some(path) = &config_path
            && !path.exists()
        {
            return Err(WalltakerError::InvalidArguments(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        match self.command.as_ref().unwrap_or(&Commands::Run) {
            Commands::Run => run::execute(config_path.as_deref()),
            Commands::Fetch { feed } => fetch::execute(config_path.as_deref(), *feed),
            Commands::Config(cmd) => config_cmd::execute(cmd),
            Commands::Completions { shell } => {
                Self::print_completions(*shell);
                Ok(())
            }
        }
    }

    /// Print shell completions to stdout.
    fn print_completions<G: Generator>(generator: G) {
        let mut cmd = Self::command();
        generate(generator, &mut cmd, "walltaker", &mut io::stdout());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_run() {
        let cli = Cli::try_parse_from(["walltaker"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from(["walltaker", "run"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Run)));
    }

    #[test]
    fn test_cli_parses_fetch_with_feed() {
        let cli = Cli::try_parse_from(["walltaker", "fetch", "--feed", "42"]).unwrap();
        match cli.command {
            Some(Commands::Fetch { feed }) => assert_eq!(feed, Some(42)),
            _ => panic!("Expected Fetch command"),
        }
    }

    #[test]
    fn test_cli_rejects_negative_feed() {
        assert!(Cli::try_parse_from(["walltaker", "fetch", "--feed", "-3"]).is_err());
    }

    #[test]
    fn test_cli_parses_completions_zsh() {
        let cli = Cli::try_parse_from(["walltaker", "completions", "--shell", "zsh"]).unwrap();
        match cli.command {
            Some(Commands::Completions { shell }) => assert_eq!(shell, Shell::Zsh),
            _ => panic!("Expected Completions command"),
        }
    }

    #[test]
    fn test_cli_parses_config_init_flags() {
        let cli =
            Cli::try_parse_from(["walltaker", "config", "init", "--force", "--stdout"]).unwrap();
        match cli.command {
            Some(Commands::Config(ConfigCommands::Init { force, path, stdout })) => {
                assert!(force);
                assert!(stdout);
                assert!(path.is_none());
            }
            _ => panic!("Expected Config Init command"),
        }
    }

    #[test]
    fn test_cli_config_flag_is_global() {
        let cli =
            Cli::try_parse_from(["walltaker", "fetch", "--config", "/path/to/walltaker.toml"])
                .unwrap();
        assert_eq!(cli.config_path(), Some(PathBuf::from("/path/to/walltaker.toml")));
    }

    #[test]
    fn test_missing_config_file_is_rejected() {
        let cli = Cli::try_parse_from([
            "walltaker",
            "--config",
            "/nonexistent/walltaker.toml",
            "fetch",
        ])
        .unwrap();
        let err = cli.execute().unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_app_version_is_not_empty() {
        assert!(!APP_VERSION.is_empty());
    }
}
