//! CLI module for Walltaker.
//!
//! With no subcommand the binary runs the agent; the other commands are
//! one-shot helpers around the feed and the configuration file.

mod commands;
mod output;

use clap::Parser;
pub use commands::Cli;

use crate::error::WalltakerError;

/// Runs the CLI.
///
/// Parses command-line arguments and executes the appropriate command.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run() -> Result<(), WalltakerError> {
    let cli = Cli::parse();
    cli.execute()
}
