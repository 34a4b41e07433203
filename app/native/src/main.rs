#![allow(clippy::multiple_crate_versions)]

//! Walltaker command-line entry point.
//!
//! With no arguments the agent runs in the foreground until interrupted or
//! told to quit; see `walltaker --help` for the one-shot commands.

use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "walltaker=info,walltaker_lib=info";

fn main() {
    // Logs go to stderr so stdout stays free for the console and JSON output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    if let Err(err) = walltaker_lib::cli::run() {
        tracing::error!(error = %err, "walltaker failed");
        eprintln!("walltaker: {err}");
        std::process::exit(1);
    }
}
