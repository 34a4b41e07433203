//! `walltaker run`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::agent::{Agent, ConsoleSource, Exit};
use crate::config::{self, AgentConfig, ConfigError};
use crate::error::WalltakerError;
use crate::integrations::{DesktopNotifier, Notifier};

/// Desktop notification for a configuration that cannot be loaded.
pub const LAUNCH_FAILED_MESSAGE: &str =
    "Could not launch Walltaker! Ensure your .toml file is up to date.";

/// How long blocked runtime threads get after the agent stopped. The console
/// reader can sit in a blocking stdin read that never returns on its own.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(250);

/// Loads the configuration and runs the agent until it is stopped.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the agent fails to
/// start.
pub fn execute(config_path: Option<&Path>) -> Result<(), WalltakerError> {
    let (config, path) = load_config(config_path, &DesktopNotifier)?;
    let feed = config.feed.feed;

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let agent = Agent::new(config, &path);

    println!("Walltaker is following feed {feed}. Type \"help\" for commands, \"quit\" to exit.");
    let exit = runtime.block_on(agent.run(ConsoleSource::stdin(), CancellationToken::new()));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    match exit? {
        Exit::Clean => println!("Wallpaper restored. Bye!"),
        Exit::AlreadyRunning => println!("Walltaker is already running."),
    }
    Ok(())
}

/// Resolves the configuration, telling the desktop when it is unusable.
fn load_config(
    config_path: Option<&Path>,
    notifier: &dyn Notifier,
) -> Result<(AgentConfig, PathBuf), ConfigError> {
    config::resolve(config_path).inspect_err(|err| {
        tracing::error!(error = %err, "could not load configuration");
        if let Err(err) = notifier.notify(LAUNCH_FAILED_MESSAGE) {
            tracing::warn!(error = %err, "could not send notification");
        }
    })
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use tempfile::TempDir;

    use super::*;
    use crate::config::template::create_config_file;
    use crate::integrations::NotifyError;

    #[derive(Default)]
    struct RecordingNotifier(Mutex<Vec<String>>);

    impl Notifier for RecordingNotifier {
        fn notify(&self, body: &str) -> Result<(), NotifyError> {
            self.0.lock().push(body.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_unusable_config_notifies_desktop() {
        let temp = TempDir::new().unwrap();
        let notifier = RecordingNotifier::default();

        let result = load_config(Some(&temp.path().join("missing.toml")), &notifier);

        assert!(result.is_err());
        assert_eq!(notifier.0.lock().as_slice(), [LAUNCH_FAILED_MESSAGE]);
    }

    #[test]
    fn test_valid_config_stays_quiet() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("walltaker.toml");
        create_config_file(&path).unwrap();
        let notifier = RecordingNotifier::default();

        let (_, loaded_from) = load_config(Some(&path), &notifier).unwrap();

        assert_eq!(loaded_from, path);
        assert!(notifier.0.lock().is_empty());
    }
}
