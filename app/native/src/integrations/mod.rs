//! Fire-and-forget desktop collaborators.
//!
//! - [`notify`] - desktop notifications
//! - [`presence`] - Discord presence session
//! - [`browser`] - opening links
//!
//! Each sits behind a trait so the agent can be driven with fakes; failures
//! are returned to the caller, which logs them and carries on.

pub mod browser;
pub mod notify;
pub mod presence;

use std::sync::Arc;

pub use browser::{BrowserOpener, SystemBrowser};
pub use notify::{DesktopNotifier, Notifier, NotifyError};
pub use presence::{DiscordPresence, PresenceBroadcaster, PresenceError};

/// The set of collaborators shared by the dispatcher and the control task.
#[derive(Clone)]
pub struct Integrations {
    pub notifier: Arc<dyn Notifier>,
    pub presence: Arc<dyn PresenceBroadcaster>,
    pub browser: Arc<dyn BrowserOpener>,
}

impl Integrations {
    /// Platform implementations.
    #[must_use]
    pub fn system(presence_application_id: &str) -> Self {
        Self {
            notifier: Arc::new(DesktopNotifier),
            presence: Arc::new(DiscordPresence::new(presence_application_id)),
            browser: Arc::new(SystemBrowser),
        }
    }
}
