//! Presence status broadcasting.
//!
//! The agent advertises a deep link to the followed feed on the user's Discord
//! profile. The session is opened when presence is enabled, updated whenever
//! the feed id changes or a wallpaper is applied, and closed when presence is
//! disabled or the agent exits.

use discord_rich_presence::{DiscordIpc, DiscordIpcClient, activity};
use parking_lot::Mutex;
use thiserror::Error;

const PRESENCE_STATE: &str = "Set my wallpaper~";
const LARGE_IMAGE: &str = "eggplant";
const LARGE_TEXT: &str = "Powered by joi.how";

#[derive(Debug, Error)]
pub enum PresenceError {
    #[error("could not connect to presence service: {0}")]
    Connect(String),
    #[error("could not update presence: {0}")]
    Update(String),
    #[error("could not close presence session: {0}")]
    Close(String),
    #[error("no presence session is open")]
    NotConnected,
}

/// A presence session that can be opened, updated and closed at runtime.
pub trait PresenceBroadcaster: Send + Sync {
    /// Opens a fresh session showing `link`, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if the presence service is unreachable.
    fn connect(&self, link: &str) -> Result<(), PresenceError>;

    /// Updates the open session.
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError::NotConnected`] when no session is open, or an
    /// error if the presence service rejects the update.
    fn update(&self, link: &str) -> Result<(), PresenceError>;

    /// Closes the session if one is open.
    ///
    /// # Errors
    ///
    /// Returns an error if the session could not be closed cleanly. The
    /// session is considered closed either way.
    fn disconnect(&self) -> Result<(), PresenceError>;

    fn is_active(&self) -> bool;
}

/// [`PresenceBroadcaster`] talking to the local Discord client over IPC.
pub struct DiscordPresence {
    application_id: String,
    started_at: i64,
    client: Mutex<Option<DiscordIpcClient>>,
}

impl DiscordPresence {
    #[must_use]
    pub fn new(application_id: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            started_at: chrono::Utc::now().timestamp(),
            client: Mutex::new(None),
        }
    }

    fn activity<'a>(&self, link: &'a str) -> activity::Activity<'a> {
        activity::Activity::new()
            .state(PRESENCE_STATE)
            .details(link)
            .assets(activity::Assets::new().large_image(LARGE_IMAGE).large_text(LARGE_TEXT))
            .timestamps(activity::Timestamps::new().start(self.started_at))
    }
}

impl PresenceBroadcaster for DiscordPresence {
    fn connect(&self, link: &str) -> Result<(), PresenceError> {
        let mut session = self.client.lock();
        if let Some(mut previous) = session.take()
            && let Err(err) = previous.close()
        {
            tracing::debug!(error = %err, "previous presence session did not close cleanly");
        }

        let mut client = DiscordIpcClient::new(&self.application_id)
            .map_err(|e| PresenceError::Connect(e.to_string()))?;
        client.connect().map_err(|e| PresenceError::Connect(e.to_string()))?;
        client.set_activity(self.activity(link)).map_err(|e| PresenceError::Update(e.to_string()))?;

        *session = Some(client);
        tracing::info!(link, "started presence");
        Ok(())
    }

    fn update(&self, link: &str) -> Result<(), PresenceError> {
        let mut session = self.client.lock();
        let Some(client) = session.as_mut() else {
            return Err(PresenceError::NotConnected);
        };
        client.set_activity(self.activity(link)).map_err(|e| PresenceError::Update(e.to_string()))
    }

    fn disconnect(&self) -> Result<(), PresenceError> {
        let Some(mut client) = self.client.lock().take() else {
            return Ok(());
        };
        client.close().map_err(|e| PresenceError::Close(e.to_string()))?;
        tracing::info!("stopped presence");
        Ok(())
    }

    fn is_active(&self) -> bool { self.client.lock().is_some() }
}
