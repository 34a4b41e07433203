//! Desktop notifications.

use thiserror::Error;

/// Title of every notification the agent sends.
pub const NOTIFICATION_TITLE: &str = "Walltaker";

#[derive(Debug, Error)]
#[error("failed to send notification: {0}")]
pub struct NotifyError(pub String);

/// Sends a one-line desktop notification.
pub trait Notifier: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the notification daemon rejects the message.
    fn notify(&self, body: &str) -> Result<(), NotifyError>;
}

/// [`Notifier`] backed by the platform notification center.
#[derive(Debug, Default, Clone, Copy)]
pub struct DesktopNotifier;

impl Notifier for DesktopNotifier {
    fn notify(&self, body: &str) -> Result<(), NotifyError> {
        notify_rust::Notification::new()
            .summary(NOTIFICATION_TITLE)
            .body(body)
            .show()
            .map(|_| ())
            .map_err(|e| NotifyError(e.to_string()))
    }
}

/// Body of the "wallpaper changed" notification.
#[must_use]
pub fn changed_message(attribution: Option<&str>) -> String {
    match attribution {
        Some(name) if !name.is_empty() => format!("{name} changed your wallpaper~"),
        _ => "Someone changed your wallpaper~".to_string(),
    }
}
