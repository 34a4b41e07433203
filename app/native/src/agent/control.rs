//! Live operator control.
//!
//! A [`ControlSource`] yields [`ControlAction`]s one at a time; the
//! [`Controller`] applies each to the shared [`RuntimeConfig`] or fires the
//! matching one-off action. The controller runs next to the poller and never
//! blocks it: the only shared state is the runtime config, and every change
//! goes through its setter and toggle methods.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::agent::poller::AppliedWallpaper;
use crate::agent::state::RuntimeConfig;
use crate::config::PresenceSection;
use crate::feed::FeedEndpoint;
use crate::integrations::Integrations;

const FEED_RETRY_PROMPT: &str = "Your feed ID was not a number last time; try again:";

/// Something the operator can ask for while the agent runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    ChangeFeed,
    ToggleMode,
    ToggleSaveLocally,
    ToggleNotifications,
    TogglePresence,
    OpenMyPage,
    OpenSourcePage,
    Status,
    Help,
    Quit,
}

impl ControlAction {
    pub const ALL: [Self; 10] = [
        Self::ChangeFeed,
        Self::ToggleMode,
        Self::ToggleSaveLocally,
        Self::ToggleNotifications,
        Self::TogglePresence,
        Self::OpenMyPage,
        Self::OpenSourcePage,
        Self::Status,
        Self::Help,
        Self::Quit,
    ];

    /// Parses an operator command. Case-insensitive; accepts a few aliases.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let action = match input.trim().to_ascii_lowercase().as_str() {
            "id" | "feed" | "set-id" => Self::ChangeFeed,
            "mode" | "fit" | "crop" => Self::ToggleMode,
            "save" => Self::ToggleSaveLocally,
            "notify" | "notifications" => Self::ToggleNotifications,
            "presence" | "discord" => Self::TogglePresence,
            "page" | "open" => Self::OpenMyPage,
            "source" => Self::OpenSourcePage,
            "status" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            _ => return None,
        };
        Some(action)
    }

    /// Primary command word.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::ChangeFeed => "id",
            Self::ToggleMode => "mode",
            Self::ToggleSaveLocally => "save",
            Self::ToggleNotifications => "notify",
            Self::TogglePresence => "presence",
            Self::OpenMyPage => "page",
            Self::OpenSourcePage => "source",
            Self::Status => "status",
            Self::Help => "help",
            Self::Quit => "quit",
        }
    }

    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::ChangeFeed => "follow another feed ID",
            Self::ToggleMode => "switch between crop and fit",
            Self::ToggleSaveLocally => "toggle saving wallpapers to disk",
            Self::ToggleNotifications => "toggle change notifications",
            Self::TogglePresence => "toggle Discord presence",
            Self::OpenMyPage => "open your feed page in the browser",
            Self::OpenSourcePage => "open the current wallpaper in the browser",
            Self::Status => "show what the agent is doing",
            Self::Help => "list commands",
            Self::Quit => "restore the original wallpaper and exit",
        }
    }
}

/// Where operator actions come from.
#[async_trait]
pub trait ControlSource: Send {
    /// Next action, or `None` when the source is closed.
    async fn next_action(&mut self) -> Option<ControlAction>;

    /// Asks the operator for a line of text. `None` means cancelled.
    async fn prompt(&mut self, message: &str) -> Option<String>;

    /// Shows a one-line message to the operator.
    fn show(&mut self, message: &str);
}

/// Applies operator actions to the running agent.
pub struct Controller<S> {
    source: S,
    config: Arc<RuntimeConfig>,
    integrations: Integrations,
    endpoint: FeedEndpoint,
    presence: PresenceSection,
    applied: watch::Receiver<Option<AppliedWallpaper>>,
    uptime: watch::Receiver<Duration>,
    shutdown: CancellationToken,
}

impl<S: ControlSource> Controller<S> {
    #[must_use]
    pub fn new(
        source: S,
        config: Arc<RuntimeConfig>,
        integrations: Integrations,
        endpoint: FeedEndpoint,
        presence: PresenceSection,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            source,
            config,
            integrations,
            endpoint,
            presence,
            applied: watch::channel(None).1,
            uptime: watch::channel(Duration::ZERO).1,
            shutdown,
        }
    }

    /// Follows the poller's applied wallpaper for the source page and status.
    #[must_use]
    pub fn with_applied(mut self, applied: watch::Receiver<Option<AppliedWallpaper>>) -> Self {
        self.applied = applied;
        self
    }

    #[must_use]
    pub fn with_uptime(mut self, uptime: watch::Receiver<Duration>) -> Self {
        self.uptime = uptime;
        self
    }

    /// Handles actions until Quit, end of input or shutdown.
    pub async fn run(mut self) {
        loop {
            let action = tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                action = self.source.next_action() => action,
            };

            let Some(action) = action else {
                tracing::debug!("control input closed");
                break;
            };

            if self.handle(action).await.is_break() {
                break;
            }
        }
    }

    /// Applies a single action. Breaks on Quit.
    pub async fn handle(&mut self, action: ControlAction) -> ControlFlow<()> {
        tracing::debug!(?action, "control action");

        match action {
            ControlAction::ChangeFeed => self.change_feed().await,
            ControlAction::ToggleMode => {
                let mode = self.config.toggle_mode();
                self.source.show(&format!("Wallpaper mode is now {mode}"));
            }
            ControlAction::ToggleSaveLocally => {
                let enabled = self.config.toggle_save_locally();
                self.source.show(&format!("Saving wallpapers locally: {}", on_off(enabled)));
            }
            ControlAction::ToggleNotifications => {
                let enabled = self.config.toggle_notifications();
                self.source.show(&format!("Notifications: {}", on_off(enabled)));
            }
            ControlAction::TogglePresence => self.toggle_presence(),
            ControlAction::OpenMyPage => {
                let url = self.endpoint.page_url(self.config.feed());
                self.open(&url);
            }
            ControlAction::OpenSourcePage => {
                let url = self.applied.borrow().as_ref().map(|applied| applied.media_url.clone());
                match url {
                    Some(url) => self.open(&url),
                    None => self.source.show("No wallpaper has been set yet"),
                }
            }
            ControlAction::Status => {
                let status = self.status();
                self.source.show(&status);
            }
            ControlAction::Help => {
                let help = help_text();
                self.source.show(&help);
            }
            ControlAction::Quit => {
                tracing::info!("quit requested");
                self.source.show("Quitting...");
                self.shutdown.cancel();
                return ControlFlow::Break(());
            }
        }

        ControlFlow::Continue(())
    }

    async fn change_feed(&mut self) {
        let current = self.config.feed();
        let mut message = format!("Enter a new feed ID (currently {current}, leave empty to keep it):");

        loop {
            let answer = self.source.prompt(&message).await.unwrap_or_default();
            let answer = answer.trim();

            if answer.is_empty() {
                self.source.show(&format!("No value entered; keeping feed ID {current}"));
                return;
            }

            let Ok(feed) = answer.parse::<u64>() else {
                tracing::debug!(input = answer, "rejected feed ID");
                FEED_RETRY_PROMPT.clone_into(&mut message);
                continue;
            };

            let previous = self.config.set_feed(feed);
            tracing::info!(previous, feed, "feed ID changed");

            if self.config.snapshot().presence
                && let Err(err) = self.integrations.presence.update(&self.presence.link_for(feed))
            {
                tracing::warn!(error = %err, "could not refresh presence");
            }

            self.source.show(&format!("Now following feed {feed}"));
            return;
        }
    }

    fn toggle_presence(&mut self) {
        if !self.config.toggle_presence() {
            if let Err(err) = self.integrations.presence.disconnect() {
                tracing::warn!(error = %err, "presence session did not close cleanly");
            }
            self.source.show("Discord presence: off");
            return;
        }

        let link = self.presence.link_for(self.config.feed());
        match self.integrations.presence.connect(&link) {
            Ok(()) => self.source.show("Discord presence: on"),
            Err(err) => {
                tracing::warn!(error = %err, "could not start presence");
                self.config.set_presence(false);
                self.source.show(&format!("Could not start Discord presence: {err}"));
            }
        }
    }

    fn open(&mut self, url: &str) {
        tracing::info!(url, "opening in browser");
        if let Err(err) = self.integrations.browser.open(url) {
            tracing::warn!(url, error = %err, "could not open browser");
            self.source.show(&format!("Could not open {url}: {err}"));
        }
    }

    fn status(&self) -> String {
        let settings = self.config.snapshot();
        let last = match self.applied.borrow().as_ref() {
            Some(applied) => format!(
                "{} (set by {}, feed {}, at {})",
                applied.media_url,
                applied.attribution.as_deref().unwrap_or("anonymous"),
                applied.feed,
                applied.applied_at.format("%Y-%m-%d %H:%M:%S UTC"),
            ),
            None => "none yet".to_string(),
        };

        format!(
            "Running for {}\nFeed: {}\nMode: {} | save locally: {} | notifications: {} | presence: {}\nLast wallpaper: {last}",
            format_elapsed(*self.uptime.borrow()),
            settings.feed,
            settings.mode,
            on_off(settings.save_locally),
            on_off(settings.notifications),
            on_off(settings.presence),
        )
    }
}

/// Command list shown by the help action.
#[must_use]
pub fn help_text() -> String {
    let mut help = String::from("Commands:");
    for action in ControlAction::ALL {
        help.push_str(&format!("\n  {:<10} {}", action.keyword(), action.describe()));
    }
    help
}

/// Formats an uptime as `1h02m03s`, dropping leading zero units.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}h{minutes:02}m{seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}

const fn on_off(enabled: bool) -> &'static str { if enabled { "on" } else { "off" } }
