//! Shared runtime configuration and the poller's private state.
//!
//! [`RuntimeConfig`] is the only state shared between tasks. The control task
//! mutates it through the setter and toggle methods; the poller and the
//! dispatcher read a [`Settings`] snapshot once per cycle. Every method takes
//! the lock for the duration of a single field update, so a reader never sees
//! a half-applied action.

use std::time::Duration;

use parking_lot::RwLock;

use crate::config::{AgentConfig, FitMode};
use crate::feed::Actionable;

/// Operator-tunable values, copied out of [`RuntimeConfig`] for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub feed: u64,
    pub mode: FitMode,
    pub save_locally: bool,
    pub presence: bool,
    pub notifications: bool,
}

impl Settings {
    #[must_use]
    pub const fn from_config(config: &AgentConfig) -> Self {
        Self {
            feed: config.feed.feed,
            mode: config.preferences.mode,
            save_locally: config.preferences.save_locally,
            presence: config.preferences.discord_presence,
            notifications: config.preferences.notifications,
        }
    }
}

/// Runtime configuration shared by the poller and the control task.
#[derive(Debug)]
pub struct RuntimeConfig {
    settings: RwLock<Settings>,
    interval: Duration,
}

impl RuntimeConfig {
    #[must_use]
    pub const fn new(settings: Settings, interval: Duration) -> Self {
        Self { settings: RwLock::new(settings), interval }
    }

    #[must_use]
    pub fn from_config(config: &AgentConfig) -> Self {
        Self::new(Settings::from_config(config), config.interval())
    }

    /// Consistent copy of every mutable field.
    #[must_use]
    pub fn snapshot(&self) -> Settings { *self.settings.read() }

    /// Poll interval. Fixed for the lifetime of the agent.
    #[must_use]
    pub const fn interval(&self) -> Duration { self.interval }

    #[must_use]
    pub fn feed(&self) -> u64 { self.settings.read().feed }

    /// Switches to another feed. Returns the previous one.
    pub fn set_feed(&self, feed: u64) -> u64 {
        self.update(|settings| std::mem::replace(&mut settings.feed, feed))
    }

    /// Flips fit/crop. Returns the new mode.
    pub fn toggle_mode(&self) -> FitMode {
        self.update(|settings| {
            settings.mode = settings.mode.toggled();
            settings.mode
        })
    }

    /// Returns the new value.
    pub fn toggle_save_locally(&self) -> bool {
        self.update(|settings| flip(&mut settings.save_locally))
    }

    /// Returns the new value.
    pub fn toggle_notifications(&self) -> bool {
        self.update(|settings| flip(&mut settings.notifications))
    }

    /// Returns the new value.
    pub fn toggle_presence(&self) -> bool { self.update(|settings| flip(&mut settings.presence)) }

    pub fn set_presence(&self, enabled: bool) { self.update(|settings| settings.presence = enabled); }

    fn update<R>(&self, f: impl FnOnce(&mut Settings) -> R) -> R {
        let mut settings = self.settings.write();
        f(&mut settings)
    }
}

fn flip(value: &mut bool) -> bool {
    *value = !*value;
    *value
}

/// Outcome of comparing a fetched assignment with the last applied one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    Unchanged,
    Changed,
}

/// What the poller last applied. Owned and written by the poller only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollingState {
    last_media_url: String,
    last_attribution: String,
}

impl PollingState {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// `true` until the first assignment has been applied.
    #[must_use]
    pub fn is_bootstrapping(&self) -> bool { self.last_media_url.is_empty() }

    #[must_use]
    pub fn last_media_url(&self) -> &str { &self.last_media_url }

    /// Empty when the last setter was anonymous.
    #[must_use]
    pub fn last_attribution(&self) -> &str { &self.last_attribution }

    /// See [`detect`].
    #[must_use]
    pub fn detect(&self, candidate: &Actionable) -> Detection { detect(self, candidate) }

    /// Remembers `applied` as the current wallpaper.
    pub fn record(&mut self, applied: &Actionable) {
        applied.media_url().clone_into(&mut self.last_media_url);
        applied.attribution().unwrap_or_default().clone_into(&mut self.last_attribution);
    }
}

/// Decides whether `candidate` is a new assignment.
///
/// Only the media reference matters: a new setter or timestamp on the same
/// image is not a change. Before anything was applied every candidate is a
/// change.
#[must_use]
pub fn detect(state: &PollingState, candidate: &Actionable) -> Detection {
    if candidate.media_url() == state.last_media_url {
        Detection::Unchanged
    } else {
        Detection::Changed
    }
}
