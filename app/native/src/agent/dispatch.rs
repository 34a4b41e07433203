//! Side effects of a detected change.
//!
//! A change runs five steps in a fixed order: clear the platform wallpaper
//! cache, apply the new background, notify, update presence, save a local
//! copy. Each step is attempted even if an earlier one failed; failures end up
//! in the [`DispatchReport`] and in the log, never in the caller's control
//! flow.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;

use crate::agent::state::Settings;
use crate::config::{FitMode, PresenceSection};
use crate::feed::Actionable;
use crate::integrations::Integrations;
use crate::integrations::notify::changed_message;
use crate::wallpaper::cache::{clear_theme_cache, platform_theme_cache_dir};
use crate::wallpaper::media::{MediaStore, SaveOutcome, saved_file_name};
use crate::wallpaper::{WallpaperError, WallpaperSetter};

/// One side effect of a change, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    ClearCache,
    ApplyBackground,
    Notify,
    Presence,
    SaveLocally,
}

impl Step {
    pub const ORDER: [Self; 5] =
        [Self::ClearCache, Self::ApplyBackground, Self::Notify, Self::Presence, Self::SaveLocally];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ClearCache => "clear-cache",
            Self::ApplyBackground => "apply-background",
            Self::Notify => "notify",
            Self::Presence => "presence",
            Self::SaveLocally => "save-locally",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.name()) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    /// Not needed: disabled by a preference, unsupported here, or already done.
    Skipped(&'static str),
    Failed(String),
}

/// Per-step results of one dispatch, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    steps: Vec<(Step, StepOutcome)>,
}

impl DispatchReport {
    #[must_use]
    pub fn steps(&self) -> &[(Step, StepOutcome)] { &self.steps }

    #[must_use]
    pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
        self.steps.iter().find(|(s, _)| *s == step).map(|(_, outcome)| outcome)
    }

    #[must_use]
    pub fn failed(&self) -> Vec<Step> {
        self.steps
            .iter()
            .filter(|(_, outcome)| matches!(outcome, StepOutcome::Failed(_)))
            .map(|(step, _)| *step)
            .collect()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool { self.failed().is_empty() }

    fn record(&mut self, step: Step, result: Result<StepOutcome, String>) {
        let outcome = match result {
            Ok(outcome) => {
                tracing::debug!(%step, ?outcome, "dispatch step finished");
                outcome
            }
            Err(err) => {
                tracing::warn!(%step, error = %err, "dispatch step failed");
                StepOutcome::Failed(err)
            }
        };
        self.steps.push((step, outcome));
    }
}

/// Runs the side effects of a change against the configured collaborators.
pub struct Dispatcher {
    wallpaper: Arc<dyn WallpaperSetter>,
    media: MediaStore,
    integrations: Integrations,
    presence: PresenceSection,
    theme_cache_dir: Option<PathBuf>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        wallpaper: Arc<dyn WallpaperSetter>,
        media: MediaStore,
        integrations: Integrations,
        presence: PresenceSection,
    ) -> Self {
        Self {
            wallpaper,
            media,
            integrations,
            presence,
            theme_cache_dir: platform_theme_cache_dir(),
        }
    }

    /// Overrides the platform cache directory. `None` disables the step.
    #[must_use]
    pub fn with_theme_cache_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.theme_cache_dir = dir;
        self
    }

    /// Runs every step for `item` with the preferences in `settings`.
    pub async fn dispatch(&self, item: &Actionable, settings: Settings) -> DispatchReport {
        let mut report = DispatchReport::default();

        report.record(Step::ClearCache, self.clear_cache().await);
        report.record(Step::ApplyBackground, self.apply(item, settings.mode).await);
        report.record(Step::Notify, self.notify(item, settings.notifications).await);
        report.record(Step::Presence, self.update_presence(settings));
        report.record(Step::SaveLocally, self.save(item, settings.save_locally).await);

        report
    }

    async fn clear_cache(&self) -> Result<StepOutcome, String> {
        let Some(dir) = self.theme_cache_dir.clone() else {
            return Ok(StepOutcome::Skipped("no wallpaper cache on this platform"));
        };

        let freed = tokio::task::spawn_blocking(move || clear_theme_cache(&dir))
            .await
            .map_err(|e| format!("cache task failed: {e}"))?
            .map_err(|e| e.to_string())?;
        tracing::debug!(freed_bytes = freed, "cleared wallpaper cache");
        Ok(StepOutcome::Done)
    }

    async fn apply(&self, item: &Actionable, mode: FitMode) -> Result<StepOutcome, String> {
        let setter = Arc::clone(&self.wallpaper);

        if setter.accepts_remote_url() {
            let url = item.media_url().to_string();
            run_blocking(move || {
                setter.set_from_url(&url)?;
                apply_mode(setter.as_ref(), mode);
                Ok(())
            })
            .await?;
            return Ok(StepOutcome::Done);
        }

        let temp = self.media.download_to_temp(item.media_url()).await.map_err(|e| e.to_string())?;
        let path = temp.to_path_buf();
        let applied = run_blocking(move || {
            setter.set_from_file(&path)?;
            apply_mode(setter.as_ref(), mode);
            Ok(())
        })
        .await;

        // The setter has returned, so the OS no longer reads the copy.
        if let Err(err) = temp.close() {
            tracing::debug!(error = %err, "could not remove temporary wallpaper");
        }

        applied.map(|()| StepOutcome::Done)
    }

    async fn notify(&self, item: &Actionable, enabled: bool) -> Result<StepOutcome, String> {
        if !enabled {
            return Ok(StepOutcome::Skipped("notifications disabled"));
        }

        let notifier = Arc::clone(&self.integrations.notifier);
        let message = changed_message(item.attribution());
        tokio::task::spawn_blocking(move || notifier.notify(&message))
            .await
            .map_err(|e| format!("notification task failed: {e}"))?
            .map_err(|e| e.to_string())?;
        Ok(StepOutcome::Done)
    }

    fn update_presence(&self, settings: Settings) -> Result<StepOutcome, String> {
        if !settings.presence {
            return Ok(StepOutcome::Skipped("presence disabled"));
        }
        if !self.integrations.presence.is_active() {
            return Ok(StepOutcome::Skipped("no presence session"));
        }

        self.integrations
            .presence
            .update(&self.presence.link_for(settings.feed))
            .map_err(|e| e.to_string())?;
        Ok(StepOutcome::Done)
    }

    async fn save(&self, item: &Actionable, enabled: bool) -> Result<StepOutcome, String> {
        if !enabled {
            return Ok(StepOutcome::Skipped("saving disabled"));
        }

        let changed_at = item.changed_at().unwrap_or_else(Utc::now);
        let file_name = saved_file_name(item.attribution(), changed_at, item.media_url());

        match self.media.save_copy(item.media_url(), &file_name).await.map_err(|e| e.to_string())? {
            SaveOutcome::Saved(path) => {
                tracing::info!(path = %path.display(), "saved wallpaper");
                Ok(StepOutcome::Done)
            }
            SaveOutcome::AlreadyExists(path) => {
                tracing::info!(path = %path.display(), "wallpaper file already exists, skipping");
                Ok(StepOutcome::Skipped("file already saved"))
            }
        }
    }
}

async fn run_blocking<F>(f: F) -> Result<(), String>
where
    F: FnOnce() -> Result<(), WallpaperError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| format!("wallpaper task failed: {e}"))?
        .map_err(|e| e.to_string())
}

/// Not every desktop supports modes, so a failure here is not a failed step.
fn apply_mode(setter: &dyn WallpaperSetter, mode: FitMode) {
    if let Err(err) = setter.set_mode(mode) {
        tracing::debug!(%mode, error = %err, "could not set wallpaper mode");
    }
}
