//! Startup and shutdown of the agent.
//!
//! Order of operations:
//! 1. take the single-instance lock, or notify and leave if it is held
//! 2. capture the current background
//! 3. start the poller, the control task, the uptime ticker and the signal
//!    listener, all sharing one cancellation token
//! 4. on cancellation, let the poller finish its cycle, restore the captured
//!    background once, close presence and release the lock

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use fs2::FileExt;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::agent::control::{ControlSource, Controller};
use crate::agent::dispatch::Dispatcher;
use crate::agent::poller::Poller;
use crate::agent::state::RuntimeConfig;
use crate::config::AgentConfig;
use crate::feed::{FeedClient, FeedEndpoint};
use crate::integrations::Integrations;
use crate::platform::path::lock_file_path;
use crate::wallpaper::cache::platform_theme_cache_dir;
use crate::wallpaper::media::MediaStore;
use crate::wallpaper::{OriginalBackground, SystemWallpaper, WallpaperError, WallpaperSetter};

/// Notification shown by a second launch.
pub const ALREADY_RUNNING_MESSAGE: &str = "Note: Walltaker is already running!";

/// Errors that stop the agent before or after it runs.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not create lock directory {}: {source}", .path.display())]
    LockDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not lock {}: {source}", .path.display())]
    Lock {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not read the current wallpaper: {0}")]
    CaptureBackground(#[source] WallpaperError),
    #[error("could not build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// How a run ended. Both are successful exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Stopped by a signal or the Quit action after restoring the background.
    Clean,
    /// Another instance holds the lock; nothing was touched.
    AlreadyRunning,
}

/// Exclusive advisory lock held for the lifetime of the agent.
#[derive(Debug)]
pub struct InstanceLock {
    // Held open; closing the file drops the lock.
    file: File,
    path: PathBuf,
}

#[derive(Debug)]
pub enum LockAttempt {
    Acquired(InstanceLock),
    AlreadyRunning,
}

impl InstanceLock {
    /// Tries to take the lock at `path` without waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be created or locking fails
    /// for a reason other than another holder.
    pub fn acquire(path: &Path) -> Result<LockAttempt, LifecycleError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .map_err(|source| LifecycleError::LockDir { path: dir.to_path_buf(), source })?;
        }

        let lock_error =
            |source: std::io::Error| LifecycleError::Lock { path: path.to_path_buf(), source };

        // Not truncated yet: until we hold the lock the content is the holder's pid.
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(lock_error)?;

        if let Err(err) = file.try_lock_exclusive() {
            if is_contended(&err) {
                return Ok(LockAttempt::AlreadyRunning);
            }
            return Err(lock_error(err));
        }

        file.set_len(0).map_err(lock_error)?;
        writeln!(file, "{}", std::process::id()).map_err(lock_error)?;

        tracing::debug!(path = %path.display(), "acquired instance lock");
        Ok(LockAttempt::Acquired(Self { file, path: path.to_path_buf() }))
    }

    /// Releases the lock.
    ///
    /// # Errors
    ///
    /// Returns an error if unlocking fails. The lock is dropped with the file
    /// either way.
    pub fn release(self) -> Result<(), LifecycleError> {
        FileExt::unlock(&self.file)
            .map_err(|source| LifecycleError::Lock { path: self.path.clone(), source })?;
        tracing::debug!(path = %self.path.display(), "released instance lock");
        Ok(())
    }
}

fn is_contended(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

/// Puts the captured background back, at most once.
pub struct RestoreGuard {
    original: OriginalBackground,
    setter: Arc<dyn WallpaperSetter>,
    restored: AtomicBool,
}

impl RestoreGuard {
    #[must_use]
    pub fn new(original: OriginalBackground, setter: Arc<dyn WallpaperSetter>) -> Self {
        Self { original, setter, restored: AtomicBool::new(false) }
    }

    /// Restores the background. Returns `false` if it was already restored.
    ///
    /// A failing setter is logged; the restore still counts as done.
    pub fn restore(&self) -> bool {
        if self.restored.swap(true, Ordering::SeqCst) {
            tracing::debug!("wallpaper already restored");
            return false;
        }

        if let Err(err) = self.original.restore(self.setter.as_ref()) {
            tracing::error!(wallpaper = self.original.identifier(), error = %err, "could not restore wallpaper");
        }
        true
    }
}

/// Cancels `shutdown` on an interrupt or termination signal.
///
/// Returns without cancelling if `shutdown` fires first or the signal
/// handlers cannot be installed.
pub async fn listen_for_shutdown_signals(shutdown: CancellationToken) {
    tokio::select! {
        () = shutdown.cancelled() => {}
        signal = wait_for_signal() => match signal {
            Ok(name) => {
                tracing::info!(signal = name, "received shutdown signal");
                shutdown.cancel();
            }
            Err(err) => tracing::warn!(error = %err, "could not listen for shutdown signals"),
        },
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|()| "interrupt"),
        _ = terminate.recv() => Ok("terminate"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|()| "interrupt")
}

/// Publishes the time since start once a second until `shutdown`.
pub async fn run_uptime_ticker(uptime: watch::Sender<Duration>, shutdown: CancellationToken) {
    let started = Instant::now();
    let mut ticks = tokio::time::interval(Duration::from_secs(1));
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            _ = ticks.tick() => {
                uptime.send_replace(started.elapsed());
            }
        }
    }
}

/// A configured agent, ready to run.
pub struct Agent {
    config: AgentConfig,
    download_dir: PathBuf,
    wallpaper: Arc<dyn WallpaperSetter>,
    integrations: Integrations,
    lock_path: PathBuf,
    theme_cache_dir: Option<PathBuf>,
}

impl Agent {
    /// Agent with the platform collaborators. `config_path` anchors relative
    /// paths in the configuration.
    #[must_use]
    pub fn new(config: AgentConfig, config_path: &Path) -> Self {
        let config_dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        let download_dir = config.download_dir(config_dir);
        let integrations = Integrations::system(&config.presence.application_id);

        Self {
            config,
            download_dir,
            wallpaper: Arc::new(SystemWallpaper),
            integrations,
            lock_path: lock_file_path(),
            theme_cache_dir: platform_theme_cache_dir(),
        }
    }

    #[must_use]
    pub fn with_wallpaper(mut self, wallpaper: Arc<dyn WallpaperSetter>) -> Self {
        self.wallpaper = wallpaper;
        self
    }

    #[must_use]
    pub fn with_integrations(mut self, integrations: Integrations) -> Self {
        self.integrations = integrations;
        self
    }

    #[must_use]
    pub fn with_lock_path(mut self, lock_path: PathBuf) -> Self {
        self.lock_path = lock_path;
        self
    }

    #[must_use]
    pub fn with_download_dir(mut self, download_dir: PathBuf) -> Self {
        self.download_dir = download_dir;
        self
    }

    #[must_use]
    pub fn with_theme_cache_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.theme_cache_dir = dir;
        self
    }

    /// Runs until `shutdown` is cancelled by a signal, the Quit action or
    /// the caller.
    ///
    /// # Errors
    ///
    /// Returns an error for startup failures: a lock that cannot be taken
    /// for reasons other than contention, an unreadable background, or an
    /// HTTP client that cannot be built. Nothing has been changed on screen
    /// when this returns an error.
    pub async fn run<S>(self, source: S, shutdown: CancellationToken) -> Result<Exit, LifecycleError>
    where
        S: ControlSource + 'static,
    {
        let lock = match InstanceLock::acquire(&self.lock_path)? {
            LockAttempt::Acquired(lock) => lock,
            LockAttempt::AlreadyRunning => {
                tracing::warn!(lock = %self.lock_path.display(), "another instance is running");
                if let Err(err) = self.integrations.notifier.notify(ALREADY_RUNNING_MESSAGE) {
                    tracing::warn!(error = %err, "could not send notification");
                }
                return Ok(Exit::AlreadyRunning);
            }
        };

        let original = OriginalBackground::capture(self.wallpaper.as_ref())
            .map_err(LifecycleError::CaptureBackground)?;
        let restore = RestoreGuard::new(original, Arc::clone(&self.wallpaper));

        let runtime = Arc::new(RuntimeConfig::from_config(&self.config));
        let settings = runtime.snapshot();
        let presence = self.config.presence.clone();

        let media = MediaStore::new(self.download_dir.clone())?;
        if settings.save_locally
            && let Err(err) = media.ensure_download_dir()
        {
            tracing::warn!(error = %err, "could not create download directory");
        }

        if settings.presence
            && let Err(err) = self.integrations.presence.connect(&presence.link_for(settings.feed))
        {
            tracing::warn!(error = %err, "could not start presence");
            runtime.set_presence(false);
        }

        let endpoint = FeedEndpoint::new(self.config.base.base.clone());
        let client = FeedClient::new(endpoint.clone())?;
        let dispatcher = Dispatcher::new(
            Arc::clone(&self.wallpaper),
            media,
            self.integrations.clone(),
            presence.clone(),
        )
        .with_theme_cache_dir(self.theme_cache_dir.clone());
        let poller = Poller::new(client, Arc::clone(&runtime), dispatcher);

        let (uptime_tx, uptime_rx) = watch::channel(Duration::ZERO);
        let controller = Controller::new(
            source,
            runtime,
            self.integrations.clone(),
            endpoint,
            presence,
            shutdown.clone(),
        )
        .with_applied(poller.subscribe())
        .with_uptime(uptime_rx);

        let signals = tokio::spawn(listen_for_shutdown_signals(shutdown.clone()));
        let ticker = tokio::spawn(run_uptime_ticker(uptime_tx, shutdown.clone()));
        let polling = tokio::spawn(poller.run(shutdown.clone()));
        let control = tokio::spawn(controller.run());

        tracing::info!(feed = settings.feed, "walltaker started");
        shutdown.cancelled().await;
        tracing::info!("shutting down");

        match polling.await {
            Ok(state) => tracing::debug!(last = state.last_media_url(), "poller finished"),
            Err(err) => tracing::error!(error = %err, "poller task failed"),
        }
        control.abort();
        signals.abort();
        if let Err(err) = ticker.await {
            tracing::debug!(error = %err, "uptime ticker ended abnormally");
        }

        if let Err(err) = tokio::task::spawn_blocking(move || restore.restore()).await {
            tracing::error!(error = %err, "restore task failed");
        }

        if let Err(err) = self.integrations.presence.disconnect() {
            tracing::warn!(error = %err, "presence session did not close cleanly");
        }

        if let Err(err) = lock.release() {
            tracing::warn!(error = %err, "could not release instance lock");
        }

        tracing::info!("walltaker stopped");
        Ok(Exit::Clean)
    }
}
