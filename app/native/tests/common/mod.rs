//! Test doubles for the agent's collaborators.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use walltaker_lib::agent::{ControlAction, ControlSource};
use walltaker_lib::config::{AgentConfig, FitMode};
use walltaker_lib::feed::{Actionable, Assignment, Classification, classify};
use walltaker_lib::integrations::{
    BrowserOpener, Integrations, Notifier, NotifyError, PresenceBroadcaster, PresenceError,
};
use walltaker_lib::wallpaper::{WallpaperError, WallpaperSetter};

pub const ORIGINAL_WALLPAPER: &str = "/home/me/original.png";

/// Records every background it is asked to show.
pub struct FakeWallpaper {
    remote: bool,
    pub applied: Mutex<Vec<String>>,
    pub modes: Mutex<Vec<FitMode>>,
    /// For file applies: whether the file existed while the setter ran.
    pub file_existed: Mutex<Vec<bool>>,
    pub current_calls: Mutex<usize>,
}

impl FakeWallpaper {
    /// A setter that paints straight from URLs, so applies need no download.
    pub fn remote() -> Arc<Self> { Arc::new(Self::new(true)) }

    /// A setter that needs a local file.
    pub fn local() -> Arc<Self> { Arc::new(Self::new(false)) }

    fn new(remote: bool) -> Self {
        Self {
            remote,
            applied: Mutex::new(Vec::new()),
            modes: Mutex::new(Vec::new()),
            file_existed: Mutex::new(Vec::new()),
            current_calls: Mutex::new(0),
        }
    }

    pub fn applied(&self) -> Vec<String> { self.applied.lock().clone() }
}

impl WallpaperSetter for FakeWallpaper {
    fn current(&self) -> Result<String, WallpaperError> {
        *self.current_calls.lock() += 1;
        Ok(ORIGINAL_WALLPAPER.to_string())
    }

    fn set_from_file(&self, path: &Path) -> Result<(), WallpaperError> {
        self.file_existed.lock().push(path.exists());
        self.applied.lock().push(path.display().to_string());
        Ok(())
    }

    fn set_mode(&self, mode: FitMode) -> Result<(), WallpaperError> {
        self.modes.lock().push(mode);
        Ok(())
    }

    fn accepts_remote_url(&self) -> bool { self.remote }

    fn set_from_url(&self, url: &str) -> Result<(), WallpaperError> {
        self.applied.lock().push(url.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    pub sent: Mutex<Vec<String>>,
}

impl Notifier for FakeNotifier {
    fn notify(&self, body: &str) -> Result<(), NotifyError> {
        self.sent.lock().push(body.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakePresence {
    active: Mutex<bool>,
    refusals_left: Mutex<usize>,
    pub connects: Mutex<Vec<String>>,
    pub updates: Mutex<Vec<String>>,
}

impl FakePresence {
    pub fn connected() -> Arc<Self> {
        let presence = Self::default();
        *presence.active.lock() = true;
        Arc::new(presence)
    }

    /// Refuses the first `n` connection attempts, as if Discord were closed.
    pub fn refusing_first(n: usize) -> Arc<Self> {
        let presence = Self::default();
        *presence.refusals_left.lock() = n;
        Arc::new(presence)
    }
}

impl PresenceBroadcaster for FakePresence {
    fn connect(&self, link: &str) -> Result<(), PresenceError> {
        let mut refusals = self.refusals_left.lock();
        if *refusals > 0 {
            *refusals -= 1;
            return Err(PresenceError::Connect("discord is not running".to_string()));
        }
        *self.active.lock() = true;
        self.connects.lock().push(link.to_string());
        Ok(())
    }

    fn update(&self, link: &str) -> Result<(), PresenceError> {
        if !*self.active.lock() {
            return Err(PresenceError::NotConnected);
        }
        self.updates.lock().push(link.to_string());
        Ok(())
    }

    fn disconnect(&self) -> Result<(), PresenceError> {
        *self.active.lock() = false;
        Ok(())
    }

    fn is_active(&self) -> bool { *self.active.lock() }
}

#[derive(Default)]
pub struct FakeBrowser {
    pub opened: Mutex<Vec<String>>,
}

impl BrowserOpener for FakeBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        self.opened.lock().push(url.to_string());
        Ok(())
    }
}

/// Fakes bundled the way the agent consumes them.
pub struct Fakes {
    pub notifier: Arc<FakeNotifier>,
    pub presence: Arc<FakePresence>,
    pub browser: Arc<FakeBrowser>,
}

impl Fakes {
    pub fn new() -> Self { Self::with_presence(Arc::new(FakePresence::default())) }

    pub fn with_presence(presence: Arc<FakePresence>) -> Self {
        Self {
            notifier: Arc::new(FakeNotifier::default()),
            presence,
            browser: Arc::new(FakeBrowser::default()),
        }
    }

    pub fn integrations(&self) -> Integrations {
        Integrations {
            notifier: self.notifier.clone(),
            presence: self.presence.clone(),
            browser: self.browser.clone(),
        }
    }
}

/// Control source fed from the test through a channel.
pub struct ChannelSource {
    actions: mpsc::UnboundedReceiver<ControlAction>,
    answers: VecDeque<String>,
    pub shown: Arc<Mutex<Vec<String>>>,
}

impl ChannelSource {
    pub fn new(answers: &[&str]) -> (Self, mpsc::UnboundedSender<ControlAction>) {
        let (tx, actions) = mpsc::unbounded_channel();
        let source = Self {
            actions,
            answers: answers.iter().map(|a| (*a).to_string()).collect(),
            shown: Arc::new(Mutex::new(Vec::new())),
        };
        (source, tx)
    }
}

#[async_trait]
impl ControlSource for ChannelSource {
    async fn next_action(&mut self) -> Option<ControlAction> { self.actions.recv().await }

    async fn prompt(&mut self, message: &str) -> Option<String> {
        self.shown.lock().push(message.to_string());
        self.answers.pop_front()
    }

    fn show(&mut self, message: &str) { self.shown.lock().push(message.to_string()); }
}

/// A validated configuration pointing at `base`.
pub fn agent_config(base: &str, feed: u64) -> AgentConfig { agent_config_with(base, feed, false) }

pub fn agent_config_with(base: &str, feed: u64, presence: bool) -> AgentConfig {
    let raw = format!(
        r#"
[Base]
base = "{base}"

[Feed]
feed = {feed}

[Preferences]
interval = 1
mode = "fit"
saveLocally = false
discordPresence = {presence}
notifications = true
"#
    );
    AgentConfig::from_toml_str(&raw, Path::new("walltaker.toml")).unwrap()
}

/// Feed payload with an image.
pub fn assignment_json(id: u64, post_url: &str, set_by: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "post_url": post_url,
        "set_by": set_by,
        "created_at": "2022-03-01T10:00:00.000Z",
        "updated_at": "2022-03-02T11:30:05.000Z",
        "terms": "",
        "blacklist": ""
    })
}

/// Feed payload without an image.
pub fn empty_assignment_json(id: u64) -> serde_json::Value {
    serde_json::json!({ "id": id, "post_url": null, "set_by": null })
}

pub fn actionable(post_url: &str, set_by: Option<&str>) -> Actionable {
    let assignment = Assignment {
        id: 1,
        post_url: Some(post_url.to_string()),
        set_by: set_by.map(str::to_string),
        updated_at: Some("2022-03-02T11:30:05Z".parse().unwrap()),
        ..Default::default()
    };
    match classify(assignment) {
        Classification::Actionable(item) => item,
        Classification::NoAssignment { .. } => panic!("expected an actionable assignment"),
    }
}

/// Polls `condition` every 20ms until it holds or `timeout` passes.
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
