//! Opening links in the default browser.

/// Launches a URL in the user's browser.
pub trait BrowserOpener: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if no launcher could be started.
    fn open(&self, url: &str) -> std::io::Result<()>;
}

/// [`BrowserOpener`] using the platform launcher (`open`, `xdg-open`, `start`).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl BrowserOpener for SystemBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> { open::that_detached(url) }
}
