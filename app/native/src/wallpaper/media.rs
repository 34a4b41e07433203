//! Local copies of remote wallpaper images.
//!
//! Two kinds of copies exist:
//! - a temporary file for setters that cannot paint from a URL, owned by the
//!   dispatch that created it and removed once the setter returns
//! - a saved copy in the download directory, named after the change event so
//!   that dispatching the same event twice never downloads twice

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::StatusCode;
use tempfile::TempPath;
use thiserror::Error;

use crate::feed::user_agent;

/// Upper bound for downloading a single image.
pub const MEDIA_TIMEOUT: Duration = Duration::from_secs(60);

/// Prefix of temporary wallpaper files.
const TEMP_PREFIX: &str = "walltakerbg";

/// Used when the URL has no usable last path segment.
const FALLBACK_BASENAME: &str = "wallpaper";

/// Setter name used in file names when nobody is credited.
pub const ANONYMOUS: &str = "anonymous";

/// Errors from downloading or storing an image.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("download of {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered {status}")]
    Status { url: String, status: StatusCode },
    #[error("could not write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What happened to a save request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(PathBuf),
    /// A file with the same name is already there; nothing was downloaded.
    AlreadyExists(PathBuf),
}

/// Downloads images into temporary files and the download directory.
#[derive(Debug, Clone)]
pub struct MediaStore {
    http: reqwest::Client,
    download_dir: PathBuf,
}

impl MediaStore {
    /// Creates a store that saves into `download_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(download_dir: PathBuf) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(MEDIA_TIMEOUT)
            .user_agent(user_agent())
            .build()?;
        Ok(Self { http, download_dir })
    }

    /// Creates the download directory if missing. Returns `true` if it was
    /// created.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_download_dir(&self) -> Result<bool, MediaError> {
        if self.download_dir.is_dir() {
            return Ok(false);
        }
        std::fs::create_dir_all(&self.download_dir)
            .map_err(|source| MediaError::Io { path: self.download_dir.clone(), source })?;
        tracing::info!(path = %self.download_dir.display(), "created download directory");
        Ok(true)
    }

    /// Downloads `url` into a fresh temporary file.
    ///
    /// The file keeps the image's extension and is deleted when the returned
    /// [`TempPath`] is dropped or closed.
    ///
    /// # Errors
    ///
    /// Returns an error if the download or the write fails.
    pub async fn download_to_temp(&self, url: &str) -> Result<TempPath, MediaError> {
        let bytes = self.fetch(url).await?;

        let basename = media_basename(url);
        let suffix = extension_of(&basename).map(|ext| format!(".{ext}")).unwrap_or_default();
        let temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(&suffix)
            .tempfile()
            .map_err(|source| MediaError::Io { path: std::env::temp_dir(), source })?;
        let path = temp.into_temp_path();

        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| MediaError::Io { path: path.to_path_buf(), source })?;

        Ok(path)
    }

    /// Saves `url` under `file_name` in the download directory, unless a file
    /// with that name already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the download or the write fails.
    pub async fn save_copy(&self, url: &str, file_name: &str) -> Result<SaveOutcome, MediaError> {
        let target = self.download_dir.join(file_name);
        if target.exists() {
            return Ok(SaveOutcome::AlreadyExists(target));
        }

        self.ensure_download_dir()?;
        let bytes = self.fetch(url).await?;

        // Write next to the target first so an interrupted save never leaves a
        // truncated file under the final name.
        let mut partial = target.clone().into_os_string();
        partial.push(".part");
        let partial = PathBuf::from(partial);
        tokio::fs::write(&partial, &bytes)
            .await
            .map_err(|source| MediaError::Io { path: partial.clone(), source })?;
        tokio::fs::rename(&partial, &target)
            .await
            .map_err(|source| MediaError::Io { path: target.clone(), source })?;

        Ok(SaveOutcome::Saved(target))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, MediaError> {
        let request = |source| MediaError::Request { url: url.to_string(), source };

        let response = self.http.get(url).send().await.map_err(request)?;
        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::Status { url: url.to_string(), status });
        }

        let bytes = response.bytes().await.map_err(request)?;
        Ok(bytes.to_vec())
    }
}

/// Deterministic file name of a saved wallpaper:
/// `walltaker_<setter|anonymous>_<timestamp>_<basename>`.
#[must_use]
pub fn saved_file_name(attribution: Option<&str>, changed_at: DateTime<Utc>, url: &str) -> String {
    let setter = attribution.filter(|name| !name.is_empty()).unwrap_or(ANONYMOUS);
    format!(
        "walltaker_{}_{}_{}",
        sanitize(setter),
        file_safe_timestamp(changed_at),
        media_basename(url)
    )
}

/// RFC 3339 timestamp with the colons that Windows rejects replaced.
#[must_use]
pub fn file_safe_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true).replace(':', "-")
}

/// Last path segment of a URL, without query or fragment.
#[must_use]
pub fn media_basename(url: &str) -> String {
    let basename = reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|segment| !segment.is_empty());

    basename.map_or_else(|| FALLBACK_BASENAME.to_string(), |name| sanitize(&name))
}

fn extension_of(name: &str) -> Option<&str> {
    Path::new(name).extension().and_then(|ext| ext.to_str())
}

fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}
