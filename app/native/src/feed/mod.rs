//! Assignment feed client.
//!
//! Fetches the current wallpaper assignment of a feed from
//! `GET {base}{feed}.json`. The client is stateless: every call builds a fresh
//! [`Assignment`], and retry policy is left to the poller.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound for a single feed request.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(2);

/// User agent sent with every feed and media request.
#[must_use]
pub fn user_agent() -> String {
    format!("Walltaker Rust Client/{}-{}", env!("CARGO_PKG_VERSION"), std::env::consts::OS)
}

/// The feed's current state, as returned by the endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: u64,
    /// Image to show. Absent or empty means nothing has been assigned yet.
    #[serde(default)]
    pub post_url: Option<String>,
    /// Who set the current image. Absent for anonymous setters.
    #[serde(default)]
    pub set_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub terms: Option<String>,
    #[serde(default)]
    pub blacklist: Option<String>,
    /// Public page of the link.
    #[serde(default)]
    pub url: Option<String>,
}

/// An assignment that carries a usable media reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actionable {
    media_url: String,
    attribution: Option<String>,
    assignment: Assignment,
}

impl Actionable {
    #[must_use]
    pub fn media_url(&self) -> &str { &self.media_url }

    /// Setter name, `None` when anonymous.
    #[must_use]
    pub fn attribution(&self) -> Option<&str> { self.attribution.as_deref() }

    #[must_use]
    pub const fn assignment(&self) -> &Assignment { &self.assignment }

    /// When the assignment last changed on the server, if known.
    #[must_use]
    pub fn changed_at(&self) -> Option<DateTime<Utc>> {
        self.assignment.updated_at.or(self.assignment.created_at)
    }
}

/// Result of looking at a freshly fetched assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Actionable(Actionable),
    /// Nothing to show yet. Not an error; the poller retries.
    NoAssignment { id: u64 },
}

/// Separates actionable assignments from empty ones.
#[must_use]
pub fn classify(assignment: Assignment) -> Classification {
    let media_url = assignment.post_url.as_deref().map(str::trim).unwrap_or_default();
    if media_url.is_empty() {
        return Classification::NoAssignment { id: assignment.id };
    }

    let media_url = media_url.to_string();
    let attribution = assignment
        .set_by
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    Classification::Actionable(Actionable { media_url, attribution, assignment })
}

/// Errors from a single feed request.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request could not be sent or the body not read.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-success status.
    #[error("{url} answered {status}")]
    Status { url: String, status: StatusCode },
    /// The body is not an assignment.
    #[error("{url} returned a malformed payload: {source}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Builds feed URLs from the configured base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEndpoint {
    base: String,
}

impl FeedEndpoint {
    #[must_use]
    pub fn new(base: impl Into<String>) -> Self { Self { base: base.into().trim().to_string() } }

    /// JSON endpoint of a feed.
    #[must_use]
    pub fn json_url(&self, feed: u64) -> String { format!("{}{feed}.json", self.base) }

    /// Human page of a feed.
    #[must_use]
    pub fn page_url(&self, feed: u64) -> String { format!("{}{feed}", self.base) }
}

/// HTTP client for the assignment feed.
#[derive(Debug, Clone)]
pub struct FeedClient {
    http: reqwest::Client,
    endpoint: FeedEndpoint,
}

impl FeedClient {
    /// Creates a client with the standard timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new(endpoint: FeedEndpoint) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(user_agent())
            .build()?;
        Ok(Self { http, endpoint })
    }

    /// Fetches the current assignment of `feed`.
    ///
    /// # Errors
    ///
    /// See [`FeedClient::fetch_url`].
    pub async fn fetch(&self, feed: u64) -> Result<Assignment, FetchError> {
        self.fetch_url(&self.endpoint.json_url(feed)).await
    }

    /// Fetches and decodes one assignment from a fully built URL.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` for transport failures, non-2xx statuses and
    /// bodies that do not decode as an assignment.
    pub async fn fetch_url(&self, url: &str) -> Result<Assignment, FetchError> {
        let transport = |source| FetchError::Transport { url: url.to_string(), source };

        let response = self.http.get(url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_string(), status });
        }

        let body = response.text().await.map_err(transport)?;
        serde_json::from_str(&body)
            .map_err(|source| FetchError::Malformed { url: url.to_string(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(post_url: Option<&str>, set_by: Option<&str>) -> Assignment {
        Assignment {
            id: 7,
            post_url: post_url.map(str::to_string),
            set_by: set_by.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_classify_null_post_url_is_no_assignment() {
        assert_eq!(classify(assignment(None, None)), Classification::NoAssignment { id: 7 });
    }

    #[test]
    fn test_classify_empty_post_url_is_no_assignment() {
        assert_eq!(
            classify(assignment(Some("  "), Some("Alice"))),
            Classification::NoAssignment { id: 7 }
        );
    }

    #[test]
    fn test_classify_actionable_keeps_attribution() {
        let Classification::Actionable(item) =
            classify(assignment(Some("https://x/img.png"), Some("Alice")))
        else {
            panic!("expected actionable");
        };
        assert_eq!(item.media_url(), "https://x/img.png");
        assert_eq!(item.attribution(), Some("Alice"));
    }

    #[test]
    fn test_classify_blank_setter_is_anonymous() {
        let Classification::Actionable(item) = classify(assignment(Some("https://x/a.png"), Some("")))
        else {
            panic!("expected actionable");
        };
        assert_eq!(item.attribution(), None);
    }

    #[test]
    fn test_assignment_decodes_feed_payload() {
        let payload = r#"{
            "id": 42,
            "expires": "2030-01-01T00:00:00.000Z",
            "user_id": 3,
            "terms": "anything",
            "blacklist": "",
            "post_url": "https://static1.e621.net/data/ab/cd/abcd.png",
            "post_thumbnail_url": "https://static1.e621.net/data/preview/ab/cd/abcd.jpg",
            "post_description": null,
            "created_at": "2022-03-01T10:00:00.000Z",
            "updated_at": "2022-03-02T11:30:00.000Z",
            "set_by": "Alice",
            "url": "https://walltaker.joi.how/links/42.json"
        }"#;
        let decoded: Assignment = serde_json::from_str(payload).unwrap();
        assert_eq!(decoded.id, 42);
        assert_eq!(decoded.set_by.as_deref(), Some("Alice"));
        assert!(decoded.updated_at.is_some());

        let Classification::Actionable(item) = classify(decoded) else {
            panic!("expected actionable");
        };
        assert_eq!(item.changed_at(), item.assignment().updated_at);
    }

    #[test]
    fn test_assignment_decodes_minimal_null_payload() {
        let decoded: Assignment = serde_json::from_str(r#"{"id": 1, "post_url": null}"#).unwrap();
        assert!(decoded.post_url.is_none());
        assert!(decoded.created_at.is_none());
    }

    #[test]
    fn test_endpoint_urls() {
        let endpoint = FeedEndpoint::new("https://walltaker.joi.how/api/links/");
        assert_eq!(endpoint.json_url(12), "https://walltaker.joi.how/api/links/12.json");
        assert_eq!(endpoint.page_url(12), "https://walltaker.joi.how/api/links/12");
    }

    #[test]
    fn test_user_agent_names_os() {
        let agent = user_agent();
        assert!(agent.starts_with("Walltaker Rust Client/"));
        assert!(agent.ends_with(std::env::consts::OS));
    }
}
