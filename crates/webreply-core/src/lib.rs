use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Hard cap on `SourceRecord::content`, in characters.
pub const MAX_CONTENT_CHARS: usize = 2_000;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("fetch failed for {url}: {message}")]
    Network { url: String, message: String },
    #[error("no usable text extracted from {url}")]
    ExtractionEmpty { url: String },
    #[error("search failed: {0}")]
    Search(String),
    #[error("encyclopedia lookup failed: {0}")]
    Encyclopedia(String),
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl Error {
    pub fn network(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Network {
            url: url.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    pub url: String,
    /// Timeout for the whole request (connect + body).
    pub timeout_ms: Option<u64>,
    /// Hard cap on bytes read from the response body.
    pub max_bytes: Option<u64>,
    /// Extra headers (the user agent is owned by the backend).
    pub headers: BTreeMap<String, String>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_ms: None,
            max_bytes: None,
            headers: BTreeMap::new(),
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    pub url: String,
    pub final_url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub truncated: bool,
    pub timings_ms: BTreeMap<String, u128>,
}

impl FetchResponse {
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).to_string()
    }
}

/// One outbound GET. Implementations fail with `Error::Network` on transport errors,
/// timeouts and non-2xx statuses, and never retry.
#[async_trait::async_trait]
pub trait FetchBackend: Send + Sync {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse>;
}

/// A candidate page produced by the search step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
}

/// One scraped or synthesized piece of content with provenance.
///
/// Fields are private so the content cap cannot be bypassed after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRecord {
    title: String,
    url: String,
    content: String,
    source: String,
}

impl SourceRecord {
    /// Builds a record, truncating `content` to `MAX_CONTENT_CHARS`.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        content: impl AsRef<str>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            content: truncate_chars(content.as_ref(), MAX_CONTENT_CHARS).to_string(),
            source: source.into(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn content_chars(&self) -> usize {
        self.content.chars().count()
    }

    pub fn to_ref(&self) -> SourceRef {
        SourceRef {
            title: self.title.clone(),
            url: self.url.clone(),
            source: self.source.clone(),
        }
    }
}

/// Provenance-only view of a `SourceRecord`, as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub title: String,
    pub url: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponsePayload {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

/// Full query pipeline: gather sources, then compose an answer.
///
/// Implementations degrade rather than fail; an `Err` here is a genuinely unexpected fault.
#[async_trait::async_trait]
pub trait Answerer: Send + Sync {
    async fn answer(&self, query: &str) -> Result<ResponsePayload>;
}

/// Char-boundary-safe prefix of at most `max_chars` characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// `M/D/YYYY`, the date style used in user-facing text.
    fn short_date(&self) -> String {
        self.now().format("%-m/%-d/%Y").to_string()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Frozen clock for deterministic output.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
