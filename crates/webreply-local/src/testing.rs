//! In-memory `FetchBackend` for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use webreply_core::{Error, FetchBackend, FetchRequest, FetchResponse, Result};

enum StubReply {
    Body(String),
    Status(u16),
}

/// Exact-URL routes; anything unrouted fails like a refused connection.
pub(crate) struct StubFetcher {
    routes: HashMap<String, StubReply>,
    calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub(crate) fn new() -> Self {
        Self {
            routes: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn ok(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.routes.insert(url.into(), StubReply::Body(body.into()));
        self
    }

    pub(crate) fn status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.routes.insert(url.into(), StubReply::Status(status));
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl FetchBackend for StubFetcher {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse> {
        self.calls.lock().unwrap().push(req.url.clone());
        match self.routes.get(&req.url) {
            Some(StubReply::Body(body)) => Ok(FetchResponse {
                url: req.url.clone(),
                final_url: req.url.clone(),
                status: 200,
                content_type: Some("text/html".to_string()),
                bytes: body.clone().into_bytes(),
                truncated: false,
                timings_ms: Default::default(),
            }),
            Some(StubReply::Status(s)) => Err(Error::network(&req.url, format!("HTTP {s}"))),
            None => Err(Error::network(&req.url, "connection refused")),
        }
    }
}

/// A page whose `<article>` holds `n` copies of `word`.
pub(crate) fn article(word: &str, n: usize) -> String {
    format!(
        "<html><body><nav>Home About</nav><article><p>{}</p></article></body></html>",
        vec![word; n].join(" ")
    )
}
