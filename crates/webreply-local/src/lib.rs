use std::collections::BTreeMap;
use std::time::Duration;
use webreply_core::{Error, FetchBackend, FetchRequest, FetchResponse, Result};

pub mod encyclopedia;
pub mod extract;
pub mod gather;
pub mod news;
pub mod pacing;
pub mod respond;
pub mod search;
pub mod textprep;

mod answer;
pub use answer::WebAnswerer;

#[cfg(test)]
pub(crate) mod testing;

/// Desktop browser user agent; plenty of sites serve bot-ish agents a challenge page instead.
pub const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_BYTES: u64 = 5_000_000;

#[derive(Debug, Clone)]
pub struct LocalFetcher {
    client: reqwest::Client,
    max_bytes: u64,
}

impl LocalFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            // Per-request timeouts (FetchRequest.timeout_ms) can still override this.
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Unexpected(format!("http client init failed: {e}")))?;
        Ok(Self {
            client,
            max_bytes: DEFAULT_MAX_BYTES,
        })
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(
            DESKTOP_USER_AGENT,
            Duration::from_millis(DEFAULT_TIMEOUT_MS),
        )
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn apply_headers(
        &self,
        mut rb: reqwest::RequestBuilder,
        headers: &BTreeMap<String, String>,
    ) -> reqwest::RequestBuilder {
        for (k, v) in headers {
            if let (Ok(name), Ok(value)) = (
                reqwest::header::HeaderName::from_bytes(k.as_bytes()),
                reqwest::header::HeaderValue::from_str(v),
            ) {
                // The backend owns the user agent.
                if name == reqwest::header::USER_AGENT {
                    continue;
                }
                rb = rb.header(name, value);
            }
        }
        rb
    }
}

#[async_trait::async_trait]
impl FetchBackend for LocalFetcher {
    async fn fetch(&self, req: &FetchRequest) -> Result<FetchResponse> {
        let t_req = std::time::Instant::now();
        let url = url::Url::parse(&req.url).map_err(|e| Error::InvalidUrl(format!("{}: {e}", req.url)))?;

        let mut rb = self.client.get(url);
        if let Some(to) = req.timeout() {
            rb = rb.timeout(to);
        }
        rb = self.apply_headers(rb, &req.headers);
        let resp = rb
            .send()
            .await
            .map_err(|e| Error::network(&req.url, e))?;
        let final_url = resp.url().to_string();
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::network(&req.url, format!("HTTP {status}")));
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let max_bytes = req.max_bytes.unwrap_or(self.max_bytes) as usize;
        let mut truncated = false;
        let mut bytes = Vec::new();
        let mut stream = resp.bytes_stream();
        use futures_util::StreamExt;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| Error::network(&req.url, e))?;
            if bytes.len().saturating_add(chunk.len()) > max_bytes {
                let can_take = max_bytes.saturating_sub(bytes.len());
                bytes.extend_from_slice(&chunk[..can_take]);
                truncated = true;
                break;
            }
            bytes.extend_from_slice(&chunk);
        }

        let mut timings_ms = BTreeMap::new();
        timings_ms.insert("network_fetch".to_string(), t_req.elapsed().as_millis());
        tracing::debug!(url = %req.url, status = status.as_u16(), bytes = bytes.len(), "fetched");

        Ok(FetchResponse {
            url: req.url.clone(),
            final_url,
            status: status.as_u16(),
            content_type,
            bytes,
            truncated,
            timings_ms,
        })
    }
}
