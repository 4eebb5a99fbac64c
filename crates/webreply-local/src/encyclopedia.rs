//! MediaWiki-style encyclopedia lookup: opensearch for the closest title, then a
//! plain-text intro extract for that title.

use serde::Deserialize;
use std::collections::BTreeMap;
use webreply_core::{Error, FetchBackend, FetchRequest, Result, SourceRecord};

pub const DEFAULT_ENCYCLOPEDIA_ENDPOINT: &str = "https://en.wikipedia.org/w/api.php";
pub const ENCYCLOPEDIA_SOURCE: &str = "Wikipedia";
pub const MAX_EXTRACT_CHARS: usize = 1_500;

pub fn opensearch_url(endpoint: &str, query: &str) -> Result<String> {
    url::Url::parse_with_params(
        endpoint,
        &[
            ("action", "opensearch"),
            ("search", query),
            ("limit", "1"),
            ("namespace", "0"),
            ("format", "json"),
        ],
    )
    .map(|u| u.to_string())
    .map_err(|e| Error::InvalidUrl(format!("encyclopedia endpoint {endpoint}: {e}")))
}

pub fn extract_url(endpoint: &str, title: &str) -> Result<String> {
    url::Url::parse_with_params(
        endpoint,
        &[
            ("action", "query"),
            ("format", "json"),
            ("titles", title),
            ("prop", "extracts"),
            ("exintro", ""),
            ("explaintext", ""),
            ("exsectionformat", "plain"),
        ],
    )
    .map(|u| u.to_string())
    .map_err(|e| Error::InvalidUrl(format!("encyclopedia endpoint {endpoint}: {e}")))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct OpenSearchHit {
    title: String,
    url: Option<String>,
}

/// Opensearch answers `[query, [titles], [descriptions], [urls]]`.
fn parse_opensearch(body: &str) -> Result<Option<OpenSearchHit>> {
    let v: serde_json::Value =
        serde_json::from_str(body).map_err(|e| Error::Encyclopedia(format!("opensearch: {e}")))?;
    let title = v
        .get(1)
        .and_then(|t| t.get(0))
        .and_then(|t| t.as_str())
        .map(str::trim)
        .filter(|t| !t.is_empty());
    let Some(title) = title else {
        return Ok(None);
    };
    let url = v
        .get(3)
        .and_then(|u| u.get(0))
        .and_then(|u| u.as_str())
        .filter(|u| !u.is_empty())
        .map(str::to_string);
    Ok(Some(OpenSearchHit {
        title: title.to_string(),
        url,
    }))
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    query: Option<ExtractQuery>,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    pages: BTreeMap<String, ExtractPage>,
}

#[derive(Debug, Deserialize)]
struct ExtractPage {
    extract: Option<String>,
}

fn parse_extract(body: &str) -> Result<Option<String>> {
    let parsed: ExtractResponse =
        serde_json::from_str(body).map_err(|e| Error::Encyclopedia(format!("extract: {e}")))?;
    Ok(parsed
        .query
        .and_then(|q| q.pages.into_values().next())
        .and_then(|p| p.extract)
        .filter(|s| !s.trim().is_empty()))
}

/// Look up the closest article for `query`. `Ok(None)` means no article matched.
pub async fn lookup(
    fetcher: &dyn FetchBackend,
    endpoint: &str,
    query: &str,
    timeout_ms: u64,
) -> Result<Option<SourceRecord>> {
    let search_req = FetchRequest::new(opensearch_url(endpoint, query)?).with_timeout_ms(timeout_ms);
    let body = fetcher.fetch(&search_req).await?.text_lossy();
    let Some(hit) = parse_opensearch(&body)? else {
        return Ok(None);
    };

    let extract_req =
        FetchRequest::new(extract_url(endpoint, &hit.title)?).with_timeout_ms(timeout_ms);
    let body = fetcher.fetch(&extract_req).await?.text_lossy();
    let Some(extract) = parse_extract(&body)? else {
        return Ok(None);
    };

    tracing::debug!(title = %hit.title, "encyclopedia article found");
    let url = hit.url.unwrap_or(extract_req.url);
    Ok(Some(SourceRecord::new(
        hit.title,
        url,
        webreply_core::truncate_chars(&extract, MAX_EXTRACT_CHARS),
        ENCYCLOPEDIA_SOURCE,
    )))
}
