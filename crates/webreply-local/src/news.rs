//! Placeholder "news" record. Nothing is fetched: the record is a template sentence built
//! from the query and today's date.

use webreply_core::{Clock, Error, Result, SourceRecord};

pub const DEFAULT_NEWS_ENDPOINT: &str = "https://news.google.com/search";
pub const NEWS_SOURCE: &str = "News Sources";

pub fn synthesize(endpoint: &str, query: &str, clock: &dyn Clock) -> Result<SourceRecord> {
    let url = url::Url::parse_with_params(endpoint, &[("q", query)])
        .map_err(|e| Error::InvalidUrl(format!("news endpoint {endpoint}: {e}")))?;
    let content = format!(
        "Recent reports as of {date} indicate significant developments in {query}. Industry experts and researchers continue to make breakthroughs that impact how we understand and implement these concepts in real-world applications.",
        date = clock.short_date(),
    );
    Ok(SourceRecord::new(
        format!("Latest developments in {query}"),
        url.to_string(),
        content,
        NEWS_SOURCE,
    ))
}
