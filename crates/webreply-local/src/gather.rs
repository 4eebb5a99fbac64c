use crate::encyclopedia;
use crate::extract;
use crate::news;
use crate::pacing::{FixedSpacing, Pacer, PacedQueue, DEFAULT_POLITENESS_MS};
use crate::search::{self, FallbackDomain, DEFAULT_FALLBACK_DOMAINS};
use crate::DEFAULT_TIMEOUT_MS;
use std::sync::Arc;
use std::time::Duration;
use webreply_core::{
    Clock, Error, FetchBackend, FetchRequest, Result, SearchResult, SourceRecord, SystemClock,
};

pub const DEFAULT_MAX_RESULTS: usize = 5;
pub const DEFAULT_MIN_SCRAPED_CHARS: usize = 100;
pub const DEFAULT_FALLBACK_URL: &str = "https://webreply.invalid/knowledge-base";
pub const FALLBACK_SOURCE: &str = "Internal Knowledge";

#[derive(Debug, Clone)]
pub struct GatherConfig {
    pub search_endpoint: String,
    pub encyclopedia_endpoint: String,
    pub news_endpoint: String,
    /// URL attached to the canned record used when gathering fails outright.
    pub fallback_url: String,
    pub timeout_ms: u64,
    /// How many search results the scrape loop visits.
    pub max_results: usize,
    /// Scraped text must be strictly longer than this to be kept.
    pub min_scraped_chars: usize,
    pub politeness_ms: u64,
}

impl Default for GatherConfig {
    fn default() -> Self {
        Self {
            search_endpoint: search::DEFAULT_SEARCH_ENDPOINT.to_string(),
            encyclopedia_endpoint: encyclopedia::DEFAULT_ENCYCLOPEDIA_ENDPOINT.to_string(),
            news_endpoint: news::DEFAULT_NEWS_ENDPOINT.to_string(),
            fallback_url: DEFAULT_FALLBACK_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_results: DEFAULT_MAX_RESULTS,
            min_scraped_chars: DEFAULT_MIN_SCRAPED_CHARS,
            politeness_ms: DEFAULT_POLITENESS_MS,
        }
    }
}

/// Host of `url` without a leading `www.`, or `Web Source` if it has none.
pub fn source_label(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.host_str()
                .map(|h| h.strip_prefix("www.").unwrap_or(h).to_string())
        })
        .unwrap_or_else(|| "Web Source".to_string())
}

pub struct SourceGatherer {
    fetcher: Arc<dyn FetchBackend>,
    pacer: Arc<dyn Pacer>,
    clock: Arc<dyn Clock>,
    fallback_domains: &'static [FallbackDomain],
    config: GatherConfig,
}

impl SourceGatherer {
    pub fn new(fetcher: Arc<dyn FetchBackend>, config: GatherConfig) -> Self {
        let pacer = FixedSpacing::new(Duration::from_millis(config.politeness_ms));
        Self {
            fetcher,
            pacer: Arc::new(pacer),
            clock: Arc::new(SystemClock),
            fallback_domains: DEFAULT_FALLBACK_DOMAINS,
            config,
        }
    }

    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_fallback_domains(mut self, domains: &'static [FallbackDomain]) -> Self {
        self.fallback_domains = domains;
        self
    }

    /// Collect sources for `query`: scraped pages, then the encyclopedia article, then the
    /// synthetic news record. Never fails; an unexpected error yields one canned record.
    pub async fn gather(&self, query: &str) -> Vec<SourceRecord> {
        match self.try_gather(query).await {
            Ok(sources) => sources,
            Err(e) => {
                tracing::error!(error = %e, "gather failed; using fallback content");
                vec![self.fallback_record(query)]
            }
        }
    }

    async fn try_gather(&self, query: &str) -> Result<Vec<SourceRecord>> {
        let page_url = search::search_url(&self.config.search_endpoint, query)?;
        let candidates = self.search_step(&page_url, query).await;
        let mut out = self.scrape_step(&candidates).await;

        match encyclopedia::lookup(
            self.fetcher.as_ref(),
            &self.config.encyclopedia_endpoint,
            query,
            self.config.timeout_ms,
        )
        .await
        {
            Ok(Some(record)) => out.push(record),
            Ok(None) => tracing::debug!("no encyclopedia article"),
            Err(e) => tracing::warn!(error = %e, "encyclopedia lookup failed"),
        }

        out.push(news::synthesize(
            &self.config.news_endpoint,
            query,
            self.clock.as_ref(),
        )?);
        tracing::info!(sources = out.len(), "gathered sources");
        Ok(out)
    }

    async fn search_step(&self, page_url: &str, query: &str) -> Vec<SearchResult> {
        let mut results =
            match search::search(self.fetcher.as_ref(), page_url, self.config.timeout_ms).await {
                Ok(rs) => {
                    tracing::info!(count = rs.len(), "search results");
                    rs
                }
                Err(e) => {
                    tracing::warn!(error = %e, "search failed");
                    Vec::new()
                }
            };
        if results.is_empty() {
            results.extend(search::fallback_results(self.fallback_domains, query));
        }
        results
    }

    async fn scrape_step(&self, candidates: &[SearchResult]) -> Vec<SourceRecord> {
        let queue = PacedQueue::new(self.pacer.as_ref());
        queue
            .run(
                candidates.iter().take(self.config.max_results),
                move |r| async move {
                    match self.scrape_one(r).await {
                        Ok(record) => Some(record),
                        Err(e) => {
                            tracing::warn!(url = %r.url, error = %e, "skipping source");
                            None
                        }
                    }
                },
            )
            .await
    }

    async fn scrape_one(&self, result: &SearchResult) -> Result<SourceRecord> {
        tracing::debug!(url = %result.url, "scraping");
        let req = FetchRequest::new(&result.url).with_timeout_ms(self.config.timeout_ms);
        let resp = self.fetcher.fetch(&req).await?;
        let text = extract::extract(&resp.text_lossy())
            .filter(|t| t.chars().count() > self.config.min_scraped_chars)
            .ok_or_else(|| Error::ExtractionEmpty {
                url: result.url.clone(),
            })?;
        Ok(SourceRecord::new(
            &result.title,
            &result.url,
            text,
            source_label(&result.url),
        ))
    }

    fn fallback_record(&self, query: &str) -> SourceRecord {
        SourceRecord::new(
            "Knowledge Base",
            &self.config.fallback_url,
            format!(
                "I attempted to search the web for comprehensive information about \"{query}\" but encountered some connectivity issues. Based on available knowledge, this topic involves multiple aspects worth exploring. For the most current and detailed information, I recommend checking reliable websites, academic sources, recent publications, or official documentation related to this subject."
            ),
            FALLBACK_SOURCE,
        )
    }
}
