use crate::gather::{GatherConfig, SourceGatherer};
use crate::respond::{Responder, ResponderConfig};
use crate::LocalFetcher;
use std::sync::Arc;
use std::time::Duration;
use webreply_core::{Answerer, Clock, ResponsePayload, Result};

/// Gathers sources for a query, then composes the answer from them.
pub struct WebAnswerer {
    gatherer: SourceGatherer,
    responder: Responder,
}

impl WebAnswerer {
    pub fn new(gatherer: SourceGatherer, responder: Responder) -> Self {
        Self {
            gatherer,
            responder,
        }
    }

    /// Live pipeline over a `LocalFetcher` with the given user agent.
    pub fn live(
        user_agent: &str,
        gather: GatherConfig,
        respond: ResponderConfig,
    ) -> Result<Self> {
        let fetcher = LocalFetcher::new(user_agent, Duration::from_millis(gather.timeout_ms))?;
        Ok(Self::new(
            SourceGatherer::new(Arc::new(fetcher), gather),
            Responder::new(respond),
        ))
    }

    /// Use one clock for both the news record and the recency closing.
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        Self {
            gatherer: self.gatherer.with_clock(clock.clone()),
            responder: self.responder.with_clock(clock),
        }
    }
}

#[async_trait::async_trait]
impl Answerer for WebAnswerer {
    async fn answer(&self, query: &str) -> Result<ResponsePayload> {
        let sources = self.gatherer.gather(query).await;
        Ok(self.responder.respond(query, &sources))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::NoPause;
    use crate::testing::StubFetcher;
    use chrono::{TimeZone, Utc};
    use webreply_core::FixedClock;

    #[tokio::test]
    async fn offline_pipeline_still_answers() {
        // Nothing routed: search, scrapes and encyclopedia all fail.
        let gatherer = SourceGatherer::new(Arc::new(StubFetcher::new()), GatherConfig::default())
            .with_pacer(Arc::new(NoPause));
        let answerer = WebAnswerer::new(gatherer, Responder::new(ResponderConfig::default()))
            .with_clock(Arc::new(FixedClock(
                Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
            )));

        let out = answerer.answer("latest fusion news").await.unwrap();
        // Only the synthetic news record survives.
        assert_eq!(out.sources.len(), 1);
        assert_eq!(out.sources[0].source, crate::news::NEWS_SOURCE);
        assert!(out.answer.starts_with("Recent reports as of 3/1/2025"));
        assert!(out.answer.ends_with("up to date as of 3/1/2025."));
    }
}
