//! Spacing between outbound scrape attempts.
//!
//! The scrape loop is deliberately serial; `PacedQueue` runs jobs one at a time and asks a
//! `Pacer` to wait after every attempt, successful or not.

use std::future::Future;
use std::time::Duration;

pub const DEFAULT_POLITENESS_MS: u64 = 500;

#[async_trait::async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self);
}

/// Constant sleep after each attempt.
#[derive(Debug, Clone, Copy)]
pub struct FixedSpacing {
    interval: Duration,
}

impl FixedSpacing {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for FixedSpacing {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_POLITENESS_MS))
    }
}

#[async_trait::async_trait]
impl Pacer for FixedSpacing {
    async fn pause(&self) {
        if !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoPause;

#[async_trait::async_trait]
impl Pacer for NoPause {
    async fn pause(&self) {}
}

pub struct PacedQueue<'a> {
    pacer: &'a dyn Pacer,
}

impl<'a> PacedQueue<'a> {
    pub fn new(pacer: &'a dyn Pacer) -> Self {
        Self { pacer }
    }

    /// Run `job` over `items` in order. `None` results are dropped.
    pub async fn run<T, R, F, Fut>(&self, items: impl IntoIterator<Item = T>, mut job: F) -> Vec<R>
    where
        F: FnMut(T) -> Fut,
        Fut: Future<Output = Option<R>>,
    {
        let mut out = Vec::new();
        for item in items {
            if let Some(r) = job(item).await {
                out.push(r);
            }
            self.pacer.pause().await;
        }
        out
    }
}
