//! Aggregation loop.
//!
//! Runs the ingestion scheduler immediately and then once per interval
//! until a fatal error or shutdown. Ticks never overlap.

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::FailurePolicy;
use crate::rss::scheduler::IngestionScheduler;
use crate::shutdown::Shutdown;
use crate::{GatorError, Result};

/// Periodic driver for the [`IngestionScheduler`].
pub struct Aggregator {
    scheduler: IngestionScheduler,
    interval: Duration,
    policy: FailurePolicy,
}

impl Aggregator {
    /// Create an aggregator that stops on the first failed tick.
    pub fn new(scheduler: IngestionScheduler, interval: Duration) -> Self {
        Self {
            scheduler,
            interval,
            policy: FailurePolicy::Abort,
        }
    }

    /// Set the policy for fetch failures.
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Run until shutdown or a fatal tick error.
    ///
    /// Returns `Ok(())` when stopped by `shutdown`.
    pub async fn run(&self, shutdown: &Shutdown) -> Result<()> {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            policy = ?self.policy,
            "Aggregation loop started"
        );

        let mut timer = interval(self.interval);
        // A slow tick pushes the schedule back instead of firing a burst.
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.wait() => break,
                _ = timer.tick() => {}
            }

            match self.scheduler.tick(shutdown).await {
                Ok(_) => {}
                Err(_) if shutdown.is_triggered() => break,
                Err(e) if self.skips(&e) => {
                    warn!(error = %e, "Tick failed, waiting for next tick");
                }
                Err(e) => return Err(e),
            }
        }

        info!("Aggregation loop stopped");
        Ok(())
    }

    fn skips(&self, error: &GatorError) -> bool {
        self.policy == FailurePolicy::Skip
            && matches!(
                error,
                GatorError::Network(_) | GatorError::Parse(_) | GatorError::NotFound(_)
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::FetchConfig;
    use crate::db::{Database, SqlStore, Store};
    use crate::rss::fetcher::FeedFetcher;
    use crate::rss::types::NewFeed;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn aggregator_for(url: Option<&str>) -> (Arc<SqlStore>, Aggregator) {
        let store = Arc::new(SqlStore::new(Database::open_in_memory().await.unwrap()));
        if let Some(url) = url {
            store.create_feed(&NewFeed::new("Feed", url)).await.unwrap();
        }
        let scheduler = IngestionScheduler::new(
            store.clone(),
            FeedFetcher::new(&FetchConfig::default()).unwrap(),
        );
        (store, Aggregator::new(scheduler, Duration::from_millis(20)))
    }

    #[tokio::test]
    async fn test_abort_policy_surfaces_fetch_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let (_store, aggregator) = aggregator_for(Some(server.uri().as_str())).await;
        let result = tokio::time::timeout(
            Duration::from_secs(2),
            aggregator.run(&Shutdown::never()),
        )
        .await
        .unwrap();
        assert!(matches!(result, Err(GatorError::Network(_))));
    }

    #[tokio::test]
    async fn test_abort_policy_stops_when_no_feeds() {
        let (_store, aggregator) = aggregator_for(None).await;
        let result = tokio::time::timeout(
            Duration::from_secs(2),
            aggregator.run(&Shutdown::never()),
        )
        .await
        .unwrap();
        assert!(matches!(result, Err(GatorError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_skip_policy_keeps_running_until_shutdown() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (_store, aggregator) = aggregator_for(Some(server.uri().as_str())).await;
        let aggregator = aggregator.with_policy(FailurePolicy::Skip);
        let (trigger, shutdown) = crate::shutdown::channel();

        let handle = tokio::spawn(async move { aggregator.run(&shutdown).await });
        tokio::time::sleep(Duration::from_millis(150)).await;
        trigger.trigger();

        let result = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());

        let requests = server.received_requests().await.unwrap();
        assert!(requests.len() >= 2, "expected repeated ticks, got {}", requests.len());
    }

    #[tokio::test]
    async fn test_shutdown_before_start_returns_ok() {
        let (store, aggregator) = aggregator_for(Some("https://unused.invalid/feed.xml")).await;
        let (trigger, shutdown) = crate::shutdown::channel();
        trigger.trigger();

        aggregator.run(&shutdown).await.unwrap();

        let feed = store
            .get_feed_by_url("https://unused.invalid/feed.xml")
            .await
            .unwrap()
            .unwrap();
        assert!(feed.last_fetched_at.is_none());
    }
}
