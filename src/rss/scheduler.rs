//! Ingestion scheduler: one fetch-and-store pass over the stalest feed.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::datetime::parse_pub_date;
use crate::db::Store;
use crate::rss::fetcher::FeedFetcher;
use crate::rss::types::{FetchTarget, NewPost, ParsedItem};
use crate::shutdown::Shutdown;
use crate::{GatorError, Result};

/// Outcome of a single post insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostInsert {
    /// A new row was written.
    Inserted,
    /// A post with the same URL already existed.
    Duplicate,
}

/// Insert a post, treating a URL collision as success.
pub async fn insert_post(store: &dyn Store, post: &NewPost) -> Result<PostInsert> {
    match store.create_post(post).await {
        Ok(_) => Ok(PostInsert::Inserted),
        Err(e) if e.is_conflict() => Ok(PostInsert::Duplicate),
        Err(e) => Err(e),
    }
}

/// What a tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Feed that was fetched.
    pub feed_id: Uuid,
    /// URL it was fetched from.
    pub url: String,
    /// Posts written.
    pub inserted: usize,
    /// Items whose URL was already stored.
    pub duplicates: usize,
    /// Items dropped for lacking a link.
    pub skipped: usize,
}

impl TickReport {
    fn new(target: &FetchTarget) -> Self {
        Self {
            feed_id: target.id,
            url: target.url.clone(),
            inserted: 0,
            duplicates: 0,
            skipped: 0,
        }
    }
}

/// Selects, fetches and ingests one feed per tick.
pub struct IngestionScheduler {
    store: Arc<dyn Store>,
    fetcher: FeedFetcher,
}

impl IngestionScheduler {
    /// Create a scheduler over the given store and fetcher.
    pub fn new(store: Arc<dyn Store>, fetcher: FeedFetcher) -> Self {
        Self { store, fetcher }
    }

    /// Run one tick.
    ///
    /// The feed's watermark is advanced before the network call, so a feed
    /// that keeps failing still yields to the others on later ticks. Items
    /// stored before a failing item stay stored.
    pub async fn tick(&self, shutdown: &Shutdown) -> Result<TickReport> {
        let feed = self
            .store
            .next_feed_to_fetch()
            .await?
            .ok_or_else(|| GatorError::NotFound("feed to fetch".to_string()))?;

        let target = self.store.mark_feed_fetched(feed.id, Utc::now()).await?;
        info!(feed_id = %target.id, url = %target.url, "Fetching feed");

        let parsed = self.fetcher.fetch(&target.url, shutdown).await?;

        let mut report = TickReport::new(&target);
        for item in parsed.items {
            let Some(post) = build_post(target.id, item)? else {
                report.skipped += 1;
                continue;
            };

            match insert_post(self.store.as_ref(), &post).await? {
                PostInsert::Inserted => report.inserted += 1,
                PostInsert::Duplicate => {
                    debug!(url = %post.url, "Post already stored");
                    report.duplicates += 1;
                }
            }
        }

        info!(
            feed_id = %report.feed_id,
            url = %report.url,
            inserted = report.inserted,
            duplicates = report.duplicates,
            skipped = report.skipped,
            "Feed ingested"
        );
        Ok(report)
    }
}

/// Turn a parsed item into a post, or `None` if it has no link.
fn build_post(feed_id: Uuid, item: ParsedItem) -> Result<Option<NewPost>> {
    let Some(link) = item.link.filter(|l| !l.trim().is_empty()) else {
        debug!(title = %item.title, "Skipping item without link");
        return Ok(None);
    };

    let mut post = NewPost::new(feed_id, item.title, link.trim());
    if let Some(description) = item.description {
        post = post.with_description(description);
    }
    if let Some(raw) = item.pub_date.as_deref().map(str::trim) {
        if !raw.is_empty() {
            post = post.with_published_at(parse_pub_date(raw)?);
        }
    }
    Ok(Some(post))
}
