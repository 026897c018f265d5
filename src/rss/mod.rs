//! Feed ingestion for gator.
//!
//! Feed, follow and post storage, the HTTP feed fetcher, and the scheduler
//! and loop that pull new posts into the store.

pub mod fetcher;
pub mod html;
pub mod repository;
pub mod scheduler;
pub mod types;
pub mod updater;

pub use fetcher::{parse_feed, validate_url, FeedFetcher};
pub use html::decode_html_entities;
pub use repository::{FeedFollowRepository, FeedRepository, PostRepository};
pub use scheduler::{insert_post, IngestionScheduler, PostInsert, TickReport};
pub use types::{
    Feed, FeedFollow, FeedListing, FetchTarget, NewFeed, NewFeedFollow, NewPost, ParsedFeed,
    ParsedItem, Post,
};
pub use updater::Aggregator;
