//! Feed, follow and post types for gator.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A registered feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    /// Feed ID.
    pub id: Uuid,
    /// When the feed was registered.
    pub created_at: DateTime<Utc>,
    /// When the feed row was last touched.
    pub updated_at: DateTime<Utc>,
    /// Human-readable name given when the feed was added.
    pub name: String,
    /// Feed URL. Unique across all feeds.
    pub url: String,
    /// User who registered the feed, if any.
    pub user_id: Option<Uuid>,
    /// Last time the feed was selected for fetching.
    pub last_fetched_at: Option<DateTime<Utc>>,
}

/// New feed for creation.
#[derive(Debug, Clone)]
pub struct NewFeed {
    /// Feed ID.
    pub id: Uuid,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Feed name.
    pub name: String,
    /// Feed URL.
    pub url: String,
    /// Registering user.
    pub user_id: Option<Uuid>,
}

impl NewFeed {
    /// Create a new, ownerless feed.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            name: name.into(),
            url: url.into(),
            user_id: None,
        }
    }

    /// Set the registering user.
    pub fn with_owner(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }
}

/// A feed as shown by the `feeds` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedListing {
    /// Feed name.
    pub name: String,
    /// Feed URL.
    pub url: String,
    /// Name of the registering user; `None` for ownerless feeds.
    pub owner: Option<String>,
}

/// A follow relationship, joined with the names on either side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedFollow {
    /// Follow ID.
    pub id: Uuid,
    /// When the follow was created.
    pub created_at: DateTime<Utc>,
    /// When the follow was last updated.
    pub updated_at: DateTime<Utc>,
    /// Following user.
    pub user_id: Uuid,
    /// Followed feed.
    pub feed_id: Uuid,
    /// Name of the following user.
    pub user_name: String,
    /// Name of the followed feed.
    pub feed_name: String,
}

/// New follow for creation.
#[derive(Debug, Clone)]
pub struct NewFeedFollow {
    /// Follow ID.
    pub id: Uuid,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Following user.
    pub user_id: Uuid,
    /// Followed feed.
    pub feed_id: Uuid,
}

impl NewFeedFollow {
    /// Create a new follow of `feed_id` by `user_id`.
    pub fn new(user_id: Uuid, feed_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            user_id,
            feed_id,
        }
    }
}

/// The feed chosen for the current ingestion tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    /// Feed ID.
    pub id: Uuid,
    /// Feed URL.
    pub url: String,
}

/// A stored post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Post ID.
    pub id: Uuid,
    /// When the post was ingested.
    pub created_at: DateTime<Utc>,
    /// When the post row was last updated.
    pub updated_at: DateTime<Utc>,
    /// Post title.
    pub title: String,
    /// Link to the article. Unique across all posts.
    pub url: String,
    /// Post description.
    pub description: Option<String>,
    /// Normalized publication time, when the item carried one.
    pub published_at: Option<DateTime<Utc>>,
    /// Feed the post was ingested from.
    pub feed_id: Uuid,
    /// Name of that feed.
    pub feed_name: String,
}

/// New post for creation.
#[derive(Debug, Clone)]
pub struct NewPost {
    /// Post ID.
    pub id: Uuid,
    /// Ingestion time.
    pub created_at: DateTime<Utc>,
    /// Post title.
    pub title: String,
    /// Link to the article.
    pub url: String,
    /// Post description.
    pub description: Option<String>,
    /// Normalized publication time.
    pub published_at: Option<DateTime<Utc>>,
    /// Source feed.
    pub feed_id: Uuid,
}

impl NewPost {
    /// Create a new post.
    pub fn new(feed_id: Uuid, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            title: title.into(),
            url: url.into(),
            description: None,
            published_at: None,
            feed_id,
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the publication time.
    pub fn with_published_at(mut self, published_at: DateTime<Utc>) -> Self {
        self.published_at = Some(published_at);
        self
    }
}

/// Parsed feed data from the fetcher.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    /// Channel title.
    pub title: String,
    /// Channel link.
    pub link: String,
    /// Channel description.
    pub description: String,
    /// Items in document order.
    pub items: Vec<ParsedItem>,
}

/// Parsed item from the fetcher.
///
/// `pub_date` is kept as the raw string from the document; it is
/// normalized during ingestion.
#[derive(Debug, Clone, Default)]
pub struct ParsedItem {
    /// Item title.
    pub title: String,
    /// Link to the article.
    pub link: Option<String>,
    /// Item description.
    pub description: Option<String>,
    /// Raw publication date.
    pub pub_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_feed_builder() {
        let owner = Uuid::new_v4();
        let feed = NewFeed::new("Blog", "https://blog.example.com/rss").with_owner(owner);

        assert_eq!(feed.name, "Blog");
        assert_eq!(feed.url, "https://blog.example.com/rss");
        assert_eq!(feed.user_id, Some(owner));
    }

    #[test]
    fn test_new_feed_without_owner() {
        let feed = NewFeed::new("Blog", "https://blog.example.com/rss");
        assert!(feed.user_id.is_none());
    }

    #[test]
    fn test_new_post_builder() {
        let feed_id = Uuid::new_v4();
        let at = Utc::now();
        let post = NewPost::new(feed_id, "Hello", "https://blog.example.com/hello")
            .with_description("First post")
            .with_published_at(at);

        assert_eq!(post.feed_id, feed_id);
        assert_eq!(post.title, "Hello");
        assert_eq!(post.description.as_deref(), Some("First post"));
        assert_eq!(post.published_at, Some(at));
    }

    #[test]
    fn test_new_post_defaults() {
        let post = NewPost::new(Uuid::new_v4(), "Hello", "https://blog.example.com/hello");
        assert!(post.description.is_none());
        assert!(post.published_at.is_none());
    }
}
