//! The persistence boundary used by commands and the ingestion engine.
//!
//! Everything above the database layer talks to an `Arc<dyn Store>`, so
//! handlers and the scheduler can be exercised against test doubles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Database, NewUser, User, UserRepository};
use crate::rss::{
    Feed, FeedFollow, FeedFollowRepository, FeedListing, FeedRepository, FetchTarget, NewFeed,
    NewFeedFollow, NewPost, Post, PostRepository,
};
use crate::{GatorError, Result};

/// Durable storage for users, feeds, follows and posts.
#[async_trait]
pub trait Store: Send + Sync {
    /// Create a user. Duplicate names fail with [`GatorError::Conflict`].
    async fn create_user(&self, user: &NewUser) -> Result<User>;

    /// Look a user up by name.
    async fn get_user(&self, name: &str) -> Result<Option<User>>;

    /// List every user.
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Delete all posts, follows, feeds and users.
    async fn reset(&self) -> Result<()>;

    /// Register a feed. Duplicate URLs fail with [`GatorError::Conflict`].
    async fn create_feed(&self, feed: &NewFeed) -> Result<Feed>;

    /// List every feed with its owner's name.
    async fn list_feeds(&self) -> Result<Vec<FeedListing>>;

    /// Look a feed up by URL.
    async fn get_feed_by_url(&self, url: &str) -> Result<Option<Feed>>;

    /// Create a follow, returning it with the user and feed names.
    async fn create_feed_follow(&self, follow: &NewFeedFollow) -> Result<FeedFollow>;

    /// Remove a user's follow of the feed at `url`. Returns whether one existed.
    async fn delete_feed_follow(&self, user_id: Uuid, url: &str) -> Result<bool>;

    /// List the follows of the named user.
    async fn list_feed_follows(&self, user_name: &str) -> Result<Vec<FeedFollow>>;

    /// The feed with the oldest watermark, never-fetched feeds first.
    async fn next_feed_to_fetch(&self) -> Result<Option<Feed>>;

    /// Set a feed's watermark to `at` and return its identity.
    async fn mark_feed_fetched(&self, feed_id: Uuid, at: DateTime<Utc>) -> Result<FetchTarget>;

    /// Insert a post. Duplicate URLs fail with [`GatorError::Conflict`].
    async fn create_post(&self, post: &NewPost) -> Result<Post>;

    /// The newest posts from the feeds a user follows.
    async fn list_posts_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<Post>>;
}

/// [`Store`] backed by the SQL database.
#[derive(Debug, Clone)]
pub struct SqlStore {
    db: Database,
}

impl SqlStore {
    /// Wrap an open database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// The underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl Store for SqlStore {
    async fn create_user(&self, user: &NewUser) -> Result<User> {
        UserRepository::new(self.db.pool()).create(user).await
    }

    async fn get_user(&self, name: &str) -> Result<Option<User>> {
        UserRepository::new(self.db.pool()).get_by_name(name).await
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        UserRepository::new(self.db.pool()).list_all().await
    }

    async fn reset(&self) -> Result<()> {
        let mut tx = self.db.pool().begin().await?;
        for table in ["posts", "feed_follows", "feeds", "users"] {
            let result = sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await?;
            tracing::debug!(table, rows = result.rows_affected(), "Cleared table");
        }
        tx.commit().await?;
        Ok(())
    }

    async fn create_feed(&self, feed: &NewFeed) -> Result<Feed> {
        FeedRepository::new(self.db.pool()).create(feed).await
    }

    async fn list_feeds(&self) -> Result<Vec<FeedListing>> {
        FeedRepository::new(self.db.pool()).list_with_owner().await
    }

    async fn get_feed_by_url(&self, url: &str) -> Result<Option<Feed>> {
        FeedRepository::new(self.db.pool()).get_by_url(url).await
    }

    async fn create_feed_follow(&self, follow: &NewFeedFollow) -> Result<FeedFollow> {
        FeedFollowRepository::new(self.db.pool())
            .create(follow)
            .await
    }

    async fn delete_feed_follow(&self, user_id: Uuid, url: &str) -> Result<bool> {
        FeedFollowRepository::new(self.db.pool())
            .delete_by_user_url(user_id, url)
            .await
    }

    async fn list_feed_follows(&self, user_name: &str) -> Result<Vec<FeedFollow>> {
        FeedFollowRepository::new(self.db.pool())
            .list_for_user_name(user_name)
            .await
    }

    async fn next_feed_to_fetch(&self) -> Result<Option<Feed>> {
        FeedRepository::new(self.db.pool()).next_to_fetch().await
    }

    async fn mark_feed_fetched(&self, feed_id: Uuid, at: DateTime<Utc>) -> Result<FetchTarget> {
        FeedRepository::new(self.db.pool())
            .mark_fetched(feed_id, at)
            .await?
            .ok_or_else(|| GatorError::NotFound(format!("feed {feed_id}")))
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post> {
        PostRepository::new(self.db.pool()).create(post).await
    }

    async fn list_posts_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<Post>> {
        PostRepository::new(self.db.pool())
            .list_for_user(user_id, limit)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_store() -> SqlStore {
        SqlStore::new(Database::open_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_user_round_trip() {
        let store = setup_store().await;
        let created = store.create_user(&NewUser::new("alice")).await.unwrap();

        assert_eq!(store.get_user("alice").await.unwrap(), Some(created));
        assert!(store.get_user("bob").await.unwrap().is_none());
        assert_eq!(store.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reset_wipes_everything() {
        let store = setup_store().await;
        let user = store.create_user(&NewUser::new("alice")).await.unwrap();
        // Ownerless feed so the user cascade alone would not remove it.
        let feed = store
            .create_feed(&NewFeed::new("Blog", "https://b/feed.xml"))
            .await
            .unwrap();
        store
            .create_feed_follow(&NewFeedFollow::new(user.id, feed.id))
            .await
            .unwrap();
        store
            .create_post(&NewPost::new(feed.id, "One", "https://b/1"))
            .await
            .unwrap();

        store.reset().await.unwrap();

        assert!(store.list_users().await.unwrap().is_empty());
        assert!(store.list_feeds().await.unwrap().is_empty());
        assert!(store.next_feed_to_fetch().await.unwrap().is_none());
        let posts = PostRepository::new(store.database().pool())
            .count()
            .await
            .unwrap();
        assert_eq!(posts, 0);
    }

    #[tokio::test]
    async fn test_mark_feed_fetched_unknown_feed() {
        let store = setup_store().await;
        let result = store.mark_feed_fetched(Uuid::new_v4(), Utc::now()).await;
        assert!(matches!(result, Err(GatorError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_post_conflict_is_distinguishable() {
        let store = setup_store().await;
        let feed = store
            .create_feed(&NewFeed::new("Blog", "https://b/feed.xml"))
            .await
            .unwrap();

        store
            .create_post(&NewPost::new(feed.id, "One", "https://b/1"))
            .await
            .unwrap();
        let err = store
            .create_post(&NewPost::new(feed.id, "One", "https://b/1"))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let err = store
            .create_post(&NewPost::new(Uuid::new_v4(), "Two", "https://b/2"))
            .await
            .unwrap_err();
        assert!(!err.is_conflict());
    }
}
