//! Feed, follow and post repositories for gator.

use chrono::{DateTime, Utc};

use super::types::{
    Feed, FeedFollow, FeedListing, FetchTarget, NewFeed, NewFeedFollow, NewPost, Post,
};
use crate::datetime::{from_db_timestamp, to_db_timestamp};
use crate::db::{parse_id, DbPool};
use crate::{GatorError, Result};

/// Row type for feed from database.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedRow {
    id: String,
    created_at: String,
    updated_at: String,
    name: String,
    url: String,
    user_id: Option<String>,
    last_fetched_at: Option<String>,
}

impl TryFrom<FeedRow> for Feed {
    type Error = GatorError;

    fn try_from(row: FeedRow) -> Result<Self> {
        Ok(Feed {
            id: parse_id(&row.id)?,
            created_at: from_db_timestamp(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: from_db_timestamp(&row.updated_at).unwrap_or_else(Utc::now),
            name: row.name,
            url: row.url,
            user_id: row.user_id.as_deref().map(parse_id).transpose()?,
            last_fetched_at: row.last_fetched_at.and_then(|s| from_db_timestamp(&s)),
        })
    }
}

/// Row type for the feed listing.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedListingRow {
    name: String,
    url: String,
    owner: Option<String>,
}

impl From<FeedListingRow> for FeedListing {
    fn from(row: FeedListingRow) -> Self {
        FeedListing {
            name: row.name,
            url: row.url,
            owner: row.owner,
        }
    }
}

/// Row type for the id/url pair returned when marking a feed fetched.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FetchTargetRow {
    id: String,
    url: String,
}

impl TryFrom<FetchTargetRow> for FetchTarget {
    type Error = GatorError;

    fn try_from(row: FetchTargetRow) -> Result<Self> {
        Ok(FetchTarget {
            id: parse_id(&row.id)?,
            url: row.url,
        })
    }
}

/// Row type for feed follow joined with user and feed names.
#[derive(Debug, Clone, sqlx::FromRow)]
struct FeedFollowRow {
    id: String,
    created_at: String,
    updated_at: String,
    user_id: String,
    feed_id: String,
    user_name: String,
    feed_name: String,
}

impl TryFrom<FeedFollowRow> for FeedFollow {
    type Error = GatorError;

    fn try_from(row: FeedFollowRow) -> Result<Self> {
        Ok(FeedFollow {
            id: parse_id(&row.id)?,
            created_at: from_db_timestamp(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: from_db_timestamp(&row.updated_at).unwrap_or_else(Utc::now),
            user_id: parse_id(&row.user_id)?,
            feed_id: parse_id(&row.feed_id)?,
            user_name: row.user_name,
            feed_name: row.feed_name,
        })
    }
}

/// Row type for post joined with its feed name.
#[derive(Debug, Clone, sqlx::FromRow)]
struct PostRow {
    id: String,
    created_at: String,
    updated_at: String,
    title: String,
    url: String,
    description: Option<String>,
    published_at: Option<String>,
    feed_id: String,
    feed_name: String,
}

impl TryFrom<PostRow> for Post {
    type Error = GatorError;

    fn try_from(row: PostRow) -> Result<Self> {
        Ok(Post {
            id: parse_id(&row.id)?,
            created_at: from_db_timestamp(&row.created_at).unwrap_or_else(Utc::now),
            updated_at: from_db_timestamp(&row.updated_at).unwrap_or_else(Utc::now),
            title: row.title,
            url: row.url,
            description: row.description,
            published_at: row.published_at.and_then(|s| from_db_timestamp(&s)),
            feed_id: parse_id(&row.feed_id)?,
            feed_name: row.feed_name,
        })
    }
}

const FEED_COLUMNS: &str = "id, created_at, updated_at, name, url, user_id, last_fetched_at";

/// Repository for feed operations.
pub struct FeedRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FeedRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a new feed.
    ///
    /// Fails with [`GatorError::Conflict`] when the URL is already registered.
    pub async fn create(&self, feed: &NewFeed) -> Result<Feed> {
        let now = to_db_timestamp(&feed.created_at);
        let row = sqlx::query_as::<_, FeedRow>(&format!(
            "INSERT INTO feeds (id, created_at, updated_at, name, url, user_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {FEED_COLUMNS}"
        ))
        .bind(feed.id.to_string())
        .bind(&now)
        .bind(&now)
        .bind(&feed.name)
        .bind(&feed.url)
        .bind(feed.user_id.map(|id| id.to_string()))
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Get a feed by URL.
    pub async fn get_by_url(&self, url: &str) -> Result<Option<Feed>> {
        let row = sqlx::query_as::<_, FeedRow>(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds WHERE url = $1"
        ))
        .bind(url)
        .fetch_optional(self.pool)
        .await?;

        row.map(Feed::try_from).transpose()
    }

    /// List every feed with its owner's name, oldest registration first.
    pub async fn list_with_owner(&self) -> Result<Vec<FeedListing>> {
        let rows = sqlx::query_as::<_, FeedListingRow>(
            "SELECT f.name, f.url, u.name AS owner
             FROM feeds f
             LEFT JOIN users u ON u.id = f.user_id
             ORDER BY f.created_at, f.name",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(FeedListing::from).collect())
    }

    /// Get the feed with the oldest watermark.
    ///
    /// Never-fetched feeds come first; ties are broken by registration time
    /// and then by id so the choice is deterministic.
    pub async fn next_to_fetch(&self) -> Result<Option<Feed>> {
        let row = sqlx::query_as::<_, FeedRow>(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds
             ORDER BY last_fetched_at ASC NULLS FIRST, created_at ASC, id ASC
             LIMIT 1"
        ))
        .fetch_optional(self.pool)
        .await?;

        row.map(Feed::try_from).transpose()
    }

    /// Advance a feed's watermark to `at`.
    ///
    /// Returns the feed's id and URL, or `None` if the feed no longer exists.
    pub async fn mark_fetched(&self, id: uuid::Uuid, at: DateTime<Utc>) -> Result<Option<FetchTarget>> {
        let at = to_db_timestamp(&at);
        let row = sqlx::query_as::<_, FetchTargetRow>(
            "UPDATE feeds SET last_fetched_at = $1, updated_at = $1
             WHERE id = $2
             RETURNING id, url",
        )
        .bind(&at)
        .bind(id.to_string())
        .fetch_optional(self.pool)
        .await?;

        row.map(FetchTarget::try_from).transpose()
    }
}

#[cfg(test)]
impl FeedRepository<'_> {
    /// Count total feeds.
    pub(crate) async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM feeds")
            .fetch_one(self.pool)
            .await?;

        Ok(count.0)
    }
}

const FOLLOW_SELECT: &str = "SELECT ff.id, ff.created_at, ff.updated_at, ff.user_id, ff.feed_id,
            u.name AS user_name, f.name AS feed_name
     FROM feed_follows ff
     JOIN users u ON u.id = ff.user_id
     JOIN feeds f ON f.id = ff.feed_id";

/// Repository for feed follow operations.
pub struct FeedFollowRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> FeedFollowRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Create a follow and return it joined with the user and feed names.
    pub async fn create(&self, follow: &NewFeedFollow) -> Result<FeedFollow> {
        let now = to_db_timestamp(&follow.created_at);
        sqlx::query(
            "INSERT INTO feed_follows (id, created_at, updated_at, user_id, feed_id)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(follow.id.to_string())
        .bind(&now)
        .bind(&now)
        .bind(follow.user_id.to_string())
        .bind(follow.feed_id.to_string())
        .execute(self.pool)
        .await?;

        self.get_by_id(follow.id)
            .await?
            .ok_or_else(|| GatorError::NotFound("feed follow".into()))
    }

    /// Get a follow by ID.
    pub async fn get_by_id(&self, id: uuid::Uuid) -> Result<Option<FeedFollow>> {
        let row = sqlx::query_as::<_, FeedFollowRow>(&format!("{FOLLOW_SELECT} WHERE ff.id = $1"))
            .bind(id.to_string())
            .fetch_optional(self.pool)
            .await?;

        row.map(FeedFollow::try_from).transpose()
    }

    /// List the follows of the user with the given name, oldest first.
    pub async fn list_for_user_name(&self, user_name: &str) -> Result<Vec<FeedFollow>> {
        let rows = sqlx::query_as::<_, FeedFollowRow>(&format!(
            "{FOLLOW_SELECT} WHERE u.name = $1 ORDER BY ff.created_at, f.name"
        ))
        .bind(user_name)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(FeedFollow::try_from).collect()
    }

    /// Remove the user's follows of the feed at `url`.
    ///
    /// Returns whether anything was removed.
    pub async fn delete_by_user_url(&self, user_id: uuid::Uuid, url: &str) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM feed_follows
             WHERE user_id = $1
               AND feed_id IN (SELECT id FROM feeds WHERE url = $2)",
        )
        .bind(user_id.to_string())
        .bind(url)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

const POST_SELECT: &str = "SELECT p.id, p.created_at, p.updated_at, p.title, p.url, p.description,
            p.published_at, p.feed_id, f.name AS feed_name
     FROM posts p
     JOIN feeds f ON f.id = p.feed_id";

/// Repository for post operations.
pub struct PostRepository<'a> {
    pool: &'a DbPool,
}

impl<'a> PostRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a DbPool) -> Self {
        Self { pool }
    }

    /// Insert a post.
    ///
    /// Fails with [`GatorError::Conflict`] when a post with the same URL is
    /// already stored.
    pub async fn create(&self, post: &NewPost) -> Result<Post> {
        let now = to_db_timestamp(&post.created_at);
        sqlx::query(
            "INSERT INTO posts (id, created_at, updated_at, title, url, description, published_at, feed_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(post.id.to_string())
        .bind(&now)
        .bind(&now)
        .bind(&post.title)
        .bind(&post.url)
        .bind(&post.description)
        .bind(post.published_at.as_ref().map(to_db_timestamp))
        .bind(post.feed_id.to_string())
        .execute(self.pool)
        .await?;

        self.get_by_id(post.id)
            .await?
            .ok_or_else(|| GatorError::NotFound("post".into()))
    }

    /// Get a post by ID.
    pub async fn get_by_id(&self, id: uuid::Uuid) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(&format!("{POST_SELECT} WHERE p.id = $1"))
            .bind(id.to_string())
            .fetch_optional(self.pool)
            .await?;

        row.map(Post::try_from).transpose()
    }

    /// List the newest posts from feeds the user follows.
    ///
    /// Posts without a publication time sort after all dated posts.
    pub async fn list_for_user(&self, user_id: uuid::Uuid, limit: i64) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(&format!(
            "{POST_SELECT}
             WHERE p.feed_id IN (SELECT feed_id FROM feed_follows WHERE user_id = $1)
             ORDER BY p.published_at DESC NULLS LAST, p.created_at DESC
             LIMIT $2"
        ))
        .bind(user_id.to_string())
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Post::try_from).collect()
    }
}

#[cfg(test)]
impl PostRepository<'_> {
    /// Count posts ingested from a feed.
    pub(crate) async fn count_by_feed(&self, feed_id: uuid::Uuid) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE feed_id = $1")
            .bind(feed_id.to_string())
            .fetch_one(self.pool)
            .await?;

        Ok(count.0)
    }

    /// Count total posts.
    pub(crate) async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
            .fetch_one(self.pool)
            .await?;

        Ok(count.0)
    }
}
