//! Test helpers for integration tests.
//!
//! Provides an in-memory application harness, a store wrapper that counts
//! calls, and helpers for serving RSS documents with wiremock.

#![allow(dead_code)]

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gator::config::Config;
use gator::db::{NewUser, Store, User};
use gator::rss::{
    Feed, FeedFollow, FeedListing, FetchTarget, NewFeed, NewFeedFollow, NewPost, Post,
};
use gator::{Command, Context, Database, Registry, Session, SqlStore};

/// Output sink shared between a [`Context`] and the test reading it.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Everything written so far.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Everything written so far, clearing the buffer.
    pub fn take(&self) -> String {
        let bytes = std::mem::take(&mut *self.0.lock().unwrap());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Open a fresh in-memory store.
pub async fn memory_store() -> Arc<SqlStore> {
    Arc::new(SqlStore::new(Database::open_in_memory().await.unwrap()))
}

/// An in-memory gator: store, session and the default command registry.
pub struct TestApp {
    pub store: Arc<SqlStore>,
    pub ctx: Context,
    pub out: SharedBuffer,
    registry: Registry,
}

impl TestApp {
    /// Create an app with nobody logged in.
    pub async fn new() -> Self {
        Self::with_config(Config::default()).await
    }

    /// Create an app with the given configuration.
    pub async fn with_config(config: Config) -> Self {
        let store = memory_store().await;
        let out = SharedBuffer::default();
        let ctx = Context::new(store.clone(), Session::ephemeral(config))
            .with_output(Box::new(out.clone()));
        Self {
            store,
            ctx,
            out,
            registry: Registry::with_defaults(),
        }
    }

    /// Run a command as if typed on the command line.
    pub async fn run(&mut self, name: &str, args: &[&str]) -> gator::Result<()> {
        let cmd = Command::new(name, args.iter().copied());
        self.registry.run(&mut self.ctx, &cmd).await
    }
}

/// Build an RSS 2.0 document.
///
/// Each item is `(title, link, pub_date)`; empty strings omit the element.
pub fn rss_document(title: &str, items: &[(&str, &str, &str)]) -> String {
    let mut xml = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\">\n<channel>\n\
         <title>{title}</title>\n<link>https://example.com</link>\n\
         <description>Test feed</description>\n"
    );
    for (item_title, link, pub_date) in items {
        xml.push_str("<item>\n");
        xml.push_str(&format!("<title>{item_title}</title>\n"));
        if !link.is_empty() {
            xml.push_str(&format!("<link>{link}</link>\n"));
        }
        xml.push_str(&format!("<description>About {item_title}</description>\n"));
        if !pub_date.is_empty() {
            xml.push_str(&format!("<pubDate>{pub_date}</pubDate>\n"));
        }
        xml.push_str("</item>\n");
    }
    xml.push_str("</channel>\n</rss>\n");
    xml
}

/// Serve `body` at `route` and return the full URL.
pub async fn serve_feed(server: &MockServer, route: &str, body: String) -> String {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/rss+xml")
                .set_body_string(body),
        )
        .mount(server)
        .await;
    format!("{}{}", server.uri(), route)
}

/// A [`Store`] wrapper that counts every call made through it.
pub struct CountingStore {
    inner: Arc<dyn Store>,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: Arc<dyn Store>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of store calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for CountingStore {
    async fn create_user(&self, user: &NewUser) -> gator::Result<User> {
        self.hit();
        self.inner.create_user(user).await
    }

    async fn get_user(&self, name: &str) -> gator::Result<Option<User>> {
        self.hit();
        self.inner.get_user(name).await
    }

    async fn list_users(&self) -> gator::Result<Vec<User>> {
        self.hit();
        self.inner.list_users().await
    }

    async fn reset(&self) -> gator::Result<()> {
        self.hit();
        self.inner.reset().await
    }

    async fn create_feed(&self, feed: &NewFeed) -> gator::Result<Feed> {
        self.hit();
        self.inner.create_feed(feed).await
    }

    async fn list_feeds(&self) -> gator::Result<Vec<FeedListing>> {
        self.hit();
        self.inner.list_feeds().await
    }

    async fn get_feed_by_url(&self, url: &str) -> gator::Result<Option<Feed>> {
        self.hit();
        self.inner.get_feed_by_url(url).await
    }

    async fn create_feed_follow(&self, follow: &NewFeedFollow) -> gator::Result<FeedFollow> {
        self.hit();
        self.inner.create_feed_follow(follow).await
    }

    async fn delete_feed_follow(&self, user_id: Uuid, url: &str) -> gator::Result<bool> {
        self.hit();
        self.inner.delete_feed_follow(user_id, url).await
    }

    async fn list_feed_follows(&self, user_name: &str) -> gator::Result<Vec<FeedFollow>> {
        self.hit();
        self.inner.list_feed_follows(user_name).await
    }

    async fn next_feed_to_fetch(&self) -> gator::Result<Option<Feed>> {
        self.hit();
        self.inner.next_feed_to_fetch().await
    }

    async fn mark_feed_fetched(
        &self,
        feed_id: Uuid,
        at: DateTime<Utc>,
    ) -> gator::Result<FetchTarget> {
        self.hit();
        self.inner.mark_feed_fetched(feed_id, at).await
    }

    async fn create_post(&self, post: &NewPost) -> gator::Result<Post> {
        self.hit();
        self.inner.create_post(post).await
    }

    async fn list_posts_for_user(&self, user_id: Uuid, limit: i64) -> gator::Result<Vec<Post>> {
        self.hit();
        self.inner.list_posts_for_user(user_id, limit).await
    }
}
