use async_trait::async_trait;
use uuid::Uuid;

use super::schema::Database;
use super::types::{Feed, NewPost, Post, StoreError};

/// The persistence operations the ingestion engine depends on.
///
/// Implementations must make `create_post` atomic with respect to URL
/// uniqueness: concurrent inserts of one URL yield exactly one `Ok` and
/// [`StoreError::UniqueViolation`] for the rest.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Up to `limit` feeds ordered by ascending `last_fetched_at`, never-fetched first.
    async fn select_due_feeds(&self, limit: usize) -> Result<Vec<Feed>, StoreError>;

    /// Set `last_fetched_at` to now (UTC) and return the updated feed.
    async fn mark_feed_fetched(&self, feed_id: Uuid) -> Result<Feed, StoreError>;

    /// Insert a post, failing with [`StoreError::UniqueViolation`] on a known URL.
    async fn create_post(&self, post: &NewPost) -> Result<Post, StoreError>;
}

#[async_trait]
impl EntryStore for Database {
    async fn select_due_feeds(&self, limit: usize) -> Result<Vec<Feed>, StoreError> {
        Database::select_due_feeds(self, limit).await
    }

    async fn mark_feed_fetched(&self, feed_id: Uuid) -> Result<Feed, StoreError> {
        Database::mark_feed_fetched(self, feed_id).await
    }

    async fn create_post(&self, post: &NewPost) -> Result<Post, StoreError> {
        Database::create_post(self, post).await
    }
}
