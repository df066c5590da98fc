use uuid::Uuid;

use super::schema::Database;
use super::types::{Feed, StoreError};

/// Columns selected for every feed query, in `Feed` field order
const FEED_COLUMNS: &str = "id, account_id, name, url, created_at, updated_at, last_fetched_at";

impl Database {
    // ========================================================================
    // Feed Operations
    // ========================================================================

    /// Subscribe an account to a feed URL.
    ///
    /// Returns [`StoreError::UniqueViolation`] if the account already follows
    /// this URL and [`StoreError::Database`] if the account does not exist.
    pub async fn create_feed(
        &self,
        account_id: Uuid,
        name: &str,
        url: &str,
    ) -> Result<Feed, StoreError> {
        let now = chrono::Utc::now().timestamp();
        let feed = sqlx::query_as::<_, Feed>(&format!(
            r#"
            INSERT INTO feeds (id, account_id, name, url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING {FEED_COLUMNS}
        "#
        ))
        .bind(Uuid::new_v4())
        .bind(account_id)
        .bind(name)
        .bind(url)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(feed_id = %feed.id, url = %feed.url, "Created feed");
        Ok(feed)
    }

    /// Get all feeds ordered by creation time
    pub async fn list_feeds(&self) -> Result<Vec<Feed>, StoreError> {
        let feeds = sqlx::query_as::<_, Feed>(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(feeds)
    }

    /// Look up a single feed by id
    pub async fn get_feed(&self, feed_id: Uuid) -> Result<Feed, StoreError> {
        let feed = sqlx::query_as::<_, Feed>(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds WHERE id = ?"
        ))
        .bind(feed_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(feed)
    }

    /// Return up to `limit` feeds, least recently fetched first.
    ///
    /// Feeds that were never fetched sort ahead of everything else; ties
    /// fall back to subscription order.
    pub async fn select_due_feeds(&self, limit: usize) -> Result<Vec<Feed>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let feeds = sqlx::query_as::<_, Feed>(&format!(
            r#"
            SELECT {FEED_COLUMNS}
            FROM feeds
            ORDER BY last_fetched_at ASC NULLS FIRST, created_at ASC, id ASC
            LIMIT ?
        "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(feeds)
    }

    /// Stamp a feed as fetched now and return the updated record.
    ///
    /// `last_fetched_at` only moves forward: a clock step backwards leaves
    /// the stored value untouched.
    pub async fn mark_feed_fetched(&self, feed_id: Uuid) -> Result<Feed, StoreError> {
        let now = chrono::Utc::now().timestamp();
        let feed = sqlx::query_as::<_, Feed>(&format!(
            r#"
            UPDATE feeds
            SET last_fetched_at = MAX(COALESCE(last_fetched_at, ?1), ?1),
                updated_at = MAX(updated_at, ?1)
            WHERE id = ?2
            RETURNING {FEED_COLUMNS}
        "#
        ))
        .bind(now)
        .bind(feed_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(feed)
    }
}
