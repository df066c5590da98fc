use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::shutdown::Shutdown;
use crate::feed::{parse_document, parse_rfc1123, FeedSource, FetchError, FetchedItem, ParseError};
use crate::storage::{EntryStore, Feed, NewPost, StoreError};

/// Feed-level failures. Any of these ends the feed's ingestion for the tick.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The feed could not be stamped as fetched; nothing was fetched
    #[error("Failed to mark feed as fetched: {0}")]
    MarkFetched(#[source] StoreError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Per-item outcome counts for one ingestion of one feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Items present in the document
    pub seen: usize,
    /// New posts stored
    pub inserted: usize,
    /// Items whose URL was already stored
    pub duplicates: usize,
    /// Items skipped because `pubDate` is not RFC 1123
    pub skipped_dates: usize,
    /// Items skipped because they carry no link
    pub missing_links: usize,
    /// Items whose insert failed for another reason
    pub failed: usize,
    /// Shutdown arrived before every item was processed
    pub interrupted: bool,
}

/// Runs the fetch, parse and persist pipeline for one feed at a time.
///
/// Holds no per-feed state, so one instance is shared by all workers of a
/// tick.
pub struct Ingestor {
    store: Arc<dyn EntryStore>,
    source: Arc<dyn FeedSource>,
}

impl Ingestor {
    pub fn new(store: Arc<dyn EntryStore>, source: Arc<dyn FeedSource>) -> Self {
        Self { store, source }
    }

    /// Ingest one feed.
    ///
    /// The feed is stamped as fetched *before* the request goes out, so a
    /// feed that keeps failing still rotates to the back of the due queue.
    /// Item-level problems are counted in the report and never abort the
    /// feed; only the failures in [`IngestError`] do.
    pub async fn ingest(&self, feed: &Feed, shutdown: &Shutdown) -> Result<IngestReport, IngestError> {
        if let Err(e) = self.store.mark_feed_fetched(feed.id).await {
            tracing::warn!(feed_id = %feed.id, error = %e, "Error marking the feed as fetched");
            return Err(IngestError::MarkFetched(e));
        }

        let mut cancel = shutdown.clone();
        let fetched = tokio::select! {
            biased;
            _ = cancel.triggered() => Err(FetchError::Cancelled),
            result = self.source.fetch(&feed.url) => result,
        };
        let body = match fetched {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(feed_id = %feed.id, url = %feed.url, error = %e, "Couldn't fetch feed");
                return Err(e.into());
            }
        };

        let document = match parse_document(&body) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(feed_id = %feed.id, url = %feed.url, error = %e, "Couldn't parse feed");
                return Err(e.into());
            }
        };

        let mut report = IngestReport {
            seen: document.items.len(),
            ..IngestReport::default()
        };

        for item in &document.items {
            if shutdown.is_triggered() {
                report.interrupted = true;
                break;
            }
            self.store_item(feed, item, &mut report).await;
        }

        tracing::info!(
            feed_id = %feed.id,
            feed = %feed.name,
            seen = report.seen,
            inserted = report.inserted,
            duplicates = report.duplicates,
            skipped = report.skipped_dates + report.missing_links + report.failed,
            interrupted = report.interrupted,
            "Collected posts from feed"
        );
        Ok(report)
    }

    async fn store_item(&self, feed: &Feed, item: &FetchedItem, report: &mut IngestReport) {
        let published = match parse_rfc1123(&item.pub_date) {
            Ok(ts) => ts,
            Err(e) => {
                tracing::warn!(feed_id = %feed.id, title = %item.title, error = %e, "Skipping item with unparsable pubDate");
                report.skipped_dates += 1;
                return;
            }
        };

        if item.link.is_empty() {
            tracing::warn!(feed_id = %feed.id, title = %item.title, "Skipping item without link");
            report.missing_links += 1;
            return;
        }

        let now = Utc::now().timestamp();
        let post = NewPost {
            id: Uuid::new_v4(),
            feed_id: feed.id,
            title: item.title.clone(),
            url: item.link.clone(),
            published_at: published.timestamp(),
            created_at: now,
            updated_at: now,
        };

        match self.store.create_post(&post).await {
            Ok(_) => {
                tracing::debug!(feed_id = %feed.id, title = %post.title, url = %post.url, "Found post");
                report.inserted += 1;
            }
            // Already stored on an earlier tick or by another feed
            Err(StoreError::UniqueViolation) => report.duplicates += 1,
            Err(e) => {
                tracing::warn!(feed_id = %feed.id, url = %post.url, error = %e, "Couldn't create post");
                report.failed += 1;
            }
        }
    }
}
