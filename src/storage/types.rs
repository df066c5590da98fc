use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Error Types
// ============================================================================

/// Errors surfaced by the entry store.
///
/// Constraint outcomes are classified from the database error kind so callers
/// can branch on them without inspecting message text.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A UNIQUE constraint rejected the write (e.g. a post URL already stored)
    #[error("Record already exists")]
    UniqueViolation,

    /// The addressed record does not exist
    #[error("Record not found")]
    NotFound,

    /// Schema creation failed while opening the database
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Any other database failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::UniqueViolation
            }
            other => StoreError::Database(other),
        }
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// Owner of a set of feed subscriptions.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A subscribed RSS source.
///
/// All timestamps are unix seconds (UTC). `last_fetched_at` is `None` until
/// the first ingestion attempt and never moves backwards afterwards.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Feed {
    pub id: Uuid,
    pub account_id: Uuid,
    pub name: String,
    pub url: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub last_fetched_at: Option<i64>,
}

/// One ingested entry, unique by `url`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Post {
    pub id: Uuid,
    pub feed_id: Uuid,
    pub title: String,
    pub url: String,
    pub published_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Parameters for inserting a post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub id: Uuid,
    pub feed_id: Uuid,
    pub title: String,
    pub url: String,
    pub published_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
}
