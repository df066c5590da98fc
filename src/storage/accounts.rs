use uuid::Uuid;

use super::schema::Database;
use super::types::{Account, StoreError};

impl Database {
    // ========================================================================
    // Account Operations
    // ========================================================================

    /// Create an account that can own feed subscriptions
    pub async fn create_account(&self, name: &str) -> Result<Account, StoreError> {
        let now = chrono::Utc::now().timestamp();
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, name, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, name, created_at, updated_at
        "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(account_id = %account.id, name = %account.name, "Created account");
        Ok(account)
    }

    /// Look up an account by id
    pub async fn get_account(&self, account_id: Uuid) -> Result<Account, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, name, created_at, updated_at FROM accounts WHERE id = ?",
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::{Database, StoreError};

    #[tokio::test]
    async fn test_create_and_get_account() {
        let db = Database::open(":memory:").await.unwrap();
        let created = db.create_account("alice").await.unwrap();
        assert_eq!(created.name, "alice");
        assert_eq!(created.created_at, created.updated_at);

        let fetched = db.get_account(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_get_missing_account_is_not_found() {
        let db = Database::open(":memory:").await.unwrap();
        let result = db.get_account(uuid::Uuid::new_v4()).await;
        assert!(matches!(result, Err(StoreError::NotFound)));
    }
}
