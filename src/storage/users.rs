use anyhow::{bail, Result};

use super::schema::Database;

impl Database {
    // ========================================================================
    // User Operations
    // ========================================================================

    /// Create a user, returning its ID. Usernames are trimmed and must be unique.
    pub async fn create_user(&self, username: &str) -> Result<i64> {
        let username = username.trim();
        if username.is_empty() {
            bail!("Username cannot be empty or whitespace-only");
        }

        let row: (i64,) = sqlx::query_as("INSERT INTO users (username) VALUES (?) RETURNING id")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.0)
    }

    /// Look up a user ID by username
    pub async fn user_id_by_name(&self, username: &str) -> Result<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(id,)| id))
    }

    /// Resolve a CLI `--user` value: a username, or else a numeric user ID.
    ///
    /// A name wins over an ID that happens to look the same. Numeric IDs are
    /// passed through unchecked; an unknown ID simply has no unread entries.
    pub async fn resolve_user(&self, user: &str) -> Result<Option<i64>> {
        if let Some(id) = self.user_id_by_name(user).await? {
            return Ok(Some(id));
        }
        Ok(user.trim().parse::<i64>().ok())
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::Database;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_lookup_user() {
        let db = test_db().await;

        let id = db.create_user("  alice ").await.unwrap();
        assert!(id > 0);
        assert_eq!(db.user_id_by_name("alice").await.unwrap(), Some(id));
        assert_eq!(db.user_id_by_name("bob").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = test_db().await;

        db.create_user("alice").await.unwrap();
        assert!(db.create_user("alice").await.is_err());
    }

    #[tokio::test]
    async fn test_empty_username_rejected() {
        let db = test_db().await;

        let result = db.create_user("   ").await;
        assert!(result.unwrap_err().to_string().contains("empty"));
    }

    #[tokio::test]
    async fn test_resolve_user_by_name_or_id() {
        let db = test_db().await;
        let alice = db.create_user("alice").await.unwrap();
        let numeric = db.create_user("1000").await.unwrap();

        assert_eq!(db.resolve_user("alice").await.unwrap(), Some(alice));
        assert_eq!(db.resolve_user(" 77 ").await.unwrap(), Some(77));
        assert_eq!(db.resolve_user("1000").await.unwrap(), Some(numeric));
        assert_eq!(db.resolve_user("nobody").await.unwrap(), None);
    }
}
