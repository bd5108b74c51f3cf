use anyhow::{bail, Result};

use super::schema::Database;
use super::types::Feed;

impl Database {
    // ========================================================================
    // Feed Operations
    // ========================================================================

    /// Subscribe `user_id` to a feed inside one of their categories.
    ///
    /// A second subscription to the same URL updates the title and category
    /// of the existing feed and returns its ID.
    pub async fn insert_feed(
        &self,
        user_id: i64,
        category_id: i64,
        title: &str,
        feed_url: &str,
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        // Entries inherit the feed's owner, so the category must share it
        let owner: Option<(i64,)> = sqlx::query_as("SELECT user_id FROM categories WHERE id = ?")
            .bind(category_id)
            .fetch_optional(&mut *tx)
            .await?;
        match owner {
            Some((owner,)) if owner == user_id => {}
            _ => bail!("Category {} does not belong to user {}", category_id, user_id),
        }

        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO feeds (user_id, category_id, title, feed_url)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id, feed_url) DO UPDATE SET
                title = excluded.title,
                category_id = excluded.category_id
            RETURNING id
        "#,
        )
        .bind(user_id)
        .bind(category_id)
        .bind(title)
        .bind(feed_url)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.0)
    }

    /// Hide or show a feed in the user's unread aggregates.
    /// Returns false if the user owns no such feed.
    pub async fn set_feed_hide_globally(&self, user_id: i64, feed_id: i64, hide: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE feeds SET hide_globally = ? WHERE id = ? AND user_id = ?")
            .bind(hide)
            .bind(feed_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All feeds of a user, ordered by title
    pub async fn get_feeds(&self, user_id: i64) -> Result<Vec<Feed>> {
        let feeds = sqlx::query_as::<_, Feed>(
            r#"
            SELECT id, user_id, category_id, title, feed_url, hide_globally
            FROM feeds
            WHERE user_id = ?
            ORDER BY title
        "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(feeds)
    }

    // ========================================================================
    // Maintenance Operations
    // ========================================================================

    /// Whether `feed_id` exists and belongs to `user_id`
    pub async fn feed_exists(&self, user_id: i64, feed_id: i64) -> Result<bool> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM feeds WHERE id = ? AND user_id = ?)")
                .bind(feed_id)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0)
    }

    /// Delete every entry of a feed, whatever its status. Returns the number removed.
    ///
    /// The feed itself is kept. Callers check ownership with [`Self::feed_exists`] first.
    pub async fn remove_feed_entries(&self, user_id: i64, feed_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM entries WHERE feed_id = ? AND user_id = ?")
            .bind(feed_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        tracing::debug!(
            user_id,
            feed_id,
            removed = result.rows_affected(),
            "Removed feed entries"
        );
        Ok(result.rows_affected())
    }
}
