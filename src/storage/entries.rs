use anyhow::{anyhow, Result};
use sqlx::QueryBuilder;

use super::schema::Database;
use super::types::NewEntry;
use crate::stats::EntryStatus;

impl Database {
    // ========================================================================
    // Entry Operations
    // ========================================================================

    /// Owner of a feed; entries are always stored under it.
    async fn feed_owner<'e, E>(executor: E, feed_id: i64) -> Result<i64>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        let row: Option<(i64,)> = sqlx::query_as("SELECT user_id FROM feeds WHERE id = ?")
            .bind(feed_id)
            .fetch_optional(executor)
            .await?;
        row.map(|(user_id,)| user_id)
            .ok_or_else(|| anyhow!("Feed {} does not exist", feed_id))
    }

    /// Insert a single entry and return its ID.
    ///
    /// An entry with the same hash in the same feed is updated in place
    /// (title, url, published_at); its status is left alone.
    pub async fn insert_entry(&self, feed_id: i64, entry: &NewEntry) -> Result<i64> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;
        let user_id = Self::feed_owner(&mut *tx, feed_id).await?;

        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO entries (user_id, feed_id, hash, title, url, status, published_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(feed_id, hash) DO UPDATE SET
                title = excluded.title,
                url = excluded.url,
                published_at = excluded.published_at
            RETURNING id
        "#,
        )
        .bind(user_id)
        .bind(feed_id)
        .bind(&entry.hash)
        .bind(&entry.title)
        .bind(&entry.url)
        .bind(entry.status.as_str())
        .bind(entry.published_at.timestamp_micros())
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.0)
    }

    /// Insert entries for a feed, returning how many were new.
    ///
    /// Batches of 100 keep us under SQLite's 999 parameter limit
    /// (8 columns * 100 = 800). Already known hashes are skipped.
    pub async fn insert_entries(&self, feed_id: i64, entries: &[NewEntry]) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }

        const BATCH_SIZE: usize = 100;
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;
        let user_id = Self::feed_owner(&mut *tx, feed_id).await?;
        let mut inserted = 0;

        for chunk in entries.chunks(BATCH_SIZE) {
            let mut builder: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(
                "INSERT OR IGNORE INTO entries \
                 (user_id, feed_id, hash, title, url, status, published_at, created_at) ",
            );

            builder.push_values(chunk, |mut b, entry| {
                b.push_bind(user_id)
                    .push_bind(feed_id)
                    .push_bind(&entry.hash)
                    .push_bind(&entry.title)
                    .push_bind(&entry.url)
                    .push_bind(entry.status.as_str())
                    .push_bind(entry.published_at.timestamp_micros())
                    .push_bind(now);
            });

            let result = builder.build().execute(&mut *tx).await?;
            inserted += result.rows_affected() as usize;
        }

        tx.commit().await?;

        tracing::debug!(feed_id, total = entries.len(), inserted, "Inserted entries");
        Ok(inserted)
    }

    /// Set the status of the given entries of a user. Returns rows changed.
    pub async fn set_entries_status(
        &self,
        user_id: i64,
        entry_ids: &[i64],
        status: EntryStatus,
    ) -> Result<u64> {
        if entry_ids.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("UPDATE entries SET status = ");
        builder.push_bind(status.as_str());
        builder.push(" WHERE user_id = ");
        builder.push_bind(user_id);
        builder.push(" AND id IN (");
        let mut separated = builder.separated(", ");
        for id in entry_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    /// Status of one entry, if it exists
    pub async fn entry_status(&self, entry_id: i64) -> Result<Option<EntryStatus>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT status FROM entries WHERE id = ?")
            .bind(entry_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|(status,)| status.parse::<EntryStatus>().map_err(|e| anyhow!(e)))
            .transpose()
    }

    /// Number of entries in a feed, any status
    pub async fn count_feed_entries(&self, feed_id: i64) -> Result<i64> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM entries WHERE feed_id = ?")
            .bind(feed_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}
