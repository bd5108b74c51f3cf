//! Visible unread statistics straight from SQL.
//!
//! Each aggregate is a single SELECT over the visible-unread join, so its
//! count, newest and grouping come from one consistent read.

use std::future::Future;

use chrono::{DateTime, Utc};

use super::schema::Database;
use super::types::{CategoryStatRow, FeedStatRow, GlobalStatRow};
use crate::stats::{
    CategoryUnreadStat, EntryStatus, FeedUnreadStat, GlobalUnreadStat, StoreError,
    UnreadStatsStore, VISIBLE_UNREAD_JOIN,
};

// ============================================================================
// Row Decoding
// ============================================================================

fn decode_count(count: i64) -> Result<u64, StoreError> {
    u64::try_from(count).map_err(|_| StoreError::Decode(format!("negative count {count}")))
}

/// `published_at` is stored as microseconds since the epoch.
fn decode_timestamp(micros: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| StoreError::Decode(format!("published_at {micros}us is out of range")))
}

/// A GROUP BY row always has at least one member and a newest timestamp.
fn decode_group(
    key: impl std::fmt::Display,
    count: i64,
    newest: Option<i64>,
) -> Result<(u64, DateTime<Utc>), StoreError> {
    let count = decode_count(count)?;
    if count == 0 {
        return Err(StoreError::Decode(format!("group {key} has no entries")));
    }
    let newest = newest
        .ok_or_else(|| StoreError::Decode(format!("group {key} has a null newest timestamp")))?;
    Ok((count, decode_timestamp(newest)?))
}

fn decode_global((count, newest): GlobalStatRow) -> Result<GlobalUnreadStat, StoreError> {
    let count = decode_count(count)?;
    let newest = match (count, newest) {
        (0, None) => None,
        (0, Some(_)) => {
            return Err(StoreError::Decode(
                "newest timestamp present without any entries".to_string(),
            ))
        }
        (_, None) => {
            return Err(StoreError::Decode(format!(
                "{count} entries without a newest timestamp"
            )))
        }
        (_, Some(micros)) => Some(decode_timestamp(micros)?),
    };
    Ok(GlobalUnreadStat { count, newest })
}

// ============================================================================
// Queries
// ============================================================================

impl Database {
    /// Unread count and newest publication time over the user's visible entries
    pub async fn visible_unread_global_stat(
        &self,
        user_id: i64,
    ) -> Result<GlobalUnreadStat, StoreError> {
        let sql = format!("SELECT COUNT(*), MAX(e.published_at) {VISIBLE_UNREAD_JOIN}");
        let row: GlobalStatRow = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(EntryStatus::Unread.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;

        let stat = decode_global(row)?;
        tracing::debug!(user_id, count = stat.count, "Fetched global unread stat");
        Ok(stat)
    }

    /// Unread counts grouped by feed; feeds with nothing visible are absent
    pub async fn visible_unread_feed_stats(
        &self,
        user_id: i64,
    ) -> Result<Vec<FeedUnreadStat>, StoreError> {
        let sql = format!(
            "SELECT e.feed_id, COUNT(*), MAX(e.published_at) {VISIBLE_UNREAD_JOIN} GROUP BY e.feed_id"
        );
        let rows: Vec<FeedStatRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(EntryStatus::Unread.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;

        let stats = rows
            .into_iter()
            .map(|(feed_id, count, newest)| {
                let (count, newest) = decode_group(format_args!("feed {feed_id}"), count, newest)?;
                Ok(FeedUnreadStat {
                    feed_id,
                    count,
                    newest,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        tracing::debug!(user_id, feeds = stats.len(), "Fetched feed unread stats");
        Ok(stats)
    }

    /// Unread counts grouped by category; categories with nothing visible are absent
    pub async fn visible_unread_category_stats(
        &self,
        user_id: i64,
    ) -> Result<Vec<CategoryUnreadStat>, StoreError> {
        let sql = format!(
            "SELECT c.id, c.title, COUNT(*), MAX(e.published_at) {VISIBLE_UNREAD_JOIN} GROUP BY c.id, c.title"
        );
        let rows: Vec<CategoryStatRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(EntryStatus::Unread.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::from_sqlx)?;

        let stats = rows
            .into_iter()
            .map(|(category_id, title, count, newest)| {
                let (count, newest) =
                    decode_group(format_args!("category {category_id}"), count, newest)?;
                Ok(CategoryUnreadStat {
                    category_id,
                    title,
                    count,
                    newest,
                })
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        tracing::debug!(user_id, categories = stats.len(), "Fetched category unread stats");
        Ok(stats)
    }
}

impl UnreadStatsStore for Database {
    fn global_unread_stat(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<GlobalUnreadStat, StoreError>> + Send {
        self.visible_unread_global_stat(user_id)
    }

    fn feed_unread_stats(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<FeedUnreadStat>, StoreError>> + Send {
        self.visible_unread_feed_stats(user_id)
    }

    fn category_unread_stats(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<CategoryUnreadStat>, StoreError>> + Send {
        self.visible_unread_category_stats(user_id)
    }
}
