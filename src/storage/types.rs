use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::stats::EntryStatus;

// ============================================================================
// Error Types
// ============================================================================

/// Errors opening or migrating the entry store
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another process holds a lock on the database file
    #[error("The database is locked by another process. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// SQLITE_BUSY (5), SQLITE_LOCKED (6) and SQLITE_CANTOPEN (14) all surface
    /// as one of these messages.
    pub(crate) fn is_lock_message(message: &str) -> bool {
        let message = message.to_lowercase();
        message.contains("database is locked")
            || message.contains("database table is locked")
            || message.contains("sqlite_busy")
            || message.contains("sqlite_locked")
    }

    /// Map a sqlx error, recognizing lock contention
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let message = err.to_string();
        if Self::is_lock_message(&message)
            || message.to_lowercase().contains("unable to open database file")
        {
            return DatabaseError::InstanceLocked;
        }

        DatabaseError::Other(err)
    }
}

// ============================================================================
// Helper Types
// ============================================================================

/// `(count, newest)` of the global unread query
pub(crate) type GlobalStatRow = (i64, Option<i64>);

/// `(feed_id, count, newest)` of the per-feed unread query
pub(crate) type FeedStatRow = (i64, i64, Option<i64>);

/// `(category_id, title, count, newest)` of the per-category unread query
pub(crate) type CategoryStatRow = (i64, String, i64, Option<i64>);

/// An entry handed over by ingestion
#[derive(Debug, Clone)]
pub struct NewEntry {
    /// Deduplication key within a feed
    pub hash: String,
    pub title: String,
    pub url: Option<String>,
    pub status: EntryStatus,
    pub published_at: DateTime<Utc>,
}

// ============================================================================
// Data Structures
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub hide_globally: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Feed {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub title: String,
    pub feed_url: String,
    pub hide_globally: bool,
}
