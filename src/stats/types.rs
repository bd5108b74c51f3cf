use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// Result Types
// ============================================================================

/// Unread count and newest publication time over a user's whole reading list.
///
/// `newest` is `None` exactly when `count` is zero.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct GlobalUnreadStat {
    pub count: u64,
    pub newest: Option<DateTime<Utc>>,
}

impl GlobalUnreadStat {
    pub fn has_unread(&self) -> bool {
        self.count > 0
    }
}

/// Unread count for one feed. Only feeds with at least one visible unread
/// entry are ever reported, so `count >= 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedUnreadStat {
    pub feed_id: i64,
    pub count: u64,
    pub newest: DateTime<Utc>,
}

/// Unread count for one category. `title` is the value read during the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryUnreadStat {
    pub category_id: i64,
    pub title: String,
    pub count: u64,
    pub newest: DateTime<Utc>,
}

/// All three aggregates for one user.
///
/// Each part is its own read; the parts are not guaranteed to come from the
/// same snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnreadSummary {
    pub global: GlobalUnreadStat,
    pub feeds: Vec<FeedUnreadStat>,
    pub categories: Vec<CategoryUnreadStat>,
}

// ============================================================================
// Error Types
// ============================================================================

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Which aggregate was being computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Global,
    Feed,
    Category,
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Aggregate::Global => "global",
            Aggregate::Feed => "feed",
            Aggregate::Category => "category",
        })
    }
}

/// Failure reported by an entry store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or the read could not execute
    #[error("store access failed: {0}")]
    Access(#[source] BoxError),

    /// A returned row could not be interpreted
    #[error("malformed row: {0}")]
    Decode(String),
}

impl StoreError {
    /// Classify a sqlx error as a decode or an access failure.
    pub fn from_sqlx(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_)
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnIndexOutOfBounds { .. }
            | sqlx::Error::TypeNotFound { .. } => StoreError::Decode(err.to_string()),
            other => StoreError::Access(Box::new(other)),
        }
    }
}

/// Failure of one aggregation call, tagged with the aggregate it belongs to.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("unable to fetch {aggregate} unread statistics: {source}")]
    StoreAccess {
        aggregate: Aggregate,
        #[source]
        source: BoxError,
    },

    #[error("unable to decode {aggregate} unread statistics: {reason}")]
    RowDecode { aggregate: Aggregate, reason: String },
}

impl StatsError {
    pub(crate) fn from_store(aggregate: Aggregate, err: StoreError) -> Self {
        match err {
            StoreError::Access(source) => StatsError::StoreAccess { aggregate, source },
            StoreError::Decode(reason) => StatsError::RowDecode { aggregate, reason },
        }
    }

    pub fn aggregate(&self) -> Aggregate {
        match self {
            StatsError::StoreAccess { aggregate, .. } | StatsError::RowDecode { aggregate, .. } => {
                *aggregate
            }
        }
    }

    pub fn is_decode_failure(&self) -> bool {
        matches!(self, StatsError::RowDecode { .. })
    }
}
