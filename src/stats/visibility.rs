//! The visibility rule shared by every unread aggregate.
//!
//! An entry counts toward a user's visible unread set iff it belongs to the
//! user, is unread, and neither its feed nor its feed's category is hidden
//! globally. [`is_visible`] is the only in-memory rendition of that rule and
//! [`VISIBLE_UNREAD_JOIN`] is the only SQL rendition; every aggregate is built
//! on one of the two.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Entry Status
// ============================================================================

/// Read state of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Unread,
    Read,
    Removed,
}

impl EntryStatus {
    /// Column value stored in `entries.status`.
    pub const fn as_str(self) -> &'static str {
        match self {
            EntryStatus::Unread => "unread",
            EntryStatus::Read => "read",
            EntryStatus::Removed => "removed",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unread" => Ok(EntryStatus::Unread),
            "read" => Ok(EntryStatus::Read),
            "removed" => Ok(EntryStatus::Removed),
            other => Err(format!("unknown entry status: {other:?}")),
        }
    }
}

// ============================================================================
// Entity Views
// ============================================================================

/// The fields of an entry the predicate looks at.
#[derive(Debug, Clone, Copy)]
pub struct EntryRef {
    pub user_id: i64,
    pub status: EntryStatus,
}

/// The fields of a feed the predicate looks at.
#[derive(Debug, Clone, Copy)]
pub struct FeedRef {
    pub hide_globally: bool,
}

/// The fields of a category the predicate looks at.
#[derive(Debug, Clone, Copy)]
pub struct CategoryRef {
    pub hide_globally: bool,
}

/// Decide whether an entry belongs to `user_id`'s visible unread set.
///
/// The category flag dominates: a hidden category hides every feed in it,
/// whatever the feed's own flag says.
pub fn is_visible(entry: EntryRef, feed: FeedRef, category: CategoryRef, user_id: i64) -> bool {
    entry.user_id == user_id
        && entry.status == EntryStatus::Unread
        && !feed.hide_globally
        && !category.hide_globally
}

/// SQL form of [`is_visible`]: the Entries x Feeds x Categories join with the
/// predicate applied. Binds `user_id` then the unread status string.
pub const VISIBLE_UNREAD_JOIN: &str = r#"
    FROM entries e
        JOIN feeds f ON f.id = e.feed_id
        JOIN categories c ON c.id = f.category_id
    WHERE
        e.user_id = ? AND e.status = ? AND
        f.hide_globally = 0 AND
        c.hide_globally = 0
"#;

// ============================================================================
// Visible Entry
// ============================================================================

/// One entry that passed the predicate, with the grouping keys the
/// aggregates need already resolved through the join.
#[derive(Debug, Clone, Copy)]
pub struct VisibleEntry<'a> {
    pub feed_id: i64,
    pub category_id: i64,
    pub category_title: &'a str,
    pub published_at: DateTime<Utc>,
}
