use std::future::Future;

use super::types::{CategoryUnreadStat, FeedUnreadStat, GlobalUnreadStat, StoreError};

/// Read side of an entry store, as the unread aggregates consume it.
///
/// Each method is one logical read against one consistent snapshot of the
/// store, with the visibility rule applied. A read that succeeds with no
/// matching rows is not an error.
pub trait UnreadStatsStore: Send + Sync {
    /// Count and newest publication time of the user's visible unread entries.
    fn global_unread_stat(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<GlobalUnreadStat, StoreError>> + Send;

    /// Visible unread entries grouped by feed. Feeds without any are omitted.
    fn feed_unread_stats(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<FeedUnreadStat>, StoreError>> + Send;

    /// Visible unread entries grouped by category. Categories without any are omitted.
    fn category_unread_stats(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<CategoryUnreadStat>, StoreError>> + Send;
}
