//! Visible unread statistics at three granularities.
//!
//! [`UnreadStats`] wraps any [`UnreadStatsStore`] and exposes the global,
//! per-feed and per-category aggregates. All three apply the same visibility
//! rule ([`is_visible`] / [`VISIBLE_UNREAD_JOIN`]), so for one snapshot the
//! per-feed and per-category counts each sum to the global count.
//!
//! The aggregator is stateless: no cache, no lock, no logging, no retries.
//! Errors carry the aggregate they came from and are left to the caller.

mod aggregate;
mod memory;
mod store;
mod types;
mod visibility;

pub use memory::{CategoryRecord, EntryRecord, FeedRecord, MemoryStore, Snapshot};
pub use store::UnreadStatsStore;
pub use types::{
    Aggregate, BoxError, CategoryUnreadStat, FeedUnreadStat, GlobalUnreadStat, StatsError,
    StoreError, UnreadSummary,
};
pub use visibility::{
    is_visible, CategoryRef, EntryRef, EntryStatus, FeedRef, VisibleEntry, VISIBLE_UNREAD_JOIN,
};

/// Aggregator over an injected, read-only entry store.
#[derive(Debug, Clone)]
pub struct UnreadStats<S> {
    store: S,
}

impl<S: UnreadStatsStore> UnreadStats<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Number of visible unread entries and the newest publication time.
    ///
    /// With nothing unread, `count` is 0 and `newest` is `None`.
    pub async fn compute_global_unread_stat(
        &self,
        user_id: i64,
    ) -> Result<GlobalUnreadStat, StatsError> {
        self.store
            .global_unread_stat(user_id)
            .await
            .map_err(|e| StatsError::from_store(Aggregate::Global, e))
    }

    /// Visible unread counts per feed, in no particular order.
    ///
    /// A feed with nothing visible and unread is absent from the list.
    pub async fn compute_feed_unread_stats(
        &self,
        user_id: i64,
    ) -> Result<Vec<FeedUnreadStat>, StatsError> {
        self.store
            .feed_unread_stats(user_id)
            .await
            .map_err(|e| StatsError::from_store(Aggregate::Feed, e))
    }

    /// Visible unread counts per category, in no particular order.
    ///
    /// A category with nothing visible and unread is absent from the list.
    pub async fn compute_category_unread_stats(
        &self,
        user_id: i64,
    ) -> Result<Vec<CategoryUnreadStat>, StatsError> {
        self.store
            .category_unread_stats(user_id)
            .await
            .map_err(|e| StatsError::from_store(Aggregate::Category, e))
    }

    /// All three aggregates; the first failure fails the whole summary.
    ///
    /// The three reads are independent, so concurrent status changes may
    /// leave the parts out of step with each other.
    pub async fn compute_summary(&self, user_id: i64) -> Result<UnreadSummary, StatsError> {
        let (global, feeds, categories) = tokio::try_join!(
            self.compute_global_unread_stat(user_id),
            self.compute_feed_unread_stats(user_id),
            self.compute_category_unread_stats(user_id),
        )?;

        Ok(UnreadSummary {
            global,
            feeds,
            categories,
        })
    }
}
