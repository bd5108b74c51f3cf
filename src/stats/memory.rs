//! In-memory entry store.
//!
//! Holds categories, feeds and entries in a [`Snapshot`] behind a read/write
//! lock. Every aggregate takes a single read guard, so count, newest and
//! grouping all come from the same state.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::aggregate;
use super::store::UnreadStatsStore;
use super::types::{CategoryUnreadStat, FeedUnreadStat, GlobalUnreadStat, StoreError};
use super::visibility::{is_visible, CategoryRef, EntryRef, EntryStatus, FeedRef, VisibleEntry};

// ============================================================================
// Records
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryRecord {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub hide_globally: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRecord {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub hide_globally: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    pub id: i64,
    pub user_id: i64,
    pub feed_id: i64,
    pub status: EntryStatus,
    pub published_at: DateTime<Utc>,
}

// ============================================================================
// Snapshot
// ============================================================================

/// Point-in-time contents of the store.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    categories: BTreeMap<i64, CategoryRecord>,
    feeds: BTreeMap<i64, FeedRecord>,
    entries: BTreeMap<i64, EntryRecord>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a category by id.
    pub fn insert_category(&mut self, category: CategoryRecord) {
        self.categories.insert(category.id, category);
    }

    /// Insert or replace a feed by id.
    pub fn insert_feed(&mut self, feed: FeedRecord) {
        self.feeds.insert(feed.id, feed);
    }

    /// Insert or replace an entry by id.
    pub fn insert_entry(&mut self, entry: EntryRecord) {
        self.entries.insert(entry.id, entry);
    }

    /// Returns false if the entry does not exist.
    pub fn set_entry_status(&mut self, entry_id: i64, status: EntryStatus) -> bool {
        match self.entries.get_mut(&entry_id) {
            Some(entry) => {
                entry.status = status;
                true
            }
            None => false,
        }
    }

    pub fn set_feed_hide_globally(&mut self, feed_id: i64, hide: bool) -> bool {
        match self.feeds.get_mut(&feed_id) {
            Some(feed) => {
                feed.hide_globally = hide;
                true
            }
            None => false,
        }
    }

    pub fn set_category_hide_globally(&mut self, category_id: i64, hide: bool) -> bool {
        match self.categories.get_mut(&category_id) {
            Some(category) => {
                category.hide_globally = hide;
                true
            }
            None => false,
        }
    }

    pub fn set_category_title(&mut self, category_id: i64, title: &str) -> bool {
        match self.categories.get_mut(&category_id) {
            Some(category) => {
                category.title = title.to_owned();
                true
            }
            None => false,
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &EntryRecord> {
        self.entries.values()
    }

    /// Join the user's entries to their feed and category and keep the
    /// visible ones.
    ///
    /// Only the user's own entries are joined, so a dangling reference in
    /// another user's data cannot fail this user's read.
    fn visible_unread(&self, user_id: i64) -> Result<Vec<VisibleEntry<'_>>, StoreError> {
        let mut visible = Vec::new();

        for entry in self.entries.values().filter(|e| e.user_id == user_id) {
            let feed = self.feeds.get(&entry.feed_id).ok_or_else(|| {
                StoreError::Decode(format!(
                    "entry {} references unknown feed {}",
                    entry.id, entry.feed_id
                ))
            })?;
            let category = self.categories.get(&feed.category_id).ok_or_else(|| {
                StoreError::Decode(format!(
                    "feed {} references unknown category {}",
                    feed.id, feed.category_id
                ))
            })?;

            let passes = is_visible(
                EntryRef {
                    user_id: entry.user_id,
                    status: entry.status,
                },
                FeedRef {
                    hide_globally: feed.hide_globally,
                },
                CategoryRef {
                    hide_globally: category.hide_globally,
                },
                user_id,
            );

            if passes {
                visible.push(VisibleEntry {
                    feed_id: feed.id,
                    category_id: category.id,
                    category_title: &category.title,
                    published_at: entry.published_at,
                });
            }
        }

        Ok(visible)
    }
}

// ============================================================================
// Memory Store
// ============================================================================

/// Shareable handle to an in-memory [`Snapshot`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    snapshot: Arc<RwLock<Snapshot>>,
}

impl MemoryStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Mutate the contents under the write lock.
    pub async fn update<R>(&self, f: impl FnOnce(&mut Snapshot) -> R) -> R {
        let mut snapshot = self.snapshot.write().await;
        f(&mut snapshot)
    }

    /// Swap in new contents, returning the old ones.
    pub async fn replace(&self, snapshot: Snapshot) -> Snapshot {
        let mut current = self.snapshot.write().await;
        std::mem::replace(&mut *current, snapshot)
    }
}

impl UnreadStatsStore for MemoryStore {
    fn global_unread_stat(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<GlobalUnreadStat, StoreError>> + Send {
        async move {
            let snapshot = self.snapshot.read().await;
            Ok(aggregate::global(snapshot.visible_unread(user_id)?))
        }
    }

    fn feed_unread_stats(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<FeedUnreadStat>, StoreError>> + Send {
        async move {
            let snapshot = self.snapshot.read().await;
            Ok(aggregate::by_feed(snapshot.visible_unread(user_id)?))
        }
    }

    fn category_unread_stats(
        &self,
        user_id: i64,
    ) -> impl Future<Output = Result<Vec<CategoryUnreadStat>, StoreError>> + Send {
        async move {
            let snapshot = self.snapshot.read().await;
            Ok(aggregate::by_category(snapshot.visible_unread(user_id)?))
        }
    }
}
