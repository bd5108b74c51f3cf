//! Integration tests for visible unread statistics on the SQLite store.
//!
//! Each test creates its own in-memory SQLite database for isolation and
//! goes through the public aggregator, the way the CLI does.

use chrono::{DateTime, Utc};
use pretty_assertions::assert_eq;

use unreadstat::stats::{
    CategoryRecord, CategoryUnreadStat, EntryRecord, EntryStatus, FeedRecord, FeedUnreadStat,
    GlobalUnreadStat, MemoryStore, Snapshot, UnreadStats,
};
use unreadstat::storage::{Database, NewEntry};

fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

fn entries(prefix: &str, status: EntryStatus, published: &[i64]) -> Vec<NewEntry> {
    published
        .iter()
        .enumerate()
        .map(|(i, secs)| NewEntry {
            hash: format!("{prefix}-{i}"),
            title: format!("{prefix} entry {i}"),
            url: None,
            status,
            published_at: ts(*secs),
        })
        .collect()
}

async fn test_db() -> Database {
    Database::open(":memory:").await.unwrap()
}

fn sorted_feeds(mut stats: Vec<FeedUnreadStat>) -> Vec<FeedUnreadStat> {
    stats.sort_by_key(|s| s.feed_id);
    stats
}

fn sorted_categories(mut stats: Vec<CategoryUnreadStat>) -> Vec<CategoryUnreadStat> {
    stats.sort_by_key(|s| s.category_id);
    stats
}

/// C1 (shown) holds F1 (shown) and F2 (hidden); C2 (hidden) holds F3 (shown).
/// Unread: 2 in F1, 3 in F2, 5 in F3.
struct Scenario {
    db: Database,
    user: i64,
    c1: i64,
    c2: i64,
    f1: i64,
    f2: i64,
    f3: i64,
}

const T1: i64 = 1_700_000_000;
const T2: i64 = 1_700_000_600;

async fn scenario() -> Scenario {
    let db = test_db().await;
    let user = db.create_user("u").await.unwrap();

    let c1 = db.create_category(user, "Reading").await.unwrap();
    let c2 = db.create_category(user, "Muted").await.unwrap();
    db.set_category_hide_globally(user, c2, true).await.unwrap();

    let f1 = db
        .insert_feed(user, c1, "F1", "https://f1.example.com/rss")
        .await
        .unwrap();
    let f2 = db
        .insert_feed(user, c1, "F2", "https://f2.example.com/rss")
        .await
        .unwrap();
    let f3 = db
        .insert_feed(user, c2, "F3", "https://f3.example.com/rss")
        .await
        .unwrap();
    db.set_feed_hide_globally(user, f2, true).await.unwrap();

    // Excluded entries are newer than anything in F1 so a leak shows up in `newest`
    db.insert_entries(f1, &entries("f1", EntryStatus::Unread, &[T1, T2]))
        .await
        .unwrap();
    db.insert_entries(f2, &entries("f2", EntryStatus::Unread, &[T2 + 1, T2 + 2, T2 + 3]))
        .await
        .unwrap();
    db.insert_entries(
        f3,
        &entries("f3", EntryStatus::Unread, &[T2 + 10, T2 + 11, T2 + 12, T2 + 13, T2 + 14]),
    )
    .await
    .unwrap();

    Scenario {
        db,
        user,
        c1,
        c2,
        f1,
        f2,
        f3,
    }
}

// ============================================================================
// Worked Example
// ============================================================================

#[tokio::test]
async fn test_example_scenario() {
    let s = scenario().await;
    let stats = UnreadStats::new(s.db.clone());

    assert_eq!(
        stats.compute_global_unread_stat(s.user).await.unwrap(),
        GlobalUnreadStat {
            count: 2,
            newest: Some(ts(T2)),
        }
    );
    assert_eq!(
        stats.compute_feed_unread_stats(s.user).await.unwrap(),
        vec![FeedUnreadStat {
            feed_id: s.f1,
            count: 2,
            newest: ts(T2),
        }]
    );
    assert_eq!(
        stats.compute_category_unread_stats(s.user).await.unwrap(),
        vec![CategoryUnreadStat {
            category_id: s.c1,
            title: "Reading".to_string(),
            count: 2,
            newest: ts(T2),
        }]
    );
}

// ============================================================================
// Absence of Data
// ============================================================================

#[tokio::test]
async fn test_user_without_entries_gets_zero_and_empty_lists() {
    let db = test_db().await;
    let user = db.create_user("empty").await.unwrap();
    let category = db.create_category(user, "All").await.unwrap();
    db.insert_feed(user, category, "Quiet", "https://quiet.example.com/rss")
        .await
        .unwrap();
    let stats = UnreadStats::new(db);

    let global = stats.compute_global_unread_stat(user).await.unwrap();
    assert_eq!(global, GlobalUnreadStat::default());
    assert!(global.newest.is_none());
    assert!(stats.compute_feed_unread_stats(user).await.unwrap().is_empty());
    assert!(stats
        .compute_category_unread_stats(user)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_unknown_user_is_not_an_error() {
    let stats = UnreadStats::new(test_db().await);
    let summary = stats.compute_summary(424242).await.unwrap();
    assert_eq!(summary.global, GlobalUnreadStat::default());
    assert!(summary.feeds.is_empty());
    assert!(summary.categories.is_empty());
}

#[tokio::test]
async fn test_feed_with_only_read_entries_is_absent() {
    let db = test_db().await;
    let user = db.create_user("u").await.unwrap();
    let category = db.create_category(user, "All").await.unwrap();
    let busy = db
        .insert_feed(user, category, "Busy", "https://busy.example.com/rss")
        .await
        .unwrap();
    let caught_up = db
        .insert_feed(user, category, "Caught up", "https://done.example.com/rss")
        .await
        .unwrap();

    db.insert_entries(busy, &entries("b", EntryStatus::Unread, &[T1]))
        .await
        .unwrap();
    db.insert_entries(caught_up, &entries("c", EntryStatus::Read, &[T2]))
        .await
        .unwrap();
    db.insert_entries(caught_up, &entries("r", EntryStatus::Removed, &[T2]))
        .await
        .unwrap();

    let stats = UnreadStats::new(db);
    let feeds = stats.compute_feed_unread_stats(user).await.unwrap();
    assert_eq!(feeds.len(), 1);
    assert_eq!(feeds[0].feed_id, busy);
    assert!(feeds.iter().all(|f| f.count >= 1));
    assert!(!feeds.iter().any(|f| f.feed_id == caught_up));
}

// ============================================================================
// Visibility Exclusion
// ============================================================================

#[tokio::test]
async fn test_hidden_feed_excluded_from_all_aggregates() {
    let s = scenario().await;
    let stats = UnreadStats::new(s.db.clone());

    let summary = stats.compute_summary(s.user).await.unwrap();
    assert!(!summary.feeds.iter().any(|f| f.feed_id == s.f2));
    // F2's entries would have made C1 count 5
    assert_eq!(summary.categories[0].count, 2);
    assert_eq!(summary.global.count, 2);
}

#[tokio::test]
async fn test_hidden_category_dominates_visible_feed() {
    let s = scenario().await;
    let stats = UnreadStats::new(s.db.clone());

    let summary = stats.compute_summary(s.user).await.unwrap();
    assert!(!summary.feeds.iter().any(|f| f.feed_id == s.f3));
    assert!(!summary.categories.iter().any(|c| c.category_id == s.c2));
}

#[tokio::test]
async fn test_unhiding_restores_entries() {
    let s = scenario().await;
    let stats = UnreadStats::new(s.db.clone());

    s.db.set_feed_hide_globally(s.user, s.f2, false).await.unwrap();
    s.db.set_category_hide_globally(s.user, s.c2, false)
        .await
        .unwrap();

    let global = stats.compute_global_unread_stat(s.user).await.unwrap();
    assert_eq!(global.count, 10);
    assert_eq!(global.newest, Some(ts(T2 + 14)));

    let feeds = sorted_feeds(stats.compute_feed_unread_stats(s.user).await.unwrap());
    let counts: Vec<(i64, u64)> = feeds.iter().map(|f| (f.feed_id, f.count)).collect();
    assert_eq!(counts, vec![(s.f1, 2), (s.f2, 3), (s.f3, 5)]);

    let categories =
        sorted_categories(stats.compute_category_unread_stats(s.user).await.unwrap());
    let counts: Vec<(i64, u64)> = categories
        .iter()
        .map(|c| (c.category_id, c.count))
        .collect();
    assert_eq!(counts, vec![(s.c1, 5), (s.c2, 5)]);
}

#[tokio::test]
async fn test_other_users_entries_are_excluded() {
    let s = scenario().await;
    let other = s.db.create_user("other").await.unwrap();
    let category = s.db.create_category(other, "Reading").await.unwrap();
    let feed = s
        .db
        .insert_feed(other, category, "Theirs", "https://f1.example.com/rss")
        .await
        .unwrap();
    s.db.insert_entries(feed, &entries("o", EntryStatus::Unread, &[T2 + 100]))
        .await
        .unwrap();

    let stats = UnreadStats::new(s.db.clone());
    let mine = stats.compute_global_unread_stat(s.user).await.unwrap();
    assert_eq!(mine.count, 2);
    assert_eq!(mine.newest, Some(ts(T2)));

    let theirs = stats.compute_global_unread_stat(other).await.unwrap();
    assert_eq!(theirs.count, 1);
    assert_eq!(theirs.newest, Some(ts(T2 + 100)));
}

// ============================================================================
// Newest and Sums
// ============================================================================

#[tokio::test]
async fn test_newest_follows_status_changes() {
    let db = test_db().await;
    let user = db.create_user("u").await.unwrap();
    let category = db.create_category(user, "All").await.unwrap();
    let feed = db
        .insert_feed(user, category, "Feed", "https://example.com/rss")
        .await
        .unwrap();

    let old = db
        .insert_entry(feed, &entries("old", EntryStatus::Unread, &[T1])[0])
        .await
        .unwrap();
    let new = db
        .insert_entry(feed, &entries("new", EntryStatus::Unread, &[T2])[0])
        .await
        .unwrap();
    let stats = UnreadStats::new(db.clone());

    assert_eq!(
        stats.compute_global_unread_stat(user).await.unwrap().newest,
        Some(ts(T2))
    );

    db.set_entries_status(user, &[new], EntryStatus::Read)
        .await
        .unwrap();
    let feeds = stats.compute_feed_unread_stats(user).await.unwrap();
    assert_eq!(feeds[0].count, 1);
    assert_eq!(feeds[0].newest, ts(T1));

    db.set_entries_status(user, &[old], EntryStatus::Removed)
        .await
        .unwrap();
    assert_eq!(
        stats.compute_global_unread_stat(user).await.unwrap(),
        GlobalUnreadStat::default()
    );
    assert!(stats.compute_feed_unread_stats(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sub_second_newest_matches_memory_store() {
    let published = DateTime::parse_from_rfc3339("2023-11-14T22:13:20.750Z")
        .unwrap()
        .with_timezone(&Utc);

    let db = test_db().await;
    let user = db.create_user("u").await.unwrap();
    let category = db.create_category(user, "All").await.unwrap();
    let feed = db
        .insert_feed(user, category, "Feed", "https://example.com/rss")
        .await
        .unwrap();
    db.insert_entry(
        feed,
        &NewEntry {
            hash: "precise".to_string(),
            title: "Precise".to_string(),
            url: None,
            status: EntryStatus::Unread,
            published_at: published,
        },
    )
    .await
    .unwrap();

    let mut snapshot = Snapshot::new();
    snapshot.insert_category(CategoryRecord {
        id: category,
        user_id: user,
        title: "All".to_string(),
        hide_globally: false,
    });
    snapshot.insert_feed(FeedRecord {
        id: feed,
        user_id: user,
        category_id: category,
        hide_globally: false,
    });
    snapshot.insert_entry(EntryRecord {
        id: 1,
        user_id: user,
        feed_id: feed,
        status: EntryStatus::Unread,
        published_at: published,
    });

    let sql = UnreadStats::new(db).compute_summary(user).await.unwrap();
    let memory = UnreadStats::new(MemoryStore::new(snapshot))
        .compute_summary(user)
        .await
        .unwrap();

    assert_eq!(sql.global.newest, Some(published));
    assert_eq!(sql, memory);
}

#[tokio::test]
async fn test_sums_agree_with_global() {
    let db = test_db().await;
    let user = db.create_user("u").await.unwrap();
    let mut expected = 0;

    for c in 0..3 {
        let category = db.create_category(user, &format!("Cat {c}")).await.unwrap();
        for f in 0..3 {
            let feed = db
                .insert_feed(
                    user,
                    category,
                    &format!("Feed {c}.{f}"),
                    &format!("https://{c}-{f}.example.com/rss"),
                )
                .await
                .unwrap();
            let published: Vec<i64> = (0..(c * 3 + f)).map(|i| T1 + i * 60).collect();
            expected += published.len() as u64;
            db.insert_entries(feed, &entries("e", EntryStatus::Unread, &published))
                .await
                .unwrap();
            db.insert_entries(feed, &entries("read", EntryStatus::Read, &[T2]))
                .await
                .unwrap();
        }
    }

    let stats = UnreadStats::new(db);
    let summary = stats.compute_summary(user).await.unwrap();

    assert_eq!(summary.global.count, expected);
    assert_eq!(summary.feeds.iter().map(|f| f.count).sum::<u64>(), expected);
    assert_eq!(
        summary.categories.iter().map(|c| c.count).sum::<u64>(),
        expected
    );
    // Feed "0.0" has no unread entries
    assert_eq!(summary.feeds.len(), 8);

    let max_feed = summary.feeds.iter().map(|f| f.newest).max();
    assert_eq!(summary.global.newest, max_feed);
}

#[tokio::test]
async fn test_calls_are_idempotent() {
    let s = scenario().await;
    let stats = UnreadStats::new(s.db.clone());

    let first = stats.compute_summary(s.user).await.unwrap();
    let second = stats.compute_summary(s.user).await.unwrap();
    assert_eq!(first.global, second.global);
    assert_eq!(sorted_feeds(first.feeds), sorted_feeds(second.feeds));
    assert_eq!(
        sorted_categories(first.categories),
        sorted_categories(second.categories)
    );
}

#[tokio::test]
async fn test_concurrent_calls_agree() {
    let s = scenario().await;
    let stats = std::sync::Arc::new(UnreadStats::new(s.db.clone()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let stats = stats.clone();
            let user = s.user;
            tokio::spawn(async move { stats.compute_global_unread_stat(user).await })
        })
        .collect();

    for handle in handles {
        let stat = handle.await.unwrap().unwrap();
        assert_eq!(stat.count, 2);
    }
}

#[tokio::test]
async fn test_category_title_is_read_each_call() {
    let s = scenario().await;
    let stats = UnreadStats::new(s.db.clone());

    s.db.rename_category(s.user, s.c1, "Renamed").await.unwrap();
    let categories = stats.compute_category_unread_stats(s.user).await.unwrap();
    assert_eq!(categories[0].title, "Renamed");
}

// ============================================================================
// Clearing Feed Entries
// ============================================================================

#[tokio::test]
async fn test_clearing_feed_entries_drops_it_from_aggregates() {
    let s = scenario().await;
    let stats = UnreadStats::new(s.db.clone());

    assert!(s.db.feed_exists(s.user, s.f1).await.unwrap());
    assert_eq!(s.db.remove_feed_entries(s.user, s.f1).await.unwrap(), 2);

    let summary = stats.compute_summary(s.user).await.unwrap();
    assert_eq!(summary.global, GlobalUnreadStat::default());
    assert!(summary.feeds.is_empty());
    assert!(summary.categories.is_empty());
}
