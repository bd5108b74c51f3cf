//! Group-by over visible entries without a relational engine.
//!
//! Groups are created on their first visible record, so a key with no
//! visible entries never shows up in the output.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::types::{CategoryUnreadStat, FeedUnreadStat, GlobalUnreadStat};
use super::visibility::VisibleEntry;

/// Count and newest timestamp of a non-empty group.
#[derive(Debug, Clone, Copy)]
struct Tally {
    count: u64,
    newest: DateTime<Utc>,
}

impl Tally {
    fn first(published_at: DateTime<Utc>) -> Self {
        Self {
            count: 1,
            newest: published_at,
        }
    }

    fn add(&mut self, published_at: DateTime<Utc>) {
        self.count += 1;
        self.newest = self.newest.max(published_at);
    }
}

fn tally_into<K: Ord>(groups: &mut BTreeMap<K, Tally>, key: K, published_at: DateTime<Utc>) {
    groups
        .entry(key)
        .and_modify(|t| t.add(published_at))
        .or_insert_with(|| Tally::first(published_at));
}

/// Scalar count and max publication time.
pub fn global<'a>(entries: impl IntoIterator<Item = VisibleEntry<'a>>) -> GlobalUnreadStat {
    let tally = entries.into_iter().fold(None::<Tally>, |acc, e| match acc {
        Some(mut t) => {
            t.add(e.published_at);
            Some(t)
        }
        None => Some(Tally::first(e.published_at)),
    });

    match tally {
        Some(t) => GlobalUnreadStat {
            count: t.count,
            newest: Some(t.newest),
        },
        None => GlobalUnreadStat::default(),
    }
}

/// Group by feed id.
pub fn by_feed<'a>(entries: impl IntoIterator<Item = VisibleEntry<'a>>) -> Vec<FeedUnreadStat> {
    let mut groups = BTreeMap::new();
    for e in entries {
        tally_into(&mut groups, e.feed_id, e.published_at);
    }

    groups
        .into_iter()
        .map(|(feed_id, t)| FeedUnreadStat {
            feed_id,
            count: t.count,
            newest: t.newest,
        })
        .collect()
}

/// Group by `(category id, title)`; the title rides along with the key.
pub fn by_category<'a>(
    entries: impl IntoIterator<Item = VisibleEntry<'a>>,
) -> Vec<CategoryUnreadStat> {
    let mut groups = BTreeMap::new();
    for e in entries {
        tally_into(
            &mut groups,
            (e.category_id, e.category_title),
            e.published_at,
        );
    }

    groups
        .into_iter()
        .map(|((category_id, title), t)| CategoryUnreadStat {
            category_id,
            title: title.to_owned(),
            count: t.count,
            newest: t.newest,
        })
        .collect()
}
