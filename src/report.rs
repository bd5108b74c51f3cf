//! Plain-text rendering of unread statistics for the CLI.

use std::collections::HashMap;
use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::stats::{CategoryUnreadStat, FeedUnreadStat, GlobalUnreadStat, UnreadSummary};
use crate::util::{pad_to_width, strip_control_chars};

/// Column width for feed and category titles
const TITLE_WIDTH: usize = 32;

fn timestamp(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Sanitized title, exactly `TITLE_WIDTH` display columns wide
fn title_cell(title: &str) -> String {
    pad_to_width(&strip_control_chars(title), TITLE_WIDTH)
}

pub fn render_global(stat: &GlobalUnreadStat) -> String {
    match &stat.newest {
        Some(newest) if stat.has_unread() => {
            format!("{} unread, newest {}\n", stat.count, timestamp(newest))
        }
        _ => "no unread entries\n".to_string(),
    }
}

/// One line per feed, sorted by feed id. `titles` labels known feeds.
pub fn render_feeds(stats: &[FeedUnreadStat], titles: &HashMap<i64, String>) -> String {
    if stats.is_empty() {
        return "no feeds with unread entries\n".to_string();
    }

    let mut sorted: Vec<&FeedUnreadStat> = stats.iter().collect();
    sorted.sort_by_key(|s| s.feed_id);

    let mut out = String::new();
    for stat in sorted {
        let label = titles
            .get(&stat.feed_id)
            .map(|t| title_cell(t))
            .unwrap_or_else(|| title_cell(&format!("feed #{}", stat.feed_id)));
        let _ = writeln!(
            out,
            "{:>6}  {}  {:>6}  {}",
            stat.feed_id,
            label,
            stat.count,
            timestamp(&stat.newest)
        );
    }
    out
}

/// One line per category, sorted by title.
pub fn render_categories(stats: &[CategoryUnreadStat]) -> String {
    if stats.is_empty() {
        return "no categories with unread entries\n".to_string();
    }

    let mut sorted: Vec<&CategoryUnreadStat> = stats.iter().collect();
    sorted.sort_by(|a, b| a.title.cmp(&b.title).then(a.category_id.cmp(&b.category_id)));

    let mut out = String::new();
    for stat in sorted {
        let _ = writeln!(
            out,
            "{:>6}  {}  {:>6}  {}",
            stat.category_id,
            title_cell(&stat.title),
            stat.count,
            timestamp(&stat.newest)
        );
    }
    out
}

pub fn render_summary(summary: &UnreadSummary, feed_titles: &HashMap<i64, String>) -> String {
    format!(
        "{}\nFeeds\n{}\nCategories\n{}",
        render_global(&summary.global),
        render_feeds(&summary.feeds, feed_titles),
        render_categories(&summary.categories)
    )
}
