//! Visible unread statistics for a feed reader.
//!
//! - [`stats`]: the aggregation core ([`stats::UnreadStats`]) over any
//!   [`stats::UnreadStatsStore`], plus an in-memory store
//! - [`storage`]: the SQLite entry store ([`storage::Database`])
//! - [`config`]: TOML configuration
//! - [`report`]: plain-text rendering for the CLI

pub mod config;
pub mod report;
pub mod stats;
pub mod storage;
pub mod util;
