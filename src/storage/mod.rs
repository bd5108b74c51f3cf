mod categories;
mod entries;
mod feeds;
mod schema;
mod types;
mod unread_counts;
mod users;

pub use schema::{Database, DatabaseOptions};
pub use types::{Category, DatabaseError, Feed, NewEntry};
