//! Terminal-safe text helpers used when rendering titles.
//!
//! - **Sanitizing**: strip control characters and escape sequences
//! - **Layout**: Unicode-aware truncation for table cells

mod text;

pub use text::{pad_to_width, strip_control_chars, truncate_to_width};
