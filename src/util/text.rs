use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Ellipsis appended to truncated cells
const ELLIPSIS: char = '…';

fn is_stripped_control(c: char) -> bool {
    c == '\x7f' || (c.is_ascii_control() && !matches!(c, '\t' | '\n' | '\r'))
}

/// Remove terminal control characters and escape sequences from `s`.
///
/// Drops CSI sequences (`ESC [` ... final byte `0x40..=0x7e`), OSC sequences
/// (`ESC ]` ... BEL or `ESC \`), bare ESC, DEL and C0 controls other than
/// tab, newline and carriage return.
///
/// Returns `Cow::Borrowed` when there is nothing to strip.
///
/// ```
/// use unreadstat::util::strip_control_chars;
///
/// assert_eq!(strip_control_chars("\x1b[1mBold\x1b[0m news"), "Bold news");
/// assert_eq!(strip_control_chars("clean"), "clean");
/// ```
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_stripped_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\x1b' {
            if !is_stripped_control(c) {
                out.push(c);
            }
            continue;
        }

        match chars.peek() {
            Some('[') => {
                chars.next();
                for c in chars.by_ref() {
                    if ('\x40'..='\x7e').contains(&c) {
                        break;
                    }
                }
            }
            Some(']') => {
                chars.next();
                while let Some(c) = chars.next() {
                    if c == '\x07' {
                        break;
                    }
                    if c == '\x1b' && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    Cow::Owned(out)
}

/// Fit `s` into `max_width` terminal columns, ending with `…` when cut.
///
/// Width is measured with Unicode display widths, so wide (CJK, emoji)
/// characters count as two columns.
///
/// ```
/// use unreadstat::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Engineering", 6), "Engin…");
/// assert_eq!(truncate_to_width("Tech", 6), "Tech");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if UnicodeWidthStr::width(s) <= max_width {
        return Cow::Borrowed(s);
    }
    if max_width == 0 {
        return Cow::Borrowed("");
    }

    let room = max_width - 1;
    let mut used = 0;
    let mut out = String::new();
    for c in s.chars() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > room {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push(ELLIPSIS);

    Cow::Owned(out)
}

/// Truncate `s` to `width` columns and left-align it in exactly that many.
///
/// `format!("{:<w$}")` pads by `char` count, which misaligns columns once a
/// cell holds wide characters.
pub fn pad_to_width(s: &str, width: usize) -> String {
    let cell = truncate_to_width(s, width);
    let fill = width.saturating_sub(UnicodeWidthStr::width(cell.as_ref()));
    let mut out = String::with_capacity(cell.len() + fill);
    out.push_str(&cell);
    out.extend(std::iter::repeat(' ').take(fill));
    out
}
