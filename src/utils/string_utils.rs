//! UTF-8-safe text helpers for the content pass and log previews.

/// Safely truncate a string to a maximum number of CHARACTERS (not bytes).
///
/// Never panics on multi-byte input; returns a slice of the original string.
///
/// # Examples
/// ```
/// # use postcrawl::utils::string_utils::safe_truncate_chars;
/// assert_eq!(safe_truncate_chars("Hello, World!", 5), "Hello");
/// assert_eq!(safe_truncate_chars("Hi", 100), "Hi");
/// ```
#[inline]
pub fn safe_truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((byte_idx, _)) => &s[..byte_idx],
    }
}

/// Collapse runs of whitespace (including non-breaking spaces) into single spaces
/// and trim both ends.
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    s.split(|c: char| c.is_whitespace() || c == '\u{a0}')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapse whitespace and map an empty result to `None`.
#[must_use]
pub fn non_empty_text(s: &str) -> Option<String> {
    let collapsed = collapse_whitespace(s);
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}
