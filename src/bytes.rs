//! Field splitting and integer parsing for tab-separated token tables

use atoi::FromRadix10Checked;
use memchr::memchr_iter;

/// Placeholder written for (and read back as) an absent field
pub const PLACEHOLDER: &str = "_";

/// Split a line into its tab-separated fields
///
/// Empty fields are kept, so `a\t\tb` yields three fields.
#[inline]
pub fn split_tabs(line: &str) -> Vec<&str> {
    let mut fields = Vec::with_capacity(12);
    let mut start = 0;
    for pos in memchr_iter(b'\t', line.as_bytes()) {
        fields.push(&line[start..pos]);
        start = pos + 1;
    }
    fields.push(&line[start..]);
    fields
}

/// Parse a non-negative decimal integer
///
/// Unlike `str::parse`, signs are rejected; unlike a prefix parse,
/// trailing garbage is rejected too.
#[inline]
pub fn parse_index(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return None;
    }
    match usize::from_radix_10_checked(bytes) {
        (Some(n), used) if used == bytes.len() => Some(n),
        _ => None,
    }
}

/// Map the `_` placeholder to `None`
#[inline]
pub fn optional(field: &str) -> Option<&str> {
    if field == PLACEHOLDER { None } else { Some(field) }
}
