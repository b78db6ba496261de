//! Commit text rewriting
//!
//! Inserts a marker after every character of a committed string.

/// Rewrite `input` so that every character is followed by `marker`.
///
/// Characters are taken by code point, so multi-byte characters are copied
/// whole. An empty input produces an empty string, not a lone marker.
///
/// `&str` is always well-formed UTF-8; callers holding raw commit bytes must
/// validate them (e.g. with `std::str::from_utf8`) before calling this.
pub fn transform(input: &str, marker: &str) -> String {
    let count = input.chars().count();
    let mut out = String::with_capacity(input.len() + count * marker.len());

    for c in input.chars() {
        out.push(c);
        out.push_str(marker);
    }

    out
}
