// src/utils/text.rs

//! Text cleanup shared by the extractors.
//!
//! Portal markup is frequently double-encoded: HTML entities on top of
//! percent-encoding. Every user-visible text field passes through
//! [`decode`] before it lands in a domain record.

use std::borrow::Cow;

/// Collapse all whitespace runs to single spaces and trim.
pub fn squash_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode HTML entities, then percent-escapes, in that order.
///
/// Percent-decoding is skipped when the result would not be valid UTF-8;
/// a literal `%` in ordinary prose passes through untouched because the
/// decoder only consumes valid `%XX` pairs.
pub fn decode(s: &str) -> String {
    let unescaped = html_escape::decode_html_entities(s);
    match urlencoding::decode(&unescaped) {
        Ok(Cow::Borrowed(_)) => unescaped.into_owned(),
        Ok(Cow::Owned(decoded)) => decoded,
        Err(_) => unescaped.into_owned(),
    }
}

/// Decode and whitespace-normalize in one go.
pub fn clean(s: &str) -> String {
    squash_whitespace(&decode(s))
}

/// Parse a locale-formatted decimal (comma separator), tolerating a
/// trailing `%` or unit suffix.
///
/// `"12,5%"` → `12.5`, `"7"` → `7.0`. Returns `None` for anything that
/// is not a number after stripping.
pub fn parse_decimal(s: &str) -> Option<f64> {
    let trimmed = s.trim().trim_end_matches('%').trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.replace(',', ".").parse().ok()
}

/// Parse a `"absent/total"` module fraction, each side locale-decimal.
pub fn parse_fraction(s: &str) -> Option<(f64, f64)> {
    let (absent, total) = s.trim().split_once('/')?;
    Some((parse_decimal(absent)?, parse_decimal(total)?))
}
