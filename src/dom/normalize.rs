// src/dom/normalize.rs

//! Repairs for the portal's recurring markup defects.

use std::sync::OnceLock;

use regex::Regex;

static BROKEN_CLOSING_TAG: OnceLock<Regex> = OnceLock::new();
static SINGLE_QUOTED_CLASS: OnceLock<Regex> = OnceLock::new();

fn broken_closing_tag() -> &'static Regex {
    // Closing tags with stray whitespace or newlines around the name,
    // e.g. `</td\n   >` or `</ tr>`.
    BROKEN_CLOSING_TAG.get_or_init(|| Regex::new(r"</\s*([a-zA-Z][a-zA-Z0-9]*)\s*>").unwrap())
}

fn single_quoted_class() -> &'static Regex {
    SINGLE_QUOTED_CLASS.get_or_init(|| Regex::new(r"class\s*=\s*'([^']*)'").unwrap())
}

/// Normalize a raw portal response body before parsing.
///
/// Two malformations show up regularly in portal output: whitespace
/// embedded in closing tags, and `class` attributes quoted with single
/// quotes. Both confuse downstream class-list lookups. This function is
/// pure, total and idempotent.
pub fn normalize(raw: &str) -> String {
    let repaired = broken_closing_tag().replace_all(raw, "</$1>");
    single_quoted_class()
        .replace_all(&repaired, "class=\"$1\"")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_in_closing_tags() {
        assert_eq!(normalize("<td>x</td\n   >"), "<td>x</td>");
        assert_eq!(normalize("<tr>a</ tr>"), "<tr>a</tr>");
    }

    #[test]
    fn rewrites_single_quoted_class() {
        assert_eq!(
            normalize("<div class='s2skemabrik lec-item'>"),
            "<div class=\"s2skemabrik lec-item\">"
        );
    }

    #[test]
    fn leaves_other_single_quotes_alone() {
        let s = "<a title='hi' class='x'>it's</a>";
        assert_eq!(normalize(s), "<a title='hi' class=\"x\">it's</a>");
    }

    #[test]
    fn idempotent() {
        let raw = "<table class='s2skema'><td>x</td\n></table>";
        let once = normalize(raw);
        assert_eq!(normalize(&once), once);
    }
}
