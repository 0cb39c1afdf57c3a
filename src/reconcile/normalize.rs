//! Title normalization used as the equality key for fuzzy matching.
//!
//! The key is deliberately lexical: lowercase, drop parenthesised
//! annotations such as `(Live)` or `（钢琴版）`, cut everything after the
//! first hyphen and trim. No unicode folding or punctuation stripping is
//! applied beyond that.

use std::sync::LazyLock;

use regex::Regex;

/// Optional leading whitespace, an ASCII or full-width opening paren, and the
/// shortest run up to the nearest ASCII or full-width closing paren.
static PARENTHETICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*[（(].*?[）)]").expect("parenthetical pattern is valid")
});

/// Map a raw title to its normalized matching key.
///
/// Every non-overlapping parenthetical match is removed in a single
/// left-to-right pass. Nested groups are not balanced: `a (b (c) d)` becomes
/// `a d)` because the first match stops at the nearest closing paren.
pub fn normalize_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = PARENTHETICAL.replace_all(&lowered, "");
    let before_hyphen = stripped.split('-').next().unwrap_or_default();
    before_hyphen.trim().to_string()
}
