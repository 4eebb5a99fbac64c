//! Minimal, deterministic text normalization helpers.

use webreply_core::truncate_chars;

/// Collapse every whitespace run to a single space (and trim the ends).
pub fn norm_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// ASCII word characters, whitespace and basic sentence punctuation.
pub fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || c == '_'
        || c.is_whitespace()
        || matches!(c, '.' | ',' | '!' | '?' | ';' | ':' | '(' | ')' | '-')
}

/// Normalize scraped text for display: collapse whitespace, drop characters outside the
/// allow-list, trim, then cap at `max_chars`.
pub fn clean_scraped(s: &str, max_chars: usize) -> String {
    let kept: String = norm_ws(s).chars().filter(|c| is_allowed_char(*c)).collect();
    truncate_chars(kept.trim(), max_chars).to_string()
}

/// Lowercased words split on single spaces, punctuation left attached.
pub fn query_words(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn clean_scraped_collapses_whitespace_and_strips_symbols() {
        let s = "  Hello,\n\n  world!\t\u{201c}quotes\u{201d} #tag ok-ish ";
        assert_eq!(clean_scraped(s, 2_000), "Hello, world! quotes tag ok-ish");
    }

    #[test]
    fn clean_scraped_drops_non_ascii_letters() {
        assert_eq!(clean_scraped("caf\u{e9} na\u{ef}ve", 100), "caf nave");
    }

    #[test]
    fn clean_scraped_truncates() {
        let s = "word ".repeat(1_000);
        assert_eq!(clean_scraped(&s, 10).chars().count(), 10);
    }

    #[test]
    fn query_words_keeps_punctuation_attached() {
        assert_eq!(
            query_words("What is  Osmosis?"),
            vec!["what".to_string(), "is".to_string(), "osmosis?".to_string()]
        );
    }

    proptest! {
        #[test]
        fn clean_scraped_output_is_bounded_and_allowlisted(s in any::<String>(), max in 0usize..3_000) {
            let out = clean_scraped(&s, max);
            prop_assert!(out.chars().count() <= max);
            prop_assert!(out.chars().all(is_allowed_char));
        }
    }
}
