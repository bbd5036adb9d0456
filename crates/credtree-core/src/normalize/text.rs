//! Text canonicalization

use unicode_normalization::UnicodeNormalization;

/// Trim, collapse internal whitespace runs to one space, then NFC-compose.
///
/// Idempotent: `normalize_text(&normalize_text(s)) == normalize_text(s)`.
pub fn normalize_text(raw: &str) -> String {
    let mut collapsed = String::with_capacity(raw.len());
    for word in raw.split_whitespace() {
        if !collapsed.is_empty() {
            collapsed.push(' ');
        }
        collapsed.push_str(word);
    }
    collapsed.nfc().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn trims_and_collapses() {
        assert_eq!(normalize_text("  hello \t\n  world  "), "hello world");
    }

    #[test]
    fn empty_and_blank() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text(" \t\r\n "), "");
    }

    #[test]
    fn unicode_whitespace_collapses() {
        assert_eq!(normalize_text("a\u{00a0}\u{2003}b"), "a b");
    }

    #[test]
    fn composes_to_nfc() {
        // e + combining acute
        let decomposed = "Cafe\u{0301}";
        assert_eq!(normalize_text(decomposed), "Caf\u{e9}");
        assert_eq!(normalize_text("Caf\u{e9}"), "Caf\u{e9}");
    }

    proptest! {
        #[test]
        fn idempotent(s in "\\PC*") {
            let once = normalize_text(&s);
            prop_assert_eq!(normalize_text(&once), once);
        }

        #[test]
        fn idempotent_with_whitespace_and_marks(s in "[ \t\na-z\u{0300}-\u{0310}\u{e9}]{0,24}") {
            let once = normalize_text(&s);
            prop_assert_eq!(normalize_text(&once), once);
        }
    }
}
