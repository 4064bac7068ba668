use std::sync::LazyLock;

use regex::Regex;

/// Regex patterns for text normalization (compiled once via LazyLock).
static RE_PARENTHESIZED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\([^)]*\)").unwrap());
static RE_BRACKETS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\[\]{}]").unwrap());
/// Unit words with ASCII word boundaries, so `泰諾mg` still loses its unit.
static RE_UNITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?-u:\b)(?:mg|ml|tab|cap|amp)(?-u:\b)").unwrap());
static RE_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[+;,/]").unwrap());
static RE_DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9\x{4e00}-\x{9fff}\s.\-]").unwrap());
static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// True for characters in the CJK Unified Ideographs block.
pub fn is_cjk_ideograph(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

pub fn contains_cjk(s: &str) -> bool {
    s.chars().any(is_cjk_ideograph)
}

/// Canonicalize free text into a lowercase, single-space-delimited string.
///
/// Steps, in order: lowercase; drop parenthesized annotations such as
/// `(200mg)`; drop `[]{}` delimiters; drop the unit words
/// `mg ml tab cap amp`; turn `+ ; , /` into spaces; drop anything that is
/// not a Latin letter, digit, CJK ideograph, whitespace, `.` or `-`;
/// collapse whitespace and trim.
///
/// Underscores count as separators before units are stripped. Otherwise
/// `a_mg` would only lose its unit on a second pass and normalization
/// would not be idempotent.
pub fn normalize_text(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let lower = raw.to_lowercase();
    let s = RE_PARENTHESIZED.replace_all(&lower, " ");
    let s = RE_BRACKETS.replace_all(&s, " ");
    let s = s.replace('_', " ");
    let s = RE_UNITS.replace_all(&s, " ");
    let s = RE_SEPARATORS.replace_all(&s, " ");
    let s = RE_DISALLOWED.replace_all(&s, " ");
    let s = RE_WHITESPACE.replace_all(&s, " ");
    s.trim().to_string()
}

/// Tokens of an already-normalized string.
pub fn tokens_of(normalized: &str) -> impl Iterator<Item = &str> {
    normalized.split(' ').filter(|t| !t.is_empty())
}

/// Normalize then split into owned tokens.
pub fn split_tokens(raw: &str) -> Vec<String> {
    tokens_of(&normalize_text(raw)).map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn lowercases_and_strips_dosage() {
        assert_eq!(normalize_text("Ibuprofen 200mg"), "ibuprofen 200mg");
        assert_eq!(normalize_text("Ibuprofen 200 mg"), "ibuprofen 200");
        assert_eq!(normalize_text("Ibuprofen (200mg) TAB"), "ibuprofen");
    }

    #[test]
    fn strips_brackets_but_keeps_content() {
        assert_eq!(normalize_text("[Aspirin] {EC}"), "aspirin ec");
    }

    #[test]
    fn separators_become_spaces() {
        assert_eq!(
            normalize_text("Amoxicillin+Clavulanate;codeine,ACETAMINOPHEN/caffeine"),
            "amoxicillin clavulanate codeine acetaminophen caffeine"
        );
    }

    #[test]
    fn keeps_cjk_dots_and_hyphens() {
        assert_eq!(normalize_text("泰諾 止痛藥"), "泰諾 止痛藥");
        assert_eq!(normalize_text("co-trimoxazole 0.5"), "co-trimoxazole 0.5");
    }

    #[test]
    fn unit_next_to_cjk_is_stripped() {
        assert_eq!(normalize_text("普拿疼mg"), "普拿疼");
    }

    #[test]
    fn units_only_stripped_as_whole_words() {
        assert_eq!(normalize_text("camphor ampicillin"), "camphor ampicillin");
        assert_eq!(normalize_text("Cap Amp ML"), "");
    }

    #[test]
    fn drops_other_symbols_and_zero_width() {
        assert_eq!(normalize_text("aspirin\u{200b}®  !!"), "aspirin");
        assert_eq!(normalize_text("na\u{00ef}ve"), "na ve");
    }

    #[test]
    fn collapses_unicode_whitespace() {
        assert_eq!(normalize_text("  a\u{3000}\tb \n c "), "a b c");
    }

    #[test]
    fn empty_input() {
        assert_eq!(normalize_text(""), "");
        assert!(split_tokens("   ").is_empty());
    }

    #[test]
    fn underscore_units_are_stable() {
        let once = normalize_text("a_mg");
        assert_eq!(once, "a");
        assert_eq!(normalize_text(&once), once);
    }

    #[test]
    fn split_tokens_skips_empty() {
        assert_eq!(split_tokens("Aspirin, Codeine"), vec!["aspirin", "codeine"]);
    }

    #[test]
    fn cjk_detection() {
        assert!(contains_cjk("abc泰"));
        assert!(!contains_cjk("aspirin"));
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(s in "\\PC{0,40}") {
            let once = normalize_text(&s);
            prop_assert_eq!(normalize_text(&once), once);
        }

        #[test]
        fn normalization_is_idempotent_on_drug_like_text(
            s in "[A-Za-z0-9 _+;,/()\\[\\]{}.\\-泰諾普拿疼]{0,40}"
        ) {
            let once = normalize_text(&s);
            prop_assert_eq!(normalize_text(&once), once);
        }

        #[test]
        fn tokens_are_lowercase_and_non_empty(s in "\\PC{0,40}") {
            for token in split_tokens(&s) {
                prop_assert!(!token.is_empty());
                prop_assert!(!token.contains(char::is_whitespace));
                prop_assert_eq!(token.to_lowercase(), token.clone());
            }
        }
    }
}
