use unicode_normalization::UnicodeNormalization;

/// Trims whitespace, applies Unicode NFKC normalization, and upper-cases.
///
/// Used for every tag/word token emitted by the lexer, for the `OR` keyword
/// match, and again just before a canonical query string is hashed into a
/// cache key — all three call sites must agree byte-for-byte or equivalent
/// queries would hash to different keys.
pub fn normalize(s: &str) -> String {
    s.trim().nfkc().collect::<String>().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::normalize;

    #[test]
    fn trims_and_uppercases() {
        assert_eq!(normalize("  foo "), "FOO");
    }

    #[test]
    fn nfkc_folds_compatibility_forms() {
        // U+FB00 LATIN SMALL LIGATURE FF -> "ff" under NFKC, then upper-cased.
        assert_eq!(normalize("\u{FB00}"), "FF");
    }

    #[test]
    fn empty_stays_empty() {
        assert_eq!(normalize("   "), "");
    }
}
