use sha2::{Digest, Sha256};

/// Cache key: the lowercase hex SHA-256 digest of the canonical query
/// string. 64 characters, matching `tag_search_caches.id CHAR(64)`.
pub fn cache_key(canonical_query: &str) -> String {
    let digest = Sha256::digest(canonical_query.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_64_hex_chars() {
        let key = cache_key("\"FOO\"");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn key_is_deterministic_and_distinguishes_inputs() {
        assert_eq!(cache_key("\"FOO\""), cache_key("\"FOO\""));
        assert_ne!(cache_key("\"FOO\""), cache_key("\"BAR\""));
    }

    #[test]
    fn empty_query_has_a_stable_key() {
        assert_eq!(
            cache_key(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
