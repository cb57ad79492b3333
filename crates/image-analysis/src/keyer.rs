//! Cache key derivation.

use sha2::{Digest, Sha256};

/// Length of a cache key in hex characters.
pub const CACHE_KEY_LEN: usize = 64;

/// Derive a stable cache key from a raw input string (lowercase hex SHA-256).
pub fn cache_key(raw: &str) -> String {
    format!("{:x}", Sha256::digest(raw.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let url = "https://example.com/cat.jpg";
        assert_eq!(cache_key(url), cache_key(url));
    }

    #[test]
    fn test_fixed_length_hex() {
        for raw in ["", "a", "/home/user/pictures/very/deep/path/photo.png"] {
            let key = cache_key(raw);
            assert_eq!(key.len(), CACHE_KEY_LEN);
            assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            cache_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_distinct_inputs() {
        let keys: std::collections::HashSet<String> = (0..10_000)
            .map(|i| cache_key(&format!("https://example.com/img/{i}.png")))
            .collect();
        assert_eq!(keys.len(), 10_000);
        assert_ne!(cache_key("cat.jpg"), cache_key("cat.jpg "));
    }
}
