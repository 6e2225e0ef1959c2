use crate::config::{MAX_ACCOUNT_NAME_LENGTH, MAX_URL_LENGTH, MIN_ACCOUNT_NAME_LENGTH};

/// Account names are lowercase letters, digits, hyphen and dot,
/// 3 to 16 characters.
pub fn is_valid_account_name(name: &str) -> bool {
    if name.len() < MIN_ACCOUNT_NAME_LENGTH || name.len() > MAX_ACCOUNT_NAME_LENGTH {
        return false;
    }
    name.bytes()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == b'-' || c == b'.')
}

/// Content URLs must point into ipfs.
pub fn is_valid_content_url(url: &str) -> bool {
    url.len() < MAX_URL_LENGTH && url.starts_with("ipfs://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_names() {
        for valid in ["abc", "alice", "a-b.c", "muse2025", "a234567890123456"] {
            assert!(is_valid_account_name(valid), "{valid} should be valid");
        }
        for invalid in ["ab", "Alice", "a_b", "", "a2345678901234567", "spa ce"] {
            assert!(!is_valid_account_name(invalid), "{invalid} should be invalid");
        }
    }

    #[test]
    fn content_urls() {
        assert!(is_valid_content_url("ipfs://QmTrack"));
        assert!(!is_valid_content_url("https://example.com"));
        assert!(!is_valid_content_url(&format!("ipfs://{}", "a".repeat(200))));
    }
}
