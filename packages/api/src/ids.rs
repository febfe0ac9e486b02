//! Public secret identifiers: `sec_` followed by ten ASCII alphanumerics.

use rand::distributions::Alphanumeric;
use rand::Rng;
use store::UNIQUE_ID_PREFIX;

/// Number of random characters after the prefix.
pub const UNIQUE_ID_LEN: usize = 10;

/// Generate a fresh identifier from the thread-local CSPRNG.
pub fn generate_unique_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(UNIQUE_ID_LEN)
        .map(char::from)
        .collect();
    format!("{UNIQUE_ID_PREFIX}{suffix}")
}

/// Whether `candidate` has the shape of a generated identifier.
pub fn is_valid_unique_id(candidate: &str) -> bool {
    candidate
        .strip_prefix(UNIQUE_ID_PREFIX)
        .is_some_and(|suffix| {
            suffix.len() == UNIQUE_ID_LEN && suffix.chars().all(|c| c.is_ascii_alphanumeric())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_have_expected_shape() {
        for _ in 0..100 {
            let id = generate_unique_id();
            assert_eq!(id.len(), UNIQUE_ID_PREFIX.len() + UNIQUE_ID_LEN);
            assert!(is_valid_unique_id(&id), "{id}");
        }
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let ids: HashSet<String> = (0..1000).map(|_| generate_unique_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_rejects_malformed_ids() {
        assert!(!is_valid_unique_id("sec_short"));
        assert!(!is_valid_unique_id("key_abcdefghij"));
        assert!(!is_valid_unique_id("sec_abcdefghi!"));
        assert!(!is_valid_unique_id("sec_abcdefghijk"));
        assert!(is_valid_unique_id("sec_aB3dE6gH9j"));
    }
}
