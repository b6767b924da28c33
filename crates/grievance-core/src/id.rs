//! Grievance identifier generation and format checks.
//!
//! Identifiers are `<prefix><ULID>`: a fixed prefix followed by 26 Crockford
//! base32 characters. The ULID body is time-ordered, so identifiers generated
//! later sort after earlier ones within millisecond resolution.

use regex::Regex;
use ulid::Ulid;

use crate::defaults::{ID_PREFIX, ULID_LEN};

/// Produces and validates grievance identifiers for one configured prefix.
#[derive(Debug, Clone)]
pub struct GrievanceIdGenerator {
    prefix: String,
    pattern: Regex,
}

impl GrievanceIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let pattern = Regex::new(&format!(
            "^{}[0-9A-Z]{{{}}}$",
            regex::escape(&prefix),
            ULID_LEN
        ))
        .expect("escaped prefix is a valid pattern");
        Self { prefix, pattern }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Generate a fresh identifier. Never fails.
    pub fn new_id(&self) -> String {
        format!("{}{}", self.prefix, Ulid::new())
    }

    /// True when `id` is the prefix followed by exactly 26 uppercase alphanumerics.
    pub fn is_valid(&self, id: &str) -> bool {
        self.pattern.is_match(id)
    }
}

impl Default for GrievanceIdGenerator {
    fn default() -> Self {
        Self::new(ID_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_new_id_has_prefix_and_length() {
        let generator = GrievanceIdGenerator::default();
        let id = generator.new_id();
        assert!(id.starts_with("GRV-"));
        assert_eq!(id.len(), "GRV-".len() + 26);
        assert!(generator.is_valid(&id));
    }

    #[test]
    fn test_new_ids_are_unique() {
        let generator = GrievanceIdGenerator::default();
        let ids: HashSet<String> = (0..1000).map(|_| generator.new_id()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_ids_sort_by_creation_time() {
        let generator = GrievanceIdGenerator::default();
        let first = generator.new_id();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = generator.new_id();
        assert!(first < second);
    }

    #[test]
    fn test_is_valid_rejects_malformed() {
        let generator = GrievanceIdGenerator::default();
        assert!(!generator.is_valid("INVALID-ID"));
        assert!(!generator.is_valid("GRV-"));
        assert!(!generator.is_valid("GRV-01ARZ3NDEKTSV4RRFFQ69G5FA"));
        assert!(!generator.is_valid("GRV-01ARZ3NDEKTSV4RRFFQ69G5FAVX"));
        assert!(!generator.is_valid("grv-01ARZ3NDEKTSV4RRFFQ69G5FAV"));
        assert!(!generator.is_valid("GRV-01arz3ndektsv4rrffq69g5fav"));
        assert!(!generator.is_valid(" GRV-01ARZ3NDEKTSV4RRFFQ69G5FAV"));
    }

    #[test]
    fn test_is_valid_accepts_well_formed() {
        let generator = GrievanceIdGenerator::default();
        assert!(generator.is_valid("GRV-01ARZ3NDEKTSV4RRFFQ69G5FAV"));
        assert!(generator.is_valid("GRV-AAAAAAAAAAAAAAAAAAAAAAAAAA"));
    }

    #[test]
    fn test_custom_prefix_is_escaped() {
        let generator = GrievanceIdGenerator::new("VS.");
        let id = generator.new_id();
        assert!(id.starts_with("VS."));
        assert!(generator.is_valid(&id));
        assert!(!generator.is_valid("VSX01ARZ3NDEKTSV4RRFFQ69G5FAV"));
    }
}
