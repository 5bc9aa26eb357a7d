//! ID generation and validation utilities.

use ulid::Ulid;

use crate::{AppError, AppResult};

/// Length of a textual ULID.
const ULID_LEN: usize = 26;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs are:
    /// - Lexicographically sortable
    /// - Monotonically increasing within the same millisecond
    /// - Shorter than UUIDs when represented as strings
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Check that `id` is a well-formed entity ID.
    ///
    /// Accepts the lower-case ULIDs produced by [`IdGenerator::generate`]
    /// (upper-case input is tolerated since ULID decoding is case-insensitive).
    #[must_use]
    pub fn is_valid(id: &str) -> bool {
        id.len() == ULID_LEN && Ulid::from_string(id).is_ok()
    }

    /// Validate an entity ID, naming the offending field in the error.
    pub fn validate_named(field: &str, id: &str) -> AppResult<()> {
        if Self::is_valid(id) {
            Ok(())
        } else {
            Err(AppError::Validation(format!("Invalid {field}: {id:?}")))
        }
    }

    /// Validate an entity ID.
    pub fn validate(id: &str) -> AppResult<()> {
        Self::validate_named("id", id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ulid() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate();
        let id2 = id_gen.generate();

        assert_eq!(id1.len(), 26);
        assert_eq!(id2.len(), 26);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_generated_ids_validate() {
        let id_gen = IdGenerator::new();
        assert!(IdGenerator::is_valid(&id_gen.generate()));
        assert!(IdGenerator::validate(&id_gen.generate()).is_ok());
    }

    #[test]
    fn test_malformed_ids_rejected() {
        assert!(!IdGenerator::is_valid(""));
        assert!(!IdGenerator::is_valid("video1"));
        assert!(!IdGenerator::is_valid("01hzzzzzzzzzzzzzzzzzzzzzz!"));

        match IdGenerator::validate_named("videoId", "nope") {
            Err(AppError::Validation(msg)) => assert!(msg.contains("videoId")),
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_uuid_is_not_an_entity_id() {
        assert!(!IdGenerator::is_valid("0190a6f2-7c3e-7d4a-9b1e-2f5c8d9e0a1b"));
    }
}
