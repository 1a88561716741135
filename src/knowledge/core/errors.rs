//! Error types for the knowledge subsystem.

use thiserror::Error;

/// Knowledge subsystem error type.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    /// The id does not refer to a live item or memory.
    #[error("not found: {0}")]
    NotFound(String),
    /// Stored checksum no longer matches the payload.
    ///
    /// Recoverable at the call site: the caller discards the payload and the
    /// store stays usable. The item itself is only removed by the next
    /// maintenance sweep.
    #[error("integrity check failed for {id}: expected {expected}, got {actual}")]
    Integrity {
        /// Offending item id.
        id: String,
        /// Checksum recorded at the last write.
        expected: String,
        /// Checksum of the payload as it is now.
        actual: String,
    },
    /// Eviction could not free enough capacity.
    #[error("store full: {required} bytes required, {available} bytes reclaimable")]
    StoreFull {
        /// Bytes that had to be freed.
        required: usize,
        /// Bytes that eviction could have freed.
        available: usize,
    },
    /// Malformed input or configuration, rejected before any mutation.
    #[error("validation failed: {0}")]
    Validation(String),
    /// A maintenance pass is already running on the component.
    #[error("maintenance already in progress on {0}")]
    MaintenanceInProgress(&'static str),
    /// Payload serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience result alias for knowledge operations.
pub type KnowledgeResult<T> = Result<T, KnowledgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integrity_message_names_both_checksums() {
        let err = KnowledgeError::Integrity {
            id: "a".to_string(),
            expected: "00".to_string(),
            actual: "ff".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "integrity check failed for a: expected 00, got ff"
        );
    }

    #[test]
    fn test_display_messages() {
        let err = KnowledgeError::StoreFull {
            required: 10,
            available: 4,
        };
        assert_eq!(
            err.to_string(),
            "store full: 10 bytes required, 4 bytes reclaimable"
        );
    }
}
