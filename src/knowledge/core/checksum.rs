//! Payload size and checksum helpers.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::knowledge::core::errors::KnowledgeResult;

/// Serialized size and content digest of a payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fingerprint {
    /// Length in bytes of the compact JSON form.
    pub size: usize,
    /// Lowercase hex SHA-256 of the compact JSON form.
    pub checksum: String,
}

/// Convert any serializable payload into its JSON value form.
///
/// # Errors
/// Returns an error if the payload cannot be represented as JSON
/// (for example a map with non-string keys).
pub fn to_value<T: Serialize + ?Sized>(data: &T) -> KnowledgeResult<Value> {
    Ok(serde_json::to_value(data)?)
}

/// Compute the fingerprint of a JSON value.
///
/// # Errors
/// Returns an error if the value cannot be serialized.
pub fn fingerprint(value: &Value) -> KnowledgeResult<Fingerprint> {
    let bytes = serde_json::to_vec(value)?;
    Ok(Fingerprint {
        size: bytes.len(),
        checksum: digest(&bytes),
    })
}

/// Compute a lowercase hex SHA-256 digest.
#[must_use]
pub fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_digest_known_vector() {
        assert_eq!(
            digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_fingerprint_size_is_compact_json_length() {
        let fp = fingerprint(&json!("abcd")).unwrap();
        assert_eq!(fp.size, 6);
        assert_eq!(fp.checksum, digest(b"\"abcd\""));
    }

    #[test]
    fn test_fingerprint_stable_across_key_order() {
        let a = fingerprint(&json!({"b": 1, "a": 2})).unwrap();
        let b = fingerprint(&json!({"a": 2, "b": 1})).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_to_value_rejects_non_string_keys() {
        let mut map = std::collections::HashMap::new();
        map.insert((1, 2), "x");
        assert!(to_value(&map).is_err());
    }
}
