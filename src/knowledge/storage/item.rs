//! Stored item model and store-wide metrics.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::knowledge::core::checksum::Fingerprint;
use crate::knowledge::core::ids::ItemId;

/// Metadata tracked alongside every stored payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMetadata {
    /// Creation timestamp.
    pub created: DateTime<Utc>,
    /// Last write timestamp.
    pub modified: DateTime<Utc>,
    /// Last read or write timestamp; drives eviction order.
    pub accessed: DateTime<Utc>,
    /// Size in bytes of the serialized payload.
    pub size: usize,
    /// Category used by the type index.
    pub item_type: String,
    /// Tags used by the tag index.
    pub tags: BTreeSet<String>,
    /// Write counter, starting at 1.
    pub version: u64,
    /// Hex SHA-256 of the serialized payload.
    pub checksum: String,
}

impl ItemMetadata {
    /// Metadata for a freshly stored payload.
    #[must_use]
    pub fn new(
        item_type: impl Into<String>,
        tags: BTreeSet<String>,
        fingerprint: Fingerprint,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            created: now,
            modified: now,
            accessed: now,
            size: fingerprint.size,
            item_type: item_type.into(),
            tags,
            version: 1,
            checksum: fingerprint.checksum,
        }
    }

    /// Record a rewrite of the payload.
    pub fn record_write(&mut self, fingerprint: Fingerprint, now: DateTime<Utc>) {
        self.modified = now;
        self.accessed = now;
        self.size = fingerprint.size;
        self.checksum = fingerprint.checksum;
        self.version = self.version.saturating_add(1);
    }
}

/// An object held by the store.
#[derive(Clone, Debug, PartialEq)]
pub struct StoredItem {
    /// Immutable identifier.
    pub id: ItemId,
    /// Payload in JSON value form.
    pub data: Value,
    /// Bookkeeping metadata.
    pub metadata: ItemMetadata,
}

/// Aggregate store metrics exposed for introspection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StorageMetrics {
    /// Sum of all item sizes in bytes.
    pub total_size: usize,
    /// Number of live items.
    pub item_count: usize,
    /// Completion time of the last maintenance pass (construction time before any).
    pub last_optimized: DateTime<Utc>,
    /// Bytes saved by the last minification divided by the resulting total size.
    pub compression_ratio: f64,
}

impl StorageMetrics {
    /// Metrics for an empty store.
    #[must_use]
    pub const fn empty(now: DateTime<Utc>) -> Self {
        Self {
            total_size: 0,
            item_count: 0,
            last_optimized: now,
            compression_ratio: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::core::checksum::fingerprint;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn test_new_metadata_starts_at_version_one() {
        let now = Utc::now();
        let fp = fingerprint(&json!({"title": "Nilüfer"})).unwrap();
        let meta = ItemMetadata::new("artwork", BTreeSet::new(), fp.clone(), now);
        assert_eq!(meta.version, 1);
        assert_eq!(meta.size, fp.size);
        assert_eq!(meta.created, meta.accessed);
    }

    #[test]
    fn test_record_write_bumps_version_and_times() {
        let now = Utc::now();
        let fp = fingerprint(&json!("a")).unwrap();
        let mut meta = ItemMetadata::new("note", BTreeSet::new(), fp, now);

        let later = now + Duration::seconds(5);
        let fp2 = fingerprint(&json!("abc")).unwrap();
        meta.record_write(fp2.clone(), later);

        assert_eq!(meta.version, 2);
        assert_eq!(meta.modified, later);
        assert_eq!(meta.accessed, later);
        assert_eq!(meta.created, now);
        assert_eq!(meta.checksum, fp2.checksum);
    }
}
