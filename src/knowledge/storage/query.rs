//! Filter parameters for store queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::knowledge::core::errors::{KnowledgeError, KnowledgeResult};
use crate::knowledge::storage::item::ItemMetadata;

/// Query filters. Every set field must match; tags are ANDed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreQuery {
    /// Exact item type.
    pub item_type: Option<String>,
    /// Tags that must all be present. An empty list means no tag filter.
    pub tags: Option<Vec<String>>,
    /// Exclude items created before this instant.
    pub created_after: Option<DateTime<Utc>>,
    /// Exclude items modified before this instant.
    pub modified_after: Option<DateTime<Utc>>,
    /// Exclude items with a lower version.
    pub min_version: Option<u64>,
}

impl StoreQuery {
    /// Create an empty query that matches everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by item type.
    #[must_use]
    pub fn with_type(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = Some(item_type.into());
        self
    }

    /// Require all of the given tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Only items created at or after `instant`.
    #[must_use]
    pub const fn created_after(mut self, instant: DateTime<Utc>) -> Self {
        self.created_after = Some(instant);
        self
    }

    /// Only items modified at or after `instant`.
    #[must_use]
    pub const fn modified_after(mut self, instant: DateTime<Utc>) -> Self {
        self.modified_after = Some(instant);
        self
    }

    /// Only items at `version` or later.
    #[must_use]
    pub const fn min_version(mut self, version: u64) -> Self {
        self.min_version = Some(version);
        self
    }

    /// Tag filter, if one applies.
    #[must_use]
    pub fn tag_filter(&self) -> Option<&[String]> {
        self.tags.as_deref().filter(|tags| !tags.is_empty())
    }

    /// Reject malformed parameters.
    ///
    /// # Errors
    /// Returns a validation error for empty type or tag strings, or a
    /// minimum version of zero.
    pub fn validate(&self) -> KnowledgeResult<()> {
        if self.item_type.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(KnowledgeError::Validation(
                "query type must not be empty".to_string(),
            ));
        }

        if self
            .tags
            .iter()
            .flatten()
            .any(|tag| tag.trim().is_empty())
        {
            return Err(KnowledgeError::Validation(
                "query tags must not be empty".to_string(),
            ));
        }

        if self.min_version == Some(0) {
            return Err(KnowledgeError::Validation(
                "min_version must be >= 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Whether the non-indexed predicates accept `metadata`.
    #[must_use]
    pub fn accepts(&self, metadata: &ItemMetadata) -> bool {
        if self
            .created_after
            .is_some_and(|after| metadata.created < after)
        {
            return false;
        }

        if self
            .modified_after
            .is_some_and(|after| metadata.modified < after)
        {
            return false;
        }

        if self
            .min_version
            .is_some_and(|min| metadata.version < min)
        {
            return false;
        }

        true
    }
}
