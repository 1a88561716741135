//! Memory entries and their semantic kinds.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::knowledge::core::errors::{KnowledgeError, KnowledgeResult};
use crate::knowledge::core::ids::MemoryId;

/// Semantic category of a memory entry.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    /// A named idea with a description, such as an art movement.
    Concept,
    /// Something that happened.
    Experience,
    /// A recurring regularity.
    Pattern,
    /// A link between other things.
    Relationship,
}

impl MemoryKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Concept,
        Self::Experience,
        Self::Pattern,
        Self::Relationship,
    ];

    /// Stable string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Concept => "concept",
            Self::Experience => "experience",
            Self::Pattern => "pattern",
            Self::Relationship => "relationship",
        }
    }
}

impl fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MemoryKind {
    type Err = KnowledgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| raw.eq_ignore_ascii_case(kind.as_str()))
            .ok_or_else(|| KnowledgeError::Validation(format!("invalid memory kind: {raw}")))
    }
}

/// Parameters for a new memory entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewMemory {
    /// Semantic category.
    pub kind: MemoryKind,
    /// Arbitrary JSON content.
    pub content: Value,
    /// Association tags.
    pub associations: Vec<String>,
    /// Initial importance, clamped to `[0, 1]`.
    pub importance: f64,
}

impl NewMemory {
    /// Build a new entry description.
    #[must_use]
    pub fn new<I, S>(kind: MemoryKind, content: Value, associations: I, importance: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind,
            content,
            associations: associations.into_iter().map(Into::into).collect(),
            importance,
        }
    }

    /// Check the inputs and normalize associations into a set.
    ///
    /// # Errors
    /// Returns a validation error for a non-finite importance or an empty
    /// association tag.
    pub(crate) fn normalized(&self) -> KnowledgeResult<(f64, BTreeSet<String>)> {
        if !self.importance.is_finite() {
            return Err(KnowledgeError::Validation(
                "importance must be a finite number".to_string(),
            ));
        }

        let mut associations = BTreeSet::new();
        for tag in &self.associations {
            if tag.trim().is_empty() {
                return Err(KnowledgeError::Validation(
                    "associations must not be empty".to_string(),
                ));
            }
            associations.insert(tag.clone());
        }

        Ok((self.importance.clamp(0.0, 1.0), associations))
    }
}

/// A scored semantic memory entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Stable identifier.
    pub id: MemoryId,
    /// Semantic category.
    pub kind: MemoryKind,
    /// Arbitrary JSON content.
    pub content: Value,
    /// Association tags, indexed for context matching.
    pub associations: BTreeSet<String>,
    /// Importance in `[0, 1]`.
    pub importance: f64,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// Last time a recall matched this entry.
    pub last_accessed: DateTime<Utc>,
    /// Number of recalls that matched this entry.
    pub access_count: u64,
    /// Creation time.
    pub created: DateTime<Utc>,
    /// Last content modification time.
    pub modified: DateTime<Utc>,
}

impl MemoryEntry {
    /// Record a recall hit.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_accessed = now;
        self.access_count = self.access_count.saturating_add(1);
    }
}
