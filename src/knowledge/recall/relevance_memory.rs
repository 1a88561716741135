//! Relevance-ranked semantic memory.
//!
//! Entries are never looked up by exact key from the outside; callers recall
//! them through a weighted relevance function. Associations share the
//! store's [`TagIndex`] so context bookkeeping follows the same rules as the
//! store's tag index.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::knowledge::core::config::MemoryConfig;
use crate::knowledge::core::errors::{KnowledgeError, KnowledgeResult};
use crate::knowledge::core::ids::MemoryId;
use crate::knowledge::index::{TagIndex, select_lowest};
use crate::knowledge::maintenance::guard::MaintenanceGuard;
use crate::knowledge::maintenance::task::{Maintainable, MaintenanceReport};
use crate::knowledge::recall::entry::{MemoryEntry, MemoryKind, NewMemory};
use crate::knowledge::recall::scoring::{
    decayed_confidence, decayed_importance, forget_score, relevance, should_cleanup,
};
use crate::knowledge::recall::seed::builtin_concepts;

const COMPONENT: &str = "relevance_memory";

/// Aggregate view of the memory contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    /// Number of entries.
    pub total_memories: usize,
    /// Mean importance, 0 when empty.
    pub average_importance: f64,
    /// Mean confidence, 0 when empty.
    pub average_confidence: f64,
    /// Entry count per kind; every kind is present.
    pub kind_distribution: BTreeMap<MemoryKind, usize>,
}

/// Statistics from a memory maintenance pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryMaintenanceStats {
    /// Entries re-scored.
    pub rescored: usize,
    /// Entries dropped by the cleanup rules.
    pub removed: usize,
    /// Pass duration in milliseconds.
    pub duration_ms: u64,
}

struct MemoryInner {
    entries: HashMap<MemoryId, MemoryEntry>,
    associations: TagIndex<MemoryId>,
}

impl MemoryInner {
    fn insert(&mut self, entry: MemoryEntry) {
        self.associations.insert_all(&entry.associations, entry.id);
        self.entries.insert(entry.id, entry);
    }

    fn remove(&mut self, id: MemoryId) -> Option<MemoryEntry> {
        let entry = self.entries.remove(&id)?;
        self.associations.remove_all(&entry.associations, id);
        Some(entry)
    }

    fn forget_one(&mut self, now: DateTime<Utc>, scale_hours: f64) -> Option<MemoryEntry> {
        let victim = select_lowest(self.entries.values(), |entry| {
            (
                forget_score(entry, now, scale_hours),
                (entry.last_accessed, entry.id),
            )
        })
        .map(|entry| entry.id)?;

        self.remove(victim)
    }
}

/// Semantic memory with decaying scores and relevance recall.
pub struct RelevanceMemory {
    config: MemoryConfig,
    inner: RwLock<MemoryInner>,
    maintenance: MaintenanceGuard,
}

impl RelevanceMemory {
    /// Create a memory, seeding the built-in concepts when configured.
    ///
    /// # Errors
    /// Returns a validation error if the configuration is invalid.
    pub fn new(config: MemoryConfig) -> KnowledgeResult<Self> {
        config.validate()?;
        let seed = config.seed_builtin_concepts;
        let memory = Self {
            config,
            inner: RwLock::new(MemoryInner {
                entries: HashMap::new(),
                associations: TagIndex::new(),
            }),
            maintenance: MaintenanceGuard::new(),
        };

        if seed {
            for concept in builtin_concepts() {
                memory.add_memory(concept)?;
            }
        }

        Ok(memory)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Whether the memory holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    /// Add an entry, forgetting the weakest one first when at capacity.
    ///
    /// # Errors
    /// Returns a validation error for a non-finite importance or an empty
    /// association.
    pub fn add_memory(&self, memory: NewMemory) -> KnowledgeResult<MemoryId> {
        self.add_memory_at(memory, Utc::now())
    }

    /// Add an entry using `now` as its creation time.
    ///
    /// # Errors
    /// See [`RelevanceMemory::add_memory`].
    pub fn add_memory_at(&self, memory: NewMemory, now: DateTime<Utc>) -> KnowledgeResult<MemoryId> {
        let (importance, associations) = memory.normalized()?;
        let id = MemoryId::new();
        let entry = MemoryEntry {
            id,
            kind: memory.kind,
            content: memory.content,
            associations,
            importance,
            confidence: self.config.initial_confidence,
            last_accessed: now,
            access_count: 0,
            created: now,
            modified: now,
        };

        let mut inner = self.inner.write();
        let forgotten = if inner.entries.len() >= self.config.capacity {
            inner.forget_one(now, self.config.scoring.recency_scale_hours)
        } else {
            None
        };
        inner.insert(entry);
        drop(inner);

        if let Some(forgotten) = forgotten {
            debug!(id = %forgotten.id, kind = %forgotten.kind, "Forgot memory at capacity");
        }

        Ok(id)
    }

    /// Return the most relevant entries for `query`.
    ///
    /// Every entry above the threshold is marked as accessed, including
    /// those cut by the result limit.
    #[must_use]
    pub fn recall(&self, query: &str, context: Option<&[String]>) -> Vec<MemoryEntry> {
        self.recall_at(query, context, Utc::now())
    }

    /// Recall using `now` for recency and access bookkeeping.
    #[must_use]
    pub fn recall_at(
        &self,
        query: &str,
        context: Option<&[String]>,
        now: DateTime<Utc>,
    ) -> Vec<MemoryEntry> {
        let context: Option<BTreeSet<String>> =
            context.map(|tags| tags.iter().cloned().collect());
        let scoring = &self.config.scoring;

        let mut inner = self.inner.write();
        let mut hits: Vec<(f64, MemoryEntry)> = Vec::new();
        for entry in inner.entries.values_mut() {
            let score = relevance(entry, query, context.as_ref(), scoring, now);
            if score > self.config.recall_threshold {
                entry.touch(now);
                hits.push((score, entry.clone()));
            }
        }
        drop(inner);

        hits.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));
        hits.truncate(self.config.recall_limit);
        hits.into_iter().map(|(_, entry)| entry).collect()
    }

    /// Read an entry without touching its access statistics.
    #[must_use]
    pub fn get(&self, id: MemoryId) -> Option<MemoryEntry> {
        self.inner.read().entries.get(&id).cloned()
    }

    /// Remove an entry.
    ///
    /// # Errors
    /// Returns `NotFound` if the id is unknown.
    pub fn remove_memory(&self, id: MemoryId) -> KnowledgeResult<MemoryEntry> {
        self.inner
            .write()
            .remove(id)
            .ok_or_else(|| KnowledgeError::NotFound(format!("memory {id}")))
    }

    /// Remove the entry with the lowest retention score.
    #[must_use]
    pub fn forget_least_important(&self) -> Option<MemoryId> {
        self.forget_least_important_at(Utc::now())
    }

    /// Remove the weakest entry, scoring recency against `now`.
    #[must_use]
    pub fn forget_least_important_at(&self, now: DateTime<Utc>) -> Option<MemoryId> {
        self.inner
            .write()
            .forget_one(now, self.config.scoring.recency_scale_hours)
            .map(|entry| entry.id)
    }

    /// Aggregate statistics.
    #[must_use]
    pub fn memory_stats(&self) -> MemoryStats {
        let inner = self.inner.read();
        let mut kind_distribution: BTreeMap<MemoryKind, usize> =
            MemoryKind::ALL.into_iter().map(|kind| (kind, 0)).collect();
        let mut total_importance = 0.0;
        let mut total_confidence = 0.0;

        for entry in inner.entries.values() {
            total_importance += entry.importance;
            total_confidence += entry.confidence;
            *kind_distribution.entry(entry.kind).or_default() += 1;
        }

        let total_memories = inner.entries.len();
        let (average_importance, average_confidence) = if total_memories == 0 {
            (0.0, 0.0)
        } else {
            #[allow(clippy::cast_precision_loss)]
            let n = total_memories as f64;
            (total_importance / n, total_confidence / n)
        };

        MemoryStats {
            total_memories,
            average_importance,
            average_confidence,
            kind_distribution,
        }
    }

    /// Re-score every entry, then drop those matching the cleanup rules.
    ///
    /// # Errors
    /// Returns `MaintenanceInProgress` if another pass is running.
    pub fn run_maintenance(&self) -> KnowledgeResult<MemoryMaintenanceStats> {
        self.run_maintenance_at(Utc::now())
    }

    /// Maintenance pass evaluated at `now`.
    ///
    /// # Errors
    /// Returns `MaintenanceInProgress` if another pass is running.
    pub fn run_maintenance_at(&self, now: DateTime<Utc>) -> KnowledgeResult<MemoryMaintenanceStats> {
        let _pass = self.maintenance.try_begin(COMPONENT)?;
        let start = Instant::now();
        let mut stats = MemoryMaintenanceStats::default();

        let mut guard = self.inner.write();
        let inner = &mut *guard;

        // Scores are computed against the index as it stands before any rewrite.
        let rescored: Vec<(MemoryId, f64, f64)> = inner
            .entries
            .values()
            .map(|entry| {
                let bucket_total: usize = entry
                    .associations
                    .iter()
                    .map(|tag| inner.associations.bucket_len(tag))
                    .sum();
                (
                    entry.id,
                    decayed_importance(entry, bucket_total, now),
                    decayed_confidence(entry, now),
                )
            })
            .collect();

        for (id, importance, confidence) in rescored {
            if let Some(entry) = inner.entries.get_mut(&id) {
                entry.importance = importance;
                entry.confidence = confidence;
                stats.rescored += 1;
            }
        }

        let doomed: Vec<MemoryId> = inner
            .entries
            .values()
            .filter(|entry| should_cleanup(entry, now))
            .map(|entry| entry.id)
            .collect();
        for id in doomed {
            if inner.remove(id).is_some() {
                stats.removed += 1;
            }
        }
        drop(guard);

        #[allow(clippy::cast_possible_truncation)]
        {
            stats.duration_ms = start.elapsed().as_millis() as u64;
        }

        info!(
            rescored = stats.rescored,
            removed = stats.removed,
            "Memory maintenance completed"
        );
        Ok(stats)
    }

    #[cfg(test)]
    fn association_index_matches(&self) -> bool {
        let inner = self.inner.read();
        let forward = inner.entries.values().all(|entry| {
            entry
                .associations
                .iter()
                .all(|tag| inner.associations.contains(tag, entry.id))
        });
        let backward = inner.associations.iter().all(|(tag, ids)| {
            ids.iter().all(|id| {
                inner
                    .entries
                    .get(id)
                    .is_some_and(|entry| entry.associations.contains(tag))
            })
        });
        forward && backward
    }
}

impl Maintainable for RelevanceMemory {
    fn component(&self) -> &'static str {
        COMPONENT
    }

    fn maintain(&self) -> KnowledgeResult<MaintenanceReport> {
        let stats = self.run_maintenance()?;
        Ok(MaintenanceReport {
            component: COMPONENT,
            examined: stats.rescored,
            removed: stats.removed,
            duration_ms: stats.duration_ms,
        })
    }
}
