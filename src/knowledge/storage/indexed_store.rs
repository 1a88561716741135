//! Generic keyed object store with type/tag indices and a byte ceiling.
//!
//! Payloads are held in their JSON value form so size and checksum are well
//! defined for any `T: Serialize`. All bookkeeping for one operation happens
//! inside a single write critical section; serialization and digesting of
//! incoming payloads happen before the lock is taken.

use std::collections::{BTreeSet, HashMap};
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::knowledge::core::checksum::{fingerprint, to_value};
use crate::knowledge::core::config::StoreConfig;
use crate::knowledge::core::errors::{KnowledgeError, KnowledgeResult};
use crate::knowledge::core::ids::ItemId;
use crate::knowledge::index::{TagIndex, plan_reclaim};
use crate::knowledge::maintenance::guard::MaintenanceGuard;
use crate::knowledge::maintenance::task::{Maintainable, MaintenanceReport};
use crate::knowledge::storage::item::{ItemMetadata, StorageMetrics, StoredItem};
use crate::knowledge::storage::minify::minify;
use crate::knowledge::storage::query::StoreQuery;

const COMPONENT: &str = "indexed_store";

/// Statistics from a store maintenance pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreMaintenanceStats {
    /// Items inspected.
    pub checked: usize,
    /// Items deleted because their checksum no longer matched.
    pub corrupted_removed: usize,
    /// Items replaced by a smaller minified payload.
    pub minified: usize,
    /// Bytes released by minification.
    pub bytes_saved: usize,
    /// Items skipped because they could not be digested.
    pub errors: usize,
    /// Pass duration in milliseconds.
    pub duration_ms: u64,
}

struct StoreInner {
    items: HashMap<ItemId, StoredItem>,
    by_type: TagIndex<ItemId>,
    by_tag: TagIndex<ItemId>,
    metrics: StorageMetrics,
}

impl StoreInner {
    fn insert(&mut self, item: StoredItem) {
        self.by_type.insert(&item.metadata.item_type, item.id);
        self.by_tag.insert_all(&item.metadata.tags, item.id);
        self.metrics.total_size += item.metadata.size;
        self.items.insert(item.id, item);
        self.metrics.item_count = self.items.len();
    }

    fn remove(&mut self, id: ItemId) -> Option<StoredItem> {
        let item = self.items.remove(&id)?;
        self.by_type.remove(&item.metadata.item_type, id);
        self.by_tag.remove_all(&item.metadata.tags, id);
        self.metrics.total_size = self.metrics.total_size.saturating_sub(item.metadata.size);
        self.metrics.item_count = self.items.len();
        Some(item)
    }

    /// Evict least recently accessed items until `incoming` more bytes fit.
    fn ensure_capacity(
        &mut self,
        incoming: usize,
        exclude: Option<ItemId>,
        max_bytes: usize,
    ) -> KnowledgeResult<usize> {
        let projected = self.metrics.total_size.saturating_add(incoming);
        if projected <= max_bytes {
            return Ok(0);
        }
        let required = projected - max_bytes;

        let mut candidates: Vec<&StoredItem> = self
            .items
            .values()
            .filter(|item| Some(item.id) != exclude)
            .collect();
        candidates.sort_by(|a, b| {
            a.metadata
                .accessed
                .cmp(&b.metadata.accessed)
                .then_with(|| a.metadata.created.cmp(&b.metadata.created))
                .then_with(|| a.id.cmp(&b.id))
        });

        let plan = plan_reclaim(
            candidates.iter().map(|item| (item.id, item.metadata.size)),
            required,
        )
        .map_err(|available| KnowledgeError::StoreFull {
            required,
            available,
        })?;

        for id in &plan.victims {
            self.remove(*id);
        }

        debug!(
            evicted = plan.victims.len(),
            freed = plan.freed,
            required,
            "Evicted items to satisfy byte ceiling"
        );
        Ok(plan.victims.len())
    }
}

/// Keyed object store with secondary indices, checksums and LRA eviction.
pub struct IndexedStore {
    config: StoreConfig,
    inner: RwLock<StoreInner>,
    maintenance: MaintenanceGuard,
}

impl IndexedStore {
    /// Create an empty store.
    ///
    /// # Errors
    /// Returns a validation error if the configuration is invalid.
    pub fn new(config: StoreConfig) -> KnowledgeResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            inner: RwLock::new(StoreInner {
                items: HashMap::new(),
                by_type: TagIndex::new(),
                by_tag: TagIndex::new(),
                metrics: StorageMetrics::empty(Utc::now()),
            }),
            maintenance: MaintenanceGuard::new(),
        })
    }

    /// Byte ceiling of the store.
    #[must_use]
    pub const fn capacity_bytes(&self) -> usize {
        self.config.max_bytes
    }

    /// Number of live items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().items.len()
    }

    /// Whether the store holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().items.is_empty()
    }

    /// Store a payload under a new id.
    ///
    /// # Errors
    /// Returns an error if the type or a tag is empty, the payload cannot be
    /// serialized, or eviction cannot free enough space.
    pub fn store<T, I, S>(&self, data: &T, item_type: &str, tags: I) -> KnowledgeResult<ItemId>
    where
        T: Serialize + ?Sized,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.store_at(data, item_type, tags, Utc::now())
    }

    /// Store a payload using `now` as the creation time.
    ///
    /// # Errors
    /// See [`IndexedStore::store`].
    pub fn store_at<T, I, S>(
        &self,
        data: &T,
        item_type: &str,
        tags: I,
        now: DateTime<Utc>,
    ) -> KnowledgeResult<ItemId>
    where
        T: Serialize + ?Sized,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if item_type.trim().is_empty() {
            return Err(KnowledgeError::Validation(
                "item type must not be empty".to_string(),
            ));
        }
        let tags = collect_tags(tags)?;
        let value = to_value(data)?;
        let fp = fingerprint(&value)?;

        let mut inner = self.inner.write();
        inner.ensure_capacity(fp.size, None, self.config.max_bytes)?;

        let id = ItemId::new();
        inner.insert(StoredItem {
            id,
            data: value,
            metadata: ItemMetadata::new(item_type, tags, fp, now),
        });

        Ok(id)
    }

    /// Read a payload, verifying its checksum.
    ///
    /// Unknown ids yield `Ok(None)`. A corrupted item is reported but left in
    /// place; only the maintenance pass removes it.
    ///
    /// # Errors
    /// Returns `Integrity` on checksum mismatch, or a serialization error if
    /// the payload does not deserialize into `T`.
    pub fn retrieve<T: DeserializeOwned>(&self, id: ItemId) -> KnowledgeResult<Option<T>> {
        self.retrieve_at(id, Utc::now())
    }

    /// Read a payload using `now` as the access time.
    ///
    /// # Errors
    /// See [`IndexedStore::retrieve`].
    pub fn retrieve_at<T: DeserializeOwned>(
        &self,
        id: ItemId,
        now: DateTime<Utc>,
    ) -> KnowledgeResult<Option<T>> {
        let value = {
            let mut inner = self.inner.write();
            let Some(item) = inner.items.get_mut(&id) else {
                return Ok(None);
            };
            item.metadata.accessed = now;

            let current = fingerprint(&item.data)?;
            if current.checksum != item.metadata.checksum {
                warn!(%id, "Checksum mismatch on retrieve");
                return Err(KnowledgeError::Integrity {
                    id: id.to_string(),
                    expected: item.metadata.checksum.clone(),
                    actual: current.checksum,
                });
            }
            item.data.clone()
        };

        Ok(Some(serde_json::from_value(value)?))
    }

    /// Replace a payload and optionally its tags.
    ///
    /// Returns `false` if the id is unknown.
    ///
    /// # Errors
    /// Returns an error if a tag is empty, the payload cannot be serialized,
    /// or the growth cannot be accommodated by evicting other items.
    pub fn update<T>(&self, id: ItemId, data: &T, tags: Option<Vec<String>>) -> KnowledgeResult<bool>
    where
        T: Serialize + ?Sized,
    {
        self.update_at(id, data, tags, Utc::now())
    }

    /// Replace a payload using `now` as the modification time.
    ///
    /// # Errors
    /// See [`IndexedStore::update`].
    pub fn update_at<T>(
        &self,
        id: ItemId,
        data: &T,
        tags: Option<Vec<String>>,
        now: DateTime<Utc>,
    ) -> KnowledgeResult<bool>
    where
        T: Serialize + ?Sized,
    {
        let tags = tags.map(collect_tags).transpose()?;
        let value = to_value(data)?;
        let fp = fingerprint(&value)?;

        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let Some(old_size) = inner.items.get(&id).map(|item| item.metadata.size) else {
            return Ok(false);
        };

        if fp.size > old_size {
            inner.ensure_capacity(fp.size - old_size, Some(id), self.config.max_bytes)?;
        }

        let Some(item) = inner.items.get_mut(&id) else {
            return Ok(false);
        };
        if let Some(tags) = tags {
            inner.by_tag.remove_all(&item.metadata.tags, id);
            inner.by_tag.insert_all(&tags, id);
            item.metadata.tags = tags;
        }

        let new_size = fp.size;
        item.data = value;
        item.metadata.record_write(fp, now);
        inner.metrics.total_size = inner.metrics.total_size - old_size + new_size;

        Ok(true)
    }

    /// Delete an item. Returns `false` if the id is unknown.
    pub fn delete(&self, id: ItemId) -> bool {
        self.inner.write().remove(id).is_some()
    }

    /// Find ids matching every filter in `query`.
    ///
    /// # Errors
    /// Returns a validation error for malformed query parameters.
    pub fn query(&self, query: &StoreQuery) -> KnowledgeResult<Vec<ItemId>> {
        query.validate()?;
        let inner = self.inner.read();

        let indexed: Option<BTreeSet<ItemId>> = match (query.item_type.as_deref(), query.tag_filter()) {
            (None, None) => None,
            (Some(item_type), None) => Some(inner.by_type.get(item_type).cloned().unwrap_or_default()),
            (None, Some(tags)) => Some(inner.by_tag.intersect(tags.iter().map(String::as_str))),
            (Some(item_type), Some(tags)) => {
                let mut ids = inner.by_tag.intersect(tags.iter().map(String::as_str));
                ids.retain(|id| inner.by_type.contains(item_type, *id));
                Some(ids)
            }
        };

        let ids = match indexed {
            None => inner
                .items
                .values()
                .filter(|item| query.accepts(&item.metadata))
                .map(|item| item.id)
                .collect(),
            Some(ids) => ids
                .into_iter()
                .filter(|id| {
                    inner
                        .items
                        .get(id)
                        .is_some_and(|item| query.accepts(&item.metadata))
                })
                .collect(),
        };

        Ok(ids)
    }

    /// Snapshot of aggregate metrics.
    #[must_use]
    pub fn metrics(&self) -> StorageMetrics {
        self.inner.read().metrics.clone()
    }

    /// Metadata of a single item, without touching its access time.
    #[must_use]
    pub fn storage_info(&self, id: ItemId) -> Option<ItemMetadata> {
        self.inner
            .read()
            .items
            .get(&id)
            .map(|item| item.metadata.clone())
    }

    /// Run one maintenance pass: drop corrupted items and minify the rest.
    ///
    /// # Errors
    /// Returns `MaintenanceInProgress` if another pass is running.
    pub fn run_maintenance(&self) -> KnowledgeResult<StoreMaintenanceStats> {
        self.run_maintenance_at(Utc::now())
    }

    /// Run one maintenance pass, stamping `now` as the optimization time.
    ///
    /// Minified payloads get a fresh checksum so they pass later integrity
    /// checks.
    ///
    /// # Errors
    /// Returns `MaintenanceInProgress` if another pass is running.
    #[allow(clippy::cast_precision_loss)]
    pub fn run_maintenance_at(&self, now: DateTime<Utc>) -> KnowledgeResult<StoreMaintenanceStats> {
        let _pass = self.maintenance.try_begin(COMPONENT)?;
        let start = Instant::now();
        let mut stats = StoreMaintenanceStats::default();

        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let ids: Vec<ItemId> = inner.items.keys().copied().collect();
        stats.checked = ids.len();

        for id in ids {
            let Some(item) = inner.items.get(&id) else {
                continue;
            };

            let current = match fingerprint(&item.data) {
                Ok(fp) => fp,
                Err(err) => {
                    warn!(%id, ?err, "Skipping item that cannot be digested");
                    stats.errors += 1;
                    continue;
                }
            };

            if current.checksum != item.metadata.checksum {
                warn!(%id, "Checksum mismatch, removing item");
                inner.remove(id);
                stats.corrupted_removed += 1;
                continue;
            }

            let minified = minify(&item.data);
            let fp = match fingerprint(&minified) {
                Ok(fp) => fp,
                Err(err) => {
                    warn!(%id, ?err, "Skipping item whose minified form cannot be digested");
                    stats.errors += 1;
                    continue;
                }
            };

            if fp.size < item.metadata.size {
                let saved = item.metadata.size - fp.size;
                let Some(entry) = inner.items.get_mut(&id) else {
                    continue;
                };
                entry.data = minified;
                entry.metadata.size = fp.size;
                entry.metadata.checksum = fp.checksum;
                inner.metrics.total_size -= saved;
                stats.minified += 1;
                stats.bytes_saved += saved;
            }
        }

        let total = inner.metrics.total_size;
        inner.metrics.last_optimized = now;
        inner.metrics.compression_ratio = if total == 0 {
            0.0
        } else {
            stats.bytes_saved as f64 / total as f64
        };
        drop(guard);

        #[allow(clippy::cast_possible_truncation)]
        {
            stats.duration_ms = start.elapsed().as_millis() as u64;
        }

        if stats.corrupted_removed > 0 || stats.minified > 0 {
            info!(
                checked = stats.checked,
                corrupted = stats.corrupted_removed,
                minified = stats.minified,
                bytes_saved = stats.bytes_saved,
                "Store maintenance completed"
            );
        } else {
            debug!(checked = stats.checked, "Store maintenance found nothing to do");
        }

        Ok(stats)
    }

    #[cfg(test)]
    fn tamper(&self, id: ItemId, data: serde_json::Value) {
        if let Some(item) = self.inner.write().items.get_mut(&id) {
            item.data = data;
        }
    }
}

impl Maintainable for IndexedStore {
    fn component(&self) -> &'static str {
        COMPONENT
    }

    fn maintain(&self) -> KnowledgeResult<MaintenanceReport> {
        let stats = self.run_maintenance()?;
        Ok(MaintenanceReport {
            component: COMPONENT,
            examined: stats.checked,
            removed: stats.corrupted_removed,
            duration_ms: stats.duration_ms,
        })
    }
}

fn collect_tags<I, S>(tags: I) -> KnowledgeResult<BTreeSet<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut set = BTreeSet::new();
    for tag in tags {
        let tag = tag.into();
        if tag.trim().is_empty() {
            return Err(KnowledgeError::Validation(
                "tags must not be empty".to_string(),
            ));
        }
        set.insert(tag);
    }
    Ok(set)
}
