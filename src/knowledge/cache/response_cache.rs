//! Bounded TTL cache for generation results.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::knowledge::cache::types::{CacheKey, GenerationResponse, ModelKind};
use crate::knowledge::core::config::CacheConfig;
use crate::knowledge::core::errors::KnowledgeResult;
use crate::knowledge::maintenance::task::{Maintainable, MaintenanceReport};

const COMPONENT: &str = "response_cache";

#[derive(Clone, Debug)]
struct CacheEntry {
    response: GenerationResponse,
    timestamp: DateTime<Utc>,
    model_version: String,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.timestamp) > ttl
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Live entries, expired or not.
    pub size: usize,
    /// Timestamp of the oldest entry.
    pub oldest_entry: Option<DateTime<Utc>>,
    /// Timestamp of the newest entry.
    pub newest_entry: Option<DateTime<Utc>>,
    /// Lookups that returned a response.
    pub hits: u64,
    /// Lookups that returned nothing.
    pub misses: u64,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<CacheKey, CacheEntry>,
    hits: u64,
    misses: u64,
}

/// Fixed-capacity response cache with TTL and model version checks.
pub struct BoundedResponseCache {
    config: CacheConfig,
    ttl: Duration,
    inner: RwLock<CacheInner>,
}

impl BoundedResponseCache {
    /// Create an empty cache.
    ///
    /// # Errors
    /// Returns a validation error if the configuration is invalid.
    pub fn new(config: CacheConfig) -> KnowledgeResult<Self> {
        config.validate()?;
        let ttl = i64::try_from(config.ttl_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        Ok(Self {
            config,
            ttl,
            inner: RwLock::new(CacheInner::default()),
        })
    }

    /// Look up a cached response.
    ///
    /// Expired entries and entries from another model version are purged
    /// and reported as a miss.
    #[must_use]
    pub fn get(
        &self,
        model: &str,
        kind: ModelKind,
        prompt: &str,
        model_version: &str,
    ) -> Option<GenerationResponse> {
        self.get_at(model, kind, prompt, model_version, Utc::now())
    }

    /// Look up a cached response, judging expiry against `now`.
    #[must_use]
    pub fn get_at(
        &self,
        model: &str,
        kind: ModelKind,
        prompt: &str,
        model_version: &str,
        now: DateTime<Utc>,
    ) -> Option<GenerationResponse> {
        if !self.config.enabled {
            return None;
        }

        let key = CacheKey::new(model, kind, prompt);
        let mut inner = self.inner.write();

        let lookup = inner.entries.get(&key).map(|entry| {
            if entry.is_expired(now, self.ttl) || entry.model_version != model_version {
                None
            } else {
                Some(entry.response.clone())
            }
        });

        let fresh = match lookup {
            None => None,
            Some(None) => {
                debug!(%key, "Purging stale cache entry");
                inner.entries.remove(&key);
                None
            }
            Some(Some(response)) => Some(response),
        };

        if fresh.is_some() {
            inner.hits += 1;
        } else {
            inner.misses += 1;
        }
        fresh
    }

    /// Cache a response.
    ///
    /// Inserting a new key at capacity evicts the oldest entry first.
    /// Replacing an existing key never evicts.
    pub fn set(
        &self,
        model: &str,
        kind: ModelKind,
        prompt: &str,
        response: GenerationResponse,
        model_version: &str,
    ) {
        self.set_at(model, kind, prompt, response, model_version, Utc::now());
    }

    /// Cache a response stamped with `now`.
    pub fn set_at(
        &self,
        model: &str,
        kind: ModelKind,
        prompt: &str,
        response: GenerationResponse,
        model_version: &str,
        now: DateTime<Utc>,
    ) {
        if !self.config.enabled {
            return;
        }

        let key = CacheKey::new(model, kind, prompt);
        let mut inner = self.inner.write();

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.config.max_entries {
            let oldest = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.timestamp)
                .map(|(candidate, _)| candidate.clone());
            if let Some(oldest) = oldest {
                inner.entries.remove(&oldest);
            }
        }

        inner.entries.insert(
            key,
            CacheEntry {
                response,
                timestamp: now,
                model_version: model_version.to_string(),
            },
        );
    }

    /// Remove expired entries and return how many were dropped.
    pub fn clear_expired(&self) -> usize {
        self.clear_expired_at(Utc::now())
    }

    /// Remove entries expired as of `now`.
    pub fn clear_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut inner = self.inner.write();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired(now, self.ttl));
        before - inner.entries.len()
    }

    /// Drop every entry. Hit and miss counters are kept.
    pub fn clear(&self) {
        self.inner.write().entries.clear();
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    /// Snapshot of cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.read();
        let timestamps = inner.entries.values().map(|entry| entry.timestamp);
        CacheStats {
            size: inner.entries.len(),
            oldest_entry: timestamps.clone().min(),
            newest_entry: timestamps.max(),
            hits: inner.hits,
            misses: inner.misses,
        }
    }
}

impl Maintainable for BoundedResponseCache {
    fn component(&self) -> &'static str {
        COMPONENT
    }

    fn maintain(&self) -> KnowledgeResult<MaintenanceReport> {
        let start = std::time::Instant::now();
        let examined = self.len();
        let removed = self.clear_expired();
        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = start.elapsed().as_millis() as u64;
        Ok(MaintenanceReport {
            component: COMPONENT,
            examined,
            removed,
            duration_ms,
        })
    }
}
