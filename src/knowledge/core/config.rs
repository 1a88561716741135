//! Configuration for the knowledge subsystem.

use serde::{Deserialize, Serialize};

use crate::knowledge::core::errors::{KnowledgeError, KnowledgeResult};
use crate::knowledge::maintenance::scheduler::SchedulerConfig;

/// Top-level configuration for the knowledge services.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KnowledgeConfig {
    /// Indexed store settings.
    pub store: StoreConfig,
    /// Relevance memory settings.
    pub memory: MemoryConfig,
    /// Response cache settings.
    pub cache: CacheConfig,
    /// Maintenance scheduling settings.
    pub scheduler: SchedulerConfig,
}

impl KnowledgeConfig {
    /// Parse a configuration from JSON. Missing sections fall back to defaults.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or the result fails validation.
    pub fn from_json_str(raw: &str) -> KnowledgeResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> KnowledgeResult<()> {
        self.store.validate()?;
        self.memory.validate()?;
        self.cache.validate()?;
        self.scheduler.validate()
    }
}

/// Indexed store settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Byte ceiling for the sum of serialized payload sizes.
    pub max_bytes: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_bytes: 1024 * 1024 * 1024, // 1 GiB
        }
    }
}

impl StoreConfig {
    /// Validate store settings.
    ///
    /// # Errors
    /// Returns an error if the byte ceiling is zero.
    pub fn validate(&self) -> KnowledgeResult<()> {
        if self.max_bytes == 0 {
            return Err(KnowledgeError::Validation(
                "store.max_bytes must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Relevance memory settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Maximum number of entries before forgetting kicks in.
    pub capacity: usize,
    /// Minimum relevance (exclusive) for an entry to be recalled.
    pub recall_threshold: f64,
    /// Maximum number of entries returned by a recall.
    pub recall_limit: usize,
    /// Confidence assigned to new entries.
    pub initial_confidence: f64,
    /// Load the built-in art concepts on construction.
    pub seed_builtin_concepts: bool,
    /// Relevance scoring weights.
    pub scoring: ScoringConfig,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            capacity: 10_000,
            recall_threshold: 0.3,
            recall_limit: 10,
            initial_confidence: 0.8,
            seed_builtin_concepts: true,
            scoring: ScoringConfig::default(),
        }
    }
}

impl MemoryConfig {
    /// Validate memory settings.
    ///
    /// # Errors
    /// Returns an error if capacities are zero or scores fall outside `[0, 1]`.
    pub fn validate(&self) -> KnowledgeResult<()> {
        if self.capacity == 0 {
            return Err(KnowledgeError::Validation(
                "memory.capacity must be > 0".to_string(),
            ));
        }

        if self.recall_limit == 0 {
            return Err(KnowledgeError::Validation(
                "memory.recall_limit must be > 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.recall_threshold) {
            return Err(KnowledgeError::Validation(
                "memory.recall_threshold must be in 0..=1".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.initial_confidence) {
            return Err(KnowledgeError::Validation(
                "memory.initial_confidence must be in 0..=1".to_string(),
            ));
        }

        self.scoring.validate()
    }
}

/// Weights of the relevance function used by recall.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Weight of query/content word overlap.
    pub content_weight: f64,
    /// Weight of association/context overlap.
    pub context_weight: f64,
    /// Weight of `importance * confidence`.
    pub intrinsic_weight: f64,
    /// Weight of access recency.
    pub recency_weight: f64,
    /// Characteristic scale in hours of the recency decay `exp(-h / scale)`.
    pub recency_scale_hours: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            content_weight: 0.4,
            context_weight: 0.3,
            intrinsic_weight: 0.2,
            recency_weight: 0.1,
            recency_scale_hours: 720.0, // 30 days
        }
    }
}

impl ScoringConfig {
    /// Validate scoring weights.
    ///
    /// # Errors
    /// Returns an error if a weight is negative, the weights do not sum to 1,
    /// or the recency scale is not strictly positive.
    pub fn validate(&self) -> KnowledgeResult<()> {
        let weights = [
            self.content_weight,
            self.context_weight,
            self.intrinsic_weight,
            self.recency_weight,
        ];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(KnowledgeError::Validation(
                "scoring weights must be finite and >= 0".to_string(),
            ));
        }

        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(KnowledgeError::Validation(format!(
                "scoring weights must sum to 1.0 (got {sum})"
            )));
        }

        if !self.recency_scale_hours.is_finite() || self.recency_scale_hours <= 0.0 {
            return Err(KnowledgeError::Validation(
                "scoring.recency_scale_hours must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Response cache settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether caching is enabled.
    pub enabled: bool,
    /// Maximum number of cached responses.
    pub max_entries: usize,
    /// Entry lifetime in seconds.
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 1000,
            ttl_seconds: 24 * 60 * 60,
        }
    }
}

impl CacheConfig {
    /// Validate cache settings.
    ///
    /// # Errors
    /// Returns an error if the capacity or TTL is zero.
    pub fn validate(&self) -> KnowledgeResult<()> {
        if self.max_entries == 0 {
            return Err(KnowledgeError::Validation(
                "cache.max_entries must be > 0".to_string(),
            ));
        }

        if self.ttl_seconds == 0 {
            return Err(KnowledgeError::Validation(
                "cache.ttl_seconds must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = KnowledgeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.max_bytes, 1_073_741_824);
        assert_eq!(config.memory.capacity, 10_000);
        assert_eq!(config.cache.max_entries, 1000);
        assert_eq!(config.cache.ttl_seconds, 86_400);
    }

    #[test]
    fn test_zero_capacities_rejected() {
        let mut config = KnowledgeConfig::default();
        config.store.max_bytes = 0;
        assert!(matches!(
            config.validate(),
            Err(KnowledgeError::Validation(_))
        ));

        let mut config = KnowledgeConfig::default();
        config.memory.capacity = 0;
        assert!(config.validate().is_err());

        let mut config = KnowledgeConfig::default();
        config.cache.max_entries = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut config = MemoryConfig::default();
        config.scoring.content_weight = 0.5;
        assert!(config.validate().is_err());

        config.scoring.context_weight = 0.2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = KnowledgeConfig::from_json_str(r#"{"store": {"max_bytes": 2048}}"#)
            .unwrap();
        assert_eq!(config.store.max_bytes, 2048);
        assert_eq!(config.memory.recall_limit, 10);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_invalid_json_config_rejected() {
        assert!(KnowledgeConfig::from_json_str(r#"{"cache": {"ttl_seconds": 0}}"#).is_err());
        assert!(KnowledgeConfig::from_json_str("not json").is_err());
    }
}
