//! In-process semantic knowledge subsystem for the gallery.
//!
//! Three components, each a shared resource behind one lock:
//! - [`IndexedStore`]: keyed JSON objects with type/tag indices, SHA-256
//!   checksums and least-recently-accessed eviction under a byte ceiling.
//! - [`RelevanceMemory`]: typed entries recalled through a weighted
//!   relevance score, with decaying importance and confidence.
//! - [`BoundedResponseCache`]: generation results keyed by model, kind and
//!   prompt, with TTL and model version checks.
//!
//! Components never run timers; a [`MaintenanceScheduler`] drives their
//! maintenance passes.

pub mod cache;
pub mod core;
pub mod index;
pub mod maintenance;
pub mod recall;
pub mod storage;

pub use cache::{BoundedResponseCache, CacheKey, CacheStats, GenerationResponse, ModelKind};
pub use self::core::{
    CacheConfig, ItemId, KnowledgeConfig, KnowledgeError, KnowledgeResult, MemoryConfig,
    MemoryId, ScoringConfig, StoreConfig,
};
pub use index::TagIndex;
pub use maintenance::{
    Maintainable, MaintenanceReport, MaintenanceScheduler, SchedulerConfig, SchedulerConfigBuilder,
};
pub use recall::{MemoryEntry, MemoryKind, MemoryStats, NewMemory, RelevanceMemory};
pub use storage::{IndexedStore, ItemMetadata, StorageMetrics, StoreQuery};
