//! Core knowledge types: configuration, errors, ids, and checksums.

pub mod checksum;
pub mod config;
pub mod errors;
pub mod ids;

pub use checksum::{Fingerprint, digest, fingerprint};
pub use config::{CacheConfig, KnowledgeConfig, MemoryConfig, ScoringConfig, StoreConfig};
pub use errors::{KnowledgeError, KnowledgeResult};
pub use ids::{ItemId, MemoryId};
