//! Relevance-ranked semantic memory built on the shared index types.

pub mod entry;
pub mod relevance_memory;
pub mod scoring;
pub mod seed;

pub use entry::{MemoryEntry, MemoryKind, NewMemory};
pub use relevance_memory::{MemoryMaintenanceStats, MemoryStats, RelevanceMemory};
