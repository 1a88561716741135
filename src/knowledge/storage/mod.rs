//! Byte-bounded keyed object store with type and tag indices.

pub mod indexed_store;
pub mod item;
pub mod minify;
pub mod query;

pub use indexed_store::{IndexedStore, StoreMaintenanceStats};
pub use item::{ItemMetadata, StorageMetrics, StoredItem};
pub use minify::minify;
pub use query::StoreQuery;
