//! Bounded cache of generation results keyed by model, kind and prompt.

pub mod response_cache;
pub mod types;

pub use response_cache::{BoundedResponseCache, CacheStats};
pub use types::{AudioOutput, CacheKey, GenerationResponse, ImageOutput, ModelKind, TextOutput, VideoOutput};
