//! Secondary indices shared by the store and the memory layer.

pub mod eviction;
pub mod tag_index;

pub use eviction::{ReclaimPlan, plan_reclaim, select_lowest};
pub use tag_index::TagIndex;
