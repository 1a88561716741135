//! Common interface for components with a periodic maintenance pass.

use crate::knowledge::core::errors::KnowledgeResult;

/// Summary of one maintenance pass, independent of the component.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    /// Component that ran the pass.
    pub component: &'static str,
    /// Number of records inspected.
    pub examined: usize,
    /// Number of records removed.
    pub removed: usize,
    /// Pass duration in milliseconds.
    pub duration_ms: u64,
}

/// A component the scheduler can sweep periodically.
pub trait Maintainable: Send + Sync {
    /// Stable component name for logs.
    fn component(&self) -> &'static str;

    /// Run one maintenance pass to completion.
    ///
    /// # Errors
    /// Returns an error if a pass is already in progress.
    fn maintain(&self) -> KnowledgeResult<MaintenanceReport>;
}
