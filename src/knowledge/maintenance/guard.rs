//! Single-flight guard for maintenance passes.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::knowledge::core::errors::{KnowledgeError, KnowledgeResult};

/// Ensures at most one maintenance pass runs per component.
#[derive(Debug, Default)]
pub struct MaintenanceGuard {
    running: AtomicBool,
}

impl MaintenanceGuard {
    /// Create an idle guard.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
        }
    }

    /// Mark a pass as started. The pass ends when the returned token drops.
    ///
    /// # Errors
    /// Returns `MaintenanceInProgress` if another pass holds the guard.
    pub fn try_begin(&self, component: &'static str) -> KnowledgeResult<MaintenancePass<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| KnowledgeError::MaintenanceInProgress(component))?;
        Ok(MaintenancePass {
            running: &self.running,
        })
    }

    /// Whether a pass is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Token held for the duration of one maintenance pass.
#[derive(Debug)]
pub struct MaintenancePass<'a> {
    running: &'a AtomicBool,
}

impl Drop for MaintenancePass<'_> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_pass_rejected_until_first_drops() {
        let guard = MaintenanceGuard::new();
        let pass = guard.try_begin("store").unwrap();
        assert!(guard.is_running());
        assert!(matches!(
            guard.try_begin("store"),
            Err(KnowledgeError::MaintenanceInProgress("store"))
        ));

        drop(pass);
        assert!(!guard.is_running());
        assert!(guard.try_begin("store").is_ok());
    }
}
