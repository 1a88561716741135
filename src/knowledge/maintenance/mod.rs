//! Maintenance plumbing shared by the knowledge components.

pub mod guard;
pub mod scheduler;
pub mod task;

pub use guard::{MaintenanceGuard, MaintenancePass};
pub use scheduler::{MaintenanceScheduler, SchedulerConfig, SchedulerConfigBuilder};
pub use task::{Maintainable, MaintenanceReport};
