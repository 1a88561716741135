//! Periodic maintenance scheduler.
//!
//! Runs each registered component's maintenance pass at its own interval
//! until shutdown is signaled. Components never spawn timers themselves.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::knowledge::core::errors::{KnowledgeError, KnowledgeResult};
use crate::knowledge::maintenance::task::Maintainable;

/// Scheduling intervals for the knowledge components.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Whether the scheduler runs at all.
    pub enabled: bool,
    /// Seconds between store maintenance passes.
    pub store_interval_seconds: u64,
    /// Seconds between memory maintenance passes.
    pub memory_interval_seconds: u64,
    /// Seconds between cache expiry sweeps.
    pub cache_interval_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            store_interval_seconds: 3600,   // 1 hour
            memory_interval_seconds: 86_400, // 24 hours
            cache_interval_seconds: 3600,   // 1 hour
        }
    }
}

impl SchedulerConfig {
    /// Validate scheduler settings.
    ///
    /// # Errors
    /// Returns an error if any interval is zero.
    pub fn validate(&self) -> KnowledgeResult<()> {
        let intervals = [
            ("store_interval_seconds", self.store_interval_seconds),
            ("memory_interval_seconds", self.memory_interval_seconds),
            ("cache_interval_seconds", self.cache_interval_seconds),
        ];
        for (name, seconds) in intervals {
            if seconds == 0 {
                return Err(KnowledgeError::Validation(format!(
                    "scheduler.{name} must be > 0"
                )));
            }
        }
        Ok(())
    }

    /// Store maintenance interval.
    #[must_use]
    pub const fn store_interval(&self) -> Duration {
        Duration::from_secs(self.store_interval_seconds)
    }

    /// Memory maintenance interval.
    #[must_use]
    pub const fn memory_interval(&self) -> Duration {
        Duration::from_secs(self.memory_interval_seconds)
    }

    /// Cache sweep interval.
    #[must_use]
    pub const fn cache_interval(&self) -> Duration {
        Duration::from_secs(self.cache_interval_seconds)
    }
}

/// Builder for scheduler configuration.
#[derive(Debug, Clone, Default)]
pub struct SchedulerConfigBuilder {
    enabled: Option<bool>,
    store_interval_seconds: Option<u64>,
    memory_interval_seconds: Option<u64>,
    cache_interval_seconds: Option<u64>,
}

impl SchedulerConfigBuilder {
    /// Create a new builder with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the scheduler.
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Set the store interval in seconds.
    #[must_use]
    pub const fn store_interval_seconds(mut self, seconds: u64) -> Self {
        self.store_interval_seconds = Some(seconds);
        self
    }

    /// Set the memory interval in seconds.
    #[must_use]
    pub const fn memory_interval_seconds(mut self, seconds: u64) -> Self {
        self.memory_interval_seconds = Some(seconds);
        self
    }

    /// Set the cache interval in seconds.
    #[must_use]
    pub const fn cache_interval_seconds(mut self, seconds: u64) -> Self {
        self.cache_interval_seconds = Some(seconds);
        self
    }

    /// Build the scheduler configuration.
    #[must_use]
    pub fn build(self) -> SchedulerConfig {
        let default = SchedulerConfig::default();
        SchedulerConfig {
            enabled: self.enabled.unwrap_or(default.enabled),
            store_interval_seconds: self
                .store_interval_seconds
                .unwrap_or(default.store_interval_seconds),
            memory_interval_seconds: self
                .memory_interval_seconds
                .unwrap_or(default.memory_interval_seconds),
            cache_interval_seconds: self
                .cache_interval_seconds
                .unwrap_or(default.cache_interval_seconds),
        }
    }
}

struct ScheduledJob {
    task: Arc<dyn Maintainable>,
    interval: Duration,
    next_due: Instant,
}

/// Background worker that drives registered maintenance passes.
pub struct MaintenanceScheduler {
    enabled: bool,
    jobs: Vec<ScheduledJob>,
    shutdown: Arc<Notify>,
}

impl MaintenanceScheduler {
    /// Create a scheduler with no jobs.
    #[must_use]
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            enabled: config.enabled,
            jobs: Vec::new(),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Register a component to be maintained every `interval`.
    ///
    /// The first pass runs one interval after the scheduler starts.
    #[must_use]
    pub fn with_job(mut self, task: Arc<dyn Maintainable>, interval: Duration) -> Self {
        self.jobs.push(ScheduledJob {
            task,
            interval,
            next_due: Instant::now() + interval,
        });
        self
    }

    /// Number of registered jobs.
    #[must_use]
    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Get a shutdown notifier to stop the scheduler.
    #[must_use]
    pub fn shutdown_notifier(&self) -> Arc<Notify> {
        Arc::clone(&self.shutdown)
    }

    /// Spawn the scheduler as a tokio task.
    ///
    /// Returns a `JoinHandle` that completes after shutdown.
    #[must_use]
    pub fn spawn(mut self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&mut self) {
        if !self.enabled {
            info!("Maintenance scheduler is disabled");
            return;
        }

        let start = Instant::now();
        for job in &mut self.jobs {
            job.next_due = start + job.interval;
        }
        info!(jobs = self.jobs.len(), "Starting maintenance scheduler");

        loop {
            let next_wake = self.jobs.iter().map(|job| job.next_due).min();
            let sleep = async {
                match next_wake {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                () = sleep => self.run_due_jobs().await,
                () = self.shutdown.notified() => {
                    info!("Maintenance scheduler shutting down");
                    break;
                }
            }
        }
    }

    /// Passes hold component locks, so they run on the blocking pool.
    async fn run_due_jobs(&mut self) {
        let now = Instant::now();
        for job in self.jobs.iter_mut().filter(|job| job.next_due <= now) {
            let task = Arc::clone(&job.task);
            let component = task.component();
            match tokio::task::spawn_blocking(move || task.maintain()).await {
                Ok(Ok(report)) => {
                    if report.removed > 0 {
                        info!(
                            component = report.component,
                            examined = report.examined,
                            removed = report.removed,
                            duration_ms = report.duration_ms,
                            "Maintenance pass completed"
                        );
                    } else {
                        debug!(
                            component = report.component,
                            examined = report.examined,
                            "Maintenance pass completed with nothing to remove"
                        );
                    }
                }
                Ok(Err(err)) => {
                    warn!(component, ?err, "Maintenance pass failed");
                }
                Err(err) => {
                    warn!(component, ?err, "Maintenance pass panicked");
                }
            }
            job.next_due = now + job.interval;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::maintenance::task::MaintenanceReport;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingTask {
        runs: AtomicUsize,
        fail: bool,
    }

    impl Maintainable for CountingTask {
        fn component(&self) -> &'static str {
            "counting"
        }

        fn maintain(&self) -> KnowledgeResult<MaintenanceReport> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(KnowledgeError::MaintenanceInProgress("counting"));
            }
            Ok(MaintenanceReport {
                component: "counting",
                ..MaintenanceReport::default()
            })
        }
    }

    struct PanickingTask {
        runs: AtomicUsize,
    }

    impl Maintainable for PanickingTask {
        fn component(&self) -> &'static str {
            "panicking"
        }

        #[allow(clippy::panic)]
        fn maintain(&self) -> KnowledgeResult<MaintenanceReport> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            panic!("sweep blew up");
        }
    }

    #[test]
    fn test_config_default() {
        let config = SchedulerConfig::default();
        assert!(config.enabled);
        assert_eq!(config.store_interval(), Duration::from_secs(3600));
        assert_eq!(config.memory_interval(), Duration::from_secs(86_400));
        assert_eq!(config.cache_interval(), Duration::from_secs(3600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = SchedulerConfigBuilder::new()
            .enabled(false)
            .store_interval_seconds(60)
            .memory_interval_seconds(120)
            .build();

        assert!(!config.enabled);
        assert_eq!(config.store_interval_seconds, 60);
        assert_eq!(config.memory_interval_seconds, 120);
        assert_eq!(config.cache_interval_seconds, 3600);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = SchedulerConfigBuilder::new().cache_interval_seconds(0).build();
        assert!(matches!(
            config.validate(),
            Err(KnowledgeError::Validation(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_jobs_run_at_their_own_intervals() {
        let fast = Arc::new(CountingTask::default());
        let slow = Arc::new(CountingTask::default());
        let scheduler = MaintenanceScheduler::new(&SchedulerConfig::default())
            .with_job(fast.clone(), Duration::from_secs(30))
            .with_job(slow.clone(), Duration::from_secs(100));
        assert_eq!(scheduler.job_count(), 2);

        let shutdown = scheduler.shutdown_notifier();
        let handle = scheduler.spawn();

        tokio::time::sleep(Duration::from_secs(250)).await;
        assert_eq!(fast.runs.load(Ordering::SeqCst), 8);
        assert_eq!(slow.runs.load(Ordering::SeqCst), 2);

        shutdown.notify_one();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_job_keeps_schedule() {
        let failing = Arc::new(CountingTask {
            runs: AtomicUsize::new(0),
            fail: true,
        });
        let scheduler = MaintenanceScheduler::new(&SchedulerConfig::default())
            .with_job(failing.clone(), Duration::from_secs(10));
        let shutdown = scheduler.shutdown_notifier();
        let handle = scheduler.spawn();

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(failing.runs.load(Ordering::SeqCst), 3);

        shutdown.notify_one();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_scheduler_exits_immediately() {
        let task = Arc::new(CountingTask::default());
        let config = SchedulerConfigBuilder::new().enabled(false).build();
        let handle = MaintenanceScheduler::new(&config)
            .with_job(task.clone(), Duration::from_secs(1))
            .spawn();

        handle.await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(task.runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_without_jobs() {
        let scheduler = MaintenanceScheduler::new(&SchedulerConfig::default());
        let shutdown = scheduler.shutdown_notifier();
        let handle = scheduler.spawn();

        shutdown.notify_one();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_job_keeps_schedule() {
        let panicking = Arc::new(PanickingTask {
            runs: AtomicUsize::new(0),
        });
        let steady = Arc::new(CountingTask::default());
        let scheduler = MaintenanceScheduler::new(&SchedulerConfig::default())
            .with_job(panicking.clone(), Duration::from_secs(10))
            .with_job(steady.clone(), Duration::from_secs(10));
        let shutdown = scheduler.shutdown_notifier();
        let handle = scheduler.spawn();

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(panicking.runs.load(Ordering::SeqCst), 2);
        assert_eq!(steady.runs.load(Ordering::SeqCst), 2);

        shutdown.notify_one();
        handle.await.unwrap();
    }
}
