//! Startup helpers for the gallery knowledge service.
//!
//! Builds the store, memory and cache from configuration, then drives their
//! maintenance passes until Ctrl-C.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::knowledge::{
    BoundedResponseCache, IndexedStore, KnowledgeConfig, MaintenanceScheduler, RelevanceMemory,
};

/// Path to a JSON configuration file.
pub const CONFIG_PATH_ENV: &str = "GALLERY_KNOWLEDGE_CONFIG";
/// Override for the store byte ceiling.
pub const STORE_MAX_BYTES_ENV: &str = "GALLERY_STORE_MAX_BYTES";
/// Override for the memory entry capacity.
pub const MEMORY_CAPACITY_ENV: &str = "GALLERY_MEMORY_CAPACITY";
/// Override for the cache entry capacity.
pub const CACHE_MAX_ENTRIES_ENV: &str = "GALLERY_CACHE_MAX_ENTRIES";

/// The three knowledge components, shared by `Arc`.
pub struct KnowledgeServices {
    /// Indexed object store.
    pub store: Arc<IndexedStore>,
    /// Relevance-ranked memory.
    pub memory: Arc<RelevanceMemory>,
    /// Generation response cache.
    pub cache: Arc<BoundedResponseCache>,
}

impl KnowledgeServices {
    /// Construct every component from `config`.
    ///
    /// # Errors
    /// Returns an error if any section of the configuration is invalid.
    pub fn build(config: &KnowledgeConfig) -> Result<Self> {
        let store = IndexedStore::new(config.store.clone()).context("invalid store config")?;
        let memory =
            RelevanceMemory::new(config.memory.clone()).context("invalid memory config")?;
        let cache =
            BoundedResponseCache::new(config.cache.clone()).context("invalid cache config")?;

        Ok(Self {
            store: Arc::new(store),
            memory: Arc::new(memory),
            cache: Arc::new(cache),
        })
    }

    /// Scheduler with one job per component at its configured interval.
    #[must_use]
    pub fn scheduler(&self, config: &KnowledgeConfig) -> MaintenanceScheduler {
        let intervals = &config.scheduler;
        MaintenanceScheduler::new(intervals)
            .with_job(self.store.clone(), intervals.store_interval())
            .with_job(self.memory.clone(), intervals.memory_interval())
            .with_job(self.cache.clone(), intervals.cache_interval())
    }
}

/// Run the service (used by the `gallery-knowledge` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting gallery knowledge service v{}", env!("CARGO_PKG_VERSION"));

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(serve()) {
        tracing::error!("Service error: {e:#}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Build the services, start the scheduler and wait for Ctrl-C.
///
/// # Errors
/// Returns an error if configuration loading fails or the signal handler
/// cannot be installed.
pub async fn serve() -> Result<()> {
    let config = load_config()?;
    let services = KnowledgeServices::build(&config)?;

    tracing::info!(
        store_max_bytes = services.store.capacity_bytes(),
        memory_entries = services.memory.len(),
        cache_max_entries = config.cache.max_entries,
        cache_enabled = config.cache.enabled,
        "Knowledge services ready"
    );

    let scheduler = services.scheduler(&config);
    let shutdown = scheduler.shutdown_notifier();
    let handle = scheduler.spawn();

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    tracing::info!("Shutdown requested");

    shutdown.notify_one();
    handle.await.context("maintenance scheduler panicked")?;

    let stats = services.memory.memory_stats();
    tracing::info!(
        stored_items = services.store.len(),
        memories = stats.total_memories,
        cached_responses = services.cache.len(),
        "Knowledge service stopped"
    );
    Ok(())
}

/// Load configuration from the environment.
///
/// Reads JSON from the file named by `GALLERY_KNOWLEDGE_CONFIG` when set,
/// falls back to defaults otherwise, then applies numeric overrides.
///
/// # Errors
/// Returns an error if the file cannot be read, the JSON is invalid, an
/// override is not a number, or the final configuration fails validation.
pub fn load_config() -> Result<KnowledgeConfig> {
    let mut config = match std::env::var(CONFIG_PATH_ENV) {
        Ok(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config file {path}"))?;
            KnowledgeConfig::from_json_str(&raw)
                .with_context(|| format!("invalid config file {path}"))?
        }
        Err(_) => KnowledgeConfig::default(),
    };

    if let Some(max_bytes) = env_override(STORE_MAX_BYTES_ENV)? {
        config.store.max_bytes = max_bytes;
    }
    if let Some(capacity) = env_override(MEMORY_CAPACITY_ENV)? {
        config.memory.capacity = capacity;
    }
    if let Some(max_entries) = env_override(CACHE_MAX_ENTRIES_ENV)? {
        config.cache.max_entries = max_entries;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn env_override(name: &str) -> Result<Option<usize>> {
    std::env::var(name)
        .ok()
        .map(|raw| parse_override(name, &raw))
        .transpose()
}

fn parse_override(name: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .with_context(|| format!("{name} must be a non-negative integer, got {raw:?}"))
}
