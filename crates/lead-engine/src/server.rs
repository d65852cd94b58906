//! Lead Engine Server Manager
//!
//! Provides a high-level server struct that owns the engine, its command
//! handler and supervisor API, a periodic monitor task and a dispatch retry
//! task that serves agents left waiting at the head of the queue.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::api::{CommandHandler, SupervisorApi};
use crate::config::{LeadEngineConfig, StoreBackend};
use crate::database::SqliteSheetStore;
use crate::error::{LeadEngineError, Result};
use crate::notify::{LogNotifier, Notifier};
use crate::orchestrator::{DispatchResult, LeadEngine};
use crate::store::{MemorySheetStore, SheetLeadStore, SheetNames, SheetStore};

/// A complete lead server that manages engine lifecycle and provides APIs
pub struct LeadEngineServer {
    engine: LeadEngine,
    handler: CommandHandler,
    supervisor_api: SupervisorApi,
    sheets: Arc<dyn SheetStore>,
    config: LeadEngineConfig,
    monitor_handle: Option<JoinHandle<()>>,
    retry_handle: Option<JoinHandle<()>>,
}

impl LeadEngineServer {
    /// Create a server over a sheet store and a notifier
    pub fn new(
        config: LeadEngineConfig,
        sheets: Arc<dyn SheetStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        let store = SheetLeadStore::new(sheets.clone(), SheetNames::from(&config.store));
        let engine = LeadEngine::new(config.clone(), Arc::new(store), notifier)?;
        info!("✅ Lead engine initialized");

        Ok(Self {
            handler: CommandHandler::new(engine.clone()),
            supervisor_api: SupervisorApi::new(engine.clone()),
            engine,
            sheets,
            config,
            monitor_handle: None,
            retry_handle: None,
        })
    }

    /// Create a server with in-memory tables that only logs notifications
    pub fn new_in_memory(config: LeadEngineConfig) -> Result<Self> {
        Self::new(config, Arc::new(MemorySheetStore::new()), Arc::new(LogNotifier))
    }

    /// Start the monitor and dispatch retry tasks
    pub async fn start(&mut self) -> Result<()> {
        if self.monitor_handle.is_some() {
            warn!("Lead server already started");
            return Ok(());
        }

        let supervisor_api = self.supervisor_api.clone();
        let period = self.config.general.monitor_interval;
        let handle = tokio::spawn(async move {
            Self::monitor_loop(supervisor_api, period).await;
        });
        self.monitor_handle = Some(handle);

        let engine = self.engine.clone();
        let period = self.config.dispatch.retry_interval;
        self.retry_handle = Some(tokio::spawn(async move {
            Self::retry_loop(engine, period).await;
        }));

        info!("🚀 Lead server started ({})", self.config.general.bot_name);
        Ok(())
    }

    /// Stop the background tasks and cancel all deadline timers
    pub async fn stop(&mut self) -> Result<()> {
        info!("🛑 Stopping lead server...");

        for handle in [self.monitor_handle.take(), self.retry_handle.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
            let _ = handle.await;
        }
        self.engine.shutdown().await;

        info!("✅ Lead server stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.monitor_handle.is_some()
    }

    pub fn engine(&self) -> &LeadEngine {
        &self.engine
    }

    pub fn handler(&self) -> &CommandHandler {
        &self.handler
    }

    pub fn supervisor_api(&self) -> &SupervisorApi {
        &self.supervisor_api
    }

    pub fn config(&self) -> &LeadEngineConfig {
        &self.config
    }

    /// Write rows into a table starting at row 1, used to load fixtures
    pub async fn seed_sheet(&self, sheet: &str, rows: &[Vec<String>]) -> Result<()> {
        for (row_index, cells) in rows.iter().enumerate() {
            for (col_index, value) in cells.iter().enumerate() {
                self.sheets
                    .write_cell(sheet, row_index + 1, col_index + 1, value)
                    .await?;
            }
        }
        info!("📥 Seeded {} rows into '{}'", rows.len(), sheet);
        Ok(())
    }

    async fn monitor_loop(supervisor_api: SupervisorApi, period: Duration) {
        info!("👀 Starting lead monitor");

        let mut interval = interval(period);
        loop {
            interval.tick().await;

            let stats = supervisor_api.get_stats().await;
            if stats.queue.total_agents > 0 || stats.pending_assignments > 0 {
                info!(
                    "📊 Queue: {} waiting (longest {}s), pending leads: {}",
                    stats.queue.total_agents,
                    stats.queue.longest_wait_time_seconds,
                    stats.pending_assignments
                );
            }
            info!(
                "👥 Agents - Known: {}, Verified: {} | Assigned: {}, Submitted: {}, Timed out: {}",
                stats.known_agents,
                stats.verified_agents,
                stats.counters.leads_assigned,
                stats.counters.statuses_submitted,
                stats.counters.timeouts
            );
        }
    }
}

impl LeadEngineServer {
    async fn retry_loop(engine: LeadEngine, period: Duration) {
        info!("🔁 Starting dispatch retry loop (every {:?})", period);

        let mut interval = interval(period);
        // the first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;

            match engine.redispatch_waiting().await {
                Ok(Some(DispatchResult::Assigned(assignment))) => {
                    info!(
                        "🔁 Retry assigned lead {} to waiting agent {}",
                        assignment.lead.lead_id, assignment.agent_id
                    );
                }
                Ok(Some(_)) => debug!("🔁 Retry found no lead for the waiting agent"),
                Ok(None) => {}
                Err(e) => error!("❌ Dispatch retry failed: {}", e),
            }
        }
    }
}

impl Drop for LeadEngineServer {
    fn drop(&mut self) {
        if let Some(handle) = self.monitor_handle.take() {
            handle.abort();
        }
        if let Some(handle) = self.retry_handle.take() {
            handle.abort();
        }
    }
}

/// Builder for LeadEngineServer with fluent API
pub struct LeadEngineServerBuilder {
    config: Option<LeadEngineConfig>,
    sheets: Option<Arc<dyn SheetStore>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl LeadEngineServerBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            sheets: None,
            notifier: None,
        }
    }

    pub fn with_config(mut self, config: LeadEngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a specific sheet store instead of the configured backend
    pub fn with_sheet_store(mut self, sheets: Arc<dyn SheetStore>) -> Self {
        self.sheets = Some(sheets);
        self
    }

    pub fn with_memory_store(self, sheets: MemorySheetStore) -> Self {
        self.with_sheet_store(Arc::new(sheets))
    }

    /// Open a SQLite database file
    pub async fn with_sqlite_store(mut self, database_path: &str) -> Result<Self> {
        let max_connections = self
            .config
            .as_ref()
            .map(|config| config.store.max_connections)
            .unwrap_or(1);
        let store = SqliteSheetStore::new(database_path, max_connections)
            .await
            .map_err(|e| LeadEngineError::config(format!("Failed to open database: {}", e)))?;
        self.sheets = Some(Arc::new(store));
        Ok(self)
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Build the server. Without an explicit store the configured backend is opened.
    pub async fn build(self) -> Result<LeadEngineServer> {
        let config = self.config.unwrap_or_default();
        config.validate().map_err(LeadEngineError::config)?;

        let sheets: Arc<dyn SheetStore> = match self.sheets {
            Some(sheets) => sheets,
            None => match config.store.backend {
                StoreBackend::Memory => Arc::new(MemorySheetStore::new()),
                StoreBackend::Sqlite => Arc::new(
                    SqliteSheetStore::new(&config.store.database_path, config.store.max_connections)
                        .await?,
                ),
            },
        };
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(LogNotifier));

        LeadEngineServer::new(config, sheets, notifier)
    }
}

impl Default for LeadEngineServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_stop_lifecycle() {
        let mut config = LeadEngineConfig::default();
        config.general.monitor_interval = Duration::from_millis(10);
        let mut server = LeadEngineServer::new_in_memory(config).expect("server");

        server.start().await.expect("start");
        assert!(server.is_running());
        tokio::time::sleep(Duration::from_millis(30)).await;
        server.stop().await.expect("stop");
        assert!(!server.is_running());
    }

    #[tokio::test]
    async fn test_builder_rejects_invalid_config() {
        let mut config = LeadEngineConfig::default();
        config.queue.snapshot_limit = 0;
        let result = LeadEngineServerBuilder::new().with_config(config).build().await;
        assert!(matches!(result, Err(LeadEngineError::Config(_))));
    }

    #[tokio::test]
    async fn test_seed_sheet_through_server() {
        let tables = MemorySheetStore::new();
        let server = LeadEngineServerBuilder::new()
            .with_memory_store(tables.clone())
            .build()
            .await
            .expect("server");

        let rows = vec![vec!["LeadID".to_string(), "Status".to_string()], vec!["1".to_string()]];
        server.seed_sheet("leads", &rows).await.expect("seed");
        assert_eq!(tables.cell("leads", 2, 1).as_deref(), Some("1"));
    }
}
