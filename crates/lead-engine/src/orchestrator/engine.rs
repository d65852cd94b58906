use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::agent::{AgentDirectory, AgentId};
use crate::assignment::Assignment;
use crate::audit::AuditRecord;
use crate::config::LeadEngineConfig;
use crate::error::{LeadEngineError, Result};
use crate::notify::{Notifier, OutboundMessage};
use crate::store::LeadStore;

use super::types::{DispatchState, EngineStats};

/// Lead assignment engine
///
/// Cheap to clone; all clones share the same state. Deadline timers hold a
/// clone so they can expire assignments on their own.
#[derive(Clone)]
pub struct LeadEngine {
    pub(super) config: Arc<LeadEngineConfig>,
    pub(super) store: Arc<dyn LeadStore>,
    pub(super) notifier: Arc<dyn Notifier>,
    pub(super) directory: Arc<AgentDirectory>,
    pub(super) state: Arc<Mutex<DispatchState>>,
}

/// Notifications collected under the state lock, sent after it is released
pub(super) type PendingDeliveries = Vec<(AgentId, OutboundMessage)>;

impl LeadEngine {
    /// Create an engine over a store and a notifier
    pub fn new(
        config: LeadEngineConfig,
        store: Arc<dyn LeadStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        config.validate().map_err(LeadEngineError::config)?;

        info!(
            "🚀 Creating LeadEngine (response timeout {:?}, empty dispatch policy {:?})",
            config.dispatch.response_timeout, config.dispatch.empty_dispatch_policy
        );

        Ok(Self {
            config: Arc::new(config),
            store,
            notifier,
            directory: Arc::new(AgentDirectory::new()),
            state: Arc::new(Mutex::new(DispatchState::default())),
        })
    }

    pub fn config(&self) -> &LeadEngineConfig {
        &self.config
    }

    pub fn directory(&self) -> &AgentDirectory {
        &self.directory
    }

    pub fn store(&self) -> &Arc<dyn LeadStore> {
        &self.store
    }

    pub(super) async fn lock_state(&self) -> MutexGuard<'_, DispatchState> {
        self.state.lock().await
    }

    /// Outstanding assignment of an agent
    pub async fn pending_assignment(&self, agent_id: &AgentId) -> Option<Assignment> {
        self.lock_state().await.assignments.get(agent_id).cloned()
    }

    /// All outstanding assignments, oldest first
    pub async fn pending_assignments(&self) -> Vec<Assignment> {
        self.lock_state().await.assignments.list()
    }

    /// 1-based queue position of an agent
    pub async fn queue_position(&self, agent_id: &AgentId) -> Option<usize> {
        self.lock_state().await.queue.position_of(agent_id)
    }

    pub async fn queue_len(&self) -> usize {
        self.lock_state().await.queue.len()
    }

    /// Get engine statistics
    pub async fn stats(&self) -> EngineStats {
        let state = self.lock_state().await;
        EngineStats {
            queue: state.queue.stats(),
            pending_assignments: state.assignments.len(),
            armed_timers: state.timers.len(),
            known_agents: self.directory.len(),
            verified_agents: self.directory.verified_count(),
            counters: state.counters.clone(),
        }
    }

    /// Append an audit record. Failures are logged and swallowed.
    pub async fn audit(&self, record: AuditRecord) {
        if let Err(e) = self.store.append_audit(&record).await {
            warn!(
                "📝 Failed to write audit '{}' for {}: {}",
                record.action, record.actor, e
            );
        }
    }

    /// Send collected notifications. Failures are logged and swallowed.
    pub(super) async fn deliver(&self, deliveries: PendingDeliveries) {
        for (agent_id, message) in deliveries {
            if let Err(e) = self.notifier.send(&agent_id, message).await {
                warn!("📨 Failed to notify agent {}: {}", agent_id, e);
            }
        }
    }

    /// Cancel every deadline timer. Outstanding assignments stay in memory.
    pub async fn shutdown(&self) {
        let mut state = self.lock_state().await;
        let armed = state.timers.len();
        state.timers.cancel_all();
        debug!("🛑 Cancelled {} deadline timers", armed);
    }
}

impl std::fmt::Debug for LeadEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeadEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
