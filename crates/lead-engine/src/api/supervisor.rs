//! Supervisor API for lead engine oversight

use crate::agent::AgentId;
use crate::assignment::Assignment;
use crate::orchestrator::{DispatchResult, EngineStats, LeadEngine};
use crate::error::Result;
use crate::lead::LeadRecord;

/// Read-mostly view for operators
///
/// Provides statistics, pending assignments, the current lead table, and a
/// manual dispatch trigger.
#[derive(Clone)]
pub struct SupervisorApi {
    engine: LeadEngine,
}

impl SupervisorApi {
    pub fn new(engine: LeadEngine) -> Self {
        Self { engine }
    }

    /// Get engine statistics
    pub async fn get_stats(&self) -> EngineStats {
        self.engine.stats().await
    }

    /// Outstanding assignments, oldest first
    pub async fn list_assignments(&self) -> Vec<Assignment> {
        self.engine.pending_assignments().await
    }

    pub async fn get_assignment(&self, agent_id: &AgentId) -> Option<Assignment> {
        self.engine.pending_assignment(agent_id).await
    }

    /// Leads as currently stored
    pub async fn list_leads(&self) -> Result<Vec<LeadRecord>> {
        self.engine.store().read_leads().await
    }

    /// Dispatch to the head of the queue now
    pub async fn force_dispatch(&self) -> Result<DispatchResult> {
        self.engine.dispatch_next().await
    }
}
