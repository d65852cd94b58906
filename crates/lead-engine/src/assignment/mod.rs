//! Outstanding lead assignments
//!
//! An [`Assignment`] binds one agent to one in-progress lead. It is created
//! when a lead is dispatched and destroyed by either a status submission or
//! deadline expiry. Each assignment owns a deadline timer in
//! [`DeadlineTimers`], keyed by agent.

pub mod deadline;
pub mod tracker;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agent::AgentId;
use crate::lead::LeadRecord;

pub use deadline::DeadlineTimers;
pub use tracker::AssignmentTracker;

/// Live binding of an agent to a lead
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    /// Unique per assignment, used to match deadline timers
    pub id: Uuid,
    pub agent_id: AgentId,
    /// Audit actor label of the agent at request time
    pub actor: String,
    /// Lead as read at assignment time
    pub lead: LeadRecord,
    pub assigned_at: DateTime<Utc>,
}

impl Assignment {
    pub fn new(agent_id: AgentId, lead: LeadRecord) -> Self {
        Self {
            id: Uuid::new_v4(),
            actor: agent_id.to_string(),
            agent_id,
            lead,
            assigned_at: Utc::now(),
        }
    }

    pub fn with_actor<A: Into<String>>(mut self, actor: A) -> Self {
        self.actor = actor.into();
        self
    }

    /// Row of the lead in the leads table
    pub fn row(&self) -> usize {
        self.lead.row
    }
}
