use std::time::Duration;
use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, AgentRecord};
use crate::assignment::{Assignment, AssignmentTracker, DeadlineTimers};
use crate::config::EmptyDispatchPolicy;
use crate::lead::{LeadId, StatusChoice};
use crate::queue::{LeadQueue, QueueStats};

/// Mutable dispatcher state, guarded by one lock so transitions are serialized
#[derive(Debug, Default)]
pub struct DispatchState {
    pub queue: LeadQueue,
    pub assignments: AssignmentTracker,
    pub timers: DeadlineTimers,
    pub counters: DispatchCounters,
}

/// Lifetime counters of the dispatcher
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchCounters {
    pub leads_assigned: u64,
    pub statuses_submitted: u64,
    pub timeouts: u64,
    pub empty_dispatches: u64,
}

/// Result of a lead request
#[derive(Debug, Clone)]
pub enum RequestOutcome {
    /// The agent was at the head of the queue and a dispatch ran
    Dispatched(DispatchResult),
    /// The agent waits behind others
    Queued {
        position: usize,
        estimated_wait: Duration,
        /// False if the agent was already waiting
        newly_enqueued: bool,
    },
}

/// Result of one dispatch attempt
#[derive(Debug, Clone)]
pub enum DispatchResult {
    /// Nobody was waiting
    Idle,
    /// Head of the queue received a lead
    Assigned(Assignment),
    /// Head of the queue was popped but no eligible lead existed
    NoLead {
        agent_id: AgentId,
        policy: EmptyDispatchPolicy,
    },
}

impl DispatchResult {
    pub fn assignment(&self) -> Option<&Assignment> {
        match self {
            Self::Assigned(assignment) => Some(assignment),
            _ => None,
        }
    }
}

/// Result of a status submission
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub lead_id: LeadId,
    pub status: StatusChoice,
    /// A dispatch for the next waiting agent was started
    pub next_dispatch_scheduled: bool,
}

/// Result of `/start`
#[derive(Debug, Clone)]
pub enum StartOutcome {
    WelcomeBack(AgentRecord),
    AwaitingPhone,
}

/// Result of a shared contact
#[derive(Debug, Clone)]
pub enum VerificationOutcome {
    Verified(AgentRecord),
    Rejected,
    /// The agent had not started verification, nothing happened
    NotAwaiting,
}

/// Engine statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStats {
    pub queue: QueueStats,
    pub pending_assignments: usize,
    pub armed_timers: usize,
    pub known_agents: usize,
    pub verified_agents: usize,
    pub counters: DispatchCounters,
}
