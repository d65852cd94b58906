use std::collections::HashMap;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::agent::AgentId;

/// Response-deadline timer tasks, one per outstanding assignment
#[derive(Debug, Default)]
pub struct DeadlineTimers {
    timers: HashMap<AgentId, ArmedTimer>,
}

#[derive(Debug)]
struct ArmedTimer {
    assignment_id: Uuid,
    handle: JoinHandle<()>,
}

impl DeadlineTimers {
    pub fn new() -> Self {
        Self {
            timers: HashMap::new(),
        }
    }

    /// Register the timer task for an assignment, aborting any previous timer of the agent
    pub fn arm(&mut self, agent_id: AgentId, assignment_id: Uuid, handle: JoinHandle<()>) {
        if let Some(previous) = self.timers.insert(agent_id.clone(), ArmedTimer { assignment_id, handle }) {
            debug!("⏱️ Replacing deadline timer of agent {}", agent_id);
            previous.handle.abort();
        }
    }

    /// Abort the agent's timer. Returns true if one was armed.
    pub fn cancel(&mut self, agent_id: &AgentId) -> bool {
        match self.timers.remove(agent_id) {
            Some(timer) => {
                timer.handle.abort();
                debug!("⏱️ Cancelled deadline timer of agent {}", agent_id);
                true
            }
            None => false,
        }
    }

    /// Forget a timer that has fired, without aborting it.
    /// Only removes the entry if it still belongs to `assignment_id`.
    pub fn release(&mut self, agent_id: &AgentId, assignment_id: Uuid) {
        let matches = self
            .timers
            .get(agent_id)
            .map(|timer| timer.assignment_id == assignment_id)
            .unwrap_or(false);
        if matches {
            self.timers.remove(agent_id);
        }
    }

    pub fn is_armed(&self, agent_id: &AgentId) -> bool {
        self.timers.contains_key(agent_id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Abort every timer
    pub fn cancel_all(&mut self) {
        for (_, timer) in self.timers.drain() {
            timer.handle.abort();
        }
    }
}
