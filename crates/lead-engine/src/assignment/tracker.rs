use std::collections::HashMap;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::agent::AgentId;
use crate::error::{LeadEngineError, Result};

use super::Assignment;

/// Tracks the single outstanding assignment of each agent
#[derive(Debug, Default)]
pub struct AssignmentTracker {
    assignments: HashMap<AgentId, Assignment>,
}

impl AssignmentTracker {
    pub fn new() -> Self {
        Self {
            assignments: HashMap::new(),
        }
    }

    /// Record a new assignment. Fails if the agent already holds one.
    pub fn insert(&mut self, assignment: Assignment) -> Result<()> {
        if let Some(existing) = self.assignments.get(&assignment.agent_id) {
            warn!(
                "⚠️ Agent {} already holds lead {}, refusing second assignment",
                existing.agent_id, existing.lead.lead_id
            );
            return Err(LeadEngineError::AlreadyPending {
                lead_id: existing.lead.lead_id.to_string(),
                assigned_at: existing.assigned_at,
            });
        }

        debug!("📌 Tracking lead {} for agent {}", assignment.lead.lead_id, assignment.agent_id);
        self.assignments.insert(assignment.agent_id.clone(), assignment);
        Ok(())
    }

    pub fn get(&self, agent_id: &AgentId) -> Option<&Assignment> {
        self.assignments.get(agent_id)
    }

    pub fn contains(&self, agent_id: &AgentId) -> bool {
        self.assignments.contains_key(agent_id)
    }

    /// Whether the given assignment is still the agent's outstanding one
    pub fn is_current(&self, agent_id: &AgentId, assignment_id: Uuid) -> bool {
        self.assignments
            .get(agent_id)
            .map(|assignment| assignment.id == assignment_id)
            .unwrap_or(false)
    }

    /// Whether any agent currently holds the lead in this table row
    pub fn holds_row(&self, row: usize) -> bool {
        self.assignments.values().any(|assignment| assignment.row() == row)
    }

    pub fn remove(&mut self, agent_id: &AgentId) -> Option<Assignment> {
        self.assignments.remove(agent_id)
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Outstanding assignments, oldest first
    pub fn list(&self) -> Vec<Assignment> {
        let mut assignments: Vec<Assignment> = self.assignments.values().cloned().collect();
        assignments.sort_by_key(|assignment| assignment.assigned_at);
        assignments
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::{LeadId, LeadRecord, LeadStatus};

    fn lead_at(row: usize, id: &str) -> LeadRecord {
        LeadRecord {
            row,
            lead_id: LeadId(id.to_string()),
            name: "Contact".to_string(),
            phone: String::new(),
            other_info: String::new(),
            status: LeadStatus::Assigned,
            assigned_to: None,
        }
    }

    fn lead(id: &str) -> LeadRecord {
        lead_at(2, id)
    }

    #[test]
    fn test_at_most_one_assignment_per_agent() {
        let mut tracker = AssignmentTracker::new();
        let agent = AgentId::from("a1");

        tracker.insert(Assignment::new(agent.clone(), lead("1"))).unwrap();
        let err = tracker.insert(Assignment::new(agent.clone(), lead("2"))).unwrap_err();
        match err {
            LeadEngineError::AlreadyPending { lead_id, .. } => assert_eq!(lead_id, "1"),
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn test_held_rows_are_tracked_by_row_not_id() {
        let mut tracker = AssignmentTracker::new();
        tracker.insert(Assignment::new(AgentId::from("a1"), lead_at(2, "2"))).unwrap();

        assert!(tracker.holds_row(2));
        // same LeadID in another row is a different lead
        assert!(!tracker.holds_row(3));
    }

    #[test]
    fn test_is_current_matches_assignment_id() {
        let mut tracker = AssignmentTracker::new();
        let agent = AgentId::from("a1");
        let first = Assignment::new(agent.clone(), lead("1"));
        let first_id = first.id;
        tracker.insert(first).unwrap();
        assert!(tracker.is_current(&agent, first_id));

        tracker.remove(&agent);
        let second = Assignment::new(agent.clone(), lead("2"));
        tracker.insert(second).unwrap();
        assert!(!tracker.is_current(&agent, first_id));
    }
}
