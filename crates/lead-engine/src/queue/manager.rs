use std::collections::VecDeque;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::agent::AgentId;

/// FIFO queue of agents waiting for a lead
#[derive(Debug, Default)]
pub struct LeadQueue {
    entries: VecDeque<QueueEntry>,
}

/// An agent waiting in the queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEntry {
    pub agent_id: AgentId,
    pub username: Option<String>,
    /// Display name at the time of enqueueing
    pub display_name: String,
    pub enqueued_at: DateTime<Utc>,
}

/// Read-only view of the head of the queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub entries: Vec<QueueSnapshotEntry>,
    pub total: usize,
}

/// One listed queue position
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSnapshotEntry {
    /// 1-based position
    pub position: usize,
    pub agent_id: AgentId,
    pub display_name: String,
    pub wait_seconds: i64,
    /// Within the first few positions
    pub hot: bool,
    /// Entry belongs to the agent that asked for the snapshot
    pub is_requester: bool,
}

/// Queue statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStats {
    pub total_agents: usize,
    pub average_wait_time_seconds: u64,
    pub longest_wait_time_seconds: u64,
}

impl QueueEntry {
    pub fn new(agent_id: AgentId, username: Option<String>, display_name: String) -> Self {
        Self {
            agent_id,
            username,
            display_name,
            enqueued_at: Utc::now(),
        }
    }

    pub fn wait_time(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.enqueued_at)
    }
}

impl QueueSnapshot {
    /// Entries beyond the listed ones
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

impl QueueSnapshotEntry {
    pub fn wait_minutes(&self) -> i64 {
        self.wait_seconds / 60
    }
}

impl LeadQueue {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    /// Check if an agent is already queued
    pub fn contains(&self, agent_id: &AgentId) -> bool {
        self.entries.iter().any(|entry| &entry.agent_id == agent_id)
    }

    /// 1-based position of an agent
    pub fn position_of(&self, agent_id: &AgentId) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| &entry.agent_id == agent_id)
            .map(|index| index + 1)
    }

    /// Append an agent to the tail. Returns the 1-based position, or `None` if
    /// the agent was already queued (the queue is left unchanged).
    pub fn enqueue(&mut self, entry: QueueEntry) -> Option<usize> {
        if self.contains(&entry.agent_id) {
            warn!("📋 Agent {} already in queue, not re-queuing", entry.agent_id);
            return None;
        }

        info!("📋 Enqueuing agent {} ({})", entry.agent_id, entry.display_name);
        self.entries.push_back(entry);
        info!("📊 Lead queue size: {} agents", self.entries.len());
        Some(self.entries.len())
    }

    /// Put an agent back at the head, used when a dispatch found no lead
    pub fn requeue_front(&mut self, entry: QueueEntry) -> bool {
        if self.contains(&entry.agent_id) {
            return false;
        }
        debug!("🔁 Re-queuing agent {} at head of queue", entry.agent_id);
        self.entries.push_front(entry);
        true
    }

    pub fn head(&self) -> Option<&QueueEntry> {
        self.entries.front()
    }

    pub fn is_head(&self, agent_id: &AgentId) -> bool {
        self.head().map(|entry| &entry.agent_id == agent_id).unwrap_or(false)
    }

    /// Remove and return the head of the queue
    pub fn dequeue(&mut self) -> Option<QueueEntry> {
        let entry = self.entries.pop_front();
        if let Some(entry) = &entry {
            info!("📤 Dequeued agent {} (remaining: {})", entry.agent_id, self.entries.len());
        }
        entry
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// List up to `limit` entries from the head with their wait times
    pub fn snapshot(
        &self,
        limit: usize,
        hot_positions: usize,
        requester: Option<&AgentId>,
    ) -> QueueSnapshot {
        let now = Utc::now();
        let entries = self
            .entries
            .iter()
            .take(limit)
            .enumerate()
            .map(|(index, entry)| {
                let position = index + 1;
                QueueSnapshotEntry {
                    position,
                    agent_id: entry.agent_id.clone(),
                    display_name: entry.display_name.clone(),
                    wait_seconds: entry.wait_time(now).num_seconds().max(0),
                    hot: position <= hot_positions,
                    is_requester: requester == Some(&entry.agent_id),
                }
            })
            .collect();

        QueueSnapshot {
            entries,
            total: self.entries.len(),
        }
    }

    /// Get queue statistics
    pub fn stats(&self) -> QueueStats {
        let now = Utc::now();
        let total_agents = self.entries.len();

        let (average, longest) = if total_agents > 0 {
            let wait_times: Vec<i64> = self
                .entries
                .iter()
                .map(|entry| entry.wait_time(now).num_seconds().max(0))
                .collect();
            let total_wait: i64 = wait_times.iter().sum();
            let longest = wait_times.iter().max().cloned().unwrap_or(0);
            (total_wait / total_agents as i64, longest)
        } else {
            (0, 0)
        };

        QueueStats {
            total_agents,
            average_wait_time_seconds: average as u64,
            longest_wait_time_seconds: longest as u64,
        }
    }
}
