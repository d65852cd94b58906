use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::agent::{AgentId, ChatUser};
use crate::assignment::Assignment;
use crate::audit::{AuditAction, AuditRecord};
use crate::config::EmptyDispatchPolicy;
use crate::error::{LeadEngineError, Result};
use crate::lead::{select_next_eligible, LeadStatus, StatusChoice};
use crate::notify::messages;
use crate::queue::QueueEntry;

use super::engine::{LeadEngine, PendingDeliveries};
use super::types::{DispatchResult, DispatchState, RequestOutcome, StatusUpdate};

impl LeadEngine {
    /// Request a lead for a verified agent
    ///
    /// Rejects unverified agents and agents that still hold a lead. Otherwise
    /// the agent joins the queue (once) and, if it is at the head, a dispatch
    /// runs before returning.
    pub async fn request_lead(&self, user: &ChatUser) -> Result<RequestOutcome> {
        let agent = self
            .directory
            .verified(&user.id)
            .ok_or(LeadEngineError::NotVerified)?;

        let mut state = self.lock_state().await;

        if let Some(pending) = state.assignments.get(&agent.id) {
            info!(
                "⚠️ Agent {} requested a lead while holding {}",
                agent.id, pending.lead.lead_id
            );
            return Err(LeadEngineError::AlreadyPending {
                lead_id: pending.lead.lead_id.to_string(),
                assigned_at: pending.assigned_at,
            });
        }

        let mut newly_enqueued = false;
        if !state.queue.contains(&agent.id) {
            let entry = QueueEntry::new(agent.id.clone(), user.username.clone(), agent.display_name());
            if let Some(position) = state.queue.enqueue(entry) {
                newly_enqueued = true;
                self.audit(
                    AuditRecord::new(user.audit_label(), AuditAction::Enqueued)
                        .with_details(format!("Queue position {}", position)),
                )
                .await;
            }
        }

        if state.queue.is_head(&agent.id) {
            let mut deliveries = PendingDeliveries::new();
            let result = self.dispatch_locked(&mut state, &mut deliveries).await;
            drop(state);
            self.deliver(deliveries).await;
            return result.map(RequestOutcome::Dispatched);
        }

        let position = state.queue.position_of(&agent.id).unwrap_or(state.queue.len());
        let estimated_wait = self.config.queue.estimated_wait_per_position * position as u32;
        Ok(RequestOutcome::Queued {
            position,
            estimated_wait,
            newly_enqueued,
        })
    }

    /// Dispatch to the head of the queue if anybody is waiting
    ///
    /// Called periodically so a head left waiting (no lead under the requeue
    /// policy, or nobody finished a lead since it joined) is served once a
    /// lead becomes available. Returns `None` when the queue is empty.
    pub async fn redispatch_waiting(&self) -> Result<Option<DispatchResult>> {
        let mut deliveries = PendingDeliveries::new();
        let result = {
            let mut state = self.lock_state().await;
            if state.queue.is_empty() {
                return Ok(None);
            }
            debug!("🔁 Retrying dispatch for {} waiting agents", state.queue.len());
            self.dispatch_locked(&mut state, &mut deliveries).await
        };
        self.deliver(deliveries).await;
        result.map(Some)
    }

    /// Pop the head of the queue and try to hand it a lead
    pub async fn dispatch_next(&self) -> Result<DispatchResult> {
        let mut deliveries = PendingDeliveries::new();
        let result = {
            let mut state = self.lock_state().await;
            self.dispatch_locked(&mut state, &mut deliveries).await
        };
        self.deliver(deliveries).await;
        result
    }

    async fn dispatch_locked(
        &self,
        state: &mut DispatchState,
        deliveries: &mut PendingDeliveries,
    ) -> Result<DispatchResult> {
        let Some(entry) = state.queue.dequeue() else {
            debug!("📭 Dispatch found an empty queue");
            return Ok(DispatchResult::Idle);
        };

        match self.assign_locked(state, &entry).await {
            Ok(Some(assignment)) => {
                self.arm_deadline(state, &assignment);
                deliveries.push((
                    assignment.agent_id.clone(),
                    messages::lead_assigned(&assignment.lead, self.config.dispatch.response_timeout),
                ));
                Ok(DispatchResult::Assigned(assignment))
            }
            Ok(None) => {
                let policy = self.config.dispatch.empty_dispatch_policy;
                state.counters.empty_dispatches += 1;
                warn!(
                    "📭 No eligible lead for agent {}, applying {:?} policy",
                    entry.agent_id, policy
                );
                match policy {
                    EmptyDispatchPolicy::Drop => {}
                    EmptyDispatchPolicy::Notify => {
                        deliveries.push((entry.agent_id.clone(), messages::no_leads_available()));
                    }
                    EmptyDispatchPolicy::Requeue => {
                        state.queue.requeue_front(entry.clone());
                    }
                }
                Ok(DispatchResult::NoLead {
                    agent_id: entry.agent_id,
                    policy,
                })
            }
            Err(e) => {
                // the agent leaves the queue and is told to ask again
                error!(
                    "❌ Dispatch to agent {} failed, removed from queue: {}",
                    entry.agent_id, e
                );
                Err(e)
            }
        }
    }

    /// Select the next eligible lead and bind it to the agent
    ///
    /// Writes the assignee and `assigned` status to the store before recording
    /// the assignment. Returns `None` when no eligible lead exists.
    async fn assign_locked(
        &self,
        state: &mut DispatchState,
        entry: &QueueEntry,
    ) -> Result<Option<Assignment>> {
        let agent_id = &entry.agent_id;
        if let Some(pending) = state.assignments.get(agent_id) {
            return Err(LeadEngineError::AlreadyPending {
                lead_id: pending.lead.lead_id.to_string(),
                assigned_at: pending.assigned_at,
            });
        }

        let leads = self.store.read_leads().await?;
        let candidates = leads
            .into_iter()
            .filter(|lead| !state.assignments.holds_row(lead.row))
            .collect();
        let Some(mut lead) = select_next_eligible(candidates) else {
            return Ok(None);
        };

        let assignee = self
            .directory
            .get(agent_id)
            .map(|record| record.assignee_label())
            .unwrap_or_else(|| agent_id.to_string());

        self.store.mark_assigned(lead.row, &assignee).await?;
        lead.status = LeadStatus::Assigned;
        lead.assigned_to = Some(assignee);

        let actor = ChatUser::new(agent_id.clone(), entry.username.as_deref()).audit_label();
        let assignment = Assignment::new(agent_id.clone(), lead).with_actor(actor);
        state.assignments.insert(assignment.clone())?;
        state.counters.leads_assigned += 1;

        info!(
            "🎯 Assigned lead {} (row {}) to agent {}",
            assignment.lead.lead_id,
            assignment.row(),
            agent_id
        );

        self.audit(
            AuditRecord::new(assignment.actor.clone(), AuditAction::LeadAssigned)
                .with_lead(&assignment.lead.lead_id)
                .with_details("Lead assigned to user"),
        )
        .await;

        Ok(Some(assignment))
    }

    /// Spawn the response-deadline timer of an assignment
    fn arm_deadline(&self, state: &mut DispatchState, assignment: &Assignment) {
        let engine = self.clone();
        let agent_id = assignment.agent_id.clone();
        let assignment_id = assignment.id;
        let timeout = self.config.dispatch.response_timeout;

        let handle = tokio::spawn({
            let agent_id = agent_id.clone();
            async move {
                tokio::time::sleep(timeout).await;
                if let Err(e) = engine.expire_assignment(&agent_id, assignment_id).await {
                    error!("❌ Failed to expire lead of agent {}: {}", agent_id, e);
                }
            }
        });

        debug!("⏱️ Armed {:?} deadline for agent {}", timeout, agent_id);
        state.timers.arm(agent_id, assignment_id, handle);
    }

    /// Start a detached dispatch for the next waiting agent
    fn spawn_dispatch(&self) {
        let engine = self.clone();
        tokio::spawn(async move {
            match engine.dispatch_next().await {
                Ok(DispatchResult::Assigned(assignment)) => {
                    debug!("📤 Background dispatch assigned {}", assignment.lead.lead_id);
                }
                Ok(_) => {}
                Err(e) => error!("❌ Background dispatch failed: {}", e),
            }
        });
    }

    /// Record an agent's outcome for its outstanding lead
    ///
    /// On success the assignment is cleared, its deadline timer cancelled and,
    /// if anybody is waiting, a dispatch is started in the background. If the
    /// store write fails nothing changes and the agent may retry.
    pub async fn submit_status(&self, user: &ChatUser, choice: StatusChoice) -> Result<StatusUpdate> {
        let mut state = self.lock_state().await;

        let assignment = state
            .assignments
            .get(&user.id)
            .cloned()
            .ok_or(LeadEngineError::NoPendingLead)?;

        self.store.set_status(assignment.row(), &choice.to_status()).await?;

        state.assignments.remove(&user.id);
        state.timers.cancel(&user.id);
        state.counters.statuses_submitted += 1;

        info!(
            "✅ Agent {} set lead {} to {}",
            user.id, assignment.lead.lead_id, choice
        );

        self.audit(
            AuditRecord::new(user.audit_label(), AuditAction::LeadStatusUpdated)
                .with_lead(&assignment.lead.lead_id)
                .with_details(choice.label()),
        )
        .await;

        let next_dispatch_scheduled = !state.queue.is_empty();
        drop(state);

        if next_dispatch_scheduled {
            self.spawn_dispatch();
        }

        Ok(StatusUpdate {
            lead_id: assignment.lead.lead_id,
            status: choice,
            next_dispatch_scheduled,
        })
    }

    /// Deadline expiry for one assignment
    ///
    /// Does nothing and returns `false` unless `assignment_id` is still the
    /// agent's outstanding assignment. Otherwise marks the lead unresponsive,
    /// clears the assignment and returns `true`.
    pub async fn expire_assignment(&self, agent_id: &AgentId, assignment_id: Uuid) -> Result<bool> {
        let mut state = self.lock_state().await;
        state.timers.release(agent_id, assignment_id);

        if !state.assignments.is_current(agent_id, assignment_id) {
            debug!("⏱️ Stale deadline for agent {}, ignoring", agent_id);
            return Ok(false);
        }
        let Some(assignment) = state.assignments.get(agent_id).cloned() else {
            return Ok(false);
        };

        self.store
            .set_status(assignment.row(), &LeadStatus::Unresponsive)
            .await?;

        state.assignments.remove(agent_id);
        state.counters.timeouts += 1;

        warn!(
            "⚠️ Lead timeout: agent {} did not update lead {}, marked Unresponsive",
            agent_id, assignment.lead.lead_id
        );

        self.audit(
            AuditRecord::new(assignment.actor.clone(), AuditAction::LeadTimeout)
                .with_lead(&assignment.lead.lead_id)
                .with_details("Marked as Unresponsive"),
        )
        .await;

        let dispatch_next =
            self.config.dispatch.dispatch_after_timeout && !state.queue.is_empty();
        drop(state);

        if self.config.dispatch.notify_on_timeout {
            self.deliver(vec![(
                agent_id.clone(),
                messages::lead_timed_out(&assignment.lead.lead_id),
            )])
            .await;
        }

        if dispatch_next {
            self.spawn_dispatch();
        }

        Ok(true)
    }
}
