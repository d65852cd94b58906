use tracing::{info, warn};

use crate::agent::{AgentRecord, ChatUser, VerificationStart};
use crate::audit::{AuditAction, AuditRecord, PerformanceReport};
use crate::error::{LeadEngineError, Result};
use crate::queue::QueueSnapshot;

use super::engine::LeadEngine;
use super::types::{StartOutcome, VerificationOutcome};

impl LeadEngine {
    /// Handle first contact (`/start`)
    pub async fn start_verification(&self, user: &ChatUser) -> StartOutcome {
        self.audit(AuditRecord::new(user.audit_label(), AuditAction::BotStarted)).await;

        match self.directory.begin_verification(user) {
            VerificationStart::AlreadyVerified(record) => StartOutcome::WelcomeBack(record),
            VerificationStart::AwaitingPhone => StartOutcome::AwaitingPhone,
        }
    }

    /// Verify a shared phone number against the team table
    ///
    /// Only agents that started verification are considered. A failed lookup
    /// leaves the agent awaiting a phone number.
    pub async fn verify_contact(&self, user: &ChatUser, phone: &str) -> Result<VerificationOutcome> {
        if !self.directory.is_awaiting_phone(&user.id) {
            return Ok(VerificationOutcome::NotAwaiting);
        }

        let details = format!("Phone: {}", phone);
        match self.store.find_team_member(phone).await? {
            Some(member) => {
                let record = self.directory.mark_verified(user, &member.name, phone);
                self.audit(
                    AuditRecord::new(user.audit_label(), AuditAction::UserVerified).with_details(details),
                )
                .await;
                Ok(VerificationOutcome::Verified(record))
            }
            None => {
                warn!("🚫 Phone verification failed for agent {}", user.id);
                self.audit(
                    AuditRecord::new(user.audit_label(), AuditAction::VerificationFailed)
                        .with_details(details),
                )
                .await;
                Ok(VerificationOutcome::Rejected)
            }
        }
    }

    /// Verified record of an agent, or `NotVerified`
    pub fn require_verified(&self, user: &ChatUser) -> Result<AgentRecord> {
        self.directory
            .verified(&user.id)
            .ok_or(LeadEngineError::NotVerified)
    }

    /// Read-only view of the queue head for a verified agent
    pub async fn queue_snapshot(&self, user: &ChatUser) -> Result<QueueSnapshot> {
        self.require_verified(user)?;
        let state = self.lock_state().await;
        Ok(state.queue.snapshot(
            self.config.queue.snapshot_limit,
            self.config.queue.hot_positions,
            Some(&user.id),
        ))
    }

    /// Aggregate the agent's audit records
    pub async fn performance_report(&self, user: &ChatUser) -> Result<PerformanceReport> {
        self.require_verified(user)?;
        let records = self.store.read_audit().await?;
        let report = PerformanceReport::from_records(&user.audit_label(), &records);
        info!(
            "📊 Report for {}: {} assigned, {} submitted",
            user.id, report.leads_assigned, report.status_submitted
        );
        Ok(report)
    }
}
