use tracing::{debug, info, warn};

use crate::agent::ChatUser;
use crate::audit::{AuditAction, AuditRecord};
use crate::config::EmptyDispatchPolicy;
use crate::error::Result;
use crate::notify::OutboundMessage;
use crate::orchestrator::{
    DispatchResult, LeadEngine, RequestOutcome, StartOutcome, VerificationOutcome,
};

use super::commands::{BotCommand, Inbound, StatusCallback};
use super::render;

/// Maps inbound chat events onto engine operations and renders replies
///
/// Every failure is turned into a reply here, so transport adapters only ever
/// see `Option<OutboundMessage>`. `None` means nothing is sent back directly;
/// lead payloads reach the agent through the notifier instead.
#[derive(Clone)]
pub struct CommandHandler {
    engine: LeadEngine,
}

impl CommandHandler {
    pub fn new(engine: LeadEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &LeadEngine {
        &self.engine
    }

    pub async fn handle(&self, user: &ChatUser, inbound: Inbound) -> Option<OutboundMessage> {
        self.engine.directory().touch(user);

        let result = match inbound {
            Inbound::Message(text) => match BotCommand::parse(&text) {
                Some(command) => self.handle_command(user, command).await,
                None => {
                    debug!("💬 Ignoring plain text from {}", user.id);
                    Ok(None)
                }
            },
            Inbound::Contact { phone } => self.handle_contact(user, &phone).await,
            Inbound::Callback(data) => self.handle_callback(user, &data).await,
        };

        match result {
            Ok(reply) => reply,
            Err(e) => {
                if e.is_store_failure() {
                    warn!("❌ Store failure while serving {}: {}", user.id, e);
                } else {
                    debug!("↩️ Rejected request from {}: {}", user.id, e);
                }
                Some(render::error(&e))
            }
        }
    }

    async fn handle_command(
        &self,
        user: &ChatUser,
        command: BotCommand,
    ) -> Result<Option<OutboundMessage>> {
        info!("📥 {} from {}", command, user.audit_label());

        match command {
            BotCommand::Start => Ok(Some(match self.engine.start_verification(user).await {
                StartOutcome::WelcomeBack(agent) => render::welcome_back(&agent),
                StartOutcome::AwaitingPhone => render::verification_prompt(),
            })),
            BotCommand::Help => {
                let config = self.engine.config();
                Ok(Some(render::help(
                    &config.general.bot_name,
                    config.dispatch.response_timeout,
                )))
            }
            BotCommand::GetNewLead => self.get_new_lead(user).await,
            BotCommand::QueueStatus => self.queue_status(user).await,
            BotCommand::Report => self.report(user).await,
            BotCommand::Unknown(name) => {
                debug!("❓ Unknown command /{} from {}", name, user.id);
                Ok(None)
            }
        }
    }

    async fn get_new_lead(&self, user: &ChatUser) -> Result<Option<OutboundMessage>> {
        match self.engine.request_lead(user).await? {
            RequestOutcome::Queued {
                position,
                estimated_wait,
                ..
            } => Ok(Some(render::queued(position, estimated_wait))),
            RequestOutcome::Dispatched(DispatchResult::NoLead {
                policy: EmptyDispatchPolicy::Requeue,
                ..
            }) => Ok(Some(render::still_first_in_queue())),
            RequestOutcome::Dispatched(_) => Ok(None),
        }
    }

    async fn queue_status(&self, user: &ChatUser) -> Result<Option<OutboundMessage>> {
        let snapshot = self.engine.queue_snapshot(user).await?;
        if snapshot.is_empty() {
            return Ok(Some(render::queue_empty()));
        }

        let reply = render::queue_status(&snapshot);
        self.engine
            .audit(AuditRecord::new(user.audit_label(), AuditAction::QueueStatusViewed))
            .await;
        Ok(Some(reply))
    }

    async fn report(&self, user: &ChatUser) -> Result<Option<OutboundMessage>> {
        let agent = self.engine.require_verified(user)?;
        let report = self.engine.performance_report(user).await?;
        let reply = render::report(&agent, &report);
        self.engine
            .audit(AuditRecord::new(user.audit_label(), AuditAction::ReportViewed))
            .await;
        Ok(Some(reply))
    }

    async fn handle_contact(&self, user: &ChatUser, phone: &str) -> Result<Option<OutboundMessage>> {
        match self.engine.verify_contact(user, phone).await? {
            VerificationOutcome::Verified(agent) => Ok(Some(render::verification_success(&agent))),
            VerificationOutcome::Rejected => Ok(Some(render::verification_failed())),
            VerificationOutcome::NotAwaiting => {
                debug!("📱 Contact from {} outside verification, ignoring", user.id);
                Ok(None)
            }
        }
    }

    async fn handle_callback(&self, user: &ChatUser, data: &str) -> Result<Option<OutboundMessage>> {
        let callback = StatusCallback::parse(data)?;
        if let Err(e) = callback.check_scope(&user.id) {
            warn!(
                "🚫 Agent {} pressed a status button issued to {}",
                user.id, callback.agent_id
            );
            return Err(e);
        }

        let update = self.engine.submit_status(user, callback.choice).await?;
        Ok(Some(render::status_updated(&update.lead_id, update.status)))
    }
}

impl std::fmt::Debug for CommandHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHandler").finish_non_exhaustive()
    }
}

