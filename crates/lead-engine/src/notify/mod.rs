//! Outbound agent notifications
//!
//! Delivery is best-effort: the engine logs and swallows notifier errors, so a
//! failed send never rolls back a state transition.

pub mod messages;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::info;

use crate::agent::AgentId;
use crate::error::{LeadEngineError, Result};
use crate::lead::StatusChoice;

/// Message sent to an agent's chat session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub text: String,
    /// Status buttons offered with the message
    pub choices: Vec<StatusChoice>,
}

impl OutboundMessage {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            choices: Vec::new(),
        }
    }

    pub fn with_choices(mut self, choices: &[StatusChoice]) -> Self {
        self.choices = choices.to_vec();
        self
    }

    /// Callback payload of each offered choice for `agent_id`
    pub fn callback_payloads(&self, agent_id: &AgentId) -> Vec<String> {
        self.choices
            .iter()
            .map(|choice| crate::api::callback_payload(*choice, agent_id))
            .collect()
    }
}

/// Chat delivery capability
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, agent_id: &AgentId, message: OutboundMessage) -> Result<()>;
}

/// Notification as delivered through a [`ChannelNotifier`]
#[derive(Debug, Clone)]
pub struct Delivery {
    pub agent_id: AgentId,
    pub message: OutboundMessage,
}

/// Forwards notifications to an unbounded channel
#[derive(Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Delivery>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Delivery>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn send(&self, agent_id: &AgentId, message: OutboundMessage) -> Result<()> {
        self.tx
            .send(Delivery {
                agent_id: agent_id.clone(),
                message,
            })
            .map_err(|_| LeadEngineError::notification("notification channel closed"))
    }
}

/// Writes notifications to the log only
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, agent_id: &AgentId, message: OutboundMessage) -> Result<()> {
        info!(
            "📨 To {}: {} ({} choices)",
            agent_id,
            message.text.replace('\n', " | "),
            message.choices.len()
        );
        Ok(())
    }
}
