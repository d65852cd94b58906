use std::fmt;

use crate::agent::AgentId;
use crate::error::{LeadEngineError, Result};
use crate::lead::StatusChoice;

/// Prefix of status callback payloads
pub const CALLBACK_PREFIX: &str = "status";

/// Slash commands understood by the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    GetNewLead,
    QueueStatus,
    Report,
    Unknown(String),
}

impl BotCommand {
    /// Parse a chat message. Returns `None` for text that is not a command.
    ///
    /// Accepts the `/command@botname` form and ignores trailing arguments.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name).to_lowercase();

        let command = match name.as_str() {
            "start" => Self::Start,
            "help" => Self::Help,
            "getnewlead" => Self::GetNewLead,
            "queuestatus" => Self::QueueStatus,
            "report" => Self::Report,
            _ => Self::Unknown(name),
        };
        Some(command)
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "/start"),
            Self::Help => write!(f, "/help"),
            Self::GetNewLead => write!(f, "/getnewlead"),
            Self::QueueStatus => write!(f, "/queuestatus"),
            Self::Report => write!(f, "/report"),
            Self::Unknown(name) => write!(f, "/{}", name),
        }
    }
}

/// Decoded `status_<key>_<agentId>` payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCallback {
    pub choice: StatusChoice,
    pub agent_id: AgentId,
}

impl StatusCallback {
    pub fn parse(data: &str) -> Result<Self> {
        let mut parts = data.trim().splitn(3, '_');
        let prefix = parts.next().unwrap_or_default();
        if prefix != CALLBACK_PREFIX {
            return Err(LeadEngineError::InvalidCallback(data.to_string()));
        }

        let choice = parts
            .next()
            .and_then(StatusChoice::from_key)
            .ok_or_else(|| LeadEngineError::InvalidCallback(data.to_string()))?;
        let agent_id = parts
            .next()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| LeadEngineError::InvalidCallback(data.to_string()))?;

        Ok(Self {
            choice,
            agent_id: AgentId::from(agent_id),
        })
    }

    /// Reject callbacks issued for another agent
    pub fn check_scope(&self, sender: &AgentId) -> Result<()> {
        if &self.agent_id != sender {
            return Err(LeadEngineError::CallbackScope);
        }
        Ok(())
    }
}

/// Callback payload attached to a status choice offered to `agent_id`
pub fn callback_payload(choice: StatusChoice, agent_id: &AgentId) -> String {
    format!("{}_{}_{}", CALLBACK_PREFIX, choice.key(), agent_id)
}

/// Inbound chat event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Plain text; commands are recognized from it
    Message(String),
    /// Shared contact card
    Contact { phone: String },
    /// Interactive button press
    Callback(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parsing() {
        assert_eq!(BotCommand::parse("/start"), Some(BotCommand::Start));
        assert_eq!(BotCommand::parse("  /GetNewLead  "), Some(BotCommand::GetNewLead));
        assert_eq!(BotCommand::parse("/queuestatus@LeadBot"), Some(BotCommand::QueueStatus));
        assert_eq!(BotCommand::parse("/report now"), Some(BotCommand::Report));
        assert_eq!(BotCommand::parse("/dance"), Some(BotCommand::Unknown("dance".to_string())));
        assert_eq!(BotCommand::parse("hello"), None);
        assert_eq!(BotCommand::parse(""), None);
    }

    #[test]
    fn test_callback_parsing() {
        let callback = StatusCallback::parse("status_notconnected_42").unwrap();
        assert_eq!(callback.choice, StatusChoice::NotConnected);
        assert_eq!(callback.agent_id, AgentId::from("42"));
        assert!(callback.check_scope(&AgentId::from("42")).is_ok());
        assert!(matches!(
            callback.check_scope(&AgentId::from("43")),
            Err(LeadEngineError::CallbackScope)
        ));

        for bad in ["status_bogus_1", "state_interested_1", "status_interested_", "status"] {
            assert!(matches!(
                StatusCallback::parse(bad),
                Err(LeadEngineError::InvalidCallback(_))
            ));
        }
    }

    #[test]
    fn test_payload_matches_parser() {
        let agent = AgentId::from("user_7");
        for choice in StatusChoice::ALL {
            let parsed = StatusCallback::parse(&callback_payload(choice, &agent)).unwrap();
            assert_eq!(parsed.choice, choice);
            assert_eq!(parsed.agent_id, agent);
        }
    }
}
