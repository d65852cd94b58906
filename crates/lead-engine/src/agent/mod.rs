//! Agent management module
//!
//! Agents are identified by their chat identity and become eligible for leads
//! once their phone number matches an entry of the team table.

pub mod directory;

use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use directory::{AgentDirectory, VerificationStart};

/// Opaque chat identity of an agent
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<i64> for AgentId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

/// Sender of a chat command
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatUser {
    pub id: AgentId,
    pub username: Option<String>,
}

impl ChatUser {
    pub fn new<I: Into<AgentId>>(id: I, username: Option<&str>) -> Self {
        Self {
            id: id.into(),
            username: username.filter(|u| !u.is_empty()).map(str::to_string),
        }
    }

    /// Actor string recorded in the audit trail: `username(id)` or just `id`
    pub fn audit_label(&self) -> String {
        match &self.username {
            Some(username) => format!("{}({})", username, self.id),
            None => self.id.to_string(),
        }
    }
}

/// Phone verification state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationState {
    Unverified,
    AwaitingPhone,
    Verified,
}

/// Directory entry for an agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: AgentId,
    pub username: Option<String>,
    /// Team name from the team table, set on verification
    pub name: Option<String>,
    /// Phone number as shared by the agent
    pub phone: Option<String>,
    pub state: VerificationState,
    pub first_seen: DateTime<Utc>,
}

impl AgentRecord {
    pub fn new(user: &ChatUser) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            name: None,
            phone: None,
            state: VerificationState::Unverified,
            first_seen: Utc::now(),
        }
    }

    pub fn is_verified(&self) -> bool {
        self.state == VerificationState::Verified
    }

    /// Best available display name: team name, then username, then id
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.username.clone())
            .unwrap_or_else(|| self.id.to_string())
    }

    /// Value written to the lead's `AssignedTo` cell
    pub fn assignee_label(&self) -> String {
        let name = self.display_name();
        match self.phone.as_deref() {
            Some(phone) if !phone.is_empty() => format!("{} ({})", name, phone),
            _ => name,
        }
    }

    pub fn chat_user(&self) -> ChatUser {
        ChatUser {
            id: self.id.clone(),
            username: self.username.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_label_formats() {
        assert_eq!(ChatUser::new(42_i64, Some("alice")).audit_label(), "alice(42)");
        assert_eq!(ChatUser::new(42_i64, None).audit_label(), "42");
        assert_eq!(ChatUser::new(42_i64, Some("")).audit_label(), "42");
    }

    #[test]
    fn test_assignee_label_includes_phone_when_known() {
        let mut record = AgentRecord::new(&ChatUser::new(7_i64, Some("bob")));
        assert_eq!(record.assignee_label(), "bob");

        record.name = Some("Bob Jones".to_string());
        record.phone = Some("+15550001".to_string());
        assert_eq!(record.assignee_label(), "Bob Jones (+15550001)");
    }
}
