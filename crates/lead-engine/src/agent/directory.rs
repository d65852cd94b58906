use dashmap::DashMap;
use tracing::{debug, info};

use super::{AgentId, AgentRecord, ChatUser, VerificationState};

/// Process-local directory of agents and their verification state
pub struct AgentDirectory {
    agents: DashMap<AgentId, AgentRecord>,
}

/// Result of starting the verification flow
#[derive(Debug, Clone)]
pub enum VerificationStart {
    /// Agent was verified earlier in this process lifetime
    AlreadyVerified(AgentRecord),
    /// Agent must now share a phone number
    AwaitingPhone,
}

impl AgentDirectory {
    pub fn new() -> Self {
        Self {
            agents: DashMap::new(),
        }
    }

    /// Get or lazily create the record for a chat user, refreshing the username
    pub fn touch(&self, user: &ChatUser) -> AgentRecord {
        let mut entry = self
            .agents
            .entry(user.id.clone())
            .or_insert_with(|| {
                debug!("👤 First contact from agent {}", user.id);
                AgentRecord::new(user)
            });
        // a username removed on the chat side is removed here too
        if entry.username != user.username {
            entry.username = user.username.clone();
        }
        entry.clone()
    }

    pub fn get(&self, agent_id: &AgentId) -> Option<AgentRecord> {
        self.agents.get(agent_id).map(|entry| entry.clone())
    }

    /// Verified record for an agent, if any
    pub fn verified(&self, agent_id: &AgentId) -> Option<AgentRecord> {
        self.get(agent_id).filter(AgentRecord::is_verified)
    }

    pub fn is_verified(&self, agent_id: &AgentId) -> bool {
        self.verified(agent_id).is_some()
    }

    pub fn is_awaiting_phone(&self, agent_id: &AgentId) -> bool {
        self.agents
            .get(agent_id)
            .map(|entry| entry.state == VerificationState::AwaitingPhone)
            .unwrap_or(false)
    }

    /// Enter the verification flow unless the agent is already verified
    pub fn begin_verification(&self, user: &ChatUser) -> VerificationStart {
        self.touch(user);
        let mut entry = match self.agents.get_mut(&user.id) {
            Some(entry) => entry,
            None => return VerificationStart::AwaitingPhone,
        };

        if entry.is_verified() {
            return VerificationStart::AlreadyVerified(entry.clone());
        }

        entry.state = VerificationState::AwaitingPhone;
        debug!("📱 Agent {} is now awaiting phone verification", user.id);
        VerificationStart::AwaitingPhone
    }

    /// Record a successful phone verification
    pub fn mark_verified(&self, user: &ChatUser, name: &str, phone: &str) -> AgentRecord {
        self.touch(user);
        let mut entry = self
            .agents
            .entry(user.id.clone())
            .or_insert_with(|| AgentRecord::new(user));
        entry.state = VerificationState::Verified;
        entry.name = Some(name.to_string());
        entry.phone = Some(phone.to_string());
        info!("✅ Agent {} verified as {}", user.id, name);
        entry.clone()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn verified_count(&self) -> usize {
        self.agents.iter().filter(|entry| entry.is_verified()).count()
    }
}

impl Default for AgentDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touch_creates_unverified_record_once() {
        let directory = AgentDirectory::new();
        let user = ChatUser::new(1_i64, Some("alice"));

        let record = directory.touch(&user);
        assert_eq!(record.state, VerificationState::Unverified);
        directory.touch(&user);
        assert_eq!(directory.len(), 1);
        assert!(!directory.is_verified(&user.id));
    }

    #[test]
    fn test_touch_follows_username_changes() {
        let directory = AgentDirectory::new();
        directory.touch(&ChatUser::new(1_i64, Some("alice")));

        let renamed = directory.touch(&ChatUser::new(1_i64, Some("alice_b")));
        assert_eq!(renamed.username.as_deref(), Some("alice_b"));

        let cleared = directory.touch(&ChatUser::new(1_i64, None));
        assert_eq!(cleared.username, None);
        assert_eq!(directory.len(), 1);
    }

    #[test]
    fn test_verification_flow() {
        let directory = AgentDirectory::new();
        let user = ChatUser::new(1_i64, Some("alice"));

        assert!(matches!(directory.begin_verification(&user), VerificationStart::AwaitingPhone));
        assert!(directory.is_awaiting_phone(&user.id));

        directory.mark_verified(&user, "Alice", "+1 555 0100");
        assert!(directory.is_verified(&user.id));
        assert_eq!(directory.verified_count(), 1);

        match directory.begin_verification(&user) {
            VerificationStart::AlreadyVerified(record) => {
                assert_eq!(record.name.as_deref(), Some("Alice"));
            }
            other => panic!("expected AlreadyVerified, got {:?}", other),
        }
        assert!(!directory.is_awaiting_phone(&user.id));
    }
}
