use std::time::Duration;
use serde::{Deserialize, Serialize};

/// Lead engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadEngineConfig {
    /// General settings
    pub general: GeneralConfig,

    /// Dispatcher and deadline configuration
    pub dispatch: DispatchConfig,

    /// Queue inspection configuration
    pub queue: QueueConfig,

    /// Store backend configuration
    pub store: StoreConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Name shown in help text
    pub bot_name: String,

    /// Interval between server status log lines
    pub monitor_interval: Duration,
}

/// Dispatcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// How long an agent has to submit a status before the lead is marked unresponsive
    pub response_timeout: Duration,

    /// What happens to a dequeued agent when no eligible lead exists
    pub empty_dispatch_policy: EmptyDispatchPolicy,

    /// Advance the queue after a deadline expires
    pub dispatch_after_timeout: bool,

    /// Tell the agent when their lead was marked unresponsive
    pub notify_on_timeout: bool,

    /// How often the server retries dispatch for agents still waiting in the queue
    pub retry_interval: Duration,
}

/// Handling of an agent popped from the queue when selection finds nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmptyDispatchPolicy {
    /// Agent leaves the queue silently
    Drop,
    /// Agent leaves the queue and is told no leads are available
    Notify,
    /// Agent is put back at the head of the queue
    Requeue,
}

/// Queue inspection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum entries listed by a queue snapshot
    pub snapshot_limit: usize,

    /// Positions flagged as "hot" in a snapshot
    pub hot_positions: usize,

    /// Wait estimate per queue position shown after enqueueing
    pub estimated_wait_per_position: Duration,
}

/// Store backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Memory,
    Sqlite,
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Backend used by the server builder
    pub backend: StoreBackend,

    /// SQLite database file path
    pub database_path: String,

    /// Maximum SQLite connections
    pub max_connections: u32,

    /// Worksheet holding leads
    pub leads_sheet: String,

    /// Worksheet holding authorized team members
    pub team_sheet: String,

    /// Worksheet holding the audit trail
    pub audit_sheet: String,
}

impl LeadEngineConfig {
    /// Validate the configuration for consistency and correctness
    pub fn validate(&self) -> Result<(), String> {
        if self.dispatch.response_timeout.is_zero() {
            return Err("response_timeout must be greater than 0".to_string());
        }

        if self.dispatch.retry_interval.is_zero() {
            return Err("retry_interval must be greater than 0".to_string());
        }

        if self.queue.snapshot_limit == 0 {
            return Err("snapshot_limit must be greater than 0".to_string());
        }

        if self.queue.hot_positions > self.queue.snapshot_limit {
            return Err("hot_positions cannot exceed snapshot_limit".to_string());
        }

        if self.general.monitor_interval.is_zero() {
            return Err("monitor_interval must be greater than 0".to_string());
        }

        let sheets = [
            &self.store.leads_sheet,
            &self.store.team_sheet,
            &self.store.audit_sheet,
        ];
        if sheets.iter().any(|name| name.trim().is_empty()) {
            return Err("worksheet names cannot be empty".to_string());
        }

        if self.store.leads_sheet == self.store.audit_sheet
            || self.store.leads_sheet == self.store.team_sheet
            || self.store.team_sheet == self.store.audit_sheet
        {
            return Err("worksheet names must be distinct".to_string());
        }

        if self.store.backend == StoreBackend::Sqlite {
            if self.store.database_path.is_empty() {
                return Err("database_path cannot be empty for the sqlite backend".to_string());
            }
            if self.store.max_connections == 0 {
                return Err("max_connections must be greater than 0".to_string());
            }
        }

        Ok(())
    }
}

impl Default for LeadEngineConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            dispatch: DispatchConfig::default(),
            queue: QueueConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            bot_name: "Lead Management Bot".to_string(),
            monitor_interval: Duration::from_secs(60),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_secs(15 * 60),
            empty_dispatch_policy: EmptyDispatchPolicy::Drop,
            dispatch_after_timeout: true,
            notify_on_timeout: true,
            retry_interval: Duration::from_secs(30),
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            snapshot_limit: 10,
            hot_positions: 3,
            estimated_wait_per_position: Duration::from_secs(120),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database_path: "leadq.db".to_string(),
            max_connections: 5,
            leads_sheet: "leads".to_string(),
            team_sheet: "team".to_string(),
            audit_sheet: "audit trails".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LeadEngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dispatch.response_timeout, Duration::from_secs(900));
        assert_eq!(config.dispatch.empty_dispatch_policy, EmptyDispatchPolicy::Drop);
        assert_eq!(config.dispatch.retry_interval, Duration::from_secs(30));
        assert_eq!(config.queue.snapshot_limit, 10);
        assert_eq!(config.store.audit_sheet, "audit trails");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = LeadEngineConfig::default();
        config.dispatch.response_timeout = Duration::ZERO;
        assert!(config.validate().is_err());

        let mut config = LeadEngineConfig::default();
        config.dispatch.retry_interval = Duration::ZERO;
        assert_eq!(
            config.validate(),
            Err("retry_interval must be greater than 0".to_string())
        );
    }

    #[test]
    fn test_duplicate_sheet_names_rejected() {
        let mut config = LeadEngineConfig::default();
        config.store.audit_sheet = "leads".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "dispatch": { "empty_dispatch_policy": "Requeue" } }"#;
        let config: LeadEngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.dispatch.empty_dispatch_policy, EmptyDispatchPolicy::Requeue);
        assert_eq!(config.dispatch.response_timeout, Duration::from_secs(900));
        assert_eq!(config.store.leads_sheet, "leads");
    }
}
