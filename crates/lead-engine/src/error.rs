use chrono::{DateTime, Utc};
use thiserror::Error;

/// Lead engine errors
#[derive(Error, Debug)]
pub enum LeadEngineError {
    /// Agent tried a gated command before finishing phone verification
    #[error("Agent is not verified")]
    NotVerified,

    /// Agent requested a new lead while one is still outstanding
    #[error("Agent already has pending lead {lead_id} (assigned {assigned_at})")]
    AlreadyPending {
        lead_id: String,
        assigned_at: DateTime<Utc>,
    },

    /// Agent submitted a status without an outstanding lead
    #[error("No pending lead found")]
    NoPendingLead,

    /// A store operation failed
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// An expected column is missing from a store table
    #[error("Column '{column}' not found in '{sheet}' worksheet")]
    SchemaMissing { sheet: String, column: String },

    /// SQLite backend errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Notification delivery failed
    #[error("Notification error: {0}")]
    Notification(String),

    /// Interactive callback payload could not be parsed
    #[error("Invalid callback: {0}")]
    InvalidCallback(String),

    /// Callback was issued for a different agent than the sender
    #[error("Callback belongs to another agent")]
    CallbackScope,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LeadEngineError {
    /// Create a new StoreUnavailable error
    pub fn store<S: Into<String>>(msg: S) -> Self {
        Self::StoreUnavailable(msg.into())
    }

    /// Create a new SchemaMissing error
    pub fn schema_missing<S: Into<String>, C: Into<String>>(sheet: S, column: C) -> Self {
        Self::SchemaMissing {
            sheet: sheet.into(),
            column: column.into(),
        }
    }

    /// Create a new Notification error
    pub fn notification<S: Into<String>>(msg: S) -> Self {
        Self::Notification(msg.into())
    }

    /// Create a new Config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new Internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the error came from the storage layer rather than agent input
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable(_) | Self::SchemaMissing { .. } | Self::Database(_)
        )
    }
}

/// Result type for lead engine operations
pub type Result<T> = std::result::Result<T, LeadEngineError>;
