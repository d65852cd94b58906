//! # Lead Assignment Engine
//!
//! This crate distributes sales leads to a pool of verified agents through a
//! single FIFO queue, enforces a response deadline on every assignment, and
//! records an audit trail of what happened.
//!
//! ## Features
//!
//! - **Queueing**: agents wait in arrival order, at most once each
//! - **Assignment**: the eligible lead with the lowest numeric LeadID goes to
//!   the head of the queue, one outstanding lead per agent
//! - **Deadlines**: an agent that does not report a status in time loses the
//!   lead, which is marked `Unresponsive`
//! - **Verification**: agents join by sharing a phone number listed in the
//!   team table
//! - **Reporting**: per-agent statistics computed from the audit trail
//! - **Storage**: in-memory tables or SQLite through sqlx
//!
//! ## Architecture
//!
//! - [`orchestrator`]: [`LeadEngine`], the dispatch and deadline state machine
//! - [`agent`]: agent identities and the verification directory
//! - [`queue`]: the FIFO request queue
//! - [`assignment`]: outstanding assignments and their timers
//! - [`lead`]: lead records, status values and selection order
//! - [`audit`]: audit records and performance reports
//! - [`store`]: storage traits and the in-memory backend
//! - [`database`]: SQLite backend
//! - [`notify`]: outbound agent notifications
//! - [`api`]: chat command surface and supervisor view
//! - [`server`]: server lifecycle and builder
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use leadq_engine::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut server = LeadEngineServerBuilder::new()
//!         .with_config(LeadEngineConfig::default())
//!         .build()
//!         .await?;
//!     server.start().await?;
//!
//!     let alice = ChatUser::new(1001_i64, Some("alice"));
//!     let reply = server
//!         .handler()
//!         .handle(&alice, Inbound::Message("/start".to_string()))
//!         .await;
//!     if let Some(reply) = reply {
//!         println!("{}", reply.text);
//!     }
//!
//!     server.stop().await?;
//!     Ok(())
//! }
//! ```

// Core modules
pub mod error;
pub mod config;

// Domain modules
pub mod lead;
pub mod agent;
pub mod queue;
pub mod assignment;
pub mod audit;
pub mod orchestrator;

// Storage and delivery
pub mod store;
pub mod database;
pub mod notify;

// External interfaces
pub mod api;
pub mod server;

// Re-exports for convenience
pub use error::{LeadEngineError, Result};
pub use config::LeadEngineConfig;
pub use orchestrator::LeadEngine;
pub use server::{LeadEngineServer, LeadEngineServerBuilder};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{LeadEngine, LeadEngineConfig, LeadEngineError, LeadEngineServer, LeadEngineServerBuilder, Result};

    // Configuration types
    pub use crate::config::{
        DispatchConfig, EmptyDispatchPolicy, GeneralConfig, QueueConfig, StoreBackend, StoreConfig,
    };

    // Domain types
    pub use crate::agent::{AgentId, AgentRecord, ChatUser, VerificationState};
    pub use crate::assignment::Assignment;
    pub use crate::audit::{AuditAction, AuditRecord, PerformanceReport};
    pub use crate::lead::{LeadId, LeadRecord, LeadStatus, StatusChoice};
    pub use crate::queue::{QueueSnapshot, QueueStats};

    // Orchestrator types
    pub use crate::orchestrator::{
        DispatchResult, EngineStats, RequestOutcome, StartOutcome, StatusUpdate, VerificationOutcome,
    };

    // Storage and delivery
    pub use crate::database::SqliteSheetStore;
    pub use crate::notify::{ChannelNotifier, Delivery, LogNotifier, Notifier, OutboundMessage};
    pub use crate::store::{LeadStore, MemorySheetStore, SheetLeadStore, SheetNames, SheetStore, TeamMember};

    // API types
    pub use crate::api::{BotCommand, CommandHandler, Inbound, StatusCallback, SupervisorApi};

    // Common external types
    pub use chrono::{DateTime, Utc};
    pub use uuid::Uuid;
}
