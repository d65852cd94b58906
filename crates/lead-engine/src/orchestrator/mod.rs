//! Lead engine orchestration
//!
//! [`LeadEngine`] owns the queue, the outstanding assignments and their
//! deadline timers, and drives the agent lifecycle:
//!
//! ```text
//! Idle --request_lead--> Queued --dispatch--> Assigned --submit_status--> Idle
//!                                                 \------deadline-------/
//! ```
//!
//! Every transition runs under a single state lock that is held across the
//! store calls of that transition. Notifications are delivered after the lock
//! is released.

pub mod engine;
pub mod dispatch;
pub mod agents;
pub mod types;

pub use engine::LeadEngine;
pub use types::{
    DispatchCounters, DispatchResult, DispatchState, EngineStats, RequestOutcome, StartOutcome,
    StatusUpdate, VerificationOutcome,
};
