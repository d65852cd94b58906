//! Lead request queue module
//!
//! Agents waiting for a lead are held in a single FIFO queue. An agent can
//! appear at most once, and the only way out of the queue is being dispatched.

pub mod manager;

pub use manager::{LeadQueue, QueueEntry, QueueSnapshot, QueueSnapshotEntry, QueueStats};
