//! Transport-agnostic chat surface
//!
//! - [`commands`]: parsing of slash commands and status callbacks
//! - [`handler`]: [`CommandHandler`] mapping inbound events to engine calls
//! - [`render`]: plain-text replies
//! - [`supervisor`]: operator view over the engine

pub mod commands;
pub mod handler;
pub mod render;
pub mod supervisor;

pub use commands::{callback_payload, BotCommand, Inbound, StatusCallback};
pub use handler::CommandHandler;
pub use supervisor::SupervisorApi;
