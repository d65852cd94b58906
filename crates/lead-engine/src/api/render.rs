//! Plain-text replies

use std::time::Duration;
use chrono::{DateTime, Utc};

use crate::agent::AgentRecord;
use crate::audit::PerformanceReport;
use crate::error::LeadEngineError;
use crate::lead::{LeadId, StatusChoice};
use crate::notify::messages::format_duration;
use crate::notify::OutboundMessage;
use crate::queue::QueueSnapshot;

const VERIFIED_COMMANDS: &str = "Available commands:\n\
    /getnewlead - Request a new lead\n\
    /report - View your performance report\n\
    /help - Show all commands";

pub fn help(bot_name: &str, response_timeout: Duration) -> OutboundMessage {
    let timeout = format_duration(response_timeout);
    let mut text = format!("🤖 {} Commands\n\n", bot_name);
    text.push_str("Basic Commands:\n");
    text.push_str("/start - Verify your phone number and get started\n");
    text.push_str("/help - Show this help message\n\n");
    text.push_str("For Verified Users:\n");
    text.push_str("/getnewlead - Join queue to get a new lead\n");
    text.push_str("/queuestatus - View current queue status\n");
    text.push_str("/report - View your performance report\n\n");
    text.push_str("How it works:\n");
    text.push_str("1. Share your phone number to verify team membership\n");
    text.push_str("2. Use /getnewlead to join the lead assignment queue\n");
    text.push_str(&format!(
        "3. When assigned a lead, update its status within {}\n",
        timeout
    ));
    text.push_str("4. Use /report to track your performance\n\n");
    text.push_str("Lead Status Options:\n");
    for choice in StatusChoice::ALL {
        text.push_str(&format!("- {}\n", choice.label()));
    }
    text.push_str("\nQueue System:\n");
    text.push_str("- First come, first served\n");
    text.push_str("- Leads assigned by LeadID order\n");
    text.push_str(&format!("- {} timeout for status updates\n", timeout));
    OutboundMessage::text(text)
}

pub fn welcome_back(agent: &AgentRecord) -> OutboundMessage {
    OutboundMessage::text(format!(
        "Welcome back, {}!\n\n{}",
        agent.display_name(),
        VERIFIED_COMMANDS
    ))
}

pub fn verification_prompt() -> OutboundMessage {
    OutboundMessage::text(
        "🔐 Team Verification Required\n\n\
         Please share your phone number to verify you're part of the team.",
    )
}

pub fn verification_success(agent: &AgentRecord) -> OutboundMessage {
    OutboundMessage::text(format!(
        "✅ Verification Successful!\n\nWelcome {}!\n\n{}",
        agent.display_name(),
        VERIFIED_COMMANDS
    ))
}

pub fn verification_failed() -> OutboundMessage {
    OutboundMessage::text(
        "❌ Verification Failed\n\nYou are not part of the team. Please contact your manager.",
    )
}

pub fn queued(position: usize, estimated_wait: Duration) -> OutboundMessage {
    OutboundMessage::text(format!(
        "📋 Added to Lead Queue\n\n\
         Your Position: {}\n\
         Estimated Wait: ~{}\n\n\
         You'll be notified when it's your turn!",
        position,
        format_duration(estimated_wait)
    ))
}

pub fn still_first_in_queue() -> OutboundMessage {
    OutboundMessage::text(
        "📭 No lead is available yet. You stay first in the queue and will be notified.",
    )
}

pub fn already_pending(lead_id: &str, assigned_at: DateTime<Utc>) -> OutboundMessage {
    OutboundMessage::text(format!(
        "⚠️ Please submit the status of your previous lead first!\n\n\
         Lead ID: {}\n\
         Assigned: {}\n\n\
         Use the status buttons to update the lead status.",
        lead_id,
        assigned_at.format("%Y-%m-%d %H:%M:%S")
    ))
}

pub fn status_updated(lead_id: &LeadId, status: StatusChoice) -> OutboundMessage {
    OutboundMessage::text(format!(
        "✅ Status Updated Successfully!\n\n\
         Lead {} Status: {}\n\n\
         Use /getnewlead to request another lead.",
        lead_id,
        status.label()
    ))
}

pub fn queue_empty() -> OutboundMessage {
    OutboundMessage::text("📋 Queue is empty\n\nUse /getnewlead to join the queue.")
}

pub fn queue_status(snapshot: &QueueSnapshot) -> OutboundMessage {
    let mut text = String::from("📋 Current Lead Queue\n\n");
    for entry in &snapshot.entries {
        let marker = if entry.hot { "🔥" } else { "⏳" };
        let you = if entry.is_requester { " (You)" } else { "" };
        text.push_str(&format!(
            "{}. {}{} {} - Waiting {}m\n",
            entry.position,
            entry.display_name,
            you,
            marker,
            entry.wait_minutes()
        ));
    }
    if snapshot.remaining() > 0 {
        text.push_str(&format!("\n... and {} more users\n", snapshot.remaining()));
    }
    text.push_str(&format!("\nTotal in Queue: {}", snapshot.total));
    OutboundMessage::text(text)
}

pub fn report(agent: &AgentRecord, report: &PerformanceReport) -> OutboundMessage {
    let mut text = String::from("📊 Your Performance Report\n\n");
    text.push_str(&format!("Name: {}\n", agent.display_name()));
    text.push_str(&format!("Leads Assigned: {}\n", report.leads_assigned));
    text.push_str(&format!("Status Submitted: {}\n", report.status_submitted));
    text.push_str(&format!("Success Rate: {:.1}%\n", report.success_rate));
    if !report.breakdown.is_empty() {
        text.push_str("\nStatus Breakdown:\n");
        for (status, count) in &report.breakdown {
            text.push_str(&format!("- {}: {}\n", status, count));
        }
    }
    OutboundMessage::text(text)
}

/// Reply for a failed command
pub fn error(err: &LeadEngineError) -> OutboundMessage {
    let text = match err {
        LeadEngineError::NotVerified => {
            "❌ Please verify your phone number first using /start".to_string()
        }
        LeadEngineError::AlreadyPending { lead_id, assigned_at } => {
            return already_pending(lead_id, *assigned_at);
        }
        LeadEngineError::NoPendingLead => "❌ No pending lead found.".to_string(),
        LeadEngineError::InvalidCallback(_) => "❌ Unrecognized action.".to_string(),
        LeadEngineError::CallbackScope => "❌ This lead belongs to another agent.".to_string(),
        _ => "❌ Something went wrong, please try again later.".to_string(),
    };
    OutboundMessage::text(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentId, ChatUser};
    use crate::queue::{LeadQueue, QueueEntry};

    #[test]
    fn test_queue_status_marks_requester_and_overflow() {
        let mut queue = LeadQueue::new();
        for i in 0..12 {
            queue.enqueue(QueueEntry::new(AgentId::from(format!("a{}", i).as_str()), None, format!("Agent {}", i)));
        }
        let snapshot = queue.snapshot(10, 3, Some(&AgentId::from("a1")));
        let text = queue_status(&snapshot).text;

        assert!(text.contains("1. Agent 0 🔥"));
        assert!(text.contains("2. Agent 1 (You) 🔥"));
        assert!(text.contains("4. Agent 3 ⏳"));
        assert!(text.contains("... and 2 more users"));
        assert!(text.contains("Total in Queue: 12"));
    }

    #[test]
    fn test_store_errors_get_generic_reply() {
        let reply = error(&LeadEngineError::store("sheet offline"));
        assert!(!reply.text.contains("sheet offline"));
        assert!(error(&LeadEngineError::NotVerified).text.contains("/start"));
    }

    #[test]
    fn test_report_formats_rate() {
        let agent = AgentRecord::new(&ChatUser::new(1_i64, Some("u")));
        let mut report = PerformanceReport::from_records("u(1)", &[]);
        report.success_rate = 50.0;
        let text = super::report(&agent, &report).text;
        assert!(text.contains("Name: u"));
        assert!(text.contains("Success Rate: 50.0%"));
        assert!(!text.contains("Status Breakdown"));
    }
}
