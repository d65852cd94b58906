use std::time::Duration;

use crate::lead::{LeadId, LeadRecord, StatusChoice};

use super::OutboundMessage;

/// Human-readable duration: whole minutes when exact, else seconds
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        let minutes = secs / 60;
        if minutes == 1 {
            "1 minute".to_string()
        } else {
            format!("{} minutes", minutes)
        }
    } else if secs == 1 {
        "1 second".to_string()
    } else if secs == 0 {
        format!("{} ms", duration.as_millis())
    } else {
        format!("{} seconds", secs)
    }
}

/// Lead payload with the status choices
pub fn lead_assigned(lead: &LeadRecord, response_timeout: Duration) -> OutboundMessage {
    let mut text = String::from("🎯 New Lead Assigned!\n\n");
    text.push_str(&format!("Lead ID: {}\n", lead.lead_id));
    text.push_str(&format!("Name: {}\n", or_na(&lead.name)));
    text.push_str(&format!("Phone: {}\n", or_na(&lead.phone)));
    if !lead.other_info.is_empty() {
        text.push_str(&format!("Other Info: {}\n", lead.other_info));
    }
    text.push_str(&format!(
        "\n⏰ Please update status within {}",
        format_duration(response_timeout)
    ));

    OutboundMessage::text(text).with_choices(&StatusChoice::ALL)
}

/// Sent when a deadline expired
pub fn lead_timed_out(lead_id: &LeadId) -> OutboundMessage {
    OutboundMessage::text(format!(
        "⚠️ Lead {} was marked as Unresponsive because no status was submitted in time.\n\n\
         Use /getnewlead to request another lead.",
        lead_id
    ))
}

/// Sent under the notify policy when the queue head found no lead
pub fn no_leads_available() -> OutboundMessage {
    OutboundMessage::text(
        "📭 No leads are available right now.\n\nUse /getnewlead to try again later.",
    )
}

fn or_na(value: &str) -> &str {
    if value.is_empty() {
        "N/A"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::LeadStatus;

    #[test]
    fn test_duration_formatting() {
        assert_eq!(format_duration(Duration::from_secs(900)), "15 minutes");
        assert_eq!(format_duration(Duration::from_secs(60)), "1 minute");
        assert_eq!(format_duration(Duration::from_secs(90)), "90 seconds");
        assert_eq!(format_duration(Duration::from_millis(50)), "50 ms");
    }

    #[test]
    fn test_lead_message_lists_fields_and_choices() {
        let lead = LeadRecord {
            row: 2,
            lead_id: LeadId("7".to_string()),
            name: "Dana".to_string(),
            phone: String::new(),
            other_info: "prefers evenings".to_string(),
            status: LeadStatus::Assigned,
            assigned_to: None,
        };
        let message = lead_assigned(&lead, Duration::from_secs(900));
        assert!(message.text.contains("Lead ID: 7"));
        assert!(message.text.contains("Phone: N/A"));
        assert!(message.text.contains("Other Info: prefers evenings"));
        assert!(message.text.contains("within 15 minutes"));
        assert_eq!(message.choices, StatusChoice::ALL.to_vec());
    }
}
