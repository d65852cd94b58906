//! Audit trail records and performance reporting
//!
//! Every agent-visible transition appends one [`AuditRecord`] to the audit
//! table. Records are never updated. [`PerformanceReport`] aggregates the
//! records of one actor.

pub mod report;

use std::fmt;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

pub use report::PerformanceReport;

/// Timestamp format used in the audit table
pub const AUDIT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Header row of the audit table
pub const AUDIT_HEADER: [&str; 5] = ["User", "Action", "Lead ID", "Timestamp", "Details"];

/// Audited action
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    BotStarted,
    UserVerified,
    VerificationFailed,
    Enqueued,
    LeadAssigned,
    LeadStatusUpdated,
    LeadTimeout,
    ReportViewed,
    QueueStatusViewed,
    /// Action string written by another producer
    Other(String),
}

impl AuditAction {
    pub fn as_str(&self) -> &str {
        match self {
            Self::BotStarted => "Bot Started",
            Self::UserVerified => "User Verified",
            Self::VerificationFailed => "Verification Failed",
            Self::Enqueued => "Enqueued for lead",
            Self::LeadAssigned => "Lead Assigned",
            Self::LeadStatusUpdated => "Lead Status Updated",
            Self::LeadTimeout => "Lead Timeout",
            Self::ReportViewed => "Report Viewed",
            Self::QueueStatusViewed => "Queue Status Viewed",
            Self::Other(action) => action,
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Bot Started" => Self::BotStarted,
            "User Verified" => Self::UserVerified,
            "Verification Failed" => Self::VerificationFailed,
            "Enqueued for lead" => Self::Enqueued,
            "Lead Assigned" => Self::LeadAssigned,
            "Lead Status Updated" => Self::LeadStatusUpdated,
            "Lead Timeout" => Self::LeadTimeout,
            "Report Viewed" => Self::ReportViewed,
            "Queue Status Viewed" => Self::QueueStatusViewed,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the audit table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// `username(id)` or `id`
    pub actor: String,
    pub action: AuditAction,
    pub lead_id: Option<String>,
    /// Formatted with [`AUDIT_TIMESTAMP_FORMAT`]
    pub timestamp: String,
    pub details: String,
}

impl AuditRecord {
    /// Record stamped with the current time
    pub fn new<A: Into<String>>(actor: A, action: AuditAction) -> Self {
        Self::at(actor, action, Utc::now())
    }

    pub fn at<A: Into<String>>(actor: A, action: AuditAction, when: DateTime<Utc>) -> Self {
        Self {
            actor: actor.into(),
            action,
            lead_id: None,
            timestamp: when.format(AUDIT_TIMESTAMP_FORMAT).to_string(),
            details: String::new(),
        }
    }

    pub fn with_lead<L: ToString>(mut self, lead_id: L) -> Self {
        self.lead_id = Some(lead_id.to_string());
        self
    }

    pub fn with_details<D: Into<String>>(mut self, details: D) -> Self {
        self.details = details.into();
        self
    }

    /// Parsed timestamp, if the cell holds a well-formed value
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&self.timestamp, AUDIT_TIMESTAMP_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Cell values in header order
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.actor.clone(),
            self.action.as_str().to_string(),
            self.lead_id.clone().unwrap_or_default(),
            self.timestamp.clone(),
            self.details.clone(),
        ]
    }

    /// Build a record from cells in header order. Missing trailing cells are empty.
    pub fn from_row(cells: &[String]) -> Self {
        let cell = |index: usize| cells.get(index).map(|value| value.trim().to_string()).unwrap_or_default();
        let lead_id = cell(2);
        Self {
            actor: cell(0),
            action: AuditAction::parse(&cell(1)),
            lead_id: if lead_id.is_empty() { None } else { Some(lead_id) },
            timestamp: cell(3),
            details: cell(4),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_row_layout() {
        let when = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 5).unwrap();
        let record = AuditRecord::at("alice(42)", AuditAction::LeadAssigned, when)
            .with_lead("7")
            .with_details("Lead assigned to user");

        assert_eq!(
            record.to_row(),
            vec!["alice(42)", "Lead Assigned", "7", "2024-03-01T09:30:05Z", "Lead assigned to user"]
        );
        assert_eq!(record.timestamp_utc(), Some(when));
        assert_eq!(AuditRecord::from_row(&record.to_row()), record);
    }

    #[test]
    fn test_short_rows_parse_with_empty_cells() {
        let record = AuditRecord::from_row(&["42".to_string(), "Report Viewed".to_string()]);
        assert_eq!(record.action, AuditAction::ReportViewed);
        assert_eq!(record.lead_id, None);
        assert!(record.details.is_empty());
    }

    #[test]
    fn test_unknown_action_is_preserved() {
        assert_eq!(AuditAction::parse("Manual Edit").as_str(), "Manual Edit");
        assert_eq!(AuditAction::parse("Enqueued for lead"), AuditAction::Enqueued);
    }
}
