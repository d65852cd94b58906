use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

use crate::lead::StatusChoice;

use super::{AuditAction, AuditRecord};

/// Per-agent performance summary derived from the audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub actor: String,
    pub leads_assigned: usize,
    pub status_submitted: usize,
    /// Count of submitted statuses keyed by status string
    pub breakdown: BTreeMap<String, usize>,
    /// Percentage of submitted statuses that were `Interested`
    pub success_rate: f64,
}

impl PerformanceReport {
    /// Aggregate the records whose actor equals `actor`
    pub fn from_records(actor: &str, records: &[AuditRecord]) -> Self {
        let mut leads_assigned = 0;
        let mut status_submitted = 0;
        let mut breakdown: BTreeMap<String, usize> = BTreeMap::new();

        for record in records.iter().filter(|record| record.actor == actor) {
            match record.action {
                AuditAction::LeadAssigned => leads_assigned += 1,
                AuditAction::LeadStatusUpdated => {
                    status_submitted += 1;
                    let status = if record.details.is_empty() {
                        "Unknown".to_string()
                    } else {
                        record.details.clone()
                    };
                    *breakdown.entry(status).or_insert(0) += 1;
                }
                _ => {}
            }
        }

        let interested = breakdown
            .get(StatusChoice::Interested.label())
            .copied()
            .unwrap_or(0);
        let success_rate = if status_submitted > 0 {
            interested as f64 / status_submitted as f64 * 100.0
        } else {
            0.0
        };

        Self {
            actor: actor.to_string(),
            leads_assigned,
            status_submitted,
            breakdown,
            success_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(actor: &str, action: AuditAction, details: &str) -> AuditRecord {
        AuditRecord::new(actor, action).with_details(details)
    }

    #[test]
    fn test_report_math() {
        let records = vec![
            record("u(1)", AuditAction::LeadAssigned, "Lead assigned to user"),
            record("u(1)", AuditAction::LeadStatusUpdated, "Interested"),
            record("u(1)", AuditAction::LeadAssigned, "Lead assigned to user"),
            record("u(1)", AuditAction::LeadStatusUpdated, "Not Connected"),
            record("other(2)", AuditAction::LeadStatusUpdated, "Interested"),
        ];

        let report = PerformanceReport::from_records("u(1)", &records);
        assert_eq!(report.leads_assigned, 2);
        assert_eq!(report.status_submitted, 2);
        assert_eq!(report.breakdown.get("Interested"), Some(&1));
        assert_eq!(report.breakdown.get("Not Connected"), Some(&1));
        assert!((report.success_rate - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_report_has_zero_rate() {
        let records = vec![record("u(1)", AuditAction::LeadAssigned, "")];
        let report = PerformanceReport::from_records("u(1)", &records);
        assert_eq!(report.leads_assigned, 1);
        assert_eq!(report.status_submitted, 0);
        assert!(report.breakdown.is_empty());
        assert_eq!(report.success_rate, 0.0);
    }
}
