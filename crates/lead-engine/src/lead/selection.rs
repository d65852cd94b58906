//! Next-lead selection
//!
//! Selection is a pure function over a fresh read of the leads table. The
//! lowest numeric `LeadID` among eligible rows wins; rows whose id does not
//! parse as an integer sort after every numeric id, and ties keep table order.

use std::cmp::Ordering;
use tracing::debug;

use super::LeadRecord;

/// Ordering key for a lead: numeric ids first, ascending, then everything else
fn priority_key(lead: &LeadRecord) -> (u8, i64) {
    match lead.lead_id.numeric() {
        Some(value) => (0, value),
        None => (1, 0),
    }
}

/// Compare two leads by selection priority
pub fn compare_priority(a: &LeadRecord, b: &LeadRecord) -> Ordering {
    priority_key(a).cmp(&priority_key(b))
}

/// Pick the next lead to hand out, or `None` when nothing is eligible
pub fn select_next_eligible(leads: Vec<LeadRecord>) -> Option<LeadRecord> {
    let total = leads.len();
    // min_by keeps the first of several equal minimums
    let selected = leads
        .into_iter()
        .filter(LeadRecord::is_eligible)
        .min_by(compare_priority);

    match &selected {
        Some(lead) => debug!("🎯 Selected lead {} (row {}) out of {} rows", lead.lead_id, lead.row, total),
        None => debug!("📭 No eligible lead among {} rows", total),
    }

    selected
}
