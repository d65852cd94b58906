//! Lead records and status values
//!
//! Leads are owned by the store. The engine only reads them and moves their
//! `Status`/`AssignedTo` cells through the values defined here.

pub mod selection;

use std::fmt;
use serde::{Deserialize, Serialize};

pub use selection::select_next_eligible;

/// Externally assigned lead identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadId(pub String);

impl LeadId {
    /// Build an id from the raw `LeadID` cell, falling back to `lead_<row>` when empty
    pub fn from_cell(raw: &str, row: usize) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self(format!("lead_{}", row))
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Numeric value of the id, if it parses as an integer
    pub fn numeric(&self) -> Option<i64> {
        self.0.trim().parse::<i64>().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status column value of a lead
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LeadStatus {
    /// Empty cell
    Unset,
    Assigned,
    Interested,
    NotConnected,
    CallDone,
    Think,
    CallBack,
    Unresponsive,
    /// Any value outside the known set
    Other(String),
}

impl LeadStatus {
    /// Parse a raw status cell. Matching is case-insensitive and ignores surrounding whitespace.
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        match normalized.as_str() {
            "" => Self::Unset,
            "assigned" => Self::Assigned,
            "interested" => Self::Interested,
            "not connected" => Self::NotConnected,
            "call done - info given" => Self::CallDone,
            "think & let me know" => Self::Think,
            "call back" => Self::CallBack,
            "unresponsive" => Self::Unresponsive,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    /// Value written to the store
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unset => "",
            Self::Assigned => "assigned",
            Self::Interested => "Interested",
            Self::NotConnected => "Not Connected",
            Self::CallDone => "Call Done - Info Given",
            Self::Think => "Think & Let Me Know",
            Self::CallBack => "Call Back",
            Self::Unresponsive => "Unresponsive",
            Self::Other(value) => value,
        }
    }

    /// A lead can be handed out when its status is empty or unknown
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Unset | Self::Other(_))
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status an agent may report for an assigned lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusChoice {
    Interested,
    NotConnected,
    CallDone,
    Think,
    CallBack,
}

impl StatusChoice {
    /// All choices, in the order they are offered to the agent
    pub const ALL: [StatusChoice; 5] = [
        StatusChoice::Interested,
        StatusChoice::NotConnected,
        StatusChoice::CallDone,
        StatusChoice::Think,
        StatusChoice::CallBack,
    ];

    /// Short key used in callback payloads
    pub fn key(&self) -> &'static str {
        match self {
            Self::Interested => "interested",
            Self::NotConnected => "notconnected",
            Self::CallDone => "calldone",
            Self::Think => "think",
            Self::CallBack => "callback",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|choice| choice.key() == key)
    }

    /// Human-readable status, also the value written to the store
    pub fn label(&self) -> &'static str {
        match self {
            Self::Interested => "Interested",
            Self::NotConnected => "Not Connected",
            Self::CallDone => "Call Done - Info Given",
            Self::Think => "Think & Let Me Know",
            Self::CallBack => "Call Back",
        }
    }

    pub fn to_status(self) -> LeadStatus {
        match self {
            Self::Interested => LeadStatus::Interested,
            Self::NotConnected => LeadStatus::NotConnected,
            Self::CallDone => LeadStatus::CallDone,
            Self::Think => LeadStatus::Think,
            Self::CallBack => LeadStatus::CallBack,
        }
    }
}

impl fmt::Display for StatusChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the leads table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    /// 1-based row in the leads table (row 1 is the header)
    pub row: usize,
    pub lead_id: LeadId,
    pub name: String,
    pub phone: String,
    pub other_info: String,
    pub status: LeadStatus,
    pub assigned_to: Option<String>,
}

impl LeadRecord {
    pub fn is_eligible(&self) -> bool {
        self.status.is_eligible()
    }
}
