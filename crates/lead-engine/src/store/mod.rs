//! Storage interfaces
//!
//! The engine talks to persistence through two layers:
//!
//! - [`SheetStore`]: a coarse table store with 1-based rows and columns where
//!   row 1 holds the header. Operations are individually durable but there is
//!   no transaction across them.
//! - [`LeadStore`]: the narrow capability the engine needs (read leads, mark a
//!   lead assigned, set a status, append and read audit records, look up team
//!   members). [`SheetLeadStore`] implements it on top of any [`SheetStore`].
//!
//! Columns are located by header name on every call, so column order in the
//! underlying tables is free. Column lookups and the audit header check only
//! read row 1; full table reads are reserved for listing leads, audit records
//! and team members.

pub mod memory;

use std::sync::Arc;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::audit::{AuditRecord, AUDIT_HEADER};
use crate::config::StoreConfig;
use crate::error::{LeadEngineError, Result};
use crate::lead::{LeadId, LeadRecord, LeadStatus};

pub use memory::MemorySheetStore;

/// Leads table columns
pub const LEADS_COLUMNS: [&str; 6] = ["LeadID", "Name", "Phone", "OtherInfo", "Status", "AssignedTo"];

/// Team table phone column
pub const TEAM_PHONE_COLUMN: &str = "Phone Number";

/// Team table name column
pub const TEAM_NAME_COLUMN: &str = "Telegram Name";

/// Coarse row/cell store
#[async_trait]
pub trait SheetStore: Send + Sync {
    /// All rows of a table, header included. A missing table reads as empty.
    async fn read_all_rows(&self, sheet: &str) -> Result<Vec<Vec<String>>>;

    /// One row (1-based). A missing row reads as empty.
    async fn read_row(&self, sheet: &str, row: usize) -> Result<Vec<String>> {
        let rows = self.read_all_rows(sheet).await?;
        Ok(row
            .checked_sub(1)
            .and_then(|index| rows.into_iter().nth(index))
            .unwrap_or_default())
    }

    /// Overwrite one cell (1-based row and column)
    async fn write_cell(&self, sheet: &str, row: usize, column: usize, value: &str) -> Result<()>;

    /// Append a row after the last non-empty row
    async fn append_row(&self, sheet: &str, values: Vec<String>) -> Result<()>;
}

#[async_trait]
impl<T: SheetStore + ?Sized> SheetStore for Arc<T> {
    async fn read_all_rows(&self, sheet: &str) -> Result<Vec<Vec<String>>> {
        (**self).read_all_rows(sheet).await
    }

    async fn read_row(&self, sheet: &str, row: usize) -> Result<Vec<String>> {
        (**self).read_row(sheet, row).await
    }

    async fn write_cell(&self, sheet: &str, row: usize, column: usize, value: &str) -> Result<()> {
        (**self).write_cell(sheet, row, column, value).await
    }

    async fn append_row(&self, sheet: &str, values: Vec<String>) -> Result<()> {
        (**self).append_row(sheet, values).await
    }
}

/// Authorized agent entry from the team table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMember {
    pub name: String,
    pub phone: String,
}

/// Persistence capability used by the engine
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Every data row of the leads table, in table order
    async fn read_leads(&self) -> Result<Vec<LeadRecord>>;

    /// Write the assignee and then `assigned` into the lead's row.
    /// The two writes are not atomic; a failure after the first is not rolled back.
    async fn mark_assigned(&self, row: usize, assignee: &str) -> Result<()>;

    /// Write a status into the lead's row
    async fn set_status(&self, row: usize, status: &LeadStatus) -> Result<()>;

    /// Append one audit record, creating the header row if absent
    async fn append_audit(&self, record: &AuditRecord) -> Result<()>;

    /// Every audit record in append order
    async fn read_audit(&self) -> Result<Vec<AuditRecord>>;

    /// Find a team member whose phone matches after stripping non-digits
    async fn find_team_member(&self, phone: &str) -> Result<Option<TeamMember>>;
}

/// Keep only ASCII digits, so `+1 (555) 000-1` and `15550001` compare equal
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Table names used by [`SheetLeadStore`]
#[derive(Debug, Clone)]
pub struct SheetNames {
    pub leads: String,
    pub team: String,
    pub audit: String,
}

impl From<&StoreConfig> for SheetNames {
    fn from(config: &StoreConfig) -> Self {
        Self {
            leads: config.leads_sheet.clone(),
            team: config.team_sheet.clone(),
            audit: config.audit_sheet.clone(),
        }
    }
}

impl Default for SheetNames {
    fn default() -> Self {
        Self::from(&StoreConfig::default())
    }
}

/// [`LeadStore`] over a [`SheetStore`]
pub struct SheetLeadStore<S> {
    sheets: S,
    names: SheetNames,
}

impl<S: SheetStore> SheetLeadStore<S> {
    pub fn new(sheets: S, names: SheetNames) -> Self {
        Self { sheets, names }
    }

    /// Underlying sheet store
    pub fn sheets(&self) -> &S {
        &self.sheets
    }

    pub fn names(&self) -> &SheetNames {
        &self.names
    }

    /// 1-based indexes of header columns, resolved from one header read
    async fn column_indexes<const N: usize>(
        &self,
        sheet: &str,
        columns: [&str; N],
    ) -> Result<[usize; N]> {
        let header = self.sheets.read_row(sheet, 1).await?;
        let mut indexes = [0; N];
        for (slot, column) in indexes.iter_mut().zip(columns) {
            *slot = header_index(&header, column).ok_or_else(|| {
                warn!("❌ Column '{}' not found in '{}' worksheet", column, sheet);
                LeadEngineError::schema_missing(sheet, column)
            })?;
        }
        Ok(indexes)
    }

    async fn ensure_audit_header(&self) -> Result<()> {
        let header = self.sheets.read_row(&self.names.audit, 1).await?;
        if header.iter().any(|cell| !cell.trim().is_empty()) {
            return Ok(());
        }

        debug!("📝 Creating audit header in '{}'", self.names.audit);
        for (index, title) in AUDIT_HEADER.iter().enumerate() {
            self.sheets.write_cell(&self.names.audit, 1, index + 1, title).await?;
        }
        Ok(())
    }
}

fn header_index(header: &[String], column: &str) -> Option<usize> {
    header
        .iter()
        .position(|cell| cell.trim() == column)
        .map(|index| index + 1)
}

fn cell_at(row: &[String], column: Option<usize>) -> String {
    column
        .and_then(|index| row.get(index - 1))
        .map(|value| value.trim().to_string())
        .unwrap_or_default()
}

#[async_trait]
impl<S: SheetStore> LeadStore for SheetLeadStore<S> {
    async fn read_leads(&self) -> Result<Vec<LeadRecord>> {
        let rows = self.sheets.read_all_rows(&self.names.leads).await?;
        let Some((header, data)) = rows.split_first() else {
            return Ok(Vec::new());
        };

        let [id_col, name_col, phone_col, info_col, status_col, assignee_col] =
            LEADS_COLUMNS.map(|column| header_index(header, column));

        let leads = data
            .iter()
            .enumerate()
            .filter(|(_, row)| row.iter().any(|cell| !cell.trim().is_empty()))
            .map(|(index, row)| {
                let row_number = index + 2;
                let assigned_to = cell_at(row, assignee_col);
                LeadRecord {
                    row: row_number,
                    lead_id: LeadId::from_cell(&cell_at(row, id_col), row_number),
                    name: cell_at(row, name_col),
                    phone: cell_at(row, phone_col),
                    other_info: cell_at(row, info_col),
                    status: LeadStatus::parse(&cell_at(row, status_col)),
                    assigned_to: if assigned_to.is_empty() { None } else { Some(assigned_to) },
                }
            })
            .collect::<Vec<_>>();

        debug!("📄 Read {} leads from '{}'", leads.len(), self.names.leads);
        Ok(leads)
    }

    async fn mark_assigned(&self, row: usize, assignee: &str) -> Result<()> {
        let [assignee_col, status_col] =
            self.column_indexes(&self.names.leads, ["AssignedTo", "Status"]).await?;

        self.sheets.write_cell(&self.names.leads, row, assignee_col, assignee).await?;
        self.sheets
            .write_cell(&self.names.leads, row, status_col, LeadStatus::Assigned.as_str())
            .await?;
        Ok(())
    }

    async fn set_status(&self, row: usize, status: &LeadStatus) -> Result<()> {
        let [status_col] = self.column_indexes(&self.names.leads, ["Status"]).await?;
        self.sheets
            .write_cell(&self.names.leads, row, status_col, status.as_str())
            .await
    }

    async fn append_audit(&self, record: &AuditRecord) -> Result<()> {
        self.ensure_audit_header().await?;
        self.sheets.append_row(&self.names.audit, record.to_row()).await
    }

    async fn read_audit(&self) -> Result<Vec<AuditRecord>> {
        let rows = self.sheets.read_all_rows(&self.names.audit).await?;
        Ok(rows
            .iter()
            .skip(1)
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .map(|row| AuditRecord::from_row(row))
            .collect())
    }

    async fn find_team_member(&self, phone: &str) -> Result<Option<TeamMember>> {
        let wanted = normalize_phone(phone);
        if wanted.is_empty() {
            return Ok(None);
        }

        let rows = self.sheets.read_all_rows(&self.names.team).await?;
        let Some((header, data)) = rows.split_first() else {
            return Ok(None);
        };
        let phone_col = header_index(header, TEAM_PHONE_COLUMN)
            .ok_or_else(|| LeadEngineError::schema_missing(&self.names.team, TEAM_PHONE_COLUMN))?;
        let name_col = header_index(header, TEAM_NAME_COLUMN);

        let member = data.iter().find_map(|row| {
            let candidate = cell_at(row, Some(phone_col));
            if normalize_phone(&candidate) != wanted {
                return None;
            }
            let name = cell_at(row, name_col);
            Some(TeamMember {
                name: if name.is_empty() { "Unknown".to_string() } else { name },
                phone: candidate,
            })
        });
        Ok(member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditAction;

    fn store() -> SheetLeadStore<MemorySheetStore> {
        let sheets = MemorySheetStore::new();
        sheets.seed_rows(
            "leads",
            vec![
                vec!["LeadID", "Name", "Phone", "OtherInfo", "Status", "AssignedTo"],
                vec!["5", "Eve", "111", "", "", ""],
                vec!["", "Nameless", "222", "", "Call Back", "bob"],
            ],
        );
        sheets.seed_rows(
            "team",
            vec![
                vec!["Phone Number", "Telegram Name"],
                vec!["+1 555-0001", "Alice"],
                vec!["15550002", ""],
            ],
        );
        SheetLeadStore::new(sheets, SheetNames::default())
    }

    #[tokio::test]
    async fn test_read_leads_maps_columns_and_rows() {
        let store = store();
        let leads = store.read_leads().await.unwrap();
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].row, 2);
        assert_eq!(leads[0].lead_id.as_str(), "5");
        assert!(leads[0].is_eligible());
        assert_eq!(leads[1].lead_id.as_str(), "lead_3");
        assert_eq!(leads[1].status, LeadStatus::CallBack);
        assert_eq!(leads[1].assigned_to.as_deref(), Some("bob"));
    }

    #[tokio::test]
    async fn test_mark_assigned_writes_assignee_then_status() {
        let store = store();
        store.mark_assigned(2, "Alice (15550001)").await.unwrap();

        let leads = store.read_leads().await.unwrap();
        assert_eq!(leads[0].status, LeadStatus::Assigned);
        assert_eq!(leads[0].assigned_to.as_deref(), Some("Alice (15550001)"));
    }

    #[tokio::test]
    async fn test_missing_status_column_is_schema_error() {
        let sheets = MemorySheetStore::new();
        sheets.seed_rows("leads", vec![vec!["LeadID", "Name"], vec!["1", "x"]]);
        let store = SheetLeadStore::new(sheets, SheetNames::default());

        let err = store.set_status(2, &LeadStatus::Interested).await.unwrap_err();
        assert!(matches!(err, LeadEngineError::SchemaMissing { ref column, .. } if column == "Status"));
    }

    #[tokio::test]
    async fn test_audit_header_created_once() {
        let store = store();
        store
            .append_audit(&AuditRecord::new("42", AuditAction::BotStarted))
            .await
            .unwrap();
        store
            .append_audit(&AuditRecord::new("42", AuditAction::ReportViewed))
            .await
            .unwrap();

        let rows = store.sheets().rows("audit trails");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], AUDIT_HEADER.map(str::to_string).to_vec());

        let records = store.read_audit().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].action, AuditAction::ReportViewed);
    }

    #[tokio::test]
    async fn test_writes_read_only_the_header_row() {
        let store = store();
        for index in 0..50 {
            store
                .sheets()
                .append_row("leads", vec![format!("{}", 100 + index), "Filler".to_string()])
                .await
                .unwrap();
        }

        store.mark_assigned(2, "Alice (15550001)").await.unwrap();
        store.set_status(2, &LeadStatus::Interested).await.unwrap();
        for _ in 0..3 {
            store
                .append_audit(&AuditRecord::new("42", AuditAction::LeadAssigned))
                .await
                .unwrap();
        }
        assert_eq!(store.sheets().full_reads(), 0);

        store.read_audit().await.unwrap();
        assert_eq!(store.sheets().full_reads(), 1);
    }

    #[tokio::test]
    async fn test_read_row_defaults_to_empty() {
        let store = store();
        assert_eq!(store.sheets().read_row("leads", 1).await.unwrap()[0], "LeadID");
        assert!(store.sheets().read_row("leads", 40).await.unwrap().is_empty());
        assert!(store.sheets().read_row("missing", 1).await.unwrap().is_empty());
        assert!(store.sheets().read_row("leads", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_team_lookup_normalizes_digits() {
        let store = store();
        let member = store.find_team_member("15550001").await.unwrap().unwrap();
        assert_eq!(member.name, "Alice");

        let unnamed = store.find_team_member("+1 (555) 0002").await.unwrap().unwrap();
        assert_eq!(unnamed.name, "Unknown");

        assert!(store.find_team_member("999").await.unwrap().is_none());
        assert!(store.find_team_member("").await.unwrap().is_none());
    }
}
