use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::{LeadEngineError, Result};

use super::SheetStore;

/// In-memory [`SheetStore`]
///
/// Clones share the same tables, so a test can keep a handle for seeding and
/// inspection after handing a clone to the engine. Write and read failures can
/// be injected to exercise store-unavailable paths.
#[derive(Clone, Default)]
pub struct MemorySheetStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    sheets: RwLock<HashMap<String, Vec<Vec<String>>>>,
    /// `None` allows unlimited writes, `Some(n)` allows `n` more before failing
    write_budget: Mutex<Option<usize>>,
    fail_reads: Mutex<bool>,
    full_reads: AtomicUsize,
}

impl MemorySheetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a table with the given rows (row 1 first)
    pub fn seed_rows<R, C>(&self, sheet: &str, rows: R)
    where
        R: IntoIterator<Item = Vec<C>>,
        C: Into<String>,
    {
        let rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        self.inner.sheets.write().insert(sheet.to_string(), rows);
    }

    /// Copy of a table's rows
    pub fn rows(&self, sheet: &str) -> Vec<Vec<String>> {
        self.inner.sheets.read().get(sheet).cloned().unwrap_or_default()
    }

    /// Value of one cell, 1-based
    pub fn cell(&self, sheet: &str, row: usize, column: usize) -> Option<String> {
        if row == 0 || column == 0 {
            return None;
        }
        self.inner
            .sheets
            .read()
            .get(sheet)
            .and_then(|rows| rows.get(row - 1))
            .and_then(|cells| cells.get(column - 1))
            .cloned()
    }

    /// Make every write fail (or succeed again)
    pub fn set_fail_writes(&self, fail: bool) {
        *self.inner.write_budget.lock() = if fail { Some(0) } else { None };
    }

    /// Allow `writes` more successful writes, then fail every write
    pub fn fail_writes_after(&self, writes: usize) {
        *self.inner.write_budget.lock() = Some(writes);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        *self.inner.fail_reads.lock() = fail;
    }

    /// Number of whole-table reads served so far
    pub fn full_reads(&self) -> usize {
        self.inner.full_reads.load(Ordering::Relaxed)
    }

    fn check_reads(&self, sheet: &str) -> Result<()> {
        if *self.inner.fail_reads.lock() {
            return Err(LeadEngineError::store(format!("read of '{}' rejected", sheet)));
        }
        Ok(())
    }

    fn take_write_permit(&self, sheet: &str) -> Result<()> {
        let mut budget = self.inner.write_budget.lock();
        match budget.as_mut() {
            None => Ok(()),
            Some(0) => {
                warn!("💥 Injected write failure on '{}'", sheet);
                Err(LeadEngineError::store(format!("write to '{}' rejected", sheet)))
            }
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl SheetStore for MemorySheetStore {
    async fn read_all_rows(&self, sheet: &str) -> Result<Vec<Vec<String>>> {
        self.check_reads(sheet)?;
        self.inner.full_reads.fetch_add(1, Ordering::Relaxed);
        Ok(self.rows(sheet))
    }

    async fn read_row(&self, sheet: &str, row: usize) -> Result<Vec<String>> {
        self.check_reads(sheet)?;
        Ok(row
            .checked_sub(1)
            .and_then(|index| self.inner.sheets.read().get(sheet)?.get(index).cloned())
            .unwrap_or_default())
    }

    async fn write_cell(&self, sheet: &str, row: usize, column: usize, value: &str) -> Result<()> {
        if row == 0 || column == 0 {
            return Err(LeadEngineError::store(format!(
                "invalid cell ({}, {}) in '{}'",
                row, column, sheet
            )));
        }
        self.take_write_permit(sheet)?;

        let mut sheets = self.inner.sheets.write();
        let rows = sheets.entry(sheet.to_string()).or_default();
        if rows.len() < row {
            rows.resize_with(row, Vec::new);
        }
        let cells = &mut rows[row - 1];
        if cells.len() < column {
            cells.resize(column, String::new());
        }
        cells[column - 1] = value.to_string();

        debug!("✏️ {}!R{}C{} = {:?}", sheet, row, column, value);
        Ok(())
    }

    async fn append_row(&self, sheet: &str, values: Vec<String>) -> Result<()> {
        self.take_write_permit(sheet)?;

        let mut sheets = self.inner.sheets.write();
        let rows = sheets.entry(sheet.to_string()).or_default();
        while rows
            .last()
            .map(|last| last.iter().all(|cell| cell.trim().is_empty()))
            .unwrap_or(false)
        {
            rows.pop();
        }
        rows.push(values);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_cell_grows_table() {
        let store = MemorySheetStore::new();
        store.write_cell("t", 3, 2, "x").await.unwrap();

        let rows = store.rows("t");
        assert_eq!(rows.len(), 3);
        assert_eq!(store.cell("t", 3, 2).as_deref(), Some("x"));
        assert_eq!(store.cell("t", 3, 1).as_deref(), Some(""));
        assert!(store.write_cell("t", 0, 1, "x").await.is_err());
    }

    #[tokio::test]
    async fn test_append_skips_trailing_blank_rows() {
        let store = MemorySheetStore::new();
        store.seed_rows("t", vec![vec!["h"], vec![""], vec![""]]);
        store.append_row("t", vec!["a".to_string()]).await.unwrap();
        assert_eq!(store.rows("t"), vec![vec!["h".to_string()], vec!["a".to_string()]]);
    }

    #[tokio::test]
    async fn test_write_budget_injection() {
        let store = MemorySheetStore::new();
        store.fail_writes_after(1);
        assert!(store.write_cell("t", 1, 1, "a").await.is_ok());
        let err = store.write_cell("t", 1, 2, "b").await.unwrap_err();
        assert!(err.is_store_failure());

        store.set_fail_writes(false);
        assert!(store.append_row("t", vec!["c".to_string()]).await.is_ok());

        store.set_fail_reads(true);
        assert!(store.read_all_rows("t").await.is_err());
    }
}
