//! SQLite-backed sheet store
//!
//! Persists every table as cells in a single `sheet_cells` table keyed by
//! `(sheet, row_num, col_num)`, using sqlx over a SQLite pool. Row and column
//! numbers are 1-based like the in-memory store. Appends insert without
//! upserting, so two writers racing for the same row fail instead of
//! overwriting each other.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tracing::{debug, error, info};

use crate::error::{LeadEngineError, Result};
use crate::store::SheetStore;

/// Durable [`SheetStore`] using SQLite
#[derive(Clone)]
pub struct SqliteSheetStore {
    pool: SqlitePool,
}

impl SqliteSheetStore {
    /// Open (creating if missing) a database file
    pub async fn new(database_path: &str, max_connections: u32) -> Result<Self> {
        info!("🗄️ Opening lead database at: {}", database_path);

        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// In-memory database for testing
    pub async fn new_in_memory() -> Result<Self> {
        info!("🗄️ Creating in-memory lead database");

        // every connection of an in-memory database is a separate database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, creating the schema if needed
    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        let store = Self { pool };
        store.migrate().await?;
        info!("✅ Lead database initialized");
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        debug!("📋 Creating sheet_cells schema");
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS sheet_cells (
                sheet TEXT NOT NULL,
                row_num INTEGER NOT NULL,
                col_num INTEGER NOT NULL,
                value TEXT NOT NULL DEFAULT '',
                updated_at TEXT NOT NULL,
                PRIMARY KEY (sheet, row_num, col_num)
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Replace a whole table, used for seeding
    pub async fn replace_sheet(&self, sheet: &str, rows: &[Vec<String>]) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM sheet_cells WHERE sheet = ?")
            .bind(sheet)
            .execute(&mut *tx)
            .await?;

        for (row_index, cells) in rows.iter().enumerate() {
            for (col_index, value) in cells.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO sheet_cells (sheet, row_num, col_num, value, updated_at)
                     VALUES (?, ?, ?, ?, ?)",
                )
                .bind(sheet)
                .bind((row_index + 1) as i64)
                .bind((col_index + 1) as i64)
                .bind(value)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        info!("📥 Loaded {} rows into '{}'", rows.len(), sheet);
        Ok(())
    }

    /// Execute a health check query
    pub async fn health_check(&self) -> bool {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => {
                debug!("💚 Database health check passed");
                true
            }
            Err(e) => {
                error!("❌ Database health check failed: {}", e);
                false
            }
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn to_index(value: i64) -> Result<usize> {
    usize::try_from(value)
        .ok()
        .filter(|index| *index > 0)
        .ok_or_else(|| LeadEngineError::store(format!("corrupt cell index {}", value)))
}

#[async_trait]
impl SheetStore for SqliteSheetStore {
    async fn read_all_rows(&self, sheet: &str) -> Result<Vec<Vec<String>>> {
        let records = sqlx::query(
            "SELECT row_num, col_num, value FROM sheet_cells
             WHERE sheet = ? ORDER BY row_num ASC, col_num ASC",
        )
        .bind(sheet)
        .fetch_all(&self.pool)
        .await?;

        let mut rows: Vec<Vec<String>> = Vec::new();
        for record in records {
            let row = to_index(record.try_get::<i64, _>("row_num")?)?;
            let column = to_index(record.try_get::<i64, _>("col_num")?)?;
            let value: String = record.try_get("value")?;

            if rows.len() < row {
                rows.resize_with(row, Vec::new);
            }
            let cells = &mut rows[row - 1];
            if cells.len() < column {
                cells.resize(column, String::new());
            }
            cells[column - 1] = value;
        }

        Ok(rows)
    }

    async fn read_row(&self, sheet: &str, row: usize) -> Result<Vec<String>> {
        let records = sqlx::query(
            "SELECT col_num, value FROM sheet_cells
             WHERE sheet = ? AND row_num = ? ORDER BY col_num ASC",
        )
        .bind(sheet)
        .bind(row as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut cells = Vec::new();
        for record in records {
            let column = to_index(record.try_get::<i64, _>("col_num")?)?;
            if cells.len() < column {
                cells.resize(column, String::new());
            }
            cells[column - 1] = record.try_get("value")?;
        }
        Ok(cells)
    }

    async fn write_cell(&self, sheet: &str, row: usize, column: usize, value: &str) -> Result<()> {
        if row == 0 || column == 0 {
            return Err(LeadEngineError::store(format!(
                "invalid cell ({}, {}) in '{}'",
                row, column, sheet
            )));
        }

        sqlx::query(
            "INSERT INTO sheet_cells (sheet, row_num, col_num, value, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(sheet, row_num, col_num) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
        )
        .bind(sheet)
        .bind(row as i64)
        .bind(column as i64)
        .bind(value)
        .bind(chrono::Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!("✏️ {}!R{}C{} = {:?}", sheet, row, column, value);
        Ok(())
    }

    async fn append_row(&self, sheet: &str, values: Vec<String>) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        let last_row: Option<i64> = sqlx::query(
            "SELECT MAX(row_num) AS last_row FROM sheet_cells WHERE sheet = ? AND value <> ''",
        )
        .bind(sheet)
        .fetch_one(&mut *tx)
        .await?
        .try_get("last_row")?;
        let next_row = last_row.unwrap_or(0) + 1;

        // trailing cells past the last non-empty row are all blank
        sqlx::query("DELETE FROM sheet_cells WHERE sheet = ? AND row_num >= ?")
            .bind(sheet)
            .bind(next_row)
            .execute(&mut *tx)
            .await?;

        for (col_index, value) in values.iter().enumerate() {
            sqlx::query(
                "INSERT INTO sheet_cells (sheet, row_num, col_num, value, updated_at)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(sheet)
            .bind(next_row)
            .bind((col_index + 1) as i64)
            .bind(value)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!("➕ Appended row {} to '{}'", next_row, sheet);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rows(raw: &[&[&str]]) -> Vec<Vec<String>> {
        raw.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[tokio::test]
    async fn test_cells_round_trip_in_memory() {
        let store = SqliteSheetStore::new_in_memory().await.expect("in-memory database");
        assert!(store.health_check().await);

        store.write_cell("leads", 2, 3, "x").await.unwrap();
        let table = store.read_all_rows("leads").await.unwrap();
        assert_eq!(table.len(), 2);
        assert!(table[0].is_empty());
        assert_eq!(table[1], vec!["", "", "x"]);

        assert!(store.read_all_rows("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_append_goes_after_last_row() {
        let store = SqliteSheetStore::new_in_memory().await.expect("in-memory database");
        store
            .replace_sheet("audit", &rows(&[&["User", "Action"], &["a", "b"]]))
            .await
            .unwrap();
        store
            .append_row("audit", vec!["c".to_string(), "d".to_string()])
            .await
            .unwrap();

        let table = store.read_all_rows("audit").await.unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table[2], vec!["c", "d"]);
    }

    #[tokio::test]
    async fn test_append_replaces_trailing_blank_cells() {
        let store = SqliteSheetStore::new_in_memory().await.expect("in-memory database");
        store
            .replace_sheet("audit", &rows(&[&["User", "Action"], &["", "", ""]]))
            .await
            .unwrap();
        store.write_cell("audit", 3, 4, "").await.unwrap();

        store
            .append_row("audit", vec!["a".to_string(), "b".to_string()])
            .await
            .unwrap();

        let table = store.read_all_rows("audit").await.unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[1], vec!["a", "b"]);
        assert_eq!(store.read_row("audit", 2).await.unwrap(), vec!["a", "b"]);
        assert!(store.read_row("audit", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_appends_never_overwrite() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("race.db");
        let path = path.to_str().expect("utf-8 path");
        let store = SqliteSheetStore::new(path, 4).await.expect("open database");

        let mut handles = Vec::new();
        for index in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.append_row("audit", vec![format!("writer {}", index)]).await
            }));
        }

        let mut appended = 0;
        for handle in handles {
            if handle.await.expect("append task panicked").is_ok() {
                appended += 1;
            }
        }

        // losers of a race fail, so every success owns its own row
        let table = store.read_all_rows("audit").await.unwrap();
        assert!(appended > 0);
        assert_eq!(table.len(), appended);
        let mut writers: Vec<_> = table.iter().map(|row| row[0].clone()).collect();
        writers.sort();
        writers.dedup();
        assert_eq!(writers.len(), appended);
    }

    #[tokio::test]
    async fn test_file_database_persists_across_reopen() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("leads.db");
        let path = path.to_str().expect("utf-8 path");

        {
            let store = SqliteSheetStore::new(path, 2).await.expect("open database");
            store.write_cell("leads", 1, 1, "LeadID").await.unwrap();
            store.pool().close().await;
        }

        let reopened = SqliteSheetStore::new(path, 2).await.expect("reopen database");
        let table = reopened.read_all_rows("leads").await.unwrap();
        assert_eq!(table, vec![vec!["LeadID".to_string()]]);
    }
}
