//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The engine hands it finished batches through EntitySink; the
//! generators never execute SQL.

use crate::{
    engine::RunSummary,
    error::{SimError, SimResult},
    sink::{EntityBatch, EntitySink},
    types::{Timestamp, SQL_DATETIME_FORMAT},
};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

mod funnel;
mod reference;
mod target;

pub struct SimStore {
    conn: Connection,
    path: Option<String>, // None for :memory:, Some(path) for file
}

impl SimStore {
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        // page_size only takes effect before the first table exists.
        conn.execute_batch(
            "PRAGMA foreign_keys=OFF;
             PRAGMA page_size=4096;
             PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA cache_size=1000000;
             PRAGMA temp_store=MEMORY;
             PRAGMA mmap_size=30000000000;",
        )?;
        log::info!("store: connected to {path}");
        Ok(Self {
            conn,
            path: Some(path.to_string()),
        })
    }

    /// Delete `path` and its WAL siblings, then open it empty.
    pub fn open_fresh(path: &str) -> SimResult<Self> {
        for file in [path.to_string(), format!("{path}-wal"), format!("{path}-shm")] {
            if Path::new(&file).exists() {
                std::fs::remove_file(&file)
                    .map_err(|e| anyhow::anyhow!("Cannot remove {file}: {e}"))?;
            }
        }
        Self::open(path)
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=OFF; PRAGMA temp_store=MEMORY;")?;
        Ok(Self { conn, path: None })
    }

    /// Apply all schema migrations in order.
    /// Foreign keys are declared, but both constructors switch enforcement
    /// off: visitors land before the customers they reference.
    /// finalize() checks them instead.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_funnel_entities.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(&self, run_id: &str, seed: u64, version: &str) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO run (run_id, seed, version, status) VALUES (?1, ?2, ?3, 'running')",
            params![run_id, seed as i64, version],
        )?;
        Ok(())
    }

    pub fn complete_run(&self, run_id: &str, summary: &RunSummary) -> SimResult<()> {
        let summary_json = serde_json::to_string(summary)?;
        self.conn.execute(
            "UPDATE run SET status = 'completed', total_rows = ?1, summary_json = ?2
             WHERE run_id = ?3",
            params![summary.total_rows() as i64, summary_json, run_id],
        )?;
        Ok(())
    }

    pub fn run_status(&self, run_id: &str) -> SimResult<Option<String>> {
        let status = self
            .conn
            .query_row(
                "SELECT status FROM run WHERE run_id = ?1",
                params![run_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(status)
    }

    /// Number of recorded runs, completed or not.
    pub fn run_count(&self) -> SimResult<i64> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM run", [], |row| row.get(0))?;
        Ok(count)
    }

    // ── Maintenance ────────────────────────────────────────────

    /// Empty every entity table, children first. The run history stays.
    pub fn clear_entities(&mut self) -> SimResult<()> {
        let tx = self.conn.transaction()?;
        for table in TABLES.iter().rev() {
            tx.execute(&format!("DELETE FROM {table}"), [])?;
        }
        tx.commit()?;
        log::info!("store: cleared {} entity tables", TABLES.len());
        Ok(())
    }

    /// Number of rows in `table`. Only catalog table names are accepted.
    pub fn row_count(&self, table: &str) -> SimResult<i64> {
        if !TABLES.contains(&table) {
            return Err(anyhow::anyhow!("Unknown table {table}").into());
        }
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(count)
    }

    /// Rows that fail a declared foreign key.
    pub fn foreign_key_violations(&self) -> SimResult<usize> {
        let mut stmt = self.conn.prepare("PRAGMA foreign_key_check")?;
        let mut rows = stmt.query([])?;
        let mut violations = 0usize;
        while let Some(row) = rows.next()? {
            let table: String = row.get(0)?;
            let parent: String = row.get(2)?;
            log::warn!("store: {table} row references missing {parent}");
            violations += 1;
        }
        Ok(violations)
    }

    /// Refresh planner statistics; file-backed stores are also vacuumed.
    pub fn optimize(&self) -> SimResult<()> {
        self.conn
            .execute_batch("PRAGMA analysis_limit=400; PRAGMA optimize;")?;
        if self.path.is_some() {
            self.conn.execute_batch("VACUUM;")?;
        }
        Ok(())
    }

    pub fn close(self) -> SimResult<()> {
        let label = self.path.clone().unwrap_or_else(|| ":memory:".into());
        self.conn.close().map_err(|(_, e)| SimError::Database(e))?;
        log::info!("store: closed {label}");
        Ok(())
    }
}

/// Tables populated by a generation run, in persistence order.
pub const TABLES: [&str; 9] = [
    "products",
    "visitors",
    "customers",
    "channels",
    "campaigns",
    "marketing_spend",
    "target_population",
    "activities",
    "applications",
];

impl EntitySink for SimStore {
    /// One transaction per batch; batches commit independently.
    fn persist(&mut self, batch: EntityBatch<'_>) -> SimResult<usize> {
        if batch.is_empty() {
            log::debug!("store: nothing to write to {}", batch.table());
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let written = match batch {
            EntityBatch::Products(rows) => reference::insert_products(&tx, rows)?,
            EntityBatch::Visitors(rows) => reference::insert_visitors(&tx, rows)?,
            EntityBatch::Customers(rows) => reference::insert_customers(&tx, rows)?,
            EntityBatch::Channels(rows) => reference::insert_channels(&tx, rows)?,
            EntityBatch::Campaigns(rows) => reference::insert_campaigns(&tx, rows)?,
            EntityBatch::MarketingSpend(rows) => reference::insert_marketing_spend(&tx, rows)?,
            EntityBatch::TargetPopulation(rows) => target::insert_target_population(&tx, rows)?,
            EntityBatch::Activities(rows) => funnel::insert_activities(&tx, rows)?,
            EntityBatch::Applications(rows) => funnel::insert_applications(&tx, rows)?,
        };
        tx.commit()?;
        log::info!("store: committed {written} rows to {}", batch.table());
        Ok(written)
    }

    fn finalize(&mut self) -> SimResult<()> {
        let violations = self.foreign_key_violations()?;
        if violations > 0 {
            return Err(SimError::IntegrityViolation { violations });
        }
        self.optimize()?;
        log::info!("store: finalized");
        Ok(())
    }
}

fn to_sql_dt(ts: &Timestamp) -> String {
    ts.format(SQL_DATETIME_FORMAT).to_string()
}

fn from_sql_dt(idx: usize, raw: &str) -> rusqlite::Result<Timestamp> {
    Timestamp::parse_from_str(raw, SQL_DATETIME_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
