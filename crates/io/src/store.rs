// Local report store using SQLite

use std::fmt;
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use caserecon_recon::{Divergence, ReasonCode, StatsByEventCode};

use crate::report::StatsRow;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS reports (
    id INTEGER PRIMARY KEY NOT NULL,
    created_at_date TEXT NOT NULL,
    time_of_creation TEXT NOT NULL,
    number_of_discrepancies INTEGER NOT NULL,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cases (
    id INTEGER PRIMARY KEY NOT NULL,
    report_id INTEGER NOT NULL REFERENCES reports(id),
    case_id TEXT NOT NULL,
    event_code TEXT NOT NULL,
    event_name TEXT NOT NULL,
    mmwr_year TEXT NOT NULL,
    mmwr_week TEXT NOT NULL,
    reason TEXT NOT NULL,
    reason_id INTEGER NOT NULL,  -- 1=duplicate, 2=missing secondary, 3=attributes, 4=missing authoritative
    case_class_status TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS cases_report ON cases(report_id);

CREATE TABLE IF NOT EXISTS statistics (
    id INTEGER PRIMARY KEY NOT NULL,
    report_id INTEGER NOT NULL REFERENCES reports(id),
    event_code TEXT NOT NULL,
    event_name TEXT NOT NULL,
    total_cases INTEGER NOT NULL,
    total_duplicates INTEGER NOT NULL,
    total_missing_from_secondary INTEGER NOT NULL,
    total_missing_from_authoritative INTEGER NOT NULL,
    total_wrong_attributes INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS statistics_report ON statistics(report_id);

CREATE TABLE IF NOT EXISTS config (
    field_name TEXT PRIMARY KEY NOT NULL,
    field_value TEXT NOT NULL
);
"#;

#[derive(Debug)]
pub enum StoreError {
    /// SQLite failure (open, schema, query).
    Sqlite(rusqlite::Error),
    /// No report with this id.
    NotFound(i64),
    /// Stored row cannot be mapped back (e.g. unknown reason id).
    Corrupt(String),
    /// Store file or directory not accessible.
    Io(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(e) => write!(f, "report store error: {e}"),
            Self::NotFound(id) => write!(f, "report {id} not found"),
            Self::Corrupt(msg) => write!(f, "report store is corrupt: {msg}"),
            Self::Io(msg) => write!(f, "cannot open report store: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite(e)
    }
}

/// One row of the reports table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub id: i64,
    pub created_at_date: String,
    pub time_of_creation: String,
    pub number_of_discrepancies: i64,
    pub name: String,
}

pub struct ReportStore {
    conn: Connection,
}

impl ReportStore {
    /// Open (or create) the store at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Io(format!("{}: {}", parent.display(), e)))?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        let version: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
        if version > crate::STORE_SCHEMA_VERSION {
            return Err(StoreError::Corrupt(format!(
                "store schema version {version} is newer than supported ({})",
                crate::STORE_SCHEMA_VERSION
            )));
        }
        conn.pragma_update(None, "user_version", crate::STORE_SCHEMA_VERSION)?;
        Ok(Self { conn })
    }

    /// Store one run: the report row, every divergence and every stats entry,
    /// in a single transaction. An empty `name` becomes `Report <id>`.
    pub fn insert_report(
        &mut self,
        name: &str,
        divergences: &[Divergence],
        stats: &StatsByEventCode,
    ) -> Result<i64, StoreError> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO reports (created_at_date, time_of_creation, number_of_discrepancies, name)
             VALUES (DATE('now'), TIME('now'), ?1, ?2)",
            params![divergences.len() as i64, name],
        )?;
        let report_id = tx.last_insert_rowid();
        if name.is_empty() {
            tx.execute(
                "UPDATE reports SET name = ?1 WHERE id = ?2",
                params![default_name(report_id), report_id],
            )?;
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO cases (report_id, case_id, event_code, event_name, mmwr_year, mmwr_week, reason, reason_id, case_class_status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for d in divergences {
                stmt.execute(params![
                    report_id,
                    d.case_id,
                    d.event_code,
                    d.event_name,
                    d.mmwr_year,
                    d.mmwr_week,
                    d.reason,
                    d.reason_id.code(),
                    d.case_class_status,
                ])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO statistics (report_id, event_code, event_name, total_cases, total_duplicates,
                    total_missing_from_secondary, total_missing_from_authoritative, total_wrong_attributes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for (code, s) in stats.iter() {
                stmt.execute(params![
                    report_id,
                    code,
                    s.event_name,
                    s.total_cases as i64,
                    s.total_duplicates as i64,
                    s.total_missing_from_secondary as i64,
                    s.total_missing_from_authoritative as i64,
                    s.total_wrong_attributes as i64,
                ])?;
            }
        }

        tx.commit()?;
        log::info!(
            "stored report {report_id} ({} divergences, {} event codes)",
            divergences.len(),
            stats.len()
        );
        Ok(report_id)
    }

    /// All reports, newest first.
    pub fn list_reports(&self) -> Result<Vec<ReportSummary>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, created_at_date, time_of_creation, number_of_discrepancies, name
             FROM reports ORDER BY created_at_date DESC, time_of_creation DESC, id DESC",
        )?;
        let rows = stmt.query_map([], summary_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    pub fn report(&self, report_id: i64) -> Result<ReportSummary, StoreError> {
        self.conn
            .query_row(
                "SELECT id, created_at_date, time_of_creation, number_of_discrepancies, name
                 FROM reports WHERE id = ?1",
                params![report_id],
                summary_from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound(report_id))
    }

    /// Divergences of one report, in the order they were produced.
    pub fn report_cases(&self, report_id: i64) -> Result<Vec<Divergence>, StoreError> {
        self.report(report_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT case_id, event_code, event_name, mmwr_year, mmwr_week, reason, reason_id, case_class_status
             FROM cases WHERE report_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![report_id], |row| {
            let reason_id: i64 = row.get(6)?;
            Ok((
                Divergence {
                    case_id: row.get(0)?,
                    event_code: row.get(1)?,
                    event_name: row.get(2)?,
                    mmwr_year: row.get(3)?,
                    mmwr_week: row.get(4)?,
                    reason: row.get(5)?,
                    reason_id: ReasonCode::DuplicateInSecondary,
                    case_class_status: row.get(7)?,
                },
                reason_id,
            ))
        })?;

        let mut cases = Vec::new();
        for row in rows {
            let (mut divergence, reason_id) = row?;
            divergence.reason_id = u8::try_from(reason_id)
                .ok()
                .and_then(ReasonCode::from_code)
                .ok_or_else(|| StoreError::Corrupt(format!("unknown reason id {reason_id}")))?;
            cases.push(divergence);
        }
        Ok(cases)
    }

    pub fn report_statistics(&self, report_id: i64) -> Result<Vec<StatsRow>, StoreError> {
        self.report(report_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT event_code, event_name, total_cases, total_duplicates, total_missing_from_secondary,
                    total_missing_from_authoritative, total_wrong_attributes
             FROM statistics WHERE report_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![report_id], |row| {
            Ok(StatsRow {
                event_code: row.get(0)?,
                event_name: row.get(1)?,
                total_cases: row.get::<_, i64>(2)? as u64,
                total_duplicates: row.get::<_, i64>(3)? as u64,
                total_missing_from_secondary: row.get::<_, i64>(4)? as u64,
                total_missing_from_authoritative: row.get::<_, i64>(5)? as u64,
                total_wrong_attributes: row.get::<_, i64>(6)? as u64,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
    }

    /// Rename a report. An empty name restores `Report <id>`.
    pub fn rename_report(&self, report_id: i64, name: &str) -> Result<(), StoreError> {
        let name = if name.is_empty() {
            default_name(report_id)
        } else {
            name.to_string()
        };
        let changed = self.conn.execute(
            "UPDATE reports SET name = ?1 WHERE id = ?2",
            params![name, report_id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(report_id));
        }
        Ok(())
    }

    /// Delete a report together with its cases and statistics.
    pub fn delete_report(&mut self, report_id: i64) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        let removed = tx.execute("DELETE FROM reports WHERE id = ?1", params![report_id])?;
        if removed == 0 {
            return Err(StoreError::NotFound(report_id));
        }
        tx.execute("DELETE FROM cases WHERE report_id = ?1", params![report_id])?;
        tx.execute("DELETE FROM statistics WHERE report_id = ?1", params![report_id])?;
        tx.commit()?;
        Ok(())
    }

    pub fn get_setting(&self, field_name: &str) -> Result<Option<String>, StoreError> {
        self.conn
            .query_row(
                "SELECT field_value FROM config WHERE field_name = ?1",
                params![field_name],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::from)
    }

    pub fn set_setting(&self, field_name: &str, value: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO config (field_name, field_value) VALUES (?1, ?2)
             ON CONFLICT(field_name) DO UPDATE SET field_value = excluded.field_value",
            params![field_name, value],
        )?;
        Ok(())
    }
}

fn summary_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReportSummary> {
    Ok(ReportSummary {
        id: row.get(0)?,
        created_at_date: row.get(1)?,
        time_of_creation: row.get(2)?,
        number_of_discrepancies: row.get(3)?,
        name: row.get(4)?,
    })
}

fn default_name(report_id: i64) -> String {
    format!("Report {report_id}")
}
