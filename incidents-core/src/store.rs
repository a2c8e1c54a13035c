//! SQLite-backed incident store.
//!
//! Every operation opens its own connection and runs a single statement, so
//! a handle never outlives the call that acquired it. Callers on the async
//! side go through [`IncidentStore::blocking`], which moves the work onto
//! tokio's blocking pool.

use crate::config::ServerConfig;
use crate::error::StoreError;
use crate::model::{Incident, IncidentStatus, NewIncident};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS incidents (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    description TEXT NOT NULL CHECK (length(description) <= 1000),
    status      TEXT NOT NULL
                CHECK (status IN ('open', 'in_progress', 'resolved', 'closed')),
    source      TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS ix_incidents_status ON incidents (status);
CREATE INDEX IF NOT EXISTS ix_incidents_source ON incidents (source);
CREATE INDEX IF NOT EXISTS ix_incidents_created_at ON incidents (created_at);
";

const COLUMNS: &str = "id, description, status, source, created_at";

impl ToSql for IncidentStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for IncidentStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// Fixed-width RFC 3339 so that text order in the column is time order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn incident_from_row(row: &Row<'_>) -> rusqlite::Result<Incident> {
    let created_at: String = row.get(4)?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?
        .with_timezone(&Utc);

    Ok(Incident {
        id: row.get(0)?,
        description: row.get(1)?,
        status: row.get(2)?,
        source: row.get(3)?,
        created_at,
    })
}

/// Handle to the incidents database.
///
/// Cloning is cheap; it holds the location and connection settings, not a
/// connection.
#[derive(Debug, Clone)]
pub struct IncidentStore {
    path: PathBuf,
    busy_timeout: Duration,
}

impl IncidentStore {
    pub fn new(path: impl Into<PathBuf>, busy_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            busy_timeout,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(&config.database_path, config.busy_timeout())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a fresh connection. Dropping it releases the handle.
    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }

    /// Create the table and indexes if they are missing. Safe to call on
    /// every start.
    pub fn init_schema(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = self.connect()?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.execute_batch(SCHEMA)?;
        debug!(path = %self.path.display(), journal_mode = %mode, "Incident schema ready");
        Ok(())
    }

    /// Insert a new incident stamped with the current UTC time.
    pub fn create(&self, new: &NewIncident) -> Result<Incident, StoreError> {
        self.create_at(new, Utc::now())
    }

    pub(crate) fn create_at(
        &self,
        new: &NewIncident,
        created_at: DateTime<Utc>,
    ) -> Result<Incident, StoreError> {
        let conn = self.connect()?;
        let incident = conn.query_row(
            &format!(
                "INSERT INTO incidents (description, status, source, created_at)
                 VALUES (?1, ?2, ?3, ?4)
                 RETURNING {COLUMNS}"
            ),
            params![
                new.description,
                new.effective_status(),
                new.source,
                format_timestamp(&created_at),
            ],
            incident_from_row,
        )?;
        Ok(incident)
    }

    /// All incidents, newest first, ties broken by the higher id.
    pub fn list(&self, status: Option<IncidentStatus>) -> Result<Vec<Incident>, StoreError> {
        let mut sql = format!("SELECT {COLUMNS} FROM incidents");
        if status.is_some() {
            sql.push_str(" WHERE status = ?1");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let conn = self.connect()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = match status {
            Some(status) => stmt.query_map(params![status], incident_from_row)?,
            None => stmt.query_map([], incident_from_row)?,
        };
        let incidents = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        debug!(count = incidents.len(), status = ?status, "Listed incidents");
        Ok(incidents)
    }

    pub fn get(&self, id: i64) -> Result<Incident, StoreError> {
        let conn = self.connect()?;
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM incidents WHERE id = ?1"),
            params![id],
            incident_from_row,
        )
        .optional()?
        .ok_or(StoreError::NotFound { id })
    }

    /// Overwrite the status of an existing incident. Last write wins.
    pub fn update_status(&self, id: i64, status: IncidentStatus) -> Result<Incident, StoreError> {
        let conn = self.connect()?;
        conn.query_row(
            &format!("UPDATE incidents SET status = ?1 WHERE id = ?2 RETURNING {COLUMNS}"),
            params![status, id],
            incident_from_row,
        )
        .optional()?
        .ok_or(StoreError::NotFound { id })
    }

    /// Run a storage operation on the blocking thread pool.
    pub async fn blocking<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&IncidentStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || op(&store)).await?
    }
}
