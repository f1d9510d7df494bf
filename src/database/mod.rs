//! Operational Store
//!
//! Read-only access to the governance runtime's data: sessions, prompt
//! decisions and audit events from its SQLite database, and trace records
//! from the append-only trace file. Every read degrades to an empty
//! collection when the source is unavailable.

pub mod models;

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::audit::trace_log::TraceLog;
use crate::error::EvidenceError;
use models::*;

/// Fully materialised view of the operational data for one request
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub sessions: Vec<Session>,
    pub decisions: Vec<Decision>,
    /// Ascending by timestamp
    pub audit_events: Vec<AuditEvent>,
    pub trace_log: TraceLog,
}

impl Snapshot {
    pub fn list_sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn list_prompts(&self) -> &[Decision] {
        &self.decisions
    }

    pub fn list_traces(&self) -> impl Iterator<Item = &TraceEntry> {
        self.trace_log.entries()
    }

    pub fn list_audit_events(&self) -> &[AuditEvent] {
        &self.audit_events
    }
}

#[derive(Clone)]
pub struct OperationalStore {
    pool: Option<SqlitePool>,
    trace_log_path: PathBuf,
}

impl OperationalStore {
    /// Open the store read-only; an unreachable database leaves it detached
    pub async fn connect(database_url: &str, trace_log_path: impl Into<PathBuf>) -> Self {
        let trace_log_path = trace_log_path.into();
        match Self::open_pool(database_url).await {
            Ok(pool) => {
                info!("Operational store connected: {}", database_url);
                Self::from_pool(pool, trace_log_path)
            }
            Err(e) => {
                warn!(
                    "Operational store {} unreachable, serving empty data: {}",
                    database_url, e
                );
                Self::detached(trace_log_path)
            }
        }
    }

    async fn open_pool(database_url: &str) -> Result<SqlitePool, EvidenceError> {
        let options = SqliteConnectOptions::from_str(database_url)?.read_only(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;
        Ok(pool)
    }

    pub fn from_pool(pool: SqlitePool, trace_log_path: impl Into<PathBuf>) -> Self {
        Self {
            pool: Some(pool),
            trace_log_path: trace_log_path.into(),
        }
    }

    /// Store without a database; only the trace file is read
    pub fn detached(trace_log_path: impl Into<PathBuf>) -> Self {
        Self {
            pool: None,
            trace_log_path: trace_log_path.into(),
        }
    }

    pub fn trace_log_path(&self) -> &Path {
        &self.trace_log_path
    }

    pub fn is_connected(&self) -> bool {
        self.pool.is_some()
    }

    pub async fn snapshot(&self) -> Snapshot {
        let snapshot = Snapshot {
            sessions: self.list_sessions().await,
            decisions: self.list_prompts().await,
            audit_events: self.list_audit_events().await,
            trace_log: TraceLog::load(&self.trace_log_path).await,
        };
        debug!(
            "Snapshot: {} sessions, {} decisions, {} audit events, {} trace lines",
            snapshot.sessions.len(),
            snapshot.decisions.len(),
            snapshot.audit_events.len(),
            snapshot.trace_log.lines.len()
        );
        snapshot
    }

    pub async fn list_sessions(&self) -> Vec<Session> {
        degrade("sessions", self.try_list_sessions().await)
    }

    pub async fn list_prompts(&self) -> Vec<Decision> {
        degrade("prompts", self.try_list_prompts().await)
    }

    pub async fn list_audit_events(&self) -> Vec<AuditEvent> {
        degrade("audit_events", self.try_list_audit_events().await)
    }

    pub async fn list_traces(&self) -> Vec<TraceEntry> {
        TraceLog::load(&self.trace_log_path)
            .await
            .entries()
            .cloned()
            .collect()
    }

    pub async fn try_list_sessions(&self) -> Result<Vec<Session>, EvidenceError> {
        let Some(pool) = &self.pool else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query(
            r#"
            SELECT id, tool, status, started_at
            FROM sessions
            ORDER BY started_at ASC, id ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(collect_rows("sessions", &rows, session_from_row))
    }

    pub async fn try_list_prompts(&self) -> Result<Vec<Decision>, EvidenceError> {
        let Some(pool) = &self.pool else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query(
            r#"
            SELECT id, timestamp, session_id, type, decision, confidence, action_taken, content
            FROM prompts
            ORDER BY timestamp ASC, id ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(collect_rows("prompts", &rows, decision_from_row))
    }

    pub async fn try_list_audit_events(&self) -> Result<Vec<AuditEvent>, EvidenceError> {
        let Some(pool) = &self.pool else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query(
            r#"
            SELECT id, timestamp, session_id, risk_level, prompt_type, action_taken,
                   message, prev_hash, hash
            FROM audit_events
            ORDER BY timestamp ASC, id ASC
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(collect_rows("audit_events", &rows, audit_event_from_row))
    }
}

fn degrade<T>(table: &str, result: Result<Vec<T>, EvidenceError>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        warn!("Failed to read {}, continuing with none: {}", table, e);
        Vec::new()
    })
}

fn collect_rows<T>(
    table: &str,
    rows: &[SqliteRow],
    map: fn(&SqliteRow) -> Result<T, String>,
) -> Vec<T> {
    rows.iter()
        .filter_map(|row| match map(row) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("Skipping {} row: {}", table, e);
                None
            }
        })
        .collect()
}

fn text(row: &SqliteRow, column: &str) -> Result<String, String> {
    row.try_get::<Option<String>, _>(column)
        .map(Option::unwrap_or_default)
        .map_err(|e| format!("column {}: {}", column, e))
}

fn optional_text(row: &SqliteRow, column: &str) -> Result<Option<String>, String> {
    row.try_get::<Option<String>, _>(column)
        .map_err(|e| format!("column {}: {}", column, e))
}

/// Accepts RFC 3339 and SQLite's `YYYY-MM-DD HH:MM:SS[.fff]`
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
}

fn timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(&text(row, column)?)
}

fn session_from_row(row: &SqliteRow) -> Result<Session, String> {
    let started_at = match optional_text(row, "started_at")? {
        Some(raw) if !raw.is_empty() => Some(parse_timestamp(&raw)?),
        _ => None,
    };

    Ok(Session {
        id: text(row, "id")?,
        tool: text(row, "tool")?,
        status: text(row, "status")?,
        started_at,
    })
}

fn decision_from_row(row: &SqliteRow) -> Result<Decision, String> {
    let decision = text(row, "decision")?.parse::<DecisionKind>()?;
    let confidence = row
        .try_get::<Option<f64>, _>("confidence")
        .map_err(|e| format!("column confidence: {}", e))?
        .unwrap_or(0.0);

    Ok(Decision {
        id: text(row, "id")?,
        timestamp: timestamp(row, "timestamp")?,
        session_id: text(row, "session_id")?,
        prompt_type: text(row, "type")?,
        decision,
        confidence,
        action_taken: text(row, "action_taken")?,
        content: text(row, "content")?,
    })
}

fn audit_event_from_row(row: &SqliteRow) -> Result<AuditEvent, String> {
    Ok(AuditEvent {
        id: text(row, "id")?,
        timestamp: timestamp(row, "timestamp")?,
        session_id: text(row, "session_id")?,
        risk_level: text(row, "risk_level")?,
        prompt_type: text(row, "prompt_type")?,
        action_taken: text(row, "action_taken")?,
        message: text(row, "message")?,
        prev_hash: optional_text(row, "prev_hash")?,
        hash: optional_text(row, "hash")?,
    })
}
