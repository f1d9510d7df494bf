#![allow(dead_code)]

use governance_evidence::api::AppState;
use governance_evidence::config::AppConfig;
use governance_evidence::database::OperationalStore;
use governance_evidence::evidence::{EvidenceBuilder, InMemoryBundleRegistry};
use governance_evidence::redaction::Redactor;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

const SCHEMA: &str = r#"
CREATE TABLE sessions (
    id TEXT PRIMARY KEY,
    tool TEXT NOT NULL,
    status TEXT NOT NULL,
    started_at TEXT
);
CREATE TABLE prompts (
    id TEXT PRIMARY KEY,
    timestamp TEXT NOT NULL,
    session_id TEXT NOT NULL,
    type TEXT NOT NULL,
    decision TEXT NOT NULL,
    confidence REAL,
    action_taken TEXT,
    content TEXT
);
CREATE TABLE audit_events (
    id TEXT PRIMARY KEY,
    timestamp TEXT NOT NULL,
    session_id TEXT NOT NULL,
    risk_level TEXT,
    prompt_type TEXT,
    action_taken TEXT,
    message TEXT,
    prev_hash TEXT,
    hash TEXT
);
"#;

/// A throwaway operational store: SQLite file plus trace log in a temp dir
pub struct Fixture {
    pub dir: TempDir,
    pub database_url: String,
    pub trace_log_path: PathBuf,
    pool: SqlitePool,
}

/// Setup an on-disk SQLite database with the operational schema
pub async fn setup_fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("governance.db");
    let trace_log_path = dir.path().join("traces.jsonl");

    let options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to create test database");

    sqlx::raw_sql(SCHEMA)
        .execute(&pool)
        .await
        .expect("Failed to create schema");

    Fixture {
        database_url: format!("sqlite://{}", db_path.display()),
        trace_log_path,
        dir,
        pool,
    }
}

impl Fixture {
    pub async fn insert_session(&self, id: &str, tool: &str, status: &str) {
        sqlx::query("INSERT INTO sessions (id, tool, status, started_at) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(tool)
            .bind(status)
            .bind("2026-03-01 09:00:00")
            .execute(&self.pool)
            .await
            .expect("Failed to insert session");
    }

    pub async fn insert_prompt(
        &self,
        id: &str,
        timestamp: &str,
        session_id: &str,
        decision: &str,
        content: &str,
    ) {
        sqlx::query(
            "INSERT INTO prompts (id, timestamp, session_id, type, decision, confidence, action_taken, content) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(timestamp)
        .bind(session_id)
        .bind("permission")
        .bind(decision)
        .bind(0.9_f64)
        .bind("allow")
        .bind(content)
        .execute(&self.pool)
        .await
        .expect("Failed to insert prompt");
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_audit_event(
        &self,
        id: &str,
        timestamp: &str,
        session_id: &str,
        action_taken: &str,
        message: &str,
        prev_hash: Option<&str>,
        hash: Option<&str>,
    ) {
        sqlx::query(
            "INSERT INTO audit_events (id, timestamp, session_id, risk_level, prompt_type, action_taken, message, prev_hash, hash) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(timestamp)
        .bind(session_id)
        .bind("high")
        .bind("shell")
        .bind(action_taken)
        .bind(message)
        .bind(prev_hash)
        .bind(hash)
        .execute(&self.pool)
        .await
        .expect("Failed to insert audit event");
    }

    pub fn write_traces(&self, lines: &[String]) {
        std::fs::write(&self.trace_log_path, lines.join("\n")).expect("Failed to write trace log");
    }

    /// Read-only store over the fixture, as the server opens it
    pub async fn store(&self) -> OperationalStore {
        OperationalStore::connect(&self.database_url, &self.trace_log_path).await
    }

    pub async fn state(&self) -> AppState {
        test_state(self.store().await)
    }
}

/// One JSONL trace record
pub fn trace_line(
    id: &str,
    session_id: &str,
    step: u64,
    rule: &str,
    action: &str,
    prev_hash: &str,
    hash: &str,
) -> String {
    serde_json::json!({
        "id": id,
        "timestamp": "2026-03-01T10:00:00Z",
        "sessionId": session_id,
        "stepIndex": step,
        "ruleMatched": rule,
        "action": action,
        "prevHash": prev_hash,
        "hash": hash,
    })
    .to_string()
}

pub fn test_state(store: OperationalStore) -> AppState {
    let config = AppConfig::default();
    let redactor = Redactor::new().expect("Failed to compile redaction rules");
    let builder = EvidenceBuilder::new(redactor, config.policy_version.clone());
    let bundles = Arc::new(InMemoryBundleRegistry::new(config.bundle_registry_capacity));
    AppState::new(config, store, builder, bundles)
}
