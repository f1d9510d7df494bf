use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::parse_timestamp;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub tool: String,
    pub status: String,
    pub started_at: Option<DateTime<Utc>>,
}

/// How a prompt was resolved by the governance runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionKind {
    Auto,
    Human,
    Escalated,
}

impl DecisionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionKind::Auto => "auto",
            DecisionKind::Human => "human",
            DecisionKind::Escalated => "escalated",
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DecisionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(DecisionKind::Auto),
            "human" => Ok(DecisionKind::Human),
            "escalated" => Ok(DecisionKind::Escalated),
            other => Err(format!("unknown decision kind: {}", other)),
        }
    }
}

/// Prompt-resolution record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    #[serde(rename = "type")]
    pub prompt_type: String,
    pub decision: DecisionKind,
    pub confidence: f64,
    pub action_taken: String,
    pub content: String,
}

/// Structured audit event written by the governance runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub risk_level: String,
    pub prompt_type: String,
    pub action_taken: String,
    pub message: String,
    pub prev_hash: Option<String>,
    pub hash: Option<String>,
}

impl AuditEvent {
    /// Actions that put an event on the escalation list
    pub const ESCALATION_ACTIONS: [&'static str; 3] = ["escalated", "denied", "prompt_escalated"];

    pub fn is_escalation(&self) -> bool {
        Self::ESCALATION_ACTIONS.contains(&self.action_taken.as_str())
    }
}

/// One record of the append-only trace file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub step_index: u64,
    #[serde(default = "default_rule")]
    pub rule_matched: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub prev_hash: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
}

/// Rule id recorded when no explicit policy rule matched
pub const DEFAULT_RULE: &str = "default";

fn default_rule() -> String {
    DEFAULT_RULE.to_string()
}

impl TraceEntry {
    /// Actions counted as blocking a high-risk step
    pub const BLOCKING_ACTIONS: [&'static str; 3] = ["blocked", "escalated", "require_human"];

    pub fn matched_explicit_rule(&self) -> bool {
        self.rule_matched != DEFAULT_RULE
    }

    pub fn is_blocking(&self) -> bool {
        Self::BLOCKING_ACTIONS.contains(&self.action.as_str())
    }

    /// Decode a trace line that is already known to be JSON
    ///
    /// Field types are not trusted: a missing or mistyped field falls back to
    /// its default instead of rejecting the line. Timestamps may be RFC 3339,
    /// SQLite `YYYY-MM-DD HH:MM:SS` or epoch milliseconds. Returns `None` only
    /// when the value is not a JSON object.
    pub fn from_json(value: &Value) -> Option<Self> {
        let fields = value.as_object()?;

        Some(Self {
            id: fields.get("id").and_then(lenient_string).unwrap_or_default(),
            timestamp: fields.get("timestamp").and_then(lenient_timestamp),
            session_id: fields
                .get("sessionId")
                .and_then(lenient_string)
                .unwrap_or_default(),
            step_index: fields
                .get("stepIndex")
                .and_then(Value::as_u64)
                .unwrap_or_default(),
            rule_matched: fields
                .get("ruleMatched")
                .and_then(lenient_string)
                .filter(|rule| !rule.is_empty())
                .unwrap_or_else(default_rule),
            action: fields
                .get("action")
                .and_then(lenient_string)
                .unwrap_or_default(),
            prev_hash: fields.get("prevHash").and_then(lenient_string),
            hash: fields.get("hash").and_then(lenient_string),
        })
    }
}

fn lenient_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lenient_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => parse_timestamp(raw).ok(),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}
