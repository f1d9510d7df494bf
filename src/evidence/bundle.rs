//! Evidence Bundle Assembly
//!
//! Combines redacted decision and escalation records, the integrity
//! report, replay references, the policy snapshot and the governance score
//! into one exportable bundle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};
use tracing::info;

use crate::audit::chain::verify_entries;
use crate::database::models::{DecisionKind, DEFAULT_RULE};
use crate::database::Snapshot;
use crate::integrity::{compute_integrity, sorted_audit_events, IntegrityData, IntegrityStatus};
use crate::redaction::Redactor;
use crate::scoring::{compute_score, in_session, GovernanceScore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleDecision {
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

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Escalation {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
    pub risk_level: String,
    pub prompt_type: String,
    pub action_taken: String,
    pub message: String,
    pub hash_verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    #[serde(flatten)]
    pub integrity: IntegrityData,
    pub hash_chain_valid: bool,
    pub trace_hash_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReference {
    pub session_id: String,
    pub trace_count: u64,
    pub tool: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySnapshotEntry {
    pub name: String,
    pub hash: String,
}

/// Exportable record of what the governance runtime did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceBundle {
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub decisions: Vec<BundleDecision>,
    pub escalations: Vec<Escalation>,
    pub integrity_report: IntegrityReport,
    pub replay_references: Vec<ReplayReference>,
    pub policy_snapshot: Vec<PolicySnapshotEntry>,
    pub governance_score: GovernanceScore,
}

pub struct EvidenceBuilder {
    redactor: Redactor,
    policy_version: String,
}

impl EvidenceBuilder {
    pub fn new(redactor: Redactor, policy_version: impl Into<String>) -> Self {
        Self {
            redactor,
            policy_version: policy_version.into(),
        }
    }

    pub fn redactor(&self) -> &Redactor {
        &self.redactor
    }

    pub fn policy_version(&self) -> &str {
        &self.policy_version
    }

    /// Assemble a bundle, optionally scoped to one session
    ///
    /// The session filter applies to decisions, escalations and the score.
    /// The integrity report, trace hash summary, replay references and
    /// policy snapshot always describe the whole store.
    pub fn build(&self, snapshot: &Snapshot, session_id: Option<&str>) -> EvidenceBundle {
        let decisions: Vec<BundleDecision> = snapshot
            .list_prompts()
            .iter()
            .filter(|d| in_session(session_id, &d.session_id))
            .map(|d| BundleDecision {
                id: d.id.clone(),
                timestamp: d.timestamp,
                session_id: d.session_id.clone(),
                prompt_type: d.prompt_type.clone(),
                decision: d.decision,
                confidence: d.confidence,
                action_taken: d.action_taken.clone(),
                content: self.redactor.redact(&d.content),
            })
            .collect();

        let escalations = self.escalations(snapshot, session_id);

        let integrity = compute_integrity(snapshot);
        let integrity_report = IntegrityReport {
            hash_chain_valid: integrity.overall_status == IntegrityStatus::Verified,
            trace_hash_summary: trace_hash_summary(snapshot),
            integrity,
        };

        let bundle = EvidenceBundle {
            generated_at: Utc::now(),
            session_id: session_id.map(str::to_string),
            decisions,
            escalations,
            integrity_report,
            replay_references: replay_references(snapshot),
            policy_snapshot: policy_snapshot(snapshot, &self.policy_version),
            governance_score: compute_score(snapshot, session_id),
        };

        info!(
            "Built evidence bundle: {} decisions, {} escalations, session {}",
            bundle.decisions.len(),
            bundle.escalations.len(),
            session_id.unwrap_or("<all>")
        );
        bundle
    }

    fn escalations(&self, snapshot: &Snapshot, session_id: Option<&str>) -> Vec<Escalation> {
        let events = sorted_audit_events(snapshot);
        let verification = verify_entries(&events);
        let linked: HashMap<&str, bool> = events
            .iter()
            .zip(verification.verified.iter())
            .map(|(event, verified)| (event.id.as_str(), *verified))
            .collect();

        snapshot
            .list_audit_events()
            .iter()
            .filter(|e| e.is_escalation() && in_session(session_id, &e.session_id))
            .map(|e| Escalation {
                id: e.id.clone(),
                timestamp: e.timestamp,
                session_id: e.session_id.clone(),
                risk_level: e.risk_level.clone(),
                prompt_type: e.prompt_type.clone(),
                action_taken: e.action_taken.clone(),
                message: self.redactor.redact(&e.message),
                hash_verified: linked.get(e.id.as_str()).copied().unwrap_or(false),
            })
            .collect()
    }
}

/// SHA-256 over every trace hash in file order, regardless of session
pub fn trace_hash_summary(snapshot: &Snapshot) -> String {
    let mut hasher = Sha256::new();
    for hash in snapshot.list_traces().filter_map(|t| t.hash.as_deref()) {
        hasher.update(hash.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// One reference per known session with its trace count
pub fn replay_references(snapshot: &Snapshot) -> Vec<ReplayReference> {
    let mut trace_counts: HashMap<&str, u64> = HashMap::new();
    for trace in snapshot.list_traces() {
        *trace_counts.entry(trace.session_id.as_str()).or_default() += 1;
    }

    snapshot
        .list_sessions()
        .iter()
        .map(|session| ReplayReference {
            session_id: session.id.clone(),
            trace_count: trace_counts.get(session.id.as_str()).copied().unwrap_or(0),
            tool: session.tool.clone(),
            status: session.status.clone(),
        })
        .collect()
}

/// Fingerprint of a policy rule at a given policy version
pub fn policy_fingerprint(rule_id: &str, policy_version: &str) -> String {
    hex::encode(Sha256::digest(format!("{}:{}", rule_id, policy_version).as_bytes()))
}

/// Distinct matched rules, sorted; never empty
pub fn policy_snapshot(snapshot: &Snapshot, policy_version: &str) -> Vec<PolicySnapshotEntry> {
    let rules: BTreeSet<&str> = snapshot
        .list_traces()
        .filter(|t| t.matched_explicit_rule())
        .map(|t| t.rule_matched.as_str())
        .collect();

    if rules.is_empty() {
        return vec![PolicySnapshotEntry {
            name: DEFAULT_RULE.to_string(),
            hash: policy_fingerprint(DEFAULT_RULE, policy_version),
        }];
    }

    rules
        .into_iter()
        .map(|rule| PolicySnapshotEntry {
            name: rule.to_string(),
            hash: policy_fingerprint(rule, policy_version),
        })
        .collect()
}
