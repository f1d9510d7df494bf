//! Governance Score
//!
//! Deterministic 0-100 summary of how a governance runtime behaved:
//! autonomy, escalation, policy coverage and high-risk blocking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::models::{DecisionKind, TraceEntry};
use crate::database::Snapshot;

pub const AUTONOMY_WEIGHT: f64 = 0.30;
pub const ESCALATION_WEIGHT: f64 = 0.25;
pub const COVERAGE_WEIGHT: f64 = 0.25;
pub const BLOCKING_WEIGHT: f64 = 0.20;

/// Points contributed by each blocked high-risk step, capped at 100
const POINTS_PER_BLOCK: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceScore {
    pub overall: f64,
    pub autonomous_rate: f64,
    pub escalation_rate: f64,
    pub blocked_high_risk: u64,
    pub policy_coverage: f64,
    pub session_count: u64,
    pub decision_count: u64,
    pub computed_at: DateTime<Utc>,
}

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        round1(100.0 * part as f64 / total as f64)
    }
}

/// True when `session_id` passes the optional exact-match filter
pub fn in_session(filter: Option<&str>, session_id: &str) -> bool {
    filter.map_or(true, |wanted| wanted == session_id)
}

/// Score a snapshot, optionally restricted to one session
///
/// An unknown session id yields an all-zero score rather than an error.
pub fn compute_score(snapshot: &Snapshot, session_filter: Option<&str>) -> GovernanceScore {
    let decisions: Vec<_> = snapshot
        .list_prompts()
        .iter()
        .filter(|d| in_session(session_filter, &d.session_id))
        .collect();
    let traces: Vec<&TraceEntry> = snapshot
        .list_traces()
        .filter(|t| in_session(session_filter, &t.session_id))
        .collect();
    let session_count = snapshot
        .list_sessions()
        .iter()
        .filter(|s| in_session(session_filter, &s.id))
        .count();

    let auto_count = decisions
        .iter()
        .filter(|d| d.decision == DecisionKind::Auto)
        .count();
    let escalated_count = decisions
        .iter()
        .filter(|d| d.decision == DecisionKind::Escalated)
        .count();
    let covered_count = traces.iter().filter(|t| t.matched_explicit_rule()).count();
    let blocked_high_risk = traces.iter().filter(|t| t.is_blocking()).count();

    let autonomous_rate = percentage(auto_count, decisions.len());
    let escalation_rate = percentage(escalated_count, decisions.len());
    let policy_coverage = percentage(covered_count, traces.len());

    let overall = overall_score(
        autonomous_rate,
        escalation_rate,
        policy_coverage,
        blocked_high_risk,
    );

    GovernanceScore {
        overall,
        autonomous_rate,
        escalation_rate,
        blocked_high_risk: blocked_high_risk as u64,
        policy_coverage,
        session_count: session_count as u64,
        decision_count: decisions.len() as u64,
        computed_at: Utc::now(),
    }
}

/// Weighted combination of the component rates, within [0, 100]
pub fn overall_score(
    autonomous_rate: f64,
    escalation_rate: f64,
    policy_coverage: f64,
    blocked_high_risk: usize,
) -> f64 {
    let blocking = (blocked_high_risk as f64 * POINTS_PER_BLOCK).min(100.0);
    let weighted = autonomous_rate * AUTONOMY_WEIGHT
        + (100.0 - escalation_rate) * ESCALATION_WEIGHT
        + policy_coverage * COVERAGE_WEIGHT
        + blocking * BLOCKING_WEIGHT;
    round1(weighted).clamp(0.0, 100.0)
}
