//! Flat CSV view of an evidence bundle: one row per decision followed by
//! one row per escalation.

use crate::error::EvidenceError;
use crate::evidence::bundle::EvidenceBundle;

pub const CSV_HEADER: [&str; 9] = [
    "record_type",
    "id",
    "timestamp",
    "session_id",
    "decision",
    "confidence",
    "risk_level",
    "action_taken",
    "detail",
];

pub fn render_csv(bundle: &EvidenceBundle) -> Result<String, EvidenceError> {
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(vec![]);

    wtr.write_record(CSV_HEADER)?;

    for decision in &bundle.decisions {
        let timestamp = decision.timestamp.to_rfc3339();
        let confidence = decision.confidence.to_string();
        wtr.write_record([
            "decision",
            decision.id.as_str(),
            timestamp.as_str(),
            decision.session_id.as_str(),
            decision.decision.as_str(),
            confidence.as_str(),
            "",
            decision.action_taken.as_str(),
            decision.content.as_str(),
        ])?;
    }

    for escalation in &bundle.escalations {
        let timestamp = escalation.timestamp.to_rfc3339();
        wtr.write_record([
            "escalation",
            escalation.id.as_str(),
            timestamp.as_str(),
            escalation.session_id.as_str(),
            "",
            "",
            escalation.risk_level.as_str(),
            escalation.action_taken.as_str(),
            escalation.message.as_str(),
        ])?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| EvidenceError::SerializationError(format!("CSV finalize error: {}", e)))?;

    String::from_utf8(bytes)
        .map_err(|e| EvidenceError::SerializationError(format!("CSV is not UTF-8: {}", e)))
}
