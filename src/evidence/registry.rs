//! Bundle Registry
//!
//! Records summaries of exported bundles for later listing. The store is
//! injected into the HTTP state; the in-memory implementation is a bounded
//! ring buffer and does not survive a restart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

use crate::evidence::bundle::EvidenceBundle;
use crate::evidence::manifest::{Manifest, EVIDENCE_FILE};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleSummary {
    pub bundle_id: Uuid,
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub decision_count: u64,
    pub escalation_count: u64,
    pub overall_score: f64,
    pub evidence_sha256: String,
}

impl BundleSummary {
    pub fn new(bundle_id: Uuid, bundle: &EvidenceBundle, manifest: &Manifest) -> Self {
        Self {
            bundle_id,
            generated_at: bundle.generated_at,
            session_id: bundle.session_id.clone(),
            decision_count: bundle.decisions.len() as u64,
            escalation_count: bundle.escalations.len() as u64,
            overall_score: bundle.governance_score.overall,
            evidence_sha256: manifest
                .file(EVIDENCE_FILE)
                .map(|f| f.sha256.clone())
                .unwrap_or_default(),
        }
    }
}

/// Storage for exported bundle summaries
pub trait BundleStore: Send + Sync {
    fn record(&self, summary: BundleSummary);

    /// Retained summaries, oldest first
    fn list(&self) -> Vec<BundleSummary>;
}

pub type SharedBundleStore = Arc<dyn BundleStore>;

/// Ring buffer holding the most recent `capacity` summaries
pub struct InMemoryBundleRegistry {
    capacity: usize,
    entries: Mutex<VecDeque<BundleSummary>>,
}

impl InMemoryBundleRegistry {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            capacity: capacity.get(),
            entries: Mutex::new(VecDeque::with_capacity(capacity.get())),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, VecDeque<BundleSummary>> {
        // summaries are plain data, a poisoned lock still holds a usable list
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl BundleStore for InMemoryBundleRegistry {
    fn record(&self, summary: BundleSummary) {
        let mut entries = self.entries();
        while entries.len() >= self.capacity {
            if let Some(evicted) = entries.pop_front() {
                debug!("Evicting bundle {} from registry", evicted.bundle_id);
            }
        }
        debug!("Registered bundle {}", summary.bundle_id);
        entries.push_back(summary);
    }

    fn list(&self) -> Vec<BundleSummary> {
        self.entries().iter().cloned().collect()
    }
}
