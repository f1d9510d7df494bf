//! Hash Chain Verification
//!
//! One verification pass shared by every prev-hash-linked log. Sources
//! expose their entries as [`ChainRecord`]s through [`ChainEntry`], so the
//! structured audit table and the JSONL trace file replay identically.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::database::models::AuditEvent;

/// Chain view of a single log position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainRecord<'a> {
    /// Entry carrying at least one link field
    Linked {
        id: &'a str,
        prev_hash: &'a str,
        hash: &'a str,
    },
    /// Legacy entry with no link fields at all; restarts the chain
    Unlinked,
    /// Source line that could not be decoded; restarts the chain
    Malformed { line: usize },
}

/// Anything that can be replayed as part of a hash chain
pub trait ChainEntry {
    fn chain_record(&self) -> ChainRecord<'_>;
}

impl<'a> ChainRecord<'a> {
    /// Chain view of an entry's optional link fields
    ///
    /// Only an entry with neither field is unlinked. A single missing field
    /// reads as `""`, so a genesis row with no `prev_hash` still anchors the
    /// chain on its own hash.
    pub fn from_fields(id: &'a str, prev_hash: Option<&'a str>, hash: Option<&'a str>) -> Self {
        match (prev_hash, hash) {
            (None, None) => ChainRecord::Unlinked,
            (prev_hash, hash) => ChainRecord::Linked {
                id,
                prev_hash: prev_hash.unwrap_or_default(),
                hash: hash.unwrap_or_default(),
            },
        }
    }
}

impl ChainEntry for AuditEvent {
    fn chain_record(&self) -> ChainRecord<'_> {
        ChainRecord::from_fields(&self.id, self.prev_hash.as_deref(), self.hash.as_deref())
    }
}

/// Outcome of replaying a chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainVerification {
    pub valid: bool,
    pub errors: Vec<String>,
    pub last_hash: String,
    pub count: usize,
    /// Per input position: true when the entry linked to its predecessor
    #[serde(skip)]
    pub verified: Vec<bool>,
}

impl ChainVerification {
    pub fn violation_count(&self) -> usize {
        self.errors.len()
    }

    pub fn summary(&self) -> String {
        if self.valid {
            format!("Hash chain is intact ({} entries)", self.count)
        } else {
            format!(
                "Hash chain has {} violation(s) across {} entries",
                self.errors.len(),
                self.count
            )
        }
    }
}

/// Replay a chain in order, recording every broken link
///
/// Verification never stops at the first violation: after a mismatch the
/// chain continues from the offending entry's own hash, so the report shows
/// every break. An empty chain is valid.
pub fn verify_chain<'a, I>(records: I) -> ChainVerification
where
    I: IntoIterator<Item = ChainRecord<'a>>,
{
    let mut expected = String::new();
    let mut errors = Vec::new();
    let mut verified = Vec::new();
    let mut count = 0;

    for (index, record) in records.into_iter().enumerate() {
        match record {
            ChainRecord::Linked { id, prev_hash, hash } => {
                count += 1;
                let linked = prev_hash == expected;
                if !linked {
                    errors.push(format!(
                        "entry {} ({}): prev_hash mismatch (expected '{}', found '{}')",
                        index + 1,
                        id,
                        expected,
                        prev_hash
                    ));
                }
                verified.push(linked);
                expected = hash.to_string();
            }
            ChainRecord::Unlinked => {
                count += 1;
                verified.push(false);
                expected.clear();
            }
            ChainRecord::Malformed { line } => {
                errors.push(format!("invalid JSON at line {}", line));
                verified.push(false);
                expected.clear();
            }
        }
    }

    if errors.is_empty() {
        debug!("Hash chain verified: {} entries", count);
    } else {
        warn!(
            "Hash chain verification found {} violation(s) in {} entries",
            errors.len(),
            count
        );
    }

    ChainVerification {
        valid: errors.is_empty(),
        errors,
        last_hash: expected,
        count,
        verified,
    }
}

/// Verify a slice of chain entries already in log order
pub fn verify_entries<T: ChainEntry>(entries: &[T]) -> ChainVerification {
    verify_chain(entries.iter().map(ChainEntry::chain_record))
}
