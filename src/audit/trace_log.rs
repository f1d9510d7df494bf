//! Trace Log
//!
//! Reads the append-only JSONL trace file written by the governance
//! runtime. Undecodable lines are kept as positions in the log so chain
//! verification can report them instead of aborting the read.

use std::path::Path;
use tracing::{debug, warn};

use crate::audit::chain::{ChainEntry, ChainRecord};
use crate::database::models::TraceEntry;
use crate::error::EvidenceError;

/// A single non-blank line of the trace file
#[derive(Debug, Clone, PartialEq)]
pub enum TraceLine {
    Record(TraceEntry),
    Malformed { line: usize },
}

impl ChainEntry for TraceLine {
    fn chain_record(&self) -> ChainRecord<'_> {
        match self {
            TraceLine::Record(entry) => {
                ChainRecord::from_fields(&entry.id, entry.prev_hash.as_deref(), entry.hash.as_deref())
            }
            TraceLine::Malformed { line } => ChainRecord::Malformed { line: *line },
        }
    }
}

/// Parsed trace file in file order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TraceLog {
    pub lines: Vec<TraceLine>,
}

impl TraceLog {
    pub fn parse(contents: &str) -> Self {
        let mut lines = Vec::new();

        for (index, line) in contents.lines().enumerate() {
            let line_number = index + 1;
            if line.trim().is_empty() {
                continue;
            }

            let value = match serde_json::from_str::<serde_json::Value>(line) {
                Ok(value) => value,
                Err(e) => {
                    debug!("Undecodable trace line {}: {}", line_number, e);
                    lines.push(TraceLine::Malformed { line: line_number });
                    continue;
                }
            };

            match TraceEntry::from_json(&value) {
                Some(entry) => lines.push(TraceLine::Record(entry)),
                None => {
                    debug!("Trace line {} is not a JSON object", line_number);
                    lines.push(TraceLine::Malformed { line: line_number });
                }
            }
        }

        Self { lines }
    }

    /// Load a trace file; a missing or unreadable file is an empty log
    pub async fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path).await {
            Ok(log) => log,
            Err(e) => {
                warn!("Trace log {:?} unavailable, treating as empty: {}", path, e);
                Self::default()
            }
        }
    }

    pub async fn try_load(path: &Path) -> Result<Self, EvidenceError> {
        let contents = tokio::fs::read_to_string(path).await?;
        let log = Self::parse(&contents);
        debug!(
            "Loaded {} trace lines ({} malformed) from {:?}",
            log.lines.len(),
            log.malformed_count(),
            path
        );
        Ok(log)
    }

    pub fn from_entries(entries: Vec<TraceEntry>) -> Self {
        Self {
            lines: entries.into_iter().map(TraceLine::Record).collect(),
        }
    }

    /// Successfully decoded records, in file order
    pub fn entries(&self) -> impl Iterator<Item = &TraceEntry> {
        self.lines.iter().filter_map(|line| match line {
            TraceLine::Record(entry) => Some(entry),
            TraceLine::Malformed { .. } => None,
        })
    }

    pub fn malformed_count(&self) -> usize {
        self.lines
            .iter()
            .filter(|line| matches!(line, TraceLine::Malformed { .. }))
            .count()
    }
}
