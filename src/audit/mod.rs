//! Audit Trail Verification
//!
//! Tamper-evidence checks for the governance runtime's hash-chained logs:
//! the structured audit event table and the append-only trace file.

pub mod chain;
pub mod trace_log;

pub use chain::{verify_chain, verify_entries, ChainEntry, ChainRecord, ChainVerification};
pub use trace_log::{TraceLine, TraceLog};
