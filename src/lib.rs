pub mod api;
pub mod audit;
pub mod config;
pub mod database;
pub mod error;
pub mod evidence;
pub mod integrity;
pub mod redaction;
pub mod scoring;

pub use error::EvidenceError;
