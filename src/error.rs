use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum EvidenceError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Archive error: {0}")]
    ArchiveError(String),

    #[error("Policy catalog error: {0}")]
    CatalogError(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

impl From<serde_json::Error> for EvidenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl From<csv::Error> for EvidenceError {
    fn from(err: csv::Error) -> Self {
        Self::SerializationError(format!("CSV write error: {}", err))
    }
}

impl From<serde_yaml::Error> for EvidenceError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::CatalogError(format!("Failed to parse policy packs: {}", err))
    }
}

impl From<sqlx::Error> for EvidenceError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseError(format!("Database error: {}", err))
    }
}

impl From<zip::result::ZipError> for EvidenceError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::ArchiveError(err.to_string())
    }
}

impl From<std::io::Error> for EvidenceError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError(err.to_string())
    }
}

impl EvidenceError {
    /// Message safe to return to HTTP clients
    pub fn external_message(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "Service misconfigured",
            Self::DatabaseError(_) => "Operational store unavailable",
            Self::SerializationError(_) => "Failed to render evidence",
            Self::ArchiveError(_) => "Failed to package evidence archive",
            Self::CatalogError(_) => "Policy pack catalog unavailable",
            Self::IoError(_) => "I/O failure",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseError(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EvidenceError {
    fn into_response(self) -> axum::response::Response {
        // Full details go to the log, clients get the short form
        error!("Request failed: {}", self);

        let payload = serde_json::json!({
            "error": self.external_message()
        });

        (self.status_code(), Json(payload)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_maps_to_serialization() {
        let err: EvidenceError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, EvidenceError::SerializationError(_)));
        assert!(err.to_string().starts_with("Serialization error"));
    }

    #[test]
    fn test_status_codes() {
        let db = EvidenceError::DatabaseError("down".to_string());
        assert_eq!(db.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let archive = EvidenceError::ArchiveError("bad".to_string());
        assert_eq!(archive.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(archive.external_message(), "Failed to package evidence archive");
    }
}
