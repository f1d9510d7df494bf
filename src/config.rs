use std::env;
use std::num::NonZeroUsize;

use crate::error::EvidenceError;

/// Version string mixed into policy snapshot fingerprints
pub const DEFAULT_POLICY_VERSION: &str = "v1.1.0";

pub const DEFAULT_BUNDLE_REGISTRY_CAPACITY: NonZeroUsize = match NonZeroUsize::new(100) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub trace_log_path: String,
    pub server_host: String,
    pub server_port: u16,
    pub policy_version: String,
    pub bundle_registry_capacity: NonZeroUsize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://governance.db".to_string(),
            trace_log_path: "traces.jsonl".to_string(),
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            policy_version: DEFAULT_POLICY_VERSION.to_string(),
            bundle_registry_capacity: DEFAULT_BUNDLE_REGISTRY_CAPACITY,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, EvidenceError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, EvidenceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_url = lookup("DATABASE_URL").unwrap_or(defaults.database_url);

        let trace_log_path = lookup("TRACE_LOG_PATH").unwrap_or(defaults.trace_log_path);

        let server_host = lookup("SERVER_HOST").unwrap_or(defaults.server_host);

        let server_port = match lookup("SERVER_PORT") {
            Some(raw) => raw.parse().map_err(|e| {
                EvidenceError::ConfigError(format!("Invalid SERVER_PORT '{}': {}", raw, e))
            })?,
            None => defaults.server_port,
        };

        let policy_version = lookup("POLICY_VERSION").unwrap_or(defaults.policy_version);
        if policy_version.trim().is_empty() {
            return Err(EvidenceError::ConfigError(
                "POLICY_VERSION cannot be empty".to_string(),
            ));
        }

        // zero is rejected here by the NonZeroUsize parse
        let bundle_registry_capacity = match lookup("BUNDLE_REGISTRY_CAPACITY") {
            Some(raw) => raw.parse::<NonZeroUsize>().map_err(|e| {
                EvidenceError::ConfigError(format!(
                    "Invalid BUNDLE_REGISTRY_CAPACITY '{}': {}",
                    raw, e
                ))
            })?,
            None => defaults.bundle_registry_capacity,
        };

        Ok(AppConfig {
            database_url,
            trace_log_path,
            server_host,
            server_port,
            policy_version,
            bundle_registry_capacity,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.database_url, "sqlite://governance.db");
        assert_eq!(config.policy_version, "v1.1.0");
        assert_eq!(config.bundle_registry_capacity.get(), 100);
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("SERVER_PORT", "8080"),
            ("POLICY_VERSION", "v2.0.0"),
            ("TRACE_LOG_PATH", "/var/log/traces.jsonl"),
        ]))
        .unwrap();
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.policy_version, "v2.0.0");
        assert_eq!(config.trace_log_path, "/var/log/traces.jsonl");
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(AppConfig::from_lookup(lookup_from(&[("SERVER_PORT", "http")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("POLICY_VERSION", " ")])).is_err());
        assert!(
            AppConfig::from_lookup(lookup_from(&[("BUNDLE_REGISTRY_CAPACITY", "0")])).is_err()
        );
    }
}
