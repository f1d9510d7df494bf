//! Policy Pack Catalog
//!
//! Static list of named policy packs, embedded at build time as YAML.

use serde::{Deserialize, Serialize};

use crate::error::EvidenceError;

const CATALOG_YAML: &str = include_str!("packs.yml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyAction {
    Enforce,
    RequireHuman,
    Advisory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackPolicy {
    pub name: String,
    pub action: PolicyAction,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyPack {
    pub id: String,
    pub name: String,
    pub category: String,
    pub description: String,
    pub disclaimer: String,
    pub policies: Vec<PackPolicy>,
}

pub fn load_policy_packs() -> Result<Vec<PolicyPack>, EvidenceError> {
    let packs: Vec<PolicyPack> = serde_yaml::from_str(CATALOG_YAML)?;
    validate(&packs)?;
    Ok(packs)
}

fn validate(packs: &[PolicyPack]) -> Result<(), EvidenceError> {
    let mut seen = std::collections::HashSet::new();
    for pack in packs {
        if !seen.insert(pack.id.as_str()) {
            return Err(EvidenceError::CatalogError(format!(
                "Duplicate policy pack id: {}",
                pack.id
            )));
        }
        if pack.policies.is_empty() {
            return Err(EvidenceError::CatalogError(format!(
                "Policy pack {} defines no policies",
                pack.id
            )));
        }
        if !pack.disclaimer.contains("does not certify") {
            return Err(EvidenceError::CatalogError(format!(
                "Policy pack {} is missing its disclaimer",
                pack.id
            )));
        }
    }
    Ok(())
}
