//! Evidence Manifest
//!
//! Content-addressed description of the files making up an evidence
//! export. Each file is hashed over its exact serialized bytes, so the JSON
//! formatting (two-space pretty printing) is part of the hash contract.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::EvidenceError;
use crate::evidence::bundle::EvidenceBundle;

pub const MANIFEST_VERSION: &str = "1.0";

pub const EVIDENCE_FILE: &str = "evidence.json";
pub const CSV_FILE: &str = "decisions.csv";
pub const INTEGRITY_FILE: &str = "integrity_report.json";
pub const README_FILE: &str = "README.txt";
pub const MANIFEST_FILE: &str = "manifest.json";

pub const DISCLAIMER: &str = "This bundle is evidence of recorded agent governance activity. \
It does not certify compliance with any regulation, standard or framework.";

pub const README: &str = "\
GOVERNANCE EVIDENCE BUNDLE
==========================

This archive contains evidence exported from an agent governance runtime:

  evidence.json          full evidence bundle (decisions, escalations,
                         integrity report, replay references, policy
                         snapshot and governance score)
  decisions.csv          decisions and escalations as a flat table
  integrity_report.json  hash-chain and component integrity report
  manifest.json          SHA-256 hash and size of every file above

Sensitive values such as tokens, keys and passwords were replaced with
[REDACTED] before export.

VERIFYING
---------
Recompute the SHA-256 of each file and compare it with manifest.json.
The bundle itself is not signed; the manifest only detects changes made
after export.

DISCLAIMER
----------
This bundle is evidence of what the governance runtime recorded.
The exporter does not certify compliance with any regulation, standard or
framework, and this bundle is not an audit opinion. Assessing compliance
remains the responsibility of the organisation and its auditors.
";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestFile {
    pub filename: String,
    pub sha256: String,
    pub size_bytes: u64,
}

impl ManifestFile {
    pub fn describe(filename: &str, contents: &[u8]) -> Self {
        Self {
            filename: filename.to_string(),
            sha256: sha256_hex(contents),
            size_bytes: contents.len() as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: String,
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub files: Vec<ManifestFile>,
    pub disclaimer: String,
}

impl Manifest {
    pub fn file(&self, filename: &str) -> Option<&ManifestFile> {
        self.files.iter().find(|f| f.filename == filename)
    }
}

/// Serialized export files, byte-for-byte as hashed in the manifest
#[derive(Debug, Clone)]
pub struct EvidenceFiles {
    pub evidence_json: String,
    pub csv: String,
    pub integrity_json: String,
    pub readme: &'static str,
}

impl EvidenceFiles {
    pub fn render(bundle: &EvidenceBundle, csv: String) -> Result<Self, EvidenceError> {
        Ok(Self {
            evidence_json: serde_json::to_string_pretty(bundle)?,
            csv,
            integrity_json: serde_json::to_string_pretty(&bundle.integrity_report)?,
            readme: README,
        })
    }

    /// `(filename, contents)` in manifest order
    pub fn entries(&self) -> [(&'static str, &[u8]); 4] {
        [
            (EVIDENCE_FILE, self.evidence_json.as_bytes()),
            (CSV_FILE, self.csv.as_bytes()),
            (INTEGRITY_FILE, self.integrity_json.as_bytes()),
            (README_FILE, self.readme.as_bytes()),
        ]
    }
}

pub fn sha256_hex(contents: &[u8]) -> String {
    hex::encode(Sha256::digest(contents))
}

pub fn build_manifest(bundle: &EvidenceBundle, files: &EvidenceFiles) -> Manifest {
    let files: Vec<ManifestFile> = files
        .entries()
        .iter()
        .map(|(name, contents)| ManifestFile::describe(name, contents))
        .collect();

    debug!("Manifest built for {} files", files.len());

    Manifest {
        version: MANIFEST_VERSION.to_string(),
        generated_at: bundle.generated_at,
        session_id: bundle.session_id.clone(),
        files,
        disclaimer: DISCLAIMER.to_string(),
    }
}

/// Recompute hashes and return the names of files that do not match
pub fn verify_manifest(manifest: &Manifest, files: &[(&str, &[u8])]) -> Vec<String> {
    manifest
        .files
        .iter()
        .filter(|expected| {
            match files.iter().find(|(name, _)| *name == expected.filename) {
                Some((_, contents)) => {
                    ManifestFile::describe(&expected.filename, contents) != **expected
                }
                None => true,
            }
        })
        .map(|f| f.filename.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Snapshot;
    use crate::evidence::bundle::EvidenceBuilder;
    use crate::evidence::csv_export::render_csv;
    use crate::redaction::Redactor;

    fn rendered() -> (EvidenceBundle, EvidenceFiles) {
        let builder = EvidenceBuilder::new(Redactor::new().unwrap(), "v1.1.0");
        let bundle = builder.build(&Snapshot::default(), Some("s1"));
        let csv = render_csv(&bundle).unwrap();
        let files = EvidenceFiles::render(&bundle, csv).unwrap();
        (bundle, files)
    }

    fn is_lower_hex_64(hash: &str) -> bool {
        hash.len() == 64 && hash.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
    }

    #[test]
    fn test_manifest_lists_export_files() {
        let (bundle, files) = rendered();
        let manifest = build_manifest(&bundle, &files);

        let names: Vec<&str> = manifest.files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(
            names,
            vec!["evidence.json", "decisions.csv", "integrity_report.json", "README.txt"]
        );
        assert_eq!(manifest.version, "1.0");
        assert_eq!(manifest.session_id.as_deref(), Some("s1"));
        assert_eq!(manifest.generated_at, bundle.generated_at);

        for file in &manifest.files {
            assert!(is_lower_hex_64(&file.sha256), "{}", file.sha256);
        }
        assert_eq!(
            manifest.file(README_FILE).unwrap().size_bytes,
            README.len() as u64
        );
    }

    #[test]
    fn test_hash_is_stable_for_same_bundle() {
        let (bundle, files) = rendered();
        let again = EvidenceFiles::render(&bundle, files.csv.clone()).unwrap();
        assert_eq!(
            build_manifest(&bundle, &files).files,
            build_manifest(&bundle, &again).files
        );
    }

    #[test]
    fn test_json_uses_two_space_indent() {
        let (_, files) = rendered();
        assert!(files.evidence_json.starts_with("{\n  \"generatedAt\""));
        for line in files.evidence_json.lines() {
            let indent = line.len() - line.trim_start_matches(' ').len();
            assert_eq!(indent % 2, 0, "line: {:?}", line);
            assert!(!line.starts_with('\t'));
        }
    }

    #[test]
    fn test_disclaimer_wording() {
        for text in [DISCLAIMER, README] {
            assert!(text.contains("does not certify"));
            assert!(!text.contains("is certified"));
            assert!(!text.contains("guarantees compliance"));
        }
    }

    #[test]
    fn test_verify_manifest_detects_changes() {
        let (bundle, files) = rendered();
        let manifest = build_manifest(&bundle, &files);

        assert!(verify_manifest(&manifest, &files.entries()).is_empty());

        let mut tampered = files.entries();
        tampered[1] = (CSV_FILE, b"record_type\n".as_slice());
        assert_eq!(verify_manifest(&manifest, &tampered), vec![CSV_FILE.to_string()]);

        let all = files.entries();
        let missing = &all[..2];
        assert_eq!(
            verify_manifest(&manifest, missing),
            vec![INTEGRITY_FILE.to_string(), README_FILE.to_string()]
        );
    }
}
