//! Evidence Export
//!
//! Builds evidence bundles from the operational snapshot and renders them
//! into hashed, downloadable artifacts.

pub mod archive;
pub mod bundle;
pub mod csv_export;
pub mod manifest;
pub mod packs;
pub mod registry;

pub use bundle::{EvidenceBuilder, EvidenceBundle};
pub use manifest::{Manifest, DISCLAIMER, README};
pub use registry::{BundleStore, BundleSummary, InMemoryBundleRegistry, SharedBundleStore};

use crate::error::EvidenceError;
use manifest::EvidenceFiles;

/// A bundle together with its rendered files and manifest
#[derive(Debug, Clone)]
pub struct EvidenceExport {
    pub bundle: EvidenceBundle,
    pub files: EvidenceFiles,
    pub manifest: Manifest,
}

impl EvidenceExport {
    pub fn render(bundle: EvidenceBundle) -> Result<Self, EvidenceError> {
        let csv = csv_export::render_csv(&bundle)?;
        let files = EvidenceFiles::render(&bundle, csv)?;
        let manifest = manifest::build_manifest(&bundle, &files);
        Ok(Self {
            bundle,
            files,
            manifest,
        })
    }

    pub fn archive(&self) -> Result<Vec<u8>, EvidenceError> {
        archive::build_archive(&self.files, &self.manifest)
    }
}
