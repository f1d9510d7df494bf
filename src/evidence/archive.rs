//! ZIP packaging of an evidence export

use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::EvidenceError;
use crate::evidence::manifest::{
    EvidenceFiles, Manifest, CSV_FILE, EVIDENCE_FILE, INTEGRITY_FILE, MANIFEST_FILE, README_FILE,
};

/// Build an in-memory archive of the export files plus the manifest
pub fn build_archive(files: &EvidenceFiles, manifest: &Manifest) -> Result<Vec<u8>, EvidenceError> {
    let manifest_json = serde_json::to_string_pretty(manifest)?;

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let entries: [(&str, &[u8]); 5] = [
        (EVIDENCE_FILE, files.evidence_json.as_bytes()),
        (CSV_FILE, files.csv.as_bytes()),
        (INTEGRITY_FILE, files.integrity_json.as_bytes()),
        (MANIFEST_FILE, manifest_json.as_bytes()),
        (README_FILE, files.readme.as_bytes()),
    ];

    for (name, contents) in entries {
        zip.start_file(name, options)?;
        zip.write_all(contents)?;
    }

    let bytes = zip.finish()?.into_inner();
    debug!("Evidence archive built: {} bytes", bytes.len());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Snapshot;
    use crate::evidence::bundle::EvidenceBuilder;
    use crate::evidence::csv_export::render_csv;
    use crate::evidence::manifest::{build_manifest, sha256_hex};
    use crate::redaction::Redactor;
    use std::io::Read;

    #[test]
    fn test_archive_contains_all_files() {
        let builder = EvidenceBuilder::new(Redactor::new().unwrap(), "v1.1.0");
        let bundle = builder.build(&Snapshot::default(), None);
        let files = EvidenceFiles::render(&bundle, render_csv(&bundle).unwrap()).unwrap();
        let manifest = build_manifest(&bundle, &files);

        let bytes = build_archive(&files, &manifest).unwrap();
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 5);

        for name in [EVIDENCE_FILE, CSV_FILE, INTEGRITY_FILE, MANIFEST_FILE, README_FILE] {
            assert!(archive.by_name(name).is_ok(), "missing {}", name);
        }

        // archived bytes hash to the manifest values
        let mut evidence = String::new();
        archive
            .by_name(EVIDENCE_FILE)
            .unwrap()
            .read_to_string(&mut evidence)
            .unwrap();
        assert_eq!(
            sha256_hex(evidence.as_bytes()),
            manifest.file(EVIDENCE_FILE).unwrap().sha256
        );

        let mut manifest_json = String::new();
        archive
            .by_name(MANIFEST_FILE)
            .unwrap()
            .read_to_string(&mut manifest_json)
            .unwrap();
        let parsed: Manifest = serde_json::from_str(&manifest_json).unwrap();
        assert_eq!(parsed, manifest);
    }
}
