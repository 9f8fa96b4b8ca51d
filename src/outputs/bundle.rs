//! The optional zip bundle.
//!
//! Packs the three exported files of one generation into a single
//! deflate-compressed archive, built entirely in memory and handed to the
//! presentation layer as bytes. No metadata entries are added.

use std::io::{Cursor, Write};
use tracing::{info, instrument};
use zip::{CompressionMethod, ZipWriter, write::FileOptions};

use super::ExportError;
use crate::models::ExportArtifactSet;

/// Build the zip bundle for one artifact set.
///
/// The archive contains exactly the three export files, stored under their
/// export filenames. Fails if any of the files is missing or unreadable.
#[instrument(level = "info", skip_all, fields(slug = %set.slug))]
pub fn build_bundle(set: &ExportArtifactSet) -> Result<Vec<u8>, ExportError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for name in set.file_names() {
        let bytes = std::fs::read(set.path_of(name))?;
        zip.start_file(name, options)?;
        zip.write_all(&bytes)?;
    }

    let cursor = zip.finish()?;
    let bytes = cursor.into_inner();
    info!(
        bytes = bytes.len(),
        bundle = %set.bundle_name(),
        "Built zip bundle"
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{GeneratedDocument, artifact_set_for};
    use crate::outputs::write_set;
    use std::io::Read;
    use zip::ZipArchive;

    #[tokio::test]
    async fn test_bundle_round_trips_the_three_export_files() {
        let tmp = tempfile::tempdir().unwrap();
        let doc = GeneratedDocument {
            raw_text: "# Title\n\nBody paragraph.".to_string(),
            slug: "idea".to_string(),
            timestamp: "2026-08-23_10-00-00".to_string(),
        };
        let set = write_set(&doc, tmp.path()).await.unwrap();

        let bytes = build_bundle(&set).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 3);

        for name in set.file_names() {
            let mut entry = archive.by_name(name).unwrap();
            let mut unpacked = Vec::new();
            entry.read_to_end(&mut unpacked).unwrap();
            let on_disk = std::fs::read(set.path_of(name)).unwrap();
            assert_eq!(unpacked, on_disk, "bundle entry {name} differs from disk");
        }
    }

    #[test]
    fn test_bundle_fails_when_a_file_is_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let doc = GeneratedDocument {
            raw_text: String::new(),
            slug: "missing".to_string(),
            timestamp: "2026-08-23_10-00-00".to_string(),
        };
        let set = artifact_set_for(&doc, tmp.path());
        let err = build_bundle(&set).unwrap_err();
        assert!(matches!(err, ExportError::Io(_)));
    }
}
