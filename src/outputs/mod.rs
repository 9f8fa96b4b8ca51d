//! Export writers for generated outlines.
//!
//! This module contains submodules responsible for writing one generation
//! to its export formats:
//!
//! # Submodules
//!
//! - [`text`]: verbatim UTF-8 writers backing both the `.txt` and `.md` files
//! - [`pdf`]: the paginated printable document
//! - [`bundle`]: the optional zip bundle packing the three files together
//!
//! # Output Structure
//!
//! ```text
//! export_dir/
//! ├── seedling_<slug>_outline_<timestamp>.txt
//! ├── seedling_<slug>_outline_<timestamp>.pdf
//! ├── seedling_<slug>_outline_<timestamp>.md
//! └── seedling_<slug>_bundle.zip        # built on demand, served in memory
//! ```

use std::path::Path;
use thiserror::Error;
use tracing::instrument;

use crate::models::{ExportArtifactSet, GeneratedDocument, artifact_set_for};

pub mod bundle;
pub mod pdf;
pub mod text;

/// A failure inside one of the export writers.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("could not write export file: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not render PDF: {0}")]
    Pdf(String),

    #[error("could not build bundle: {0}")]
    Archive(#[from] zip::result::ZipError),
}

/// Write the full artifact set for one generation.
///
/// Writes the text, Markdown, and PDF files in that order. A failure part
/// way through leaves the earlier files on disk; each writer is idempotent
/// on retry because the filenames are fixed by slug + timestamp.
#[instrument(level = "info", skip_all, fields(slug = %doc.slug, timestamp = %doc.timestamp))]
pub async fn write_set(
    doc: &GeneratedDocument,
    export_dir: &Path,
) -> Result<ExportArtifactSet, ExportError> {
    let set = artifact_set_for(doc, export_dir);
    text::write_verbatim(&doc.raw_text, &set.path_of(&set.txt_name)).await?;
    text::write_verbatim(&doc.raw_text, &set.path_of(&set.md_name)).await?;
    pdf::write_pdf(&doc.raw_text, &set.path_of(&set.pdf_name))?;
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_set_produces_three_files_with_identical_text() {
        let tmp = tempfile::tempdir().unwrap();
        let doc = GeneratedDocument {
            raw_text: "# Title\n\nBody paragraph.".to_string(),
            slug: "idea".to_string(),
            timestamp: "2026-08-23_10-00-00".to_string(),
        };

        let set = write_set(&doc, tmp.path()).await.unwrap();

        let txt = std::fs::read(set.path_of(&set.txt_name)).unwrap();
        let md = std::fs::read(set.path_of(&set.md_name)).unwrap();
        assert_eq!(txt, doc.raw_text.as_bytes());
        assert_eq!(md, txt);

        let pdf = std::fs::read(set.path_of(&set.pdf_name)).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }
}
