//! Verbatim text writers.
//!
//! The plain-text and Markdown exports are byte-identical: the backend's
//! response written as UTF-8, unchanged. Two files exist only so each
//! download affordance hands the operator the extension they asked for.

use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

use super::ExportError;

/// Write the raw outline text to `path`, unchanged.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_verbatim(raw_text: &str, path: &Path) -> Result<(), ExportError> {
    fs::write(path, raw_text).await?;
    info!(bytes = raw_text.len(), "Wrote export file");
    Ok(())
}
