//! The application-level error type.
//!
//! Every component returns an explicit error value; the web layer maps each
//! kind to a single human-readable banner. No failure is fatal to the
//! process.

use thiserror::Error;

use crate::api::GenerationError;
use crate::outputs::ExportError;

#[derive(Debug, Error)]
pub enum AppError {
    /// The form was rejected before any network call was made.
    #[error("{0}")]
    Validation(String),

    /// The generation backend could not produce text.
    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),

    /// An export writer failed. Files written before the failure remain
    /// on disk.
    #[error("export failed: {0}")]
    Export(#[from] ExportError),

    /// Filesystem failure outside the exporters.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
