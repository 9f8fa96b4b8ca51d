//! # Seedling
//!
//! A single-page outline studio: describe a product idea in a small web
//! form, send a templated prompt to a text-generation backend (a local
//! Ollama host or a hosted completion API), and export the returned
//! outline as plain text, Markdown, and a paginated PDF, with an optional
//! zip bundle of all three.
//!
//! ## Usage
//!
//! ```sh
//! seedling --bind 127.0.0.1:8080 --export-dir ./outputs
//! ```
//!
//! ## Architecture
//!
//! One generation action flows through a short pipeline:
//! 1. **Collect**: the form posts the idea, audience, format, tone, and
//!    backend choice to `/generate`
//! 2. **Prompt**: the request is rendered into a single instruction string
//! 3. **Generate**: the prompt is sent to the selected backend, retrying
//!    transient failures with exponential backoff
//! 4. **Export**: the outline is written as `.txt`, `.md`, and `.pdf`,
//!    named by slug + timestamp
//!
//! Housekeeping (`POST /clean`) deletes export files older than 24 hours.

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod error;
mod housekeeping;
mod models;
mod outputs;
mod prompt;
mod utils;
mod web;

use cli::Cli;
use utils::ensure_writable_dir;
use web::AppState;

/// Outbound request timeout for both generation backends.
const GENERATION_TIMEOUT: Duration = Duration::from_secs(120);

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    info!("seedling starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.bind, ?args.export_dir, "Parsed CLI arguments");

    // Early check: the export directory must exist and be writable
    if let Err(e) = ensure_writable_dir(&args.export_dir).await {
        error!(
            path = %args.export_dir.display(),
            error = %e,
            "Export directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    let http = reqwest::Client::builder()
        .timeout(GENERATION_TIMEOUT)
        .build()?;

    let state = Arc::new(AppState {
        export_dir: args.export_dir,
        http,
        ollama_url: args.ollama_url,
        ollama_model: args.ollama_model,
        hosted_url: args.hosted_url,
        hosted_model: args.hosted_model,
    });

    let listener = tokio::net::TcpListener::bind(&args.bind).await?;
    info!(addr = %args.bind, "Serving the outline studio");
    axum::serve(listener, web::router(state)).await?;

    Ok(())
}
