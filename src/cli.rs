//! Command-line interface definitions for Seedling.
//!
//! Every flag has a default, so running the bare binary serves the studio
//! on localhost with the standard export directory and backend endpoints.
//! The hosted API key is deliberately not a flag: it is a secret entered
//! in the form, per request.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Seedling outline studio.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Address to serve the form UI on
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// Directory where exported outlines are written
    #[arg(short, long, default_value = "outputs")]
    pub export_dir: PathBuf,

    /// Base URL of the local Ollama-compatible backend
    #[arg(long, default_value = "http://localhost:11434")]
    pub ollama_url: String,

    /// Model served by the local backend
    #[arg(long, default_value = "gemma")]
    pub ollama_model: String,

    /// Base URL of the hosted completion backend
    #[arg(long, default_value = "https://api.openai.com")]
    pub hosted_url: String,

    /// Model requested from the hosted backend
    #[arg(long, default_value = "gpt-4o-mini")]
    pub hosted_model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["seedling"]);
        assert_eq!(cli.bind, "127.0.0.1:8080");
        assert_eq!(cli.export_dir, PathBuf::from("outputs"));
        assert_eq!(cli.ollama_url, "http://localhost:11434");
        assert_eq!(cli.ollama_model, "gemma");
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "seedling",
            "-b",
            "0.0.0.0:9000",
            "--export-dir",
            "/tmp/exports",
            "--ollama-model",
            "llama3",
        ]);
        assert_eq!(cli.bind, "0.0.0.0:9000");
        assert_eq!(cli.export_dir, PathBuf::from("/tmp/exports"));
        assert_eq!(cli.ollama_model, "llama3");
    }
}
