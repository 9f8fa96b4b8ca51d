//! Utility functions for slug derivation, timestamps, string truncation,
//! and file system checks.

use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Characters that are not allowed in an export filename slug.
static SLUG_INVALID: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9A-Za-z_-]").unwrap());

/// Maximum length of a derived slug, in characters.
const SLUG_MAX_LEN: usize = 40;

/// Convert free text into a filesystem-safe identifier.
///
/// Every character outside `[0-9A-Za-z_-]` becomes an underscore, leading
/// and trailing underscores are stripped, and the result is truncated to
/// 40 characters. An empty result falls back to `"untitled"`.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify("AI Cookbook"), "AI_Cookbook");
/// assert_eq!(slugify("???"), "untitled");
/// ```
pub fn slugify(text: &str) -> String {
    let replaced = SLUG_INVALID.replace_all(text, "_");
    let slug: String = replaced
        .trim_matches('_')
        .chars()
        .take(SLUG_MAX_LEN)
        .collect();
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

/// Local time formatted for use in export filenames.
///
/// Second resolution, e.g. `2026-08-23_10-00-00`.
pub fn file_timestamp() -> String {
    Local::now().format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and byte count
/// indicator appended. Cuts on character boundaries, so backend responses
/// containing multi-byte text are safe to preview.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((idx, _)) => format!("{}…(+{} bytes)", &s[..idx], s.len() - idx),
    }
}

/// Estimated cost of one hosted generation, in USD.
///
/// A rough idea-length heuristic: one token per four characters at a fixed
/// per-kilotoken rate. Shown as a caption, never used for billing.
pub fn estimated_hosted_cost_usd(idea: &str) -> f64 {
    (idea.len() / 4) as f64 * 0.03 / 1000.0
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if absent, then performs a write test by creating
/// and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable
/// (permission denied, read-only filesystem, etc.).
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path).await?;
    // Small sync write using std fs (simpler error surface)
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Export directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("AI Cookbook"), "AI_Cookbook");
        assert_eq!(slugify("hello-world_01"), "hello-world_01");
        assert_eq!(slugify("Idea: grow!"), "Idea__grow");
    }

    #[test]
    fn test_slugify_strips_boundary_underscores() {
        assert_eq!(slugify("  padded  "), "padded");
        assert_eq!(slugify("!wow!"), "wow");
    }

    #[test]
    fn test_slugify_truncates_to_forty_chars() {
        let long = "a".repeat(100);
        assert_eq!(slugify(&long).len(), 40);
    }

    #[test]
    fn test_slugify_empty_falls_back_to_untitled() {
        assert_eq!(slugify(""), "untitled");
        assert_eq!(slugify("???"), "untitled");
        assert_eq!(slugify("___"), "untitled");
    }

    #[test]
    fn test_slugify_output_shape_for_arbitrary_inputs() {
        let shape = Regex::new(r"^[A-Za-z0-9_-]{1,40}$").unwrap();
        let samples = [
            "AI Cookbook",
            "emoji 🌱 garden",
            "  spaces  everywhere  ",
            "tabs\tand\nnewlines",
            "ünïcödé idé",
            "----",
            "a",
            "",
            "日本語のアイデア",
        ];
        for sample in samples {
            let slug = slugify(sample);
            assert!(shape.is_match(&slug), "bad slug {slug:?} for {sample:?}");
            // deterministic
            assert_eq!(slug, slugify(sample));
        }
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_multibyte_boundary() {
        let s = "ééééé";
        let result = truncate_for_log(s, 3);
        assert!(result.starts_with("ééé"));
    }

    #[test]
    fn test_estimated_hosted_cost() {
        let idea = "a".repeat(400);
        assert!((estimated_hosted_cost_usd(&idea) - 0.003).abs() < 1e-9);
        assert_eq!(estimated_hosted_cost_usd(""), 0.0);
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_missing_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("nested").join("exports");
        ensure_writable_dir(&target).await.unwrap();
        assert!(target.is_dir());
    }
}
