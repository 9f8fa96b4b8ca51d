//! Export-directory housekeeping.
//!
//! Deletes export files older than a fixed age threshold on manual trigger.
//! The scan is non-recursive, touches only regular files, and tolerates
//! individual delete failures: one unreadable or protected file never
//! aborts the rest of the batch.

use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{info, instrument, warn};

/// Age threshold applied by the "Clean Old Files" action.
pub const MAX_EXPORT_AGE: Duration = Duration::from_secs(24 * 3600);

/// Result of one purge run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PurgeOutcome {
    /// Files successfully deleted.
    pub deleted: usize,
    /// Files that were old enough but could not be deleted.
    pub failed: usize,
}

/// Whether a file last modified at `modified` has outlived `max_age`.
pub fn is_expired(modified: SystemTime, now: SystemTime, max_age: Duration) -> bool {
    match now.checked_sub(max_age) {
        Some(cutoff) => modified < cutoff,
        // max_age reaches past the epoch; nothing can be that old
        None => false,
    }
}

/// Delete direct children of `dir` whose mtime is older than `now - max_age`.
///
/// # Errors
///
/// Fails only if the directory itself cannot be read. Per-file failures
/// (stat or delete) are logged, counted in the outcome, and skipped.
#[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
pub fn purge_older_than(dir: &Path, max_age: Duration) -> std::io::Result<PurgeOutcome> {
    let now = SystemTime::now();
    let mut outcome = PurgeOutcome::default();

    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Could not read directory entry; skipping");
                outcome.failed += 1;
                continue;
            }
        };
        let path = entry.path();

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not stat file; skipping");
                outcome.failed += 1;
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }

        let modified = match metadata.modified() {
            Ok(modified) => modified,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "No modification time; skipping");
                outcome.failed += 1;
                continue;
            }
        };
        if !is_expired(modified, now, max_age) {
            continue;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "Deleted old export file");
                outcome.deleted += 1;
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not delete file; skipping");
                outcome.failed += 1;
            }
        }
    }

    info!(
        deleted = outcome.deleted,
        failed = outcome.failed,
        "Housekeeping pass complete"
    );
    Ok(outcome)
}
