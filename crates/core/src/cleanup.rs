//! Removal of stale artifacts.
//!
//! Scratch markup and rendered decks accumulate in the artifact directory; this
//! routine deletes files older than a threshold. It is an administrative side
//! channel and never touches files that are younger than the threshold.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Outcome of a cleanup run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupStatus {
    /// The directory does not exist.
    Skipped,
    /// Candidates were listed but nothing was deleted.
    DryRun,
    /// Candidates were deleted.
    Success,
}

/// A file old enough to be removed.
#[derive(Debug, Clone, Serialize)]
pub struct StaleFile {
    pub path: PathBuf,
    pub age_hours: f64,
    pub size_bytes: u64,
}

/// Report returned by [`cleanup_old_files`].
#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    pub status: CleanupStatus,
    /// Files older than the threshold.
    pub files: Vec<StaleFile>,
    pub files_deleted: usize,
    pub bytes_freed: u64,
    /// Per-file failures; they never abort the run.
    pub errors: Vec<String>,
}

impl CleanupReport {
    fn new(status: CleanupStatus) -> Self {
        Self {
            status,
            files: Vec::new(),
            files_deleted: 0,
            bytes_freed: 0,
            errors: Vec::new(),
        }
    }

    /// Total size of the candidates, in bytes.
    pub fn candidate_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }
}

/// Delete files under `dir` (recursively) last modified more than
/// `max_age_hours` ago. With `dry_run` the candidates are only listed.
pub fn cleanup_old_files(dir: &Path, max_age_hours: u64, dry_run: bool) -> CleanupReport {
    if !dir.is_dir() {
        log::info!("Cleanup skipped: {} does not exist", dir.display());
        return CleanupReport::new(CleanupStatus::Skipped);
    }

    let now = SystemTime::now();
    let max_age = Duration::from_secs(max_age_hours.saturating_mul(3600));

    let mut report = CleanupReport::new(if dry_run {
        CleanupStatus::DryRun
    } else {
        CleanupStatus::Success
    });

    collect_stale(dir, now, max_age, &mut report);

    log::info!(
        "Cleanup of {}: {} file(s) older than {}h ({} bytes)",
        dir.display(),
        report.files.len(),
        max_age_hours,
        report.candidate_bytes()
    );

    if dry_run {
        return report;
    }

    for file in &report.files {
        match fs::remove_file(&file.path) {
            Ok(()) => {
                report.files_deleted += 1;
                report.bytes_freed += file.size_bytes;
                log::debug!("Deleted {}", file.path.display());
            }
            Err(e) => {
                log::warn!("Failed to delete {}: {}", file.path.display(), e);
                report.errors.push(format!("{}: {}", file.path.display(), e));
            }
        }
    }

    report
}

fn collect_stale(dir: &Path, now: SystemTime, max_age: Duration, report: &mut CleanupReport) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            report.errors.push(format!("{}: {}", dir.display(), e));
            return;
        }
    };

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                report.errors.push(format!("{}: {}", dir.display(), e));
                continue;
            }
        };
        let path = entry.path();

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                report.errors.push(format!("{}: {}", path.display(), e));
                continue;
            }
        };

        if metadata.is_dir() {
            collect_stale(&path, now, max_age, report);
            continue;
        }

        // Files with a modification time in the future have age zero
        let age = metadata
            .modified()
            .ok()
            .and_then(|m| now.duration_since(m).ok())
            .unwrap_or_default();

        if age > max_age {
            report.files.push(StaleFile {
                path,
                age_hours: age.as_secs_f64() / 3600.0,
                size_bytes: metadata.len(),
            });
        }
    }
}
