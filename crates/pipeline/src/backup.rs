//! Output archiving with a bounded retention window
//!
//! Before an output file is overwritten, the previous version is copied to
//! the backup directory as `<stem>_<YYYYMMDD_HHMMSS>.<ext>`; the timestamp
//! format sorts lexicographically in chronological order, so pruning keeps
//! the 3 newest archives per stem. Two backups within the same second
//! collide and overwrite one another; accepted for this infrequent-run,
//! single-threaded design.

use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Number of archived versions retained per output stem.
pub const RETAIN: usize = 3;

/// Archive the current version of `output_path`, if it exists.
///
/// Returns the path of the archive created, or `None` when there was
/// nothing to back up. Pruning failures are logged per file and never
/// propagate.
pub fn backup_existing(output_path: &Path, backup_dir: &Path) -> std::io::Result<Option<PathBuf>> {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    backup_at(output_path, backup_dir, &timestamp)
}

fn backup_at(
    output_path: &Path,
    backup_dir: &Path,
    timestamp: &str,
) -> std::io::Result<Option<PathBuf>> {
    if !output_path.exists() {
        return Ok(None);
    }
    let stem = output_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = output_path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();

    let backup_name = if extension.is_empty() {
        format!("{stem}_{timestamp}")
    } else {
        format!("{stem}_{timestamp}.{extension}")
    };
    let backup_path = backup_dir.join(backup_name);

    let metadata = fs::metadata(output_path)?;
    fs::copy(output_path, &backup_path)?;
    // Carry the original modification time over, like a cp -p
    if let Ok(modified) = metadata.modified() {
        if let Ok(file) = fs::OpenOptions::new().write(true).open(&backup_path) {
            let _ = file.set_modified(modified);
        }
    }
    info!("backed up previous output to {}", backup_path.display());

    prune_stale(backup_dir, &stem, &extension);
    Ok(Some(backup_path))
}

/// Delete all but the `RETAIN` newest archives for one stem, oldest first.
fn prune_stale(backup_dir: &Path, stem: &str, extension: &str) {
    let Ok(entries) = fs::read_dir(backup_dir) else {
        return;
    };
    let prefix = format!("{stem}_");
    let suffix = if extension.is_empty() {
        String::new()
    } else {
        format!(".{extension}")
    };

    let mut archives: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&prefix) && name.ends_with(&suffix))
        })
        .collect();
    archives.sort();

    let stale_count = archives.len().saturating_sub(RETAIN);
    for stale in &archives[..stale_count] {
        match fs::remove_file(stale) {
            Ok(()) => info!("removed stale backup {}", stale.display()),
            Err(err) => warn!("failed to remove stale backup {}: {err}", stale.display()),
        }
    }
}
