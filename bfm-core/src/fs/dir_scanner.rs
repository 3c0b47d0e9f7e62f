//! ``src/fs/dir_scanner.rs``
//!
//! # `Directory Scanner`: Asynchronous Filesystem Listing
//!
//! Reads a resolved directory from scratch and returns one [`Entry`] per
//! visible child. Ordering is left to [`crate::fs::sorter`].

use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use tokio::fs::{self, DirEntry, ReadDir};
use tracing::{debug, info};

use crate::error::AppError;
use crate::fs::entry::Entry;

/// Whether a child name is listed. `.` and `..` never are; other dotfiles
/// only when `show_dotfiles` is set.
#[must_use]
pub fn is_visible(name: &str, show_dotfiles: bool) -> bool {
    if name == "." || name == ".." {
        return false;
    }

    show_dotfiles || !name.starts_with('.')
}

/// Scans the given directory asynchronously and returns its entries in
/// filesystem order.
///
/// Entries whose `stat` fails (dangling symlinks, races with deletion) are
/// skipped; only failing to open the directory itself
/// is an error.
///
/// # Arguments
/// * `path` - The resolved directory to scan.
/// * `show_dotfiles` - Whether to include names starting with '.'.
pub async fn scan_dir(path: &Path, show_dotfiles: bool) -> Result<Vec<Entry>, AppError> {
    let start_time: Instant = Instant::now();

    let mut entries: Vec<Entry> = Vec::new();
    let mut read_dir: ReadDir = fs::read_dir(path)
        .await
        .map_err(|e| AppError::metadata(path, e))?;
    let mut skipped: usize = 0;

    loop {
        let entry: DirEntry = match read_dir.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                debug!("Failed to read entry in {:?}: {}", path, e);
                skipped += 1;
                continue;
            }
        };

        let file_name: OsString = entry.file_name();
        if !is_visible(&file_name.to_string_lossy(), show_dotfiles) {
            continue;
        }

        match stat_entry(&entry, &file_name).await {
            Ok(info) => entries.push(info),

            Err(e) => {
                // Log the error but continue processing other entries
                debug!("Failed to stat {:?}: {}", entry.path(), e);
                skipped += 1;
            }
        }
    }

    let duration: Duration = start_time.elapsed();
    info!(
        marker = "PERF_DIRECTORY_SCAN",
        operation_type = "scan_dir",
        entries = entries.len(),
        skipped,
        "Directory scan of {:?} completed in {:?}",
        path,
        duration
    );

    Ok(entries)
}

async fn stat_entry(entry: &DirEntry, file_name: &OsStr) -> std::io::Result<Entry> {
    let entry_path: PathBuf = entry.path();
    let via_link: bool = entry
        .file_type()
        .await
        .map(|t| t.is_symlink())
        .unwrap_or(false);

    // Follow links like `stat(2)`; a dangling link fails here and is skipped.
    let meta = fs::metadata(&entry_path).await?;

    Ok(Entry::from_metadata(file_name, &meta, via_link))
}
