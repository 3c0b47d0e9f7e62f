//! `src/fs/entry.rs`
//! ============================================================
//! Directory entry snapshot produced by the scanner.
//!
//! An `Entry` is immutable once built; a rescan replaces the whole list.
//! Display helpers (name with trailing separator, `ls`-style permission
//! string, size class, formatted mtime) live here so every front end renders
//! the same columns.

// ------------------------------------------------------------
// Standard-library imports
// ------------------------------------------------------------

use std::ffi::{OsStr, OsString};
use std::fmt::Write as _;
use std::fs::{FileType, Metadata};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[cfg(unix)]
use std::os::unix::fs::{FileTypeExt, MetadataExt};

// ------------------------------------------------------------
// Third-party crate imports
// ------------------------------------------------------------

use chrono::{DateTime, Local, TimeZone};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------
// Local-crate imports
// ------------------------------------------------------------

use crate::util::humanize::size_class;

// ------------------------------------------------------------
// EntryKind: what `stat` says the entry is.
// ------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    Directory,
    Regular,
    Symlink,
    BlockDevice,
    CharDevice,
    Fifo,
    Socket,
    Other,
}

impl EntryKind {
    /// Classify a followed file type. `via_link` marks entries reached
    /// through a symlink; those keep `Directory` when the target is one so
    /// they stay navigable, and become `Symlink` otherwise.
    #[must_use]
    pub fn classify(ftype: FileType, via_link: bool) -> Self {
        if ftype.is_dir() {
            return Self::Directory;
        }
        if via_link || ftype.is_symlink() {
            return Self::Symlink;
        }
        if ftype.is_file() {
            return Self::Regular;
        }

        #[cfg(unix)]
        {
            if ftype.is_block_device() {
                return Self::BlockDevice;
            }
            if ftype.is_char_device() {
                return Self::CharDevice;
            }
            if ftype.is_fifo() {
                return Self::Fifo;
            }
            if ftype.is_socket() {
                return Self::Socket;
            }
        }

        Self::Other
    }

    /// First column of `ls -l`.
    #[must_use]
    pub const fn type_char(self) -> char {
        match self {
            Self::Directory => 'd',
            Self::Regular => '-',
            Self::Symlink => 'l',
            Self::BlockDevice => 'b',
            Self::CharDevice => 'c',
            Self::Fifo => 'p',
            Self::Socket => 's',
            Self::Other => '?',
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s: &str = match self {
            Self::Directory => "directory",
            Self::Regular => "regular",
            Self::Symlink => "symlink",
            Self::BlockDevice => "block device",
            Self::CharDevice => "char device",
            Self::Fifo => "fifo",
            Self::Socket => "socket",
            Self::Other => "other",
        };

        write!(f, "{s}")
    }
}

// ------------------------------------------------------------
// Entry: one row of a directory listing.
// ------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Name for display, lookup and ordering; lossy for non-UTF-8 names.
    pub name: CompactString,
    /// Name exactly as stored on disk, used to build paths.
    pub file_name: OsString,
    pub kind: EntryKind,
    pub size: u64,
    /// Raw POSIX mode bits (`st_mode`), zero where the platform has none.
    pub mode: u32,
    pub modified: SystemTime,
}

const PERM_TRIPLETS: [&str; 8] = ["---", "--x", "-w-", "-wx", "r--", "r-x", "rw-", "rwx"];

impl Entry {
    /// Build from followed metadata.
    #[must_use]
    pub fn from_metadata(file_name: &OsStr, meta: &Metadata, via_link: bool) -> Self {
        let kind: EntryKind = EntryKind::classify(meta.file_type(), via_link);

        Self {
            name: CompactString::new(file_name.to_string_lossy()),
            file_name: file_name.to_os_string(),
            kind,
            size: meta.len(),
            mode: mode_bits(meta),
            modified: meta.modified().unwrap_or(UNIX_EPOCH),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Name as listed: directories carry a trailing separator.
    #[must_use]
    pub fn display_name(&self) -> CompactString {
        if self.is_dir() {
            let mut name: CompactString = self.name.clone();
            name.push(std::path::MAIN_SEPARATOR);
            name
        } else {
            self.name.clone()
        }
    }

    /// `drwxr-xr-x` style permission string.
    #[must_use]
    pub fn permission_string(&self) -> String {
        let mut out: String = String::with_capacity(10);
        out.push(self.kind.type_char());

        for shift in [6u32, 3, 0] {
            out.push_str(PERM_TRIPLETS[((self.mode >> shift) & 0o7) as usize]);
        }

        out
    }

    #[inline]
    #[must_use]
    pub fn size_class(&self) -> String {
        size_class(self.size)
    }

    /// Format the modification time in local time with a strftime pattern.
    /// An invalid pattern yields an empty string rather than a panic.
    #[allow(clippy::cast_possible_wrap)]
    #[must_use]
    pub fn format_modified(&self, fmt: &str) -> String {
        let dur: Duration = self
            .modified
            .duration_since(UNIX_EPOCH)
            .unwrap_or_else(|_| -> Duration { Duration::from_secs(0) });

        let Some(dt): Option<DateTime<Local>> = Local
            .timestamp_opt(dur.as_secs() as i64, dur.subsec_nanos())
            .single()
        else {
            return String::new();
        };

        let mut out: String = String::new();
        if write!(out, "{}", dt.format(fmt)).is_err() {
            out.clear();
        }
        out
    }
}

#[cfg(unix)]
fn mode_bits(meta: &Metadata) -> u32 {
    meta.mode()
}

#[cfg(not(unix))]
fn mode_bits(meta: &Metadata) -> u32 {
    if meta.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}
