//! ``src/model/session.rs``
//! ============================================================================
//! # `Session`: one independent view over a directory
//!
//! Each session has its own path, dotfile filter and entry cache. Sessions
//! are owned by [`crate::model::session_manager::SessionManager`] and only
//! ever mutated through it.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::fs::entry::Entry;

/// Stable handle for an open session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,

    /// Canonical directory currently listed.
    pub(crate) current_path: PathBuf,

    pub(crate) show_dotfiles: bool,

    /// Modification time of `current_path` sampled right before the last
    /// successful scan.
    pub(crate) last_known_modified: SystemTime,

    /// Sorted listing of `current_path`.
    pub(crate) entries: Vec<Entry>,

    /// Bumped on every committed rebuild.
    pub(crate) generation: u64,
}

impl Session {
    #[must_use]
    pub(crate) fn new(id: SessionId, show_dotfiles: bool) -> Self {
        Self {
            id,
            current_path: PathBuf::new(),
            show_dotfiles,
            last_known_modified: UNIX_EPOCH,
            entries: Vec::new(),
            generation: 0,
        }
    }

    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn current_path(&self) -> &Path {
        &self.current_path
    }

    #[must_use]
    pub const fn show_dotfiles(&self) -> bool {
        self.show_dotfiles
    }

    #[must_use]
    pub const fn last_known_modified(&self) -> SystemTime {
        self.last_known_modified
    }

    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Look up a listed entry by name.
    #[must_use]
    pub fn entry(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Path of the child called `name`, spelled as on disk when it is listed.
    #[must_use]
    pub fn child_path(&self, name: &str) -> PathBuf {
        match self.entry(name) {
            Some(entry) => self.current_path.join(&entry.file_name),
            None => self.current_path.join(name),
        }
    }

    /// Replace the listing wholesale.
    pub(crate) fn commit(&mut self, path: PathBuf, modified: SystemTime, entries: Vec<Entry>) {
        self.current_path = path;
        self.last_known_modified = modified;
        self.entries = entries;
        self.generation += 1;
    }
}
