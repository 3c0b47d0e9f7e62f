//! ``src/model/session_manager.rs``
//! ============================================================================
//! # `SessionManager`: the navigation engine
//!
//! Owns every open [`Session`] and is the only place their state changes.
//! Every operation that alters what a session shows ends in the same rebuild
//! sequence: resolve the target, sample its mtime, scan, sort, then commit
//! the new listing in one step. A failed rebuild leaves the session exactly
//! as it was.
//!
//! All operations take `&mut self` and run to completion on the event loop
//! task, so a rebuild is never interleaved with another command or with a
//! staleness check.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info, instrument, warn};

use crate::config::CommandTemplates;
use crate::controller::collaborators::{LaunchPurpose, LaunchRequest, Launcher, TextEntry};
use crate::controller::monitor::{is_stale, observe_mtime};
use crate::error::AppError;
use crate::fs::dir_scanner::scan_dir;
use crate::fs::entry::Entry;
use crate::fs::resolver::{Resolved, resolve};
use crate::fs::sorter::sort_entries;
use crate::model::bookmarks::Bookmarks;
use crate::model::session::{Session, SessionId};

/// Whether an operation changed what a session shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Changed,
    Unchanged,
}

/// Whether any session is still open after a close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Running,
    Shutdown,
}

/// Process-wide settings shared by every session.
#[derive(Debug, Clone, Default)]
pub struct ManagerSettings {
    /// Dotfile visibility of newly opened sessions.
    pub show_dotfiles: bool,
    pub bookmarks: Bookmarks,
    pub commands: CommandTemplates,
}

#[derive(Debug)]
pub struct SessionManager {
    sessions: BTreeMap<SessionId, Session>,
    next_id: u64,
    settings: ManagerSettings,
}

/// A fully built listing, ready to commit.
struct Listing {
    path: PathBuf,
    modified: SystemTime,
    entries: Vec<Entry>,
}

async fn build_listing(
    target: &Path,
    base: &Path,
    show_dotfiles: bool,
) -> Result<Listing, AppError> {
    let Resolved { path, climbed } = resolve(target, base).await?;
    if climbed > 0 {
        info!(
            requested = %target.display(),
            resolved = %path.display(),
            climbed,
            "Fell back to ancestor directory"
        );
    }

    // Sampled before the scan so a change during the scan still reads stale.
    let modified: SystemTime = observe_mtime(&path).await.unwrap_or(UNIX_EPOCH);

    let mut entries: Vec<Entry> = scan_dir(&path, show_dotfiles).await?;
    sort_entries(&mut entries);

    Ok(Listing {
        path,
        modified,
        entries,
    })
}

impl SessionManager {
    #[must_use]
    pub const fn new(settings: ManagerSettings) -> Self {
        Self {
            sessions: BTreeMap::new(),
            next_id: 1,
            settings,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &ManagerSettings {
        &self.settings
    }

    #[must_use]
    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    /// Open sessions in creation order.
    pub fn sessions(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    #[must_use]
    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.keys().copied().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn get(&self, id: SessionId) -> Result<&Session, AppError> {
        self.sessions.get(&id).ok_or(AppError::UnknownSession(id))
    }

    fn get_mut(&mut self, id: SessionId) -> Result<&mut Session, AppError> {
        self.sessions
            .get_mut(&id)
            .ok_or(AppError::UnknownSession(id))
    }

    /// Create a session listing `initial`. Relative paths resolve against
    /// `base`. Nothing is added if the first listing cannot be built.
    #[instrument(level = "info", skip_all, fields(initial = %initial.display()))]
    pub async fn open_session(&mut self, initial: &Path, base: &Path) -> Result<SessionId, AppError> {
        let show_dotfiles: bool = self.settings.show_dotfiles;
        let listing: Listing = build_listing(initial, base, show_dotfiles).await?;

        let id: SessionId = SessionId(self.next_id);
        self.next_id += 1;

        let mut session: Session = Session::new(id, show_dotfiles);
        session.commit(listing.path, listing.modified, listing.entries);
        info!(
            session = %id,
            path = %session.current_path.display(),
            "Session opened"
        );
        self.sessions.insert(id, session);

        Ok(id)
    }

    /// Drop a session. Closing an unknown id is a no-op.
    pub fn close_session(&mut self, id: SessionId) -> Lifecycle {
        if self.sessions.remove(&id).is_some() {
            info!(session = %id, remaining = self.sessions.len(), "Session closed");
        }

        if self.sessions.is_empty() {
            Lifecycle::Shutdown
        } else {
            Lifecycle::Running
        }
    }

    /// Rebuild `id` from `target` and commit it with the given filter.
    async fn rebuild(
        &mut self,
        id: SessionId,
        target: &Path,
        show_dotfiles: bool,
    ) -> Result<Outcome, AppError> {
        let base: PathBuf = self.get(id)?.current_path.clone();

        let listing: Listing = build_listing(target, &base, show_dotfiles)
            .await
            .inspect_err(|e| warn!(session = %id, "Rebuild failed: {e}"))?;

        let session: &mut Session = self.get_mut(id)?;
        session.show_dotfiles = show_dotfiles;
        session.commit(listing.path, listing.modified, listing.entries);
        debug!(
            session = %id,
            path = %session.current_path.display(),
            entries = session.entries.len(),
            generation = session.generation,
            "Listing committed"
        );

        Ok(Outcome::Changed)
    }

    /// Navigate to `target`, or ask for a path when there is none. A
    /// cancelled or empty answer changes nothing.
    pub async fn navigate(
        &mut self,
        id: SessionId,
        target: Option<&str>,
        entry: &mut dyn TextEntry,
    ) -> Result<Outcome, AppError> {
        let requested: String = match target {
            Some(path) => path.to_string(),
            None => {
                let current: String = self.get(id)?.current_path.display().to_string();
                match entry.request_text("path", Some(&current)).await {
                    Some(text) if !text.is_empty() => text,
                    _ => return Ok(Outcome::Unchanged),
                }
            }
        };

        self.navigate_to(id, Path::new(&requested)).await
    }

    /// Navigate to a known path; relative paths are taken from the session's
    /// current directory.
    pub async fn navigate_to(&mut self, id: SessionId, target: &Path) -> Result<Outcome, AppError> {
        let show_dotfiles: bool = self.get(id)?.show_dotfiles;
        self.rebuild(id, target, show_dotfiles).await
    }

    /// Flip dotfile visibility and rescan in place.
    pub async fn toggle_dotfiles(&mut self, id: SessionId) -> Result<Outcome, AppError> {
        let session: &Session = self.get(id)?;
        let path: PathBuf = session.current_path.clone();
        let show_dotfiles: bool = !session.show_dotfiles;

        self.rebuild(id, &path, show_dotfiles).await
    }

    /// Rescan the current directory.
    pub async fn reload(&mut self, id: SessionId) -> Result<Outcome, AppError> {
        let session: &Session = self.get(id)?;
        let path: PathBuf = session.current_path.clone();
        let show_dotfiles: bool = session.show_dotfiles;

        self.rebuild(id, &path, show_dotfiles).await
    }

    /// Go to bookmark `index`; out of range does nothing.
    pub async fn bookmark_jump(&mut self, id: SessionId, index: usize) -> Result<Outcome, AppError> {
        let Some(target) = self.settings.bookmarks.get(index).map(Path::to_path_buf) else {
            debug!(session = %id, index, "No bookmark at index");
            return Ok(Outcome::Unchanged);
        };

        self.navigate_to(id, &target).await
    }

    /// Ask for a name and create that directory inside the session's
    /// directory. On success the session is reloaded.
    pub async fn make_directory(
        &mut self,
        id: SessionId,
        mode: u32,
        entry: &mut dyn TextEntry,
    ) -> Result<Outcome, AppError> {
        let parent: PathBuf = self.get(id)?.current_path.clone();

        let name: String = match entry.request_text("make directory", None).await {
            Some(name) if !name.is_empty() => name,
            _ => return Ok(Outcome::Unchanged),
        };

        let path: PathBuf = parent.join(&name);
        create_dir(&path, mode)
            .await
            .map_err(|source| AppError::CreateDirectory {
                path: path.clone(),
                source,
            })?;
        info!(session = %id, path = %path.display(), mode = format_args!("{mode:o}"), "Directory created");

        self.reload(id).await
    }

    /// Hand each named entry to the remove action, then reload once.
    pub async fn remove_selected<S: AsRef<str>>(
        &mut self,
        id: SessionId,
        names: &[S],
        launcher: &dyn Launcher,
    ) -> Result<Outcome, AppError> {
        let session: &Session = self.get(id)?;
        let workdir: PathBuf = session.current_path.clone();

        for name in names.iter().map(AsRef::as_ref) {
            if !is_plain_name(name) {
                warn!(session = %id, name, "Refusing to remove");
                continue;
            }

            launcher.launch(LaunchRequest {
                session: id,
                purpose: LaunchPurpose::Remove,
                argv: self.settings.commands.remove.clone(),
                target: session.child_path(name),
                workdir: workdir.clone(),
            });
        }

        self.reload(id).await
    }

    /// Enter `name` when it is a directory, otherwise hand its absolute path
    /// to the open action.
    pub async fn exec_selected(
        &mut self,
        id: SessionId,
        name: &str,
        launcher: &dyn Launcher,
    ) -> Result<Outcome, AppError> {
        let session: &Session = self.get(id)?;
        let workdir: PathBuf = session.current_path.clone();
        let listed: Option<bool> = session.entry(name).map(Entry::is_dir);

        let joined: PathBuf = session.child_path(name);
        let target: PathBuf = tokio::fs::canonicalize(&joined).await.unwrap_or_else(|e| {
            warn!("{}: {}", joined.display(), e);
            joined.clone()
        });

        let is_dir: bool = match listed {
            Some(is_dir) => is_dir,
            None => tokio::fs::metadata(&target)
                .await
                .is_ok_and(|meta| meta.is_dir()),
        };

        if is_dir {
            return self.navigate_to(id, &target).await;
        }

        launcher.launch(LaunchRequest {
            session: id,
            purpose: LaunchPurpose::Open,
            argv: self.settings.commands.open.clone(),
            target,
            workdir,
        });

        Ok(Outcome::Unchanged)
    }

    /// Run `argv` with the session's directory as target and workdir.
    pub fn exec_external(
        &self,
        id: SessionId,
        argv: &[String],
        launcher: &dyn Launcher,
    ) -> Result<(), AppError> {
        let workdir: PathBuf = self.get(id)?.current_path.clone();

        launcher.launch(LaunchRequest {
            session: id,
            purpose: LaunchPurpose::DirExec,
            argv: argv.to_vec(),
            target: workdir.clone(),
            workdir,
        });

        Ok(())
    }

    /// Rebuild `id` if its directory changed since the last scan.
    pub async fn refresh_if_stale(&mut self, id: SessionId) -> Result<Outcome, AppError> {
        let session: &Session = self.get(id)?;
        let path: PathBuf = session.current_path.clone();
        let last_known: SystemTime = session.last_known_modified;
        let show_dotfiles: bool = session.show_dotfiles;

        if !is_stale(observe_mtime(&path).await, last_known) {
            return Ok(Outcome::Unchanged);
        }

        info!(
            marker = "STALE_DIRECTORY",
            session = %id,
            path = %path.display(),
            "Directory changed, rebuilding"
        );
        self.rebuild(id, &path, show_dotfiles).await
    }

    /// One staleness pass over every open session.
    pub async fn refresh_stale(&mut self) -> Vec<(SessionId, Result<Outcome, AppError>)> {
        let mut results = Vec::with_capacity(self.sessions.len());
        for id in self.ids() {
            let result = self.refresh_if_stale(id).await;
            results.push((id, result));
        }
        results
    }
}

/// A single path component that stays inside the directory.
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(std::path::MAIN_SEPARATOR)
}

#[cfg(unix)]
async fn create_dir(path: &Path, mode: u32) -> std::io::Result<()> {
    tokio::fs::DirBuilder::new().mode(mode).create(path).await
}

#[cfg(not(unix))]
async fn create_dir(path: &Path, _mode: u32) -> std::io::Result<()> {
    tokio::fs::DirBuilder::new().create(path).await
}
