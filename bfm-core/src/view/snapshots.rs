//! src/view/snapshots.rs
//! ============================================================
//! Immutable data-transfer structs harvested from the session
//! manager and the per-session view state, then consumed by the
//! renderer widgets. Widgets never see the live state.
//!
//! The prompt reuses the last snapshot as its backdrop, so a
//! snapshot owns everything it shows.

use std::collections::HashMap;

use compact_str::CompactString;

use crate::fs::entry::{Entry, EntryKind};
use crate::model::session::{Session, SessionId};
use crate::model::session_manager::SessionManager;
use crate::model::ui_state::{Notification, ViewState};

/// One formatted table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowSnapshot {
    pub name: CompactString,
    pub kind: EntryKind,
    pub permissions: String,
    pub size: String,
    pub modified: String,
    pub marked: bool,
}

impl RowSnapshot {
    fn from_entry(entry: &Entry, time_format: &str, marked: bool) -> Self {
        Self {
            name: entry.display_name(),
            kind: entry.kind,
            permissions: entry.permission_string(),
            size: entry.size_class(),
            modified: entry.format_modified(time_format),
            marked,
        }
    }
}

/// One entry of the session strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSnapshot {
    pub id: SessionId,
    pub label: CompactString,
    pub active: bool,
}

/// Text entry overlay contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSnapshot {
    pub title: CompactString,
    pub input: String,
    /// Cursor position in chars.
    pub cursor: usize,
}

/// Everything one frame shows.
#[derive(Debug, Clone, Default)]
pub struct UiSnapshot {
    /// Directory of the visible session.
    pub title: CompactString,
    pub rows: Vec<RowSnapshot>,
    pub cursor: Option<usize>,
    pub tabs: Vec<TabSnapshot>,
    pub show_dotfiles: bool,
    pub marked: usize,
    pub notification: Option<Notification>,
    pub prompt: Option<PromptSnapshot>,
}

impl UiSnapshot {
    #[must_use]
    pub fn capture(
        manager: &SessionManager,
        active: Option<SessionId>,
        views: &HashMap<SessionId, ViewState>,
        time_format: &str,
        notification: Option<&Notification>,
    ) -> Self {
        let tabs: Vec<TabSnapshot> = manager
            .sessions()
            .map(|session| TabSnapshot {
                id: session.id(),
                label: tab_label(session),
                active: Some(session.id()) == active,
            })
            .collect();

        let mut snapshot: Self = Self {
            tabs,
            notification: notification.cloned(),
            ..Self::default()
        };

        let Some(session) = active.and_then(|id| manager.session(id)) else {
            return snapshot;
        };
        let view: Option<&ViewState> = views.get(&session.id());

        snapshot.title = CompactString::new(session.current_path().to_string_lossy());
        snapshot.show_dotfiles = session.show_dotfiles();
        snapshot.rows = session
            .entries()
            .iter()
            .map(|entry| {
                let marked: bool = view.is_some_and(|v| v.marked.contains(&entry.name));
                RowSnapshot::from_entry(entry, time_format, marked)
            })
            .collect();
        snapshot.marked = snapshot.rows.iter().filter(|r| r.marked).count();
        snapshot.cursor = if snapshot.rows.is_empty() {
            None
        } else {
            Some(view.map_or(0, |v| v.cursor))
        };

        snapshot
    }

    /// Copy of `self` with the text entry overlay on top.
    #[must_use]
    pub fn with_prompt(&self, prompt: PromptSnapshot) -> Self {
        Self {
            prompt: Some(prompt),
            ..self.clone()
        }
    }
}

fn tab_label(session: &Session) -> CompactString {
    match session.current_path().file_name() {
        Some(name) => CompactString::new(name.to_string_lossy()),
        None => CompactString::new(session.current_path().to_string_lossy()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::session_manager::ManagerSettings;
    use std::path::Path;

    #[tokio::test]
    async fn capture_formats_visible_session() -> anyhow::Result<()> {
        let tmp = tempfile::TempDir::new()?;
        let root = std::fs::canonicalize(tmp.path())?;
        std::fs::create_dir(root.join("sub"))?;
        std::fs::write(root.join("a.txt"), b"0123456789")?;

        let mut manager = SessionManager::new(ManagerSettings::default());
        let first = manager.open_session(&root, Path::new("/")).await?;
        let second = manager.open_session(&root.join("sub"), Path::new("/")).await?;

        let mut views = HashMap::new();
        if let Some(session) = manager.session(first) {
            let mut view = ViewState::for_session(session);
            view.marked.insert(CompactString::new("a.txt"));
            views.insert(first, view);
        }

        let snap = UiSnapshot::capture(&manager, Some(first), &views, "%Y", None);
        assert_eq!(snap.title, root.to_string_lossy());
        assert_eq!(snap.rows.len(), 2);
        assert_eq!(snap.rows[1].name, "a.txt");
        assert_eq!(snap.rows[1].size, "10 B");
        assert!(snap.rows[1].marked);
        assert_eq!(snap.marked, 1);
        assert_eq!(snap.cursor, Some(0));

        let labels: Vec<(SessionId, bool)> = snap.tabs.iter().map(|t| (t.id, t.active)).collect();
        assert_eq!(labels, [(first, true), (second, false)]);
        assert_eq!(snap.tabs[1].label, "sub");

        let empty = UiSnapshot::capture(&manager, Some(second), &HashMap::new(), "%Y", None);
        assert!(empty.rows.is_empty());
        assert_eq!(empty.cursor, None);
        Ok(())
    }
}
