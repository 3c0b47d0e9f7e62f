//! src/model/ui_state.rs
//! ============================================================================
//! # UI state: cursor, marks and notifications
//!
//! Presentation-only state kept next to each session. The navigation engine
//! never reads it; the event loop reconciles it after every rebuild so the
//! cursor stays on the same entry when that entry still exists.

use std::collections::BTreeSet;
use std::path::PathBuf;

use compact_str::CompactString;

use crate::controller::actions::Motion;
use crate::fs::entry::Entry;
use crate::model::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NotificationLevel {
    Warning,
    Error,
}

/// One line of feedback shown in the status bar until the next key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: CompactString,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn warning(message: impl Into<CompactString>) -> Self {
        Self {
            message: message.into(),
            level: NotificationLevel::Warning,
        }
    }

    pub fn error(message: impl Into<CompactString>) -> Self {
        Self {
            message: message.into(),
            level: NotificationLevel::Error,
        }
    }
}

/// Cursor and marks of one session.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub cursor: usize,
    pub marked: BTreeSet<CompactString>,

    /// Directory the cursor and marks refer to.
    path: PathBuf,

    /// Name under the cursor, used to find it again after a rescan.
    anchor: Option<CompactString>,
}

impl ViewState {
    #[must_use]
    pub fn for_session(session: &Session) -> Self {
        let mut view = Self {
            path: session.current_path().to_path_buf(),
            ..Self::default()
        };
        view.remember(session);
        view
    }

    /// Bring cursor and marks in line with a freshly committed listing.
    pub fn reconcile(&mut self, session: &Session) {
        let entries: &[Entry] = session.entries();

        if session.current_path() != self.path {
            self.path = session.current_path().to_path_buf();
            self.cursor = 0;
            self.marked.clear();
        } else {
            if let Some(index) = self
                .anchor
                .as_ref()
                .and_then(|name| entries.iter().position(|e| &e.name == name))
            {
                self.cursor = index;
            }
            self.marked
                .retain(|name| entries.iter().any(|e| &e.name == name));
        }

        self.cursor = self.cursor.min(entries.len().saturating_sub(1));
        self.remember(session);
    }

    pub fn move_cursor(&mut self, motion: Motion, session: &Session, page: usize) {
        let last: usize = session.entries().len().saturating_sub(1);
        let page: usize = page.max(1);

        self.cursor = match motion {
            Motion::Up => self.cursor.saturating_sub(1),
            Motion::Down => self.cursor.saturating_add(1),
            Motion::PageUp => self.cursor.saturating_sub(page),
            Motion::PageDown => self.cursor.saturating_add(page),
            Motion::Home => 0,
            Motion::End => last,
        }
        .min(last);

        self.remember(session);
    }

    #[must_use]
    pub fn selected<'a>(&self, session: &'a Session) -> Option<&'a Entry> {
        session.entries().get(self.cursor)
    }

    /// Flip the mark under the cursor and step down.
    pub fn toggle_mark(&mut self, session: &Session) {
        let Some(entry) = self.selected(session) else {
            return;
        };

        if !self.marked.remove(&entry.name) {
            self.marked.insert(entry.name.clone());
        }
        self.move_cursor(Motion::Down, session, 1);
    }

    /// Marked names in listing order, or the cursor entry when nothing is
    /// marked.
    #[must_use]
    pub fn targets(&self, session: &Session) -> Vec<CompactString> {
        if self.marked.is_empty() {
            return self
                .selected(session)
                .map(|e| vec![e.name.clone()])
                .unwrap_or_default();
        }

        session
            .entries()
            .iter()
            .filter(|e| self.marked.contains(&e.name))
            .map(|e| e.name.clone())
            .collect()
    }

    fn remember(&mut self, session: &Session) {
        self.anchor = self.selected(session).map(|e| e.name.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::entry::EntryKind;
    use crate::model::session::SessionId;
    use std::time::UNIX_EPOCH;

    fn session(path: &str, names: &[&str]) -> Session {
        let mut session = Session::new(SessionId(1), false);
        let entries = names
            .iter()
            .map(|name| Entry {
                name: CompactString::new(name),
                file_name: name.into(),
                kind: EntryKind::Regular,
                size: 0,
                mode: 0o644,
                modified: UNIX_EPOCH,
            })
            .collect();
        session.commit(PathBuf::from(path), UNIX_EPOCH, entries);
        session
    }

    #[test]
    fn cursor_is_clamped() {
        let s = session("/d", &["a", "b", "c"]);
        let mut view = ViewState::for_session(&s);

        view.move_cursor(Motion::Up, &s, 10);
        assert_eq!(view.cursor, 0);
        view.move_cursor(Motion::PageDown, &s, 10);
        assert_eq!(view.cursor, 2);
        view.move_cursor(Motion::Down, &s, 10);
        assert_eq!(view.cursor, 2);
        view.move_cursor(Motion::Home, &s, 10);
        assert_eq!(view.cursor, 0);

        let empty = session("/e", &[]);
        let mut view = ViewState::for_session(&empty);
        view.move_cursor(Motion::End, &empty, 10);
        assert_eq!(view.cursor, 0);
        assert!(view.selected(&empty).is_none());
    }

    #[test]
    fn rescan_keeps_cursor_on_same_entry() {
        let before = session("/d", &["b", "c", "d"]);
        let mut view = ViewState::for_session(&before);
        view.move_cursor(Motion::End, &before, 1);
        view.marked.insert(CompactString::new("b"));
        view.marked.insert(CompactString::new("c"));

        let after = session("/d", &["a", "b", "d"]);
        view.reconcile(&after);
        assert_eq!(view.selected(&after).map(|e| e.name.as_str()), Some("d"));
        assert_eq!(view.marked.len(), 1);
        assert!(view.marked.contains("b"));
    }

    #[test]
    fn new_directory_resets_view() {
        let before = session("/d", &["a", "b"]);
        let mut view = ViewState::for_session(&before);
        view.toggle_mark(&before);
        assert_eq!(view.cursor, 1);

        let elsewhere = session("/other", &["a", "b"]);
        view.reconcile(&elsewhere);
        assert_eq!(view.cursor, 0);
        assert!(view.marked.is_empty());
    }

    #[test]
    fn targets_prefer_marks_in_listing_order() {
        let s = session("/d", &["a", "b", "c"]);
        let mut view = ViewState::for_session(&s);
        assert_eq!(view.targets(&s), ["a"]);

        view.marked.insert(CompactString::new("c"));
        view.marked.insert(CompactString::new("a"));
        assert_eq!(view.targets(&s), ["a", "c"]);

        view.toggle_mark(&s);
        assert_eq!(view.targets(&s), ["c"]);
    }
}
