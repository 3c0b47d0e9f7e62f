//! src/controller/actions.rs
//! ============================================================================
//! # Commands: what a key binding can ask for
//!
//! A closed set of command variants, each carrying its static argument.
//! Bindings are matched by [`crate::controller::keymap::Keymap`] and the
//! resulting commands are executed through one explicit `match` in the event
//! loop.

use serde::{Deserialize, Serialize};

/// Cursor movement within the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Motion {
    Up,
    Down,
    PageUp,
    PageDown,
    Home,
    End,
}

pub const DEFAULT_DIR_MODE: u32 = 0o755;

const fn default_dir_mode() -> u32 {
    DEFAULT_DIR_MODE
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Move the cursor.
    MoveCursor { motion: Motion },

    /// Open another session at the current path.
    NewSession,

    /// Close the visible session.
    CloseSession,

    /// Show the next open session.
    CycleSession,

    /// Close every session.
    Quit,

    /// Flip dotfile visibility and rescan.
    ToggleDotfiles,

    /// Navigate to a fixed path (relative paths resolve against the session).
    SetPath { path: String },

    /// Ask for a path, then navigate.
    PromptPath,

    /// Rescan the current directory.
    Reload,

    /// Jump to the bookmark at `index`.
    Bookmark { index: usize },

    /// Ask for a name and create a directory with `mode`.
    MakeDirectory {
        #[serde(default = "default_dir_mode")]
        mode: u32,
    },

    /// Run the remove action on the marked entries (or the cursor entry).
    Remove,

    /// Enter the cursor entry, or open it when it is not a directory.
    Activate,

    /// Toggle the mark on the cursor entry.
    ToggleMark,

    /// Run `argv` with the current directory appended.
    DirExec { argv: Vec<String> },
}

impl Command {
    /// Short label for logs and the help line.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::MoveCursor { .. } => "move",
            Self::NewSession => "new session",
            Self::CloseSession => "close session",
            Self::CycleSession => "next session",
            Self::Quit => "quit",
            Self::ToggleDotfiles => "dotfiles",
            Self::SetPath { .. } => "go to",
            Self::PromptPath => "path",
            Self::Reload => "reload",
            Self::Bookmark { .. } => "bookmark",
            Self::MakeDirectory { .. } => "mkdir",
            Self::Remove => "remove",
            Self::Activate => "open",
            Self::ToggleMark => "mark",
            Self::DirExec { .. } => "exec",
        }
    }
}
