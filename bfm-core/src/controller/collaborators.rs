//! ``src/controller/collaborators.rs``
//!
//! # Seams to the outside world
//!
//! The navigation engine never draws a dialog or forks a process itself. It
//! asks a [`TextEntry`] for free text and hands external actions to a
//! [`Launcher`]. The terminal front end and the tests each provide their own
//! implementations.

use std::fmt;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::AppError;
use crate::model::session::SessionId;

/// Modal single-line text input.
#[async_trait]
pub trait TextEntry: Send {
    /// Ask for a line of text. `None` means the user cancelled.
    async fn request_text(&mut self, title: &str, initial: Option<&str>) -> Option<String>;
}

/// Which configured action a launch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaunchPurpose {
    Open,
    Remove,
    DirExec,
}

impl fmt::Display for LaunchPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Open => "open",
            Self::Remove => "remove",
            Self::DirExec => "exec",
        })
    }
}

/// An external program to run as `argv... target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub session: SessionId,
    pub purpose: LaunchPurpose,
    pub argv: Vec<String>,
    /// Appended as the last argument and exported as `BFM_PATH`.
    pub target: PathBuf,
    /// Working directory of the child: the session's directory.
    pub workdir: PathBuf,
}

impl LaunchRequest {
    /// Human readable command line for logs and errors.
    #[must_use]
    pub fn command_line(&self) -> String {
        let mut line: String = self.argv.join(" ");
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&self.target.to_string_lossy());
        line
    }
}

/// Starts external programs without blocking the caller.
pub trait Launcher: Send + Sync {
    fn launch(&self, request: LaunchRequest);
}

/// Completion notice for a launched program.
#[derive(Debug)]
pub struct LaunchReport {
    pub request: LaunchRequest,
    pub result: Result<(), AppError>,
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory collaborators for driving the engine from tests.

    use std::collections::VecDeque;

    use async_trait::async_trait;
    use parking_lot::Mutex;

    use super::{LaunchRequest, Launcher, TextEntry};

    /// Replies with a scripted sequence; cancels once the script runs out.
    #[derive(Debug, Default)]
    pub struct ScriptedEntry {
        replies: VecDeque<Option<String>>,
        pub prompts: Vec<(String, Option<String>)>,
    }

    impl ScriptedEntry {
        pub fn new<I, S>(replies: I) -> Self
        where
            I: IntoIterator<Item = Option<S>>,
            S: Into<String>,
        {
            Self {
                replies: replies.into_iter().map(|r| r.map(Into::into)).collect(),
                prompts: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl TextEntry for ScriptedEntry {
        async fn request_text(&mut self, title: &str, initial: Option<&str>) -> Option<String> {
            self.prompts
                .push((title.to_string(), initial.map(str::to_string)));
            self.replies.pop_front().flatten()
        }
    }

    /// Records every request and runs nothing.
    #[derive(Debug, Default)]
    pub struct RecordingLauncher {
        requests: Mutex<Vec<LaunchRequest>>,
    }

    impl RecordingLauncher {
        pub fn requests(&self) -> Vec<LaunchRequest> {
            self.requests.lock().clone()
        }
    }

    impl Launcher for RecordingLauncher {
        fn launch(&self, request: LaunchRequest) {
            self.requests.lock().push(request);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_appends_target() {
        let request = LaunchRequest {
            session: SessionId(1),
            purpose: LaunchPurpose::Remove,
            argv: vec!["rm".into(), "-rf".into()],
            target: PathBuf::from("/tmp/x y"),
            workdir: PathBuf::from("/tmp"),
        };
        assert_eq!(request.command_line(), "rm -rf /tmp/x y");

        let bare = LaunchRequest {
            argv: Vec::new(),
            ..request
        };
        assert_eq!(bare.command_line(), "/tmp/x y");
    }
}
