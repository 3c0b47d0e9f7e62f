pub mod error;

pub mod config;

pub mod controller {
    pub mod actions;
    pub use actions::{Command, Motion};

    pub mod collaborators;
    pub use collaborators::{LaunchPurpose, LaunchReport, LaunchRequest, Launcher, TextEntry};

    pub mod event_loop;
    pub use event_loop::EventLoop;

    pub mod keymap;
    pub use keymap::{BindingSpec, KeyBinding, Keymap};

    pub mod launcher;
    pub use launcher::ProcessLauncher;

    pub mod monitor;
    pub use monitor::StalenessMonitor;

    pub mod prompt;
}

pub mod model {
    pub mod bookmarks;
    pub use bookmarks::Bookmarks;

    pub mod session;
    pub use session::{Session, SessionId};

    pub mod session_manager;
    pub use session_manager::{Lifecycle, ManagerSettings, Outcome, SessionManager};

    pub mod ui_state;
    pub use ui_state::{Notification, NotificationLevel, ViewState};
}

pub mod view {
    pub mod snapshots;
    pub use snapshots::*;

    pub mod theme;

    pub mod ui;

    pub mod components {
        pub mod input_prompt_overlay;
        pub use input_prompt_overlay::InputPromptOverlay;
        pub mod object_table;
        pub use object_table::FileTable;
        pub mod status_bar;
        pub use status_bar::{SessionStrip, StatusBar};
    }
}

pub mod fs {
    pub mod dir_scanner;
    pub mod entry;
    pub mod resolver;
    pub mod sorter;
}

pub mod logging;
pub use logging::LoggerBuilder;

pub mod util {
    pub mod humanize;
}

pub use config::Config;
pub use error::AppError;
