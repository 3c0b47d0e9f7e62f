//! src/config.rs
//! ============================================================================
//! # Config: user settings loaded from TOML
//!
//! Read once at startup from `config.toml` in the platform config directory
//! (via [`directories`](https://docs.rs/directories)) or from an explicit
//! `--config` path. A missing default file means built-in defaults; the file
//! is never written back.
//!
//! ```toml
//! show_dotfiles = false
//! time_format = "%Y/%m/%d %H:%M:%S"
//! poll_interval = 15
//! bookmarks = ["/", "/var/tmp", "~"]
//!
//! [commands]
//! open = ["xdg-open"]
//! remove = ["rm", "-rf"]
//! terminal = ["st"]
//!
//! [[keys]]
//! key = "ctrl+r"
//! command = "reload"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use chrono::format::{Item, StrftimeItems};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use tokio::fs as TokioFs;
use tracing::info;

use crate::controller::keymap::{BindingSpec, Keymap};
use crate::error::AppError;
use crate::fs::resolver::expand_home;
use crate::model::bookmarks::Bookmarks;
use crate::model::session_manager::ManagerSettings;

pub const DEFAULT_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";
pub const DEFAULT_POLL_SECS: u64 = 15;

/// Argument prefixes for the external actions. The target path is appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandTemplates {
    /// Run on a selected non-directory.
    pub open: Vec<String>,

    /// Run once per removed entry.
    pub remove: Vec<String>,

    /// Bound to F4 in the default keymap.
    pub terminal: Vec<String>,
}

impl Default for CommandTemplates {
    fn default() -> Self {
        Self {
            open: vec!["xdg-open".to_string()],
            remove: vec!["rm".to_string(), "-rf".to_string()],
            terminal: vec!["st".to_string()],
        }
    }
}

/// Main configuration struct for the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dotfile visibility of new sessions.
    pub show_dotfiles: bool,

    /// `strftime` pattern for the Modified column.
    pub time_format: String,

    /// Seconds between staleness checks.
    pub poll_interval: u64,

    /// Bookmark targets, addressed by position. `~` expands to home.
    pub bookmarks: Vec<PathBuf>,

    pub commands: CommandTemplates,

    /// Replaces the built-in keymap entirely when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<BindingSpec>>,
}

impl Default for Config {
    fn default() -> Self {
        let mut bookmarks: Vec<PathBuf> = vec![PathBuf::from("/"), PathBuf::from("/var/tmp")];
        if let Some(dirs) = BaseDirs::new() {
            bookmarks.push(dirs.home_dir().to_path_buf());
        }

        Self {
            show_dotfiles: false,
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            poll_interval: DEFAULT_POLL_SECS,
            bookmarks,
            commands: CommandTemplates::default(),
            keys: None,
        }
    }
}

impl Config {
    /// Load from `explicit`, or from the default location.
    ///
    /// A missing file at the default location yields defaults; a missing
    /// explicit file is an error.
    pub async fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        let path: PathBuf = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = Self::config_path()?;
                if !TokioFs::try_exists(&path).await.unwrap_or(false) {
                    info!(
                        "No config file found at {}, using default configuration",
                        path.display()
                    );
                    return Ok(Self::default());
                }
                path
            }
        };

        Self::load_from(&path).await
    }

    /// Parse and validate the file at `path`.
    pub async fn load_from(path: &Path) -> anyhow::Result<Self> {
        info!("Loading config from {}", path.display());

        let text: String = TokioFs::read_to_string(path)
            .await
            .map_err(|source| AppError::ConfigIo {
                path: path.to_path_buf(),
                source,
            })?;

        let cfg: Self = Self::from_toml_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        Ok(cfg)
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, AppError> {
        let cfg: Self = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.poll_interval == 0 {
            return Err(AppError::invalid_input(
                "poll_interval",
                "must be at least 1 second",
            ));
        }

        if StrftimeItems::new(&self.time_format).any(|item| matches!(item, Item::Error)) {
            return Err(AppError::invalid_input(
                "time_format",
                format!("`{}` is not a valid strftime pattern", self.time_format),
            ));
        }

        for (field, argv) in [
            ("commands.open", &self.commands.open),
            ("commands.remove", &self.commands.remove),
            ("commands.terminal", &self.commands.terminal),
        ] {
            if argv.first().is_none_or(String::is_empty) {
                return Err(AppError::invalid_input(field, "needs a program name"));
            }
        }

        self.keymap().map(drop)
    }

    #[must_use]
    pub const fn poll_duration(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    /// The configured keymap, or the built-in one.
    pub fn keymap(&self) -> Result<Keymap, AppError> {
        match &self.keys {
            Some(specs) => Keymap::from_specs(specs),
            None => Ok(Keymap::defaults(&self.commands)),
        }
    }

    #[must_use]
    pub fn manager_settings(&self) -> ManagerSettings {
        let bookmarks: Vec<PathBuf> = self
            .bookmarks
            .iter()
            .map(PathBuf::as_path)
            .map(expand_home)
            .collect();

        ManagerSettings {
            show_dotfiles: self.show_dotfiles,
            bookmarks: Bookmarks::new(bookmarks),
            commands: self.commands.clone(),
        }
    }

    fn project_dirs() -> anyhow::Result<ProjectDirs> {
        ProjectDirs::from("org", "bfm", "bfm")
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory."))
    }

    /// Returns the canonical config file path using `directories::ProjectDirs`.
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Where log files go.
    pub fn log_dir() -> anyhow::Result<PathBuf> {
        Ok(Self::project_dirs()?.data_local_dir().join("logs"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::actions::Command;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() -> Result<(), AppError> {
        let cfg = Config::default();
        cfg.validate()?;

        assert_eq!(cfg.time_format, DEFAULT_TIME_FORMAT);
        assert_eq!(cfg.poll_duration(), Duration::from_secs(15));
        assert_eq!(cfg.bookmarks[0], PathBuf::from("/"));
        assert_eq!(cfg.bookmarks[1], PathBuf::from("/var/tmp"));
        assert!(!cfg.show_dotfiles);
        Ok(())
    }

    #[test]
    fn partial_file_keeps_other_defaults() -> Result<(), AppError> {
        let cfg = Config::from_toml_str(
            r#"
            show_dotfiles = true
            bookmarks = ["/srv", "~/src"]

            [commands]
            open = ["~/bin/exec_rifle"]
            "#,
        )?;

        assert!(cfg.show_dotfiles);
        assert_eq!(cfg.poll_interval, DEFAULT_POLL_SECS);
        assert_eq!(cfg.commands.open, ["~/bin/exec_rifle"]);
        assert_eq!(cfg.commands.remove, CommandTemplates::default().remove);

        let settings = cfg.manager_settings();
        assert_eq!(settings.bookmarks.len(), 2);
        assert_eq!(settings.bookmarks.get(0), Some(Path::new("/srv")));
        Ok(())
    }

    #[test]
    fn keys_section_replaces_default_keymap() -> Result<(), AppError> {
        let cfg = Config::from_toml_str(
            r#"
            [[keys]]
            key = "ctrl+r"
            command = "reload"

            [[keys]]
            key = "f7"
            command = "make_directory"

            [[keys]]
            key = "ctrl+4"
            command = "bookmark"
            index = 3

            [[keys]]
            key = "f4"
            command = "dir_exec"
            argv = ["alacritty"]
            "#,
        )?;

        let keymap = cfg.keymap()?;
        let commands: Vec<&Command> = keymap.bindings().iter().map(|b| &b.command).collect();
        assert_eq!(
            commands,
            [
                &Command::Reload,
                &Command::MakeDirectory { mode: 0o755 },
                &Command::Bookmark { index: 3 },
                &Command::DirExec {
                    argv: vec!["alacritty".to_string()]
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(Config::from_toml_str("poll_interval = 0").is_err());
        assert!(Config::from_toml_str(r#"time_format = "%Y %Q""#).is_err());
        assert!(Config::from_toml_str("[commands]\nremove = []").is_err());
        assert!(Config::from_toml_str("[[keys]]\nkey = \"hyper+x\"\ncommand = \"quit\"").is_err());
        assert!(Config::from_toml_str("show_dotfiles = \"yes\"").is_err());
    }

    #[test]
    fn printed_config_parses_back() -> anyhow::Result<()> {
        let cfg = Config::default();
        let text = cfg.to_toml_string()?;
        assert_eq!(Config::from_toml_str(&text)?, cfg);
        Ok(())
    }

    #[tokio::test]
    async fn explicit_file_must_exist() -> anyhow::Result<()> {
        let tmp = TempDir::new()?;
        let path = tmp.path().join("config.toml");

        assert!(Config::load(Some(&path)).await.is_err());

        std::fs::write(&path, "poll_interval = 30\n")?;
        let cfg = Config::load(Some(&path)).await?;
        assert_eq!(cfg.poll_interval, 30);
        Ok(())
    }
}
