//! ``src/fs/resolver.rs``
//!
//! # Path resolution with ancestor fallback
//!
//! Turns whatever the user asked for into a directory that can actually be
//! listed. Relative requests are joined onto the session's own path (the
//! process working directory is never touched) and canonicalized, which
//! resolves symlinks before `..`. A path that does not exist is replaced by
//! its closest existing ancestor. If the result cannot be opened as a
//! directory the resolver climbs one component at a time until something
//! opens or the root itself fails.

use std::path::{Component, Path, PathBuf};

use directories::BaseDirs;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::AppError;

/// Outcome of a successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Canonical, openable directory.
    pub path: PathBuf,
    /// How many trailing components were dropped to get there.
    pub climbed: usize,
}

/// Resolve `requested` against `base` and fall back to the nearest openable
/// ancestor.
///
/// # Errors
/// [`AppError::Unresolvable`] when even the filesystem root cannot be opened.
pub async fn resolve(requested: &Path, base: &Path) -> Result<Resolved, AppError> {
    let expanded: PathBuf = expand_home(requested);
    let joined: PathBuf = if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    };

    let (mut candidate, mut climbed) = canonical_ancestor(&joined).await;

    loop {
        match fs::read_dir(&candidate).await {
            Ok(_) => {
                debug!(
                    marker = "PATH_RESOLVED",
                    requested = %requested.display(),
                    resolved = %candidate.display(),
                    climbed,
                    "Resolved directory"
                );
                return Ok(Resolved {
                    path: candidate,
                    climbed,
                });
            }

            Err(e) => {
                warn!("{}: {}", candidate.display(), e);

                // Parents of a canonical path are canonical.
                match candidate.parent() {
                    Some(parent) => {
                        candidate = parent.to_path_buf();
                        climbed += 1;
                    }
                    None => return Err(AppError::unresolvable(&joined, candidate)),
                }
            }
        }
    }
}

/// Canonicalize `joined`, or the closest ancestor of it that exists, so
/// symlinks are resolved before any `..` is applied. Paths with no existing
/// ancestor at all are only normalized lexically.
async fn canonical_ancestor(joined: &Path) -> (PathBuf, usize) {
    for (climbed, ancestor) in joined.ancestors().enumerate() {
        if ancestor.as_os_str().is_empty() {
            break;
        }

        match fs::canonicalize(ancestor).await {
            Ok(canonical) => return (canonical, climbed),
            Err(e) => debug!("{}: {}", ancestor.display(), e),
        }
    }

    (normalize_lexically(joined), 0)
}

/// Replace a leading `~` component with the user's home directory.
#[must_use]
pub fn expand_home(path: &Path) -> PathBuf {
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };

    match BaseDirs::new() {
        Some(dirs) => dirs.home_dir().join(rest),
        None => path.to_path_buf(),
    }
}

/// Collapse `.` and `..` without touching the filesystem. `..` at the root
/// stays at the root.
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out: PathBuf = PathBuf::new();

    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                out.push(component.as_os_str());
            }

            Component::CurDir => {}

            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> std::io::Result<(TempDir, PathBuf)> {
        let tmp = TempDir::new()?;
        let root = std::fs::canonicalize(tmp.path())?;
        std::fs::create_dir(root.join("sub"))?;
        std::fs::write(root.join("a.txt"), b"0123456789")?;
        Ok((tmp, root))
    }

    #[tokio::test]
    async fn existing_directory_resolves_to_itself() -> anyhow::Result<()> {
        let (_tmp, root) = fixture()?;

        let resolved = resolve(&root.join("sub"), Path::new("/")).await?;
        assert_eq!(resolved.path, root.join("sub"));
        assert_eq!(resolved.climbed, 0);
        Ok(())
    }

    #[tokio::test]
    async fn relative_request_uses_session_path() -> anyhow::Result<()> {
        let (_tmp, root) = fixture()?;

        let up = resolve(Path::new(".."), &root.join("sub")).await?;
        assert_eq!(up.path, root);

        let down = resolve(Path::new("./sub/."), &root).await?;
        assert_eq!(down.path, root.join("sub"));
        Ok(())
    }

    #[tokio::test]
    async fn missing_path_climbs_to_nearest_ancestor() -> anyhow::Result<()> {
        let (_tmp, root) = fixture()?;

        let resolved = resolve(&root.join("sub/x/y/z"), &root).await?;
        assert_eq!(resolved.path, root.join("sub"));
        assert_eq!(resolved.climbed, 3);
        Ok(())
    }

    #[tokio::test]
    async fn regular_file_falls_back_to_its_directory() -> anyhow::Result<()> {
        let (_tmp, root) = fixture()?;

        let resolved = resolve(Path::new("a.txt"), &root).await?;
        assert_eq!(resolved.path, root);
        assert_eq!(resolved.climbed, 1);
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn parent_of_symlink_is_the_target_parent() -> anyhow::Result<()> {
        let (_tmp, root) = fixture()?;
        std::fs::create_dir_all(root.join("real/deep"))?;
        std::fs::create_dir(root.join("other"))?;
        std::os::unix::fs::symlink(root.join("real/deep"), root.join("other/link"))?;

        let up = resolve(Path::new("other/link/.."), &root).await?;
        assert_eq!(up.path, root.join("real"));
        assert_eq!(up.climbed, 0);

        let missing = resolve(Path::new("other/link/../gone"), &root).await?;
        assert_eq!(missing.path, root.join("real"));
        assert_eq!(missing.climbed, 1);
        Ok(())
    }

    #[tokio::test]
    async fn fallback_stops_at_root_within_depth() -> anyhow::Result<()> {
        let requested = Path::new("/bfm-does-not-exist/x/y");

        let resolved = resolve(requested, Path::new("/")).await?;
        assert_eq!(resolved.path, PathBuf::from("/"));
        assert!(resolved.climbed <= requested.components().count() - 1);
        Ok(())
    }

    #[test]
    fn lexical_normalization() {
        assert_eq!(normalize_lexically(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize_lexically(Path::new("/../..")), PathBuf::from("/"));
        assert_eq!(normalize_lexically(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn home_expansion_only_touches_leading_tilde() {
        assert_eq!(expand_home(Path::new("/x/~")), PathBuf::from("/x/~"));
        assert_eq!(expand_home(Path::new("~user")), PathBuf::from("~user"));

        if let Some(dirs) = BaseDirs::new() {
            assert_eq!(expand_home(Path::new("~/docs")), dirs.home_dir().join("docs"));
        }
    }
}
