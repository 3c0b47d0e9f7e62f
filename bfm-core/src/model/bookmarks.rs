//! ``src/model/bookmarks.rs``
//!
//! Fixed, ordered list of directory shortcuts. Bookmark commands carry an
//! index into it; an index past the end is simply ignored.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bookmarks {
    paths: Vec<PathBuf>,
}

impl Bookmarks {
    #[must_use]
    pub const fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// Bounds-checked lookup.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_bounds_checked() {
        let marks = Bookmarks::new(vec![PathBuf::from("/"), PathBuf::from("/var/tmp")]);

        assert_eq!(marks.get(0), Some(Path::new("/")));
        assert_eq!(marks.get(1), Some(Path::new("/var/tmp")));
        assert_eq!(marks.get(2), None);
        assert_eq!(marks.get(usize::MAX), None);
        assert_eq!(marks.len(), 2);
    }
}
