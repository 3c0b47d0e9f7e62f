//! ``src/fs/sorter.rs``
//!
//! Listing order: directories first, then names compared case-insensitively
//! with the raw bytes as tie-break so equal-ignoring-case names still have a
//! fixed order.

use std::cmp::Ordering;

use crate::fs::entry::Entry;

/// Total order over entries.
#[must_use]
pub fn compare_entries(a: &Entry, b: &Entry) -> Ordering {
    match (a.is_dir(), b.is_dir()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => compare_names(&a.name, &b.name),
    }
}

/// Case-insensitive name order with a byte-wise tie-break.
#[must_use]
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let folded_a = a.chars().flat_map(char::to_lowercase);
    let folded_b = b.chars().flat_map(char::to_lowercase);

    folded_a
        .cmp(folded_b)
        .then_with(|| a.as_bytes().cmp(b.as_bytes()))
}

/// Stable in-place sort.
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(compare_entries);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::entry::EntryKind;
    use compact_str::CompactString;
    use std::time::UNIX_EPOCH;

    fn entry(name: &str, kind: EntryKind) -> Entry {
        Entry {
            name: CompactString::new(name),
            file_name: name.into(),
            kind,
            size: 0,
            mode: 0o644,
            modified: UNIX_EPOCH,
        }
    }

    fn sample() -> Vec<Entry> {
        vec![
            entry("b.txt", EntryKind::Regular),
            entry("Zeta", EntryKind::Directory),
            entry("A.txt", EntryKind::Regular),
            entry(".hidden", EntryKind::Regular),
            entry("alpha", EntryKind::Directory),
            entry("a.txt", EntryKind::Regular),
            entry("link", EntryKind::Symlink),
        ]
    }

    fn names(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn directories_first_then_case_insensitive_names() {
        let mut entries = sample();
        sort_entries(&mut entries);

        assert_eq!(
            names(&entries),
            ["alpha", "Zeta", ".hidden", "A.txt", "a.txt", "b.txt", "link"]
        );

        let first_file = entries.iter().position(|e| !e.is_dir()).unwrap();
        assert!(entries[..first_file].iter().all(Entry::is_dir));
        assert!(entries[first_file..].iter().all(|e| !e.is_dir()));
    }

    #[test]
    fn sorting_is_idempotent() {
        let mut once = sample();
        sort_entries(&mut once);
        let mut twice = once.clone();
        sort_entries(&mut twice);

        assert_eq!(once, twice);
    }

    #[test]
    fn comparator_is_antisymmetric() {
        let entries = sample();
        for a in &entries {
            for b in &entries {
                assert_eq!(compare_entries(a, b), compare_entries(b, a).reverse());
            }
            assert_eq!(compare_entries(a, a), Ordering::Equal);
        }
    }

    #[test]
    fn tie_break_is_bytewise() {
        assert_eq!(compare_names("README", "readme"), Ordering::Less);
        assert_eq!(compare_names("readme", "README"), Ordering::Greater);
        assert_eq!(compare_names("a", "B"), Ordering::Less);
    }
}
