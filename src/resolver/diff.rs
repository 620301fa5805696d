//! State diffing between two resolutions.

use std::fmt;

use crate::core::library::LibraryRecord;
use crate::resolver::Resolution;

/// Why a library is (re-)fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchReason {
    /// Not in the previous resolution
    New,
    /// Recorded with different fields
    Changed,
    /// Recorded unchanged, but its install directory is gone
    Missing,
}

impl fmt::Display for FetchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchReason::New => write!(f, "new"),
            FetchReason::Changed => write!(f, "changed"),
            FetchReason::Missing => write!(f, "missing"),
        }
    }
}

/// A library scheduled for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedFetch {
    pub record: LibraryRecord,
    pub reason: FetchReason,
}

/// The side effects needed to go from one resolution to another.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateDiff {
    /// Previously installed, no longer declared (previous order)
    pub to_remove: Vec<LibraryRecord>,

    /// New, changed or missing on disk (merge order)
    pub to_fetch: Vec<PlannedFetch>,

    /// Recorded and present (merge order)
    pub unchanged: Vec<LibraryRecord>,
}

impl StateDiff {
    /// Nothing to remove or fetch.
    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_fetch.is_empty()
    }
}

/// Compare the merged resolution with the previous one.
///
/// `exists` reports whether a library's install directory is present.
pub fn diff<F>(new: &Resolution, old: &Resolution, exists: F) -> StateDiff
where
    F: Fn(&LibraryRecord) -> bool,
{
    let to_remove = old
        .iter()
        .filter(|record| !new.contains(&record.name))
        .cloned()
        .collect();

    let mut to_fetch = Vec::new();
    let mut unchanged = Vec::new();

    for record in new {
        let reason = match old.get(&record.name) {
            None => Some(FetchReason::New),
            Some(previous) if previous != record => Some(FetchReason::Changed),
            Some(_) if !exists(record) => Some(FetchReason::Missing),
            Some(_) => None,
        };

        match reason {
            Some(reason) => to_fetch.push(PlannedFetch {
                record: record.clone(),
                reason,
            }),
            None => unchanged.push(record.clone()),
        }
    }

    StateDiff {
        to_remove,
        to_fetch,
        unchanged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lib(name: &str, url: &str) -> LibraryRecord {
        LibraryRecord::new(name, url, "root")
    }

    fn resolution(records: &[LibraryRecord]) -> Resolution {
        records.iter().cloned().collect()
    }

    #[test]
    fn test_classification() {
        let old = resolution(&[
            lib("kept", "https://x/kept-1.0.zip"),
            lib("gone", "https://x/gone-1.0.zip"),
            lib("bumped", "https://x/bumped-1.0.zip"),
        ]);
        let new = resolution(&[
            lib("bumped", "https://x/bumped-2.0.zip"),
            lib("fresh", "https://x/fresh-1.0.zip"),
            lib("kept", "https://x/kept-1.0.zip"),
        ]);

        let diff = diff(&new, &old, |_| true);

        let removed: Vec<_> = diff.to_remove.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(removed, vec!["gone"]);

        let fetched: Vec<_> = diff
            .to_fetch
            .iter()
            .map(|f| (f.record.name.as_str(), f.reason))
            .collect();
        assert_eq!(
            fetched,
            vec![("bumped", FetchReason::Changed), ("fresh", FetchReason::New)]
        );

        let unchanged: Vec<_> = diff.unchanged.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(unchanged, vec!["kept"]);
    }

    #[test]
    fn test_missing_install_dir_is_refetched() {
        let state = resolution(&[lib("a", "https://x/a.zip"), lib("b", "https://x/b.zip")]);

        let diff = diff(&state, &state, |r| r.name != "b");

        assert_eq!(diff.to_fetch.len(), 1);
        assert_eq!(diff.to_fetch[0].record.name, "b");
        assert_eq!(diff.to_fetch[0].reason, FetchReason::Missing);
        assert_eq!(diff.unchanged.len(), 1);
    }

    #[test]
    fn test_identical_states_are_empty() {
        let state = resolution(&[lib("a", "https://x/a.zip")]);
        let diff = diff(&state, &state, |_| true);
        assert!(diff.is_empty());
        assert_eq!(diff.unchanged.len(), 1);
    }

    #[test]
    fn test_checksum_change_is_a_change() {
        let old = resolution(&[lib("a", "https://x/a.zip")]);
        let new = resolution(&[lib("a", "https://x/a.zip").with_shasum("abc")]);

        let diff = diff(&new, &old, |_| true);
        assert_eq!(diff.to_fetch[0].reason, FetchReason::Changed);
    }

    #[test]
    fn test_declaring_package_change_is_a_change() {
        let old = resolution(&[LibraryRecord::new("a", "https://x/a.zip", "root")]);
        let new = resolution(&[LibraryRecord::new("a", "https://x/a.zip", "acme/theme")]);

        assert_eq!(diff(&new, &old, |_| true).to_fetch.len(), 1);
    }

    #[test]
    fn test_empty_new_removes_everything() {
        let old = resolution(&[lib("a", "https://x/a.zip"), lib("b", "https://x/b.zip")]);
        let diff = diff(&Resolution::new(), &old, |_| true);

        let removed: Vec<_> = diff.to_remove.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(removed, vec!["a", "b"]);
        assert!(diff.to_fetch.is_empty());
    }
}
