//! Library resolution.
//!
//! Declarations from every source are merged into a single ordered
//! [`Resolution`] and diffed against the previous one. Both steps are
//! pure; all I/O happens before and after.

pub mod diff;
pub mod merge;

pub use diff::{diff, FetchReason, PlannedFetch, StateDiff};
pub use merge::{merge_declarations, merge_into, resolve_declarations};

use std::collections::HashMap;

use crate::core::library::LibraryRecord;

/// An insertion-ordered mapping of library name to record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    records: Vec<LibraryRecord>,
    index: HashMap<String, usize>,
}

impl Resolution {
    /// Create an empty resolution.
    pub fn new() -> Self {
        Resolution::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by library name.
    pub fn get(&self, name: &str) -> Option<&LibraryRecord> {
        self.index.get(name).map(|&i| &self.records[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &LibraryRecord> {
        self.records.iter()
    }

    /// Library names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.name.as_str())
    }

    /// Insert a record unless its name is already taken.
    ///
    /// On conflict the existing record is kept and returned.
    pub fn try_insert(&mut self, record: LibraryRecord) -> Result<(), &LibraryRecord> {
        if let Some(&i) = self.index.get(&record.name) {
            return Err(&self.records[i]);
        }
        self.index.insert(record.name.clone(), self.records.len());
        self.records.push(record);
        Ok(())
    }
}

impl FromIterator<LibraryRecord> for Resolution {
    /// Collect records, keeping the first of any duplicate names.
    fn from_iter<T: IntoIterator<Item = LibraryRecord>>(iter: T) -> Self {
        let mut resolution = Resolution::new();
        for record in iter {
            let _ = resolution.try_insert(record);
        }
        resolution
    }
}

impl<'a> IntoIterator for &'a Resolution {
    type Item = &'a LibraryRecord;
    type IntoIter = std::slice::Iter<'a, LibraryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
