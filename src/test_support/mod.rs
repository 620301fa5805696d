//! Test utilities and mocks for libinstall unit tests.
//!
//! This module provides a recording [`Fetcher`] that touches only a temp
//! directory, and fixtures for projects and archives.
//!
//! # Example
//!
//! ```rust,ignore
//! use libinstall::test_support::{FetchEvent, RecordingFetcher};
//!
//! #[test]
//! fn test_example() {
//!     let tmp = tempfile::TempDir::new().unwrap();
//!     let fetcher = RecordingFetcher::new(tmp.path()).fail_download("broken");
//!
//!     // Reconcile with the fetcher, then inspect fetcher.events()...
//! }
//! ```

pub mod fixtures;

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::core::layout::{InstallLayout, LayoutError};
use crate::core::library::LibraryRecord;
use crate::sources::fetcher::{FetchError, Fetcher, RemovalError};

// Re-export fixtures for convenience
pub use fixtures::*;

/// A call made to a [`RecordingFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    /// `download` of the named library
    Download(String),
    /// `remove` of an install path
    Remove(PathBuf),
}

/// Mock fetcher that records calls and writes placeholder files.
///
/// Libraries install into `<root>/libraries/<name>` unless overridden.
#[derive(Debug, Default)]
pub struct RecordingFetcher {
    root: PathBuf,
    paths: HashMap<String, PathBuf>,
    files: HashMap<String, Vec<String>>,
    failing_downloads: HashSet<String>,
    failing_removals: HashSet<String>,
    events: Mutex<Vec<FetchEvent>>,
}

impl RecordingFetcher {
    /// Create a fetcher installing below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        RecordingFetcher {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Install a library at a specific path.
    pub fn with_path(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(name.to_string(), path.into());
        self
    }

    /// Files a download of `name` creates. Defaults to `<name>.js`.
    pub fn with_files(mut self, name: &str, files: &[&str]) -> Self {
        self.files
            .insert(name.to_string(), files.iter().map(|f| f.to_string()).collect());
        self
    }

    /// Make downloads of `name` fail with a network error.
    pub fn fail_download(mut self, name: &str) -> Self {
        self.failing_downloads.insert(name.to_string());
        self
    }

    /// Make removal of `name`'s install path fail.
    pub fn fail_remove(mut self, name: &str) -> Self {
        self.failing_removals.insert(name.to_string());
        self
    }

    /// Calls made so far.
    pub fn events(&self) -> Vec<FetchEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Forget recorded calls.
    pub fn clear_events(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }

    fn record(&self, event: FetchEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    fn name_for_path(&self, path: &Path) -> Option<String> {
        self.paths
            .iter()
            .find(|(_, p)| p.as_path() == path)
            .map(|(name, _)| name.clone())
            .or_else(|| {
                path.strip_prefix(self.root.join("libraries"))
                    .ok()
                    .map(|rel| rel.to_string_lossy().into_owned())
            })
    }
}

impl Fetcher for RecordingFetcher {
    fn download(&self, record: &LibraryRecord, install_path: &Path) -> Result<(), FetchError> {
        self.record(FetchEvent::Download(record.name.clone()));

        if self.failing_downloads.contains(&record.name) {
            return Err(FetchError::Network {
                url: record.url.clone(),
                message: "connection refused".to_string(),
            });
        }

        if install_path.exists() {
            std::fs::remove_dir_all(install_path).map_err(|e| FetchError::io(install_path, e))?;
        }

        let default_files = vec![format!("{}.js", record.name)];
        let files = self.files.get(&record.name).unwrap_or(&default_files);
        for file in files {
            let path = install_path.join(file);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| FetchError::io(parent, e))?;
            }
            std::fs::write(&path, &record.version).map_err(|e| FetchError::io(&path, e))?;
        }

        Ok(())
    }

    fn remove(&self, install_path: &Path) -> Result<(), RemovalError> {
        self.record(FetchEvent::Remove(install_path.to_path_buf()));

        let failing = self
            .name_for_path(install_path)
            .is_some_and(|name| self.failing_removals.contains(&name));
        if failing {
            return Err(RemovalError {
                path: install_path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
            });
        }

        if install_path.exists() {
            std::fs::remove_dir_all(install_path).map_err(|source| RemovalError {
                path: install_path.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }

    fn resolve_install_path(&self, name: &str) -> Result<PathBuf, LayoutError> {
        if let Some(path) = self.paths.get(name) {
            return Ok(path.clone());
        }
        InstallLayout::new(&self.root, "libraries/{$name}").install_path(name)
    }
}
