//! Applying a state diff to disk.
//!
//! Every removal finishes before the first download starts. A library
//! that moves between names can then reuse its old directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::core::layout::LayoutError;
use crate::core::library::{DeclarationError, LibraryRecord};
use crate::ops::errors::InstallError;
use crate::ops::prune::prune;
use crate::resolver::{FetchReason, Resolution, StateDiff};
use crate::sources::fetcher::{Fetcher, RemovalError};
use crate::util::glob::GlobSet;

/// A library that was downloaded during reconciliation.
#[derive(Debug, Clone)]
pub struct FetchedLibrary {
    pub name: String,
    pub version: String,
    pub reason: FetchReason,
    pub path: PathBuf,
}

/// What reconciliation did.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    /// The new state: unchanged and fetched libraries in merge order
    pub installed: Resolution,

    /// Names of removed libraries
    pub removed: Vec<String>,

    /// Downloaded libraries
    pub fetched: Vec<FetchedLibrary>,

    /// Pruned paths, as `library/relative/path`
    pub pruned: Vec<String>,

    /// Removals that failed; the run carried on
    pub removal_failures: Vec<(String, RemovalError)>,

    /// Names of libraries left alone
    pub unchanged: Vec<String>,
}

/// Apply `diff`, whose records come from the `merged` resolution.
pub fn reconcile<F: Fetcher + ?Sized>(
    fetcher: &F,
    merged: &Resolution,
    diff: StateDiff,
) -> Result<ReconcileReport, InstallError> {
    let mut report = ReconcileReport::default();

    // Resolve every path before touching the disk.
    let removals = diff
        .to_remove
        .iter()
        .map(|record| Ok((record, fetcher.resolve_install_path(&record.name)?)))
        .collect::<Result<Vec<_>, LayoutError>>()?;
    let fetches = diff
        .to_fetch
        .iter()
        .map(|planned| Ok((planned, fetcher.resolve_install_path(&planned.record.name)?)))
        .collect::<Result<Vec<_>, LayoutError>>()?;

    for (record, path) in removals {
        tracing::info!("Removing {} ({})", record.name, record.version);

        match fetcher.remove(&path) {
            Ok(()) => report.removed.push(record.name.clone()),
            Err(e) => {
                tracing::warn!("Could not remove {}: {}", record.name, e);
                report.removal_failures.push((record.name.clone(), e));
            }
        }
    }

    for (planned, path) in fetches {
        let record = &planned.record;

        fetcher
            .download(record, &path)
            .map_err(|source| InstallError::Fetch {
                library: record.name.clone(),
                source,
            })?;

        for relative in prune_ignored(record, &path)? {
            report.pruned.push(format!("{}/{}", record.name, relative));
        }

        report.fetched.push(FetchedLibrary {
            name: record.name.clone(),
            version: record.version.clone(),
            reason: planned.reason,
            path,
        });
    }

    report.unchanged = diff.unchanged.iter().map(|r| r.name.clone()).collect();

    let on_disk: HashSet<&str> = diff
        .unchanged
        .iter()
        .map(|r| r.name.as_str())
        .chain(diff.to_fetch.iter().map(|p| p.record.name.as_str()))
        .collect();
    report.installed = merged
        .iter()
        .filter(|r| on_disk.contains(r.name.as_str()))
        .cloned()
        .collect();

    Ok(report)
}

fn prune_ignored(record: &LibraryRecord, path: &Path) -> Result<Vec<String>, InstallError> {
    if record.ignore.is_empty() {
        return Ok(Vec::new());
    }

    let ignore = GlobSet::new(&record.ignore).map_err(|source| {
        InstallError::Configuration(DeclarationError::InvalidIgnorePattern {
            library: record.name.clone(),
            package: record.package.clone(),
            source,
        })
    })?;

    prune(path, &ignore).map_err(|(path, source)| InstallError::Prune {
        library: record.name.clone(),
        path,
        source,
    })
}
