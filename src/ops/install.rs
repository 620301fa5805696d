//! Implementation of `libinstall install` and `libinstall status`.

use anyhow::{Context, Result};

use crate::core::project::Project;
use crate::core::source::PackageGraph;
use crate::ops::errors::InstallError;
use crate::ops::lockfile::LockStore;
use crate::ops::reconcile::{reconcile, ReconcileReport};
use crate::resolver::{diff, resolve_declarations, Resolution, StateDiff};
use crate::sources::fetcher::Fetcher;
use crate::sources::http::HttpFetcher;

/// Options for install command.
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Dry run - compute the plan without touching the disk
    pub dry_run: bool,
}

/// What a run would do.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Merged declarations
    pub resolution: Resolution,

    /// State recorded by the previous run
    pub previous: Resolution,

    /// Classification against the previous state
    pub diff: StateDiff,
}

/// Result of an install run.
#[derive(Debug)]
pub struct InstallReport {
    pub plan: Plan,

    /// `None` for dry runs
    pub reconciled: Option<ReconcileReport>,
}

impl InstallReport {
    pub fn is_dry_run(&self) -> bool {
        self.reconciled.is_none()
    }
}

/// The reconciliation engine wired to a fetcher and a lock store.
pub struct LibraryInstaller<F> {
    fetcher: F,
    store: LockStore,
}

impl<F: Fetcher> LibraryInstaller<F> {
    pub fn new(fetcher: F, store: LockStore) -> Self {
        LibraryInstaller { fetcher, store }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn store(&self) -> &LockStore {
        &self.store
    }

    /// Merge declarations and diff them against the lock file.
    pub fn plan(&self, graph: &dyn PackageGraph) -> Result<Plan> {
        let previous = self.store.load()?.installed;
        let resolution = resolve_declarations(graph).map_err(InstallError::from)?;

        let diff = diff(&resolution, &previous, |record| {
            self.fetcher
                .resolve_install_path(&record.name)
                .is_ok_and(|path| path.exists())
        });

        tracing::debug!(
            "{} declared, {} to remove, {} to fetch, {} unchanged",
            resolution.len(),
            diff.to_remove.len(),
            diff.to_fetch.len(),
            diff.unchanged.len()
        );

        Ok(Plan {
            resolution,
            previous,
            diff,
        })
    }

    /// Converge the disk on the declared libraries and record the result.
    ///
    /// The lock file is written only after every step succeeded.
    pub fn install(&self, graph: &dyn PackageGraph, opts: &InstallOptions) -> Result<InstallReport> {
        let plan = self.plan(graph)?;

        if opts.dry_run {
            tracing::info!("Dry run - no libraries will be changed");
            return Ok(InstallReport {
                plan,
                reconciled: None,
            });
        }

        let reconciled = reconcile(&self.fetcher, &plan.resolution, plan.diff.clone())?;

        tracing::debug!("Writing to {}", self.store.path().display());
        self.store.save(&reconciled.installed)?;

        Ok(InstallReport {
            plan,
            reconciled: Some(reconciled),
        })
    }
}

fn default_installer(project: &Project) -> Result<LibraryInstaller<HttpFetcher>> {
    let fetcher = HttpFetcher::for_project(project)?;
    Ok(LibraryInstaller::new(
        fetcher,
        LockStore::new(project.lockfile_path()),
    ))
}

/// Install the project's libraries.
pub fn install(project: &Project, opts: &InstallOptions) -> Result<InstallReport> {
    default_installer(project)?
        .install(project, opts)
        .with_context(|| format!("failed to install libraries for {}", project.root().display()))
}

/// Compute the project's plan without side effects.
pub fn status(project: &Project) -> Result<Plan> {
    default_installer(project)?.plan(project)
}
