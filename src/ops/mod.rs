//! High-level operations.
//!
//! This module contains the implementation of libinstall commands.

pub mod errors;
pub mod install;
pub mod lockfile;
pub mod prune;
pub mod reconcile;

pub use errors::InstallError;
pub use install::{install, status, InstallOptions, InstallReport, LibraryInstaller, Plan};
pub use lockfile::{LockStore, LockfileState, SCHEMA_VERSION};
pub use reconcile::{reconcile, FetchedLibrary, ReconcileReport};
