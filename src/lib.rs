//! libinstall - installs frontend libraries declared in Composer manifests
//!
//! This crate provides the core library functionality for libinstall,
//! including declaration merging, state diffing, and reconciliation of the
//! libraries directory against a lock file.

pub mod core;
pub mod ops;
pub mod resolver;
pub mod sources;
pub mod util;

/// Test utilities and mocks for libinstall unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a recording fetcher, project fixtures, and
/// archive builders.
#[cfg(test)]
pub mod test_support;

pub use core::{library::LibraryRecord, manifest::Manifest, project::Project};

pub use ops::{LibraryInstaller, LockStore};
pub use resolver::Resolution;
pub use util::context::GlobalContext;
