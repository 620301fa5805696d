//! The Fetcher trait - how libraries reach the disk.
//!
//! The reconciler only ever talks to a `Fetcher`. It never opens a
//! network connection or unpacks an archive itself.

use std::io;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

use crate::core::layout::LayoutError;
use crate::core::library::LibraryRecord;

/// Error downloading or unpacking a library. Fatal for the run.
#[derive(Debug, Error, Diagnostic)]
pub enum FetchError {
    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    #[diagnostic(
        code(libinstall::fetch::checksum_mismatch),
        help("update the declared `shasum` if the archive was intentionally republished")
    )]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("failed to download {url}: {message}")]
    #[diagnostic(code(libinstall::fetch::network))]
    Network { url: String, message: String },

    #[error("failed to unpack {url}: {message}")]
    #[diagnostic(code(libinstall::fetch::unpack))]
    Unpack { url: String, message: String },

    #[error("I/O error at {}", .path.display())]
    #[diagnostic(code(libinstall::fetch::io))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FetchError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        FetchError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Error removing an installed library. Logged, never fatal.
#[derive(Debug, Error, Diagnostic)]
#[error("failed to remove {}", .path.display())]
#[diagnostic(code(libinstall::remove::failed))]
pub struct RemovalError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Downloads, unpacks and removes libraries.
pub trait Fetcher {
    /// Fetch the library's archive and unpack it into `install_path`,
    /// replacing anything already there.
    fn download(&self, record: &LibraryRecord, install_path: &Path) -> Result<(), FetchError>;

    /// Remove an installed library directory.
    fn remove(&self, install_path: &Path) -> Result<(), RemovalError>;

    /// Where a library with this name is installed. Fails if the path
    /// would not be a directory of its own below the libraries directory.
    fn resolve_install_path(&self, name: &str) -> Result<PathBuf, LayoutError>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
    fn download(&self, record: &LibraryRecord, install_path: &Path) -> Result<(), FetchError> {
        (**self).download(record, install_path)
    }

    fn remove(&self, install_path: &Path) -> Result<(), RemovalError> {
        (**self).remove(install_path)
    }

    fn resolve_install_path(&self, name: &str) -> Result<PathBuf, LayoutError> {
        (**self).resolve_install_path(name)
    }
}
