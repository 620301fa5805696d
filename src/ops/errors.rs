//! Errors that abort an install run.

use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::core::layout::LayoutError;
use crate::core::library::DeclarationError;
use crate::sources::fetcher::FetchError;

/// A fatal install error. The lock file is never written after one.
#[derive(Debug, Error, Diagnostic)]
pub enum InstallError {
    /// A declaration could not be normalized
    #[error(transparent)]
    #[diagnostic(transparent)]
    Configuration(#[from] DeclarationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Layout(#[from] LayoutError),

    #[error("failed to install library `{library}`")]
    #[diagnostic(code(libinstall::install::fetch))]
    Fetch {
        library: String,
        #[source]
        source: FetchError,
    },

    #[error("failed to prune `{}` from library `{library}`", .path.display())]
    #[diagnostic(code(libinstall::install::prune))]
    Prune {
        library: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
