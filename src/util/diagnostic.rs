//! User-friendly diagnostic messages.
//!
//! Every fatal error the binary reports should name the root cause and,
//! where one exists, the fix.

use std::fmt;
use std::path::PathBuf;

use crate::core::library::DeclarationError;
use crate::core::manifest::ManifestError;
use crate::ops::errors::InstallError;
use crate::sources::fetcher::FetchError;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when no manifest file is found.
    pub const NO_MANIFEST: &str =
        "Run from a directory containing composer.json or pass `--manifest-path`";

    /// Suggestion when a declaration has no URL.
    pub const MISSING_URL: &str = "Give the library a non-empty `url` in `extra.drupal-libraries`";

    /// Suggestion for malformed declarations.
    pub const MALFORMED_DECLARATION: &str =
        "Declare the library as a URL string or an object with `url`, `version`, `type`, `ignore` and `shasum`";

    /// Suggestion for ignore patterns that do not compile.
    pub const INVALID_IGNORE: &str = "Close every `{` in the library's ignore patterns";

    /// Suggestion for fetch failures.
    pub const FETCH_FAILED: &str =
        "Check your network connection and the library URL, then run `libinstall install` again";

    /// Suggestion when a downloaded archive does not match its checksum.
    pub const CHECKSUM_MISMATCH: &str =
        "Update the declared `shasum` if the archive was intentionally republished";

    /// Suggestion when an archive cannot be unpacked.
    pub const UNPACK_FAILED: &str = "Point the library at a zip, tar or tar.gz archive";

    /// Suggestion when a library would be installed outside its directory.
    pub const OUTSIDE_BASE: &str =
        "Rename the library to a plain directory name and make sure every installer path ends in `{$name}`";

    /// Suggestion when pruning fails.
    pub const PRUNE_FAILED: &str = "Check the permissions of the library's install directory";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location (file path)
    pub location: Option<PathBuf>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Warning,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a file location.
    pub fn with_location(mut self, path: impl Into<PathBuf>) -> Self {
        self.location = Some(path.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = if color {
            match self.severity {
                Severity::Error => "\x1b[1;31merror\x1b[0m",
                Severity::Warning => "\x1b[1;33mwarning\x1b[0m",
            }
        } else {
            match self.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            }
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        if let Some(ref path) = self.location {
            output.push_str(&format!("  --> {}\n", path.display()));
        }

        for ctx in &self.context {
            output.push_str(&format!("  = {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }

    /// Build a diagnostic for a known error in an `anyhow` chain.
    ///
    /// Returns `None` when nothing in the chain has a suggestion attached.
    pub fn from_error(err: &anyhow::Error) -> Option<Self> {
        for cause in err.chain() {
            if let Some(install) = cause.downcast_ref::<InstallError>() {
                return Some(install_diagnostic(install));
            }
            if let Some(decl) = cause.downcast_ref::<DeclarationError>() {
                return Some(declaration_diagnostic(decl));
            }
            if let Some(manifest) = cause.downcast_ref::<ManifestError>() {
                return Some(
                    Diagnostic::error(manifest.to_string()).with_suggestion(suggestions::NO_MANIFEST),
                );
            }
        }
        None
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

fn declaration_diagnostic(err: &DeclarationError) -> Diagnostic {
    let suggestion = match err {
        DeclarationError::MissingUrl { .. } => suggestions::MISSING_URL,
        DeclarationError::Malformed { .. } => suggestions::MALFORMED_DECLARATION,
        DeclarationError::InvalidIgnorePattern { .. } => suggestions::INVALID_IGNORE,
    };
    Diagnostic::error(err.to_string()).with_suggestion(suggestion)
}

fn install_diagnostic(err: &InstallError) -> Diagnostic {
    match err {
        InstallError::Configuration(decl) => declaration_diagnostic(decl),
        InstallError::Layout(_) => {
            Diagnostic::error(err.to_string()).with_suggestion(suggestions::OUTSIDE_BASE)
        }
        InstallError::Fetch { source, .. } => {
            let suggestion = match source {
                FetchError::ChecksumMismatch { .. } => suggestions::CHECKSUM_MISMATCH,
                FetchError::Unpack { .. } => suggestions::UNPACK_FAILED,
                FetchError::Network { .. } | FetchError::Io { .. } => suggestions::FETCH_FAILED,
            };
            Diagnostic::error(err.to_string())
                .with_context(source.to_string())
                .with_context("the lock file was left unchanged")
                .with_suggestion(suggestion)
        }
        InstallError::Prune { path, source, .. } => Diagnostic::error(err.to_string())
            .with_context(source.to_string())
            .with_location(path.clone())
            .with_suggestion(suggestions::PRUNE_FAILED),
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_formatting() {
        let diag = Diagnostic::error("failed to install library `chosen`")
            .with_context("checksum mismatch")
            .with_suggestion("Update the declared `shasum`")
            .with_suggestion("Run `libinstall install` again");

        let output = diag.format(false);
        assert!(output.contains("error: failed to install library `chosen`"));
        assert!(output.contains("= checksum mismatch"));
        assert!(output.contains("help: consider:"));
        assert!(output.contains("2. Run `libinstall install` again"));
    }

    #[test]
    fn test_from_error_finds_install_error_in_chain() {
        let err = InstallError::Fetch {
            library: "chosen".into(),
            source: FetchError::ChecksumMismatch {
                url: "https://x/chosen.zip".into(),
                expected: "abc".into(),
                actual: "def".into(),
            },
        };
        let err = anyhow::Error::new(err).context("install failed");

        let diag = Diagnostic::from_error(&err).unwrap();
        assert!(diag.message.contains("chosen"));
        assert_eq!(diag.suggestions, vec![suggestions::CHECKSUM_MISMATCH.to_string()]);
    }

    #[test]
    fn test_from_error_outside_base() {
        let err = InstallError::Layout(crate::core::layout::LayoutError::OutsideBase {
            library: "..".into(),
            path: PathBuf::from("/project"),
        });
        let diag = Diagnostic::from_error(&anyhow::Error::new(err)).unwrap();

        assert!(diag.message.contains("`..`"));
        assert_eq!(diag.suggestions, vec![suggestions::OUTSIDE_BASE.to_string()]);
    }

    #[test]
    fn test_removal_warning() {
        let diag = Diagnostic::warning("could not remove `old`")
            .with_context("permission denied")
            .with_location("/project/libraries/old");

        let output = diag.format(false);
        assert!(output.starts_with("warning: could not remove `old`"));
        assert!(output.contains("--> /project/libraries/old"));
        assert!(output.contains("= permission denied"));
    }

    #[test]
    fn test_from_error_unknown() {
        let err = anyhow::anyhow!("something else");
        assert!(Diagnostic::from_error(&err).is_none());
    }
}
