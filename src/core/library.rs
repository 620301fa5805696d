//! Library declarations and the canonical library record.
//!
//! A manifest declares a library either as a bare URL or as an object:
//!
//! ```json
//! "extra": {
//!     "drupal-libraries": {
//!         "chosen": "https://github.com/harvesthq/chosen/releases/download/v1.8.7/chosen_v1.8.7.zip",
//!         "dropzone": {
//!             "url": "https://github.com/dropzone/dropzone/archive/v5.9.3.tar.gz",
//!             "ignore": ["test/**", "*.md"],
//!             "shasum": "0a1cb6ff4b1a2a3b3b7a0e2f3c7c1c2b49d4e0af"
//!         }
//!     }
//! }
//! ```
//!
//! Both shapes are normalized right away into a [`LibraryRecord`].

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use miette::Diagnostic;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::util::glob::GlobSet;

/// Version assumed when neither the declaration nor the URL names one.
///
/// A plain `1.0.0` keeps the library looking like a stable release.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Trailing `<version>.<extension>` of a download URL.
static URL_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(v?[\d.]{2,})\.(zip|rar|tgz|tar(?:\.(?:gz|bz2))?)$")
        .expect("URL version pattern is valid")
});

/// Archive format of a library distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DistributionType {
    #[default]
    #[serde(rename = "zip")]
    Zip,
    #[serde(rename = "rar")]
    Rar,
    #[serde(rename = "tar", alias = "tgz")]
    Tar,
    #[serde(rename = "tar.gz")]
    TarGz,
    #[serde(rename = "tar.bz2")]
    TarBz2,
}

impl DistributionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionType::Zip => "zip",
            DistributionType::Rar => "rar",
            DistributionType::Tar => "tar",
            DistributionType::TarGz => "tar.gz",
            DistributionType::TarBz2 => "tar.bz2",
        }
    }
}

impl fmt::Display for DistributionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistributionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zip" => Ok(DistributionType::Zip),
            "rar" => Ok(DistributionType::Rar),
            "tar" | "tgz" => Ok(DistributionType::Tar),
            "tar.gz" => Ok(DistributionType::TarGz),
            "tar.bz2" => Ok(DistributionType::TarBz2),
            _ => Err(format!(
                "unknown distribution type '{}'; expected one of zip, rar, tar, tar.gz, tar.bz2",
                s
            )),
        }
    }
}

/// A fully resolved library, as recorded in the lock file.
///
/// Two records are equal only if every field is equal, including the
/// order of ignore patterns and the presence of a checksum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryRecord {
    /// Library name (the key in the declaring manifest)
    pub name: String,

    /// Declared or inferred version
    pub version: String,

    /// Archive URL
    pub url: String,

    /// Archive format
    pub dist_type: DistributionType,

    /// Globs pruned from the unpacked tree
    pub ignore: Vec<String>,

    /// Optional archive checksum (sha1)
    pub shasum: Option<String>,

    /// Name of the package that declared the library
    pub package: String,
}

impl LibraryRecord {
    /// Create a record with defaults guessed from the URL.
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        package: impl Into<String>,
    ) -> Self {
        let url = url.into();
        let (version, dist_type) = guess_defaults(&url);
        LibraryRecord {
            name: name.into(),
            version,
            url,
            dist_type,
            ignore: Vec::new(),
            shasum: None,
            package: package.into(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_type(mut self, dist_type: DistributionType) -> Self {
        self.dist_type = dist_type;
        self
    }

    pub fn with_ignore<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_shasum(mut self, shasum: impl Into<String>) -> Self {
        self.shasum = Some(shasum.into());
        self
    }
}

/// Error in a library declaration.
///
/// These abort the whole run before anything touches the disk.
#[derive(Debug, Error, Diagnostic)]
pub enum DeclarationError {
    #[error("library `{library}` declared by `{package}` does not contain a valid URL")]
    #[diagnostic(
        code(libinstall::config::missing_url),
        help("add a non-empty `url` to the `{library}` declaration")
    )]
    MissingUrl { library: String, package: String },

    #[error("library `{library}` declared by `{package}` is malformed: {message}")]
    #[diagnostic(
        code(libinstall::config::malformed),
        help("declare the library as a URL string or an object with `url`, `version`, `type`, `ignore` and `shasum`")
    )]
    Malformed {
        library: String,
        package: String,
        message: String,
    },

    #[error("library `{library}` declared by `{package}` has an invalid ignore pattern")]
    #[diagnostic(code(libinstall::config::ignore_pattern))]
    InvalidIgnorePattern {
        library: String,
        package: String,
        #[source]
        source: crate::util::glob::GlobError,
    },
}

/// A library declaration as written in a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawDeclaration {
    /// `"name": "https://..."`
    Simple(String),

    /// `"name": { "url": ..., ... }`
    Structured(StructuredDeclaration),
}

/// Object form of a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StructuredDeclaration {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default, rename = "type")]
    pub dist_type: Option<DistributionType>,

    #[serde(default)]
    pub ignore: Option<Vec<String>>,

    #[serde(default)]
    pub shasum: Option<String>,
}

impl RawDeclaration {
    /// Interpret a JSON value from a manifest's `extra` section.
    pub fn from_value(library: &str, package: &str, value: &Value) -> Result<Self, DeclarationError> {
        match value {
            Value::String(url) => Ok(RawDeclaration::Simple(url.clone())),
            Value::Object(_) => serde_json::from_value(value.clone())
                .map(RawDeclaration::Structured)
                .map_err(|e| DeclarationError::Malformed {
                    library: library.to_string(),
                    package: package.to_string(),
                    message: e.to_string(),
                }),
            other => Err(DeclarationError::Malformed {
                library: library.to_string(),
                package: package.to_string(),
                message: format!("expected a URL string or an object, found {}", json_kind(other)),
            }),
        }
    }

    /// Turn the declaration into a canonical record.
    ///
    /// Version and type are guessed from the URL first; explicit fields
    /// of a structured declaration win over the guesses.
    pub fn normalize(self, library: &str, package: &str) -> Result<LibraryRecord, DeclarationError> {
        validate_name(library).map_err(|message| DeclarationError::Malformed {
            library: library.to_string(),
            package: package.to_string(),
            message,
        })?;

        let record = match self {
            RawDeclaration::Simple(url) => {
                if url.trim().is_empty() {
                    return Err(DeclarationError::MissingUrl {
                        library: library.to_string(),
                        package: package.to_string(),
                    });
                }
                LibraryRecord::new(library, url, package)
            }
            RawDeclaration::Structured(decl) => {
                let url = match decl.url {
                    Some(url) if !url.trim().is_empty() => url,
                    _ => {
                        return Err(DeclarationError::MissingUrl {
                            library: library.to_string(),
                            package: package.to_string(),
                        })
                    }
                };

                let mut record = LibraryRecord::new(library, url, package);
                if let Some(version) = decl.version {
                    record.version = version;
                }
                if let Some(dist_type) = decl.dist_type {
                    record.dist_type = dist_type;
                }
                record.ignore = decl.ignore.unwrap_or_default();
                record.shasum = decl.shasum;
                record
            }
        };

        if !record.ignore.is_empty() {
            GlobSet::new(&record.ignore).map_err(|e| DeclarationError::InvalidIgnorePattern {
                library: library.to_string(),
                package: package.to_string(),
                source: e,
            })?;
        }

        Ok(record)
    }
}

/// Check that a library name is a single plain directory name.
///
/// The name ends up in a filesystem path that is later deleted, so it
/// may not be empty, `.`, `..` or contain a path separator.
pub fn validate_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("the library name is empty".to_string());
    }
    if name == "." || name == ".." {
        return Err(format!("`{}` is not a valid library name", name));
    }
    if name.contains(['/', '\\']) {
        return Err(format!("library name `{}` contains a path separator", name));
    }
    Ok(())
}

/// Guess version and archive type from the tail of a URL.
///
/// `https://x/foo-v2.3.1.tar.gz` gives `("v2.3.1", Tar)`; anything that
/// does not end in `<version>.<archive extension>` gives
/// `("1.0.0", Zip)`.
pub fn guess_defaults(url: &str) -> (String, DistributionType) {
    match URL_VERSION_RE.captures(url) {
        Some(caps) => {
            let version = caps[1].to_string();
            // Only the first extension segment is kept: tar.gz -> tar.
            let dist_type = match caps[2].split('.').next() {
                Some("rar") => DistributionType::Rar,
                Some("zip") => DistributionType::Zip,
                _ => DistributionType::Tar,
            };
            (version, dist_type)
        }
        None => (DEFAULT_VERSION.to_string(), DistributionType::Zip),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
