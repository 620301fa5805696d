//! Composer-style JSON manifests.
//!
//! Only the parts of `composer.json` the installer cares about are
//! modelled: the package name, the `extra` section holding library
//! declarations, and `config.vendor-dir`. Object key order is preserved
//! so declarations are processed in the order they were written.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::source::{DeclaringPackage, DependencyPolicy};

/// Manifest file name looked up in the project root.
pub const MANIFEST_NAME: &str = "composer.json";

/// Package name Composer gives a root package without a `name`.
pub const ROOT_PACKAGE_NAME: &str = "__root__";

/// Default Composer vendor directory.
pub const DEFAULT_VENDOR_DIR: &str = "vendor";

/// Error locating a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not find `composer.json` in `{}` or any parent directory", .cwd.display())]
    NotFound { cwd: PathBuf },
}

/// A package manifest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    /// Package name (`vendor/name`)
    #[serde(default)]
    pub name: Option<String>,

    /// Free-form `extra` section
    #[serde(default)]
    pub extra: Value,

    /// Composer `config` section
    #[serde(default)]
    pub config: Value,
}

impl Manifest {
    /// Load a manifest from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("failed to parse manifest: {}", path.display()))
    }

    /// Parse manifest JSON.
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// The package name, or `__root__` when unnamed.
    pub fn package_name(&self) -> &str {
        self.name.as_deref().unwrap_or(ROOT_PACKAGE_NAME)
    }

    /// Look up a key of the `extra` section.
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.as_object().and_then(|extra| extra.get(key))
    }

    /// Raw library declarations under `extra.<key>`, in declared order.
    ///
    /// Anything other than an object declares nothing.
    pub fn library_declarations(&self, key: &str) -> Vec<(String, Value)> {
        match self.extra(key) {
            Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            _ => Vec::new(),
        }
    }

    /// The dependency allow-list under `extra.<key>`.
    pub fn dependency_policy(&self, key: &str) -> DependencyPolicy {
        DependencyPolicy::from_value(self.extra(key))
    }

    /// `extra.installer-paths` as `(template, selectors)` pairs.
    pub fn installer_paths(&self) -> Vec<(String, Vec<String>)> {
        let Some(Value::Object(paths)) = self.extra("installer-paths") else {
            return Vec::new();
        };

        paths
            .iter()
            .map(|(template, selectors)| {
                let selectors = selectors
                    .as_array()
                    .map(|list| {
                        list.iter()
                            .filter_map(|s| s.as_str().map(str::to_string))
                            .collect()
                    })
                    .unwrap_or_default();
                (template.clone(), selectors)
            })
            .collect()
    }

    /// The vendor directory, relative to the project root.
    pub fn vendor_dir(&self) -> &str {
        self.config
            .as_object()
            .and_then(|config| config.get("vendor-dir"))
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_VENDOR_DIR)
    }

    /// View this manifest as a declaration source.
    pub fn to_declaring_package(&self, libraries_key: &str) -> DeclaringPackage {
        DeclaringPackage {
            name: self.package_name().to_string(),
            libraries: self.library_declarations(libraries_key),
        }
    }
}

/// `vendor/composer/installed.json`, in either Composer format.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InstalledRepository {
    /// Composer 2: `{ "packages": [...], "dev": true, ... }`
    Packages { packages: Vec<Manifest> },

    /// Composer 1: a bare list
    List(Vec<Manifest>),
}

/// Load the installed package list, in repository order.
///
/// A missing file means nothing is installed yet.
pub fn load_installed(path: &Path) -> Result<Vec<Manifest>> {
    if !path.exists() {
        tracing::debug!("No installed package list at {}", path.display());
        return Ok(Vec::new());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read installed packages: {}", path.display()))?;
    let repo: InstalledRepository = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse installed packages: {}", path.display()))?;

    Ok(match repo {
        InstalledRepository::Packages { packages } => packages,
        InstalledRepository::List(packages) => packages,
    })
}
