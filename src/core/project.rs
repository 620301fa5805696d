//! Project - the host package graph on disk.
//!
//! A Project is the root `composer.json`, the packages Composer has
//! installed into the vendor directory, and the libinstall configuration
//! that applies to them.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::layout::InstallLayout;
use crate::core::manifest::{load_installed, Manifest};
use crate::core::source::{DeclaringPackage, DependencyPolicy, PackageGraph};
use crate::util::config::Config;
use crate::util::GlobalContext;

/// Directory under the vendor dir owned by libinstall.
pub const STATE_DIR: &str = "libinstall";

/// Lock file name.
pub const LOCKFILE_NAME: &str = "installed-libraries.json";

/// A Composer project with its installed packages.
#[derive(Debug)]
pub struct Project {
    /// Project root (directory of the manifest)
    root: PathBuf,

    /// Path to the root manifest
    manifest_path: PathBuf,

    /// Parsed root manifest
    manifest: Manifest,

    /// Effective configuration
    config: Config,

    /// Root declarations
    root_package: DeclaringPackage,

    /// Installed packages in repository order
    dependencies: Vec<DeclaringPackage>,

    /// Root allow-list for dependency declarations
    policy: DependencyPolicy,

    /// Install path rules
    layout: InstallLayout,
}

impl Project {
    /// Load a project, merging global and project configuration.
    pub fn new(manifest_path: &Path, ctx: &GlobalContext) -> Result<Self> {
        let root = project_root(manifest_path);
        let config = ctx.load_config(&root);
        Self::load(manifest_path, config)
    }

    /// Load a project with an explicit configuration.
    pub fn load(manifest_path: &Path, config: Config) -> Result<Self> {
        let manifest = Manifest::load(manifest_path)?;
        let root = project_root(manifest_path);

        let libraries_key = config.libraries_key();
        let root_package = manifest.to_declaring_package(libraries_key);
        let policy = manifest.dependency_policy(config.dependencies_key());

        let installed_json = installed_json_path(&root, &manifest);
        let dependencies: Vec<DeclaringPackage> = load_installed(&installed_json)?
            .iter()
            .map(|pkg| pkg.to_declaring_package(libraries_key))
            .collect();

        tracing::debug!(
            "Loaded {} with {} installed packages",
            manifest.package_name(),
            dependencies.len()
        );

        let layout = InstallLayout::from_manifest(&root, &manifest, &config);

        Ok(Project {
            root,
            manifest_path: manifest_path.to_path_buf(),
            manifest,
            config,
            root_package,
            dependencies,
            policy,
            layout,
        })
    }

    /// Get the project root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn layout(&self) -> &InstallLayout {
        &self.layout
    }

    /// Absolute vendor directory.
    pub fn vendor_dir(&self) -> PathBuf {
        self.root.join(self.manifest.vendor_dir())
    }

    /// Path to Composer's installed package list.
    pub fn installed_json_path(&self) -> PathBuf {
        installed_json_path(&self.root, &self.manifest)
    }

    /// Path to the lock file.
    ///
    /// Defaults to `<vendor-dir>/libinstall/installed-libraries.json`.
    pub fn lockfile_path(&self) -> PathBuf {
        match &self.config.install.lock_file {
            Some(path) => self.root.join(path),
            None => self.vendor_dir().join(STATE_DIR).join(LOCKFILE_NAME),
        }
    }
}

impl PackageGraph for Project {
    fn root_package(&self) -> &DeclaringPackage {
        &self.root_package
    }

    fn dependency_packages(&self) -> &[DeclaringPackage] {
        &self.dependencies
    }

    fn dependency_policy(&self) -> &DependencyPolicy {
        &self.policy
    }
}

fn project_root(manifest_path: &Path) -> PathBuf {
    match manifest_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn installed_json_path(root: &Path, manifest: &Manifest) -> PathBuf {
    root.join(manifest.vendor_dir())
        .join("composer")
        .join("installed.json")
}
