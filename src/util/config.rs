//! Configuration file support for libinstall.
//!
//! libinstall supports two configuration file locations:
//! - Global: `~/.libinstall/config.toml` - User-wide defaults
//! - Project: `.libinstall/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Manifest `extra` key holding library declarations.
pub const DEFAULT_LIBRARIES_KEY: &str = "drupal-libraries";

/// Manifest `extra` key holding the dependency allow-list.
pub const DEFAULT_DEPENDENCIES_KEY: &str = "drupal-libraries-dependencies";

/// Install path template used when no `installer-paths` rule matches.
pub const DEFAULT_LIBRARIES_DIR: &str = "libraries/{$name}";

/// Download timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// libinstall configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Manifest settings
    pub manifest: ManifestConfig,

    /// Install settings
    pub install: InstallConfig,

    /// Network settings
    pub net: NetConfig,
}

/// Where declarations live in the manifests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ManifestConfig {
    /// `extra` key holding library declarations
    pub libraries_key: Option<String>,

    /// `extra` key holding the dependency allow-list
    pub dependencies_key: Option<String>,
}

/// Where libraries and the lock file are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InstallConfig {
    /// Default install path template, relative to the project root
    pub libraries_dir: Option<String>,

    /// Lock file path, relative to the project root
    pub lock_file: Option<PathBuf>,
}

/// Network settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Download timeout in seconds
    pub timeout: Option<u64>,

    /// Offline mode (only `file://` and local paths are fetched)
    pub offline: bool,

    /// Extra attempts after a network failure
    pub retries: Option<u32>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        // Manifest settings
        if other.manifest.libraries_key.is_some() {
            self.manifest.libraries_key = other.manifest.libraries_key;
        }
        if other.manifest.dependencies_key.is_some() {
            self.manifest.dependencies_key = other.manifest.dependencies_key;
        }

        // Install settings
        if other.install.libraries_dir.is_some() {
            self.install.libraries_dir = other.install.libraries_dir;
        }
        if other.install.lock_file.is_some() {
            self.install.lock_file = other.install.lock_file;
        }

        // Net settings
        if other.net.timeout.is_some() {
            self.net.timeout = other.net.timeout;
        }
        if other.net.offline {
            self.net.offline = true;
        }
        if other.net.retries.is_some() {
            self.net.retries = other.net.retries;
        }
    }

    pub fn libraries_key(&self) -> &str {
        self.manifest
            .libraries_key
            .as_deref()
            .unwrap_or(DEFAULT_LIBRARIES_KEY)
    }

    pub fn dependencies_key(&self) -> &str {
        self.manifest
            .dependencies_key
            .as_deref()
            .unwrap_or(DEFAULT_DEPENDENCIES_KEY)
    }

    pub fn libraries_dir(&self) -> &str {
        self.install
            .libraries_dir
            .as_deref()
            .unwrap_or(DEFAULT_LIBRARIES_DIR)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.net.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn retries(&self) -> u32 {
        self.net.retries.unwrap_or(0)
    }
}

/// Load configuration from global and project paths.
///
/// Project config takes precedence over global config.
pub fn load_config(global_path: &Path, project_path: &Path) -> Config {
    let mut config = Config::default();

    // Load global config first
    if global_path.exists() {
        let global = Config::load_or_default(global_path);
        config.merge(global);
    }

    // Project config overrides global
    if project_path.exists() {
        let project = Config::load_or_default(project_path);
        config.merge(project);
    }

    config
}

/// Get the global libinstall config directory (~/.libinstall).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".libinstall"))
}

/// Get the project config path (.libinstall/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".libinstall").join("config.toml")
}
