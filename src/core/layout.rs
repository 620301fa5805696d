//! Install layout: where each library lands on disk.
//!
//! Libraries are installed as synthetic `drupal-library/<name>` packages
//! of type `drupal-library`, so the root manifest's `installer-paths`
//! can place them with the same selectors it uses for real packages:
//!
//! ```json
//! "installer-paths": {
//!     "web/libraries/{$name}": ["type:drupal-library"]
//! }
//! ```

use std::path::{Component, Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

use crate::core::manifest::Manifest;
use crate::util::config::Config;

/// Vendor of the synthetic library packages.
pub const LIBRARY_VENDOR: &str = "drupal-library";

/// Package type of the synthetic library packages.
pub const LIBRARY_TYPE: &str = "drupal-library";

/// Placeholder for the library name in a path template.
const NAME_VAR: &str = "{$name}";

/// Error placing a library on disk.
#[derive(Debug, Error, Diagnostic)]
pub enum LayoutError {
    #[error("install path `{}` of library `{library}` is not inside its libraries directory", .path.display())]
    #[diagnostic(
        code(libinstall::layout::outside_base),
        help("library names must be plain directory names and install templates must end in `{{$name}}`")
    )]
    OutsideBase { library: String, path: PathBuf },
}

/// Maps library names to install directories.
#[derive(Debug, Clone)]
pub struct InstallLayout {
    root: PathBuf,
    rules: Vec<(String, Vec<String>)>,
    default_template: String,
}

impl InstallLayout {
    /// Create a layout with only a default template.
    pub fn new(root: impl Into<PathBuf>, default_template: impl Into<String>) -> Self {
        InstallLayout {
            root: root.into(),
            rules: Vec::new(),
            default_template: default_template.into(),
        }
    }

    /// Build the layout from the root manifest's `installer-paths`.
    pub fn from_manifest(root: &Path, manifest: &Manifest, config: &Config) -> Self {
        InstallLayout {
            root: root.to_path_buf(),
            rules: manifest.installer_paths(),
            default_template: config.libraries_dir().to_string(),
        }
    }

    /// Add an `installer-paths` rule. Earlier rules win.
    pub fn with_rule<I, S>(mut self, template: impl Into<String>, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules
            .push((template.into(), selectors.into_iter().map(Into::into).collect()));
        self
    }

    /// The install directory of a library.
    ///
    /// The template up to `{$name}` is the base directory; the result must
    /// lie strictly below it. A template without `{$name}` would put every
    /// library in one directory and is refused as well.
    pub fn install_path(&self, library: &str) -> Result<PathBuf, LayoutError> {
        let template = self
            .rules
            .iter()
            .find(|(_, selectors)| selectors.iter().any(|s| selects(s, library)))
            .map(|(template, _)| template.as_str())
            .unwrap_or(&self.default_template);

        let (base, tail) = template.split_at(template.find(NAME_VAR).unwrap_or(template.len()));
        let tail = expand(tail, library);
        let tail = Path::new(tail.trim_end_matches('/'));
        let path = self.root.join(expand(base, library)).join(tail);

        let below_base = tail.components().next().is_some()
            && tail.components().all(|c| matches!(c, Component::Normal(_)));
        if !below_base {
            return Err(LayoutError::OutsideBase {
                library: library.to_string(),
                path,
            });
        }

        Ok(path)
    }
}

fn selects(selector: &str, library: &str) -> bool {
    if let Some(ty) = selector.strip_prefix("type:") {
        return ty == LIBRARY_TYPE;
    }
    if let Some(vendor) = selector.strip_prefix("vendor:") {
        return vendor == LIBRARY_VENDOR;
    }
    selector
        .strip_prefix(LIBRARY_VENDOR)
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|name| name == library)
}

fn expand(template: &str, library: &str) -> String {
    template
        .replace(NAME_VAR, library)
        .replace("{$vendor}", LIBRARY_VENDOR)
        .replace("{$type}", LIBRARY_TYPE)
}
