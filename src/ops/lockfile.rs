//! Lock file I/O.
//!
//! `installed-libraries.json` records what the last successful run put on
//! disk. A lock file written by another schema version is not migrated;
//! it is treated as empty and every library is fetched again.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::library::{validate_name, DistributionType, LibraryRecord};
use crate::resolver::Resolution;

/// Current lock file schema version.
pub const SCHEMA_VERSION: &str = "1.0";

/// Decoded lock file contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockfileState {
    pub schema_version: String,
    pub installed: Resolution,
}

impl LockfileState {
    /// An empty state at the current schema version.
    pub fn empty() -> Self {
        LockfileState {
            schema_version: SCHEMA_VERSION.to_string(),
            installed: Resolution::new(),
        }
    }
}

impl Default for LockfileState {
    fn default() -> Self {
        Self::empty()
    }
}

/// On-disk document.
#[derive(Debug, Serialize, Deserialize)]
struct LockfileDocument {
    #[serde(rename = "schema-version", default)]
    schema_version: Option<String>,

    /// An object keyed by library name. PHP writes an empty one as `[]`.
    #[serde(default)]
    installed: Value,
}

/// One entry of `installed`.
#[derive(Debug, Serialize, Deserialize)]
struct LockedLibrary {
    version: String,
    url: String,
    #[serde(rename = "type")]
    dist_type: DistributionType,
    #[serde(default)]
    ignore: Vec<String>,
    package: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    shasum: Option<String>,
}

impl LockedLibrary {
    fn from_record(record: &LibraryRecord) -> Self {
        LockedLibrary {
            version: record.version.clone(),
            url: record.url.clone(),
            dist_type: record.dist_type,
            ignore: record.ignore.clone(),
            package: record.package.clone(),
            shasum: record.shasum.clone(),
        }
    }

    fn into_record(self, name: String) -> LibraryRecord {
        LibraryRecord {
            name,
            version: self.version,
            url: self.url,
            dist_type: self.dist_type,
            ignore: self.ignore,
            shasum: self.shasum,
            package: self.package,
        }
    }
}

/// Reads and writes the lock file.
#[derive(Debug, Clone)]
pub struct LockStore {
    path: PathBuf,
}

impl LockStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        LockStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the previous state.
    ///
    /// A missing, unreadable-as-JSON or foreign-schema file gives an empty
    /// state. Only I/O errors other than "not found" are returned.
    pub fn load(&self) -> Result<LockfileState> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No lock file at {}", self.path.display());
                return Ok(LockfileState::empty());
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read lock file: {}", self.path.display()))
            }
        };

        match decode(&contents) {
            Ok(state) => Ok(state),
            Err(reason) => {
                tracing::debug!(
                    "Discarding lock file {}: {}",
                    self.path.display(),
                    reason
                );
                Ok(LockfileState::empty())
            }
        }
    }

    /// Atomically replace the lock file with `installed`.
    pub fn save(&self, installed: &Resolution) -> Result<()> {
        let contents = encode(installed)?;
        crate::util::fs::write_atomic(&self.path, contents.as_bytes())
            .with_context(|| format!("failed to write lock file: {}", self.path.display()))?;
        tracing::debug!("Wrote {}", self.path.display());
        Ok(())
    }
}

fn decode(contents: &str) -> std::result::Result<LockfileState, String> {
    let doc: LockfileDocument =
        serde_json::from_str(contents).map_err(|e| format!("malformed JSON: {}", e))?;

    match doc.schema_version.as_deref() {
        Some(SCHEMA_VERSION) => {}
        Some(other) => return Err(format!("schema version {} is not {}", other, SCHEMA_VERSION)),
        None => return Err("missing schema version".to_string()),
    }

    let entries = match doc.installed {
        Value::Object(map) => map,
        Value::Array(list) if list.is_empty() => Map::new(),
        Value::Null => Map::new(),
        _ => return Err("`installed` is not an object".to_string()),
    };

    let mut installed = Resolution::new();
    for (name, value) in entries {
        validate_name(&name).map_err(|e| format!("entry `{}` is malformed: {}", name, e))?;
        let locked: LockedLibrary = serde_json::from_value(value)
            .map_err(|e| format!("entry `{}` is malformed: {}", name, e))?;
        let _ = installed.try_insert(locked.into_record(name));
    }

    Ok(LockfileState {
        schema_version: SCHEMA_VERSION.to_string(),
        installed,
    })
}

fn encode(installed: &Resolution) -> Result<String> {
    let mut entries = Map::new();
    for record in installed {
        let value = serde_json::to_value(LockedLibrary::from_record(record))
            .with_context(|| format!("failed to encode library `{}`", record.name))?;
        entries.insert(record.name.clone(), value);
    }

    let doc = LockfileDocument {
        schema_version: Some(SCHEMA_VERSION.to_string()),
        installed: Value::Object(entries),
    };

    let mut contents =
        serde_json::to_string_pretty(&doc).context("failed to serialize lock file")?;
    contents.push('\n');
    Ok(contents)
}
