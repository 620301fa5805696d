//! Test fixtures for common test scenarios.
//!
//! This module provides Composer project layouts and in-memory archives
//! for testing libinstall.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tempfile::TempDir;

/// Fixture for a Composer project on disk.
///
/// Dropping the fixture removes the project directory.
#[derive(Debug)]
pub struct ProjectFixture {
    dir: TempDir,
    root: Value,
    installed: Vec<Value>,
    composer1: bool,
}

impl ProjectFixture {
    /// Create a fixture with an empty root manifest.
    pub fn new() -> Self {
        ProjectFixture {
            dir: TempDir::new().expect("failed to create temp dir"),
            root: json!({ "name": "acme/site" }),
            installed: Vec::new(),
            composer1: false,
        }
    }

    /// Set the root `composer.json`.
    pub fn with_root(mut self, manifest: Value) -> Self {
        self.root = manifest;
        self
    }

    /// Add an entry to `installed.json`.
    pub fn with_installed(mut self, package: Value) -> Self {
        self.installed.push(package);
        self
    }

    /// Write `installed.json` as a bare list, like Composer 1.
    pub fn composer1(mut self) -> Self {
        self.composer1 = true;
        self
    }

    /// Write the manifest files to disk.
    pub fn write(self) -> Self {
        let manifest = serde_json::to_string_pretty(&self.root).expect("failed to encode manifest");
        std::fs::write(self.manifest_path(), manifest).expect("failed to write composer.json");

        if !self.installed.is_empty() {
            let vendor = self
                .root
                .pointer("/config/vendor-dir")
                .and_then(Value::as_str)
                .unwrap_or("vendor");
            let path = self.root().join(vendor).join("composer").join("installed.json");
            std::fs::create_dir_all(path.parent().expect("installed.json has a parent"))
                .expect("failed to create vendor dir");

            let doc = if self.composer1 {
                Value::Array(self.installed.clone())
            } else {
                json!({ "packages": self.installed.clone(), "dev": true })
            };
            std::fs::write(&path, serde_json::to_string_pretty(&doc).expect("encode"))
                .expect("failed to write installed.json");
        }

        self
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Path to `composer.json`.
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.path().join("composer.json")
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a zip archive from `(path, contents)` pairs.
pub fn zip_archive(files: &[(&str, &str)]) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buf);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);

        for (path, contents) in files {
            zip.start_file(*path, options).expect("failed to start zip entry");
            zip.write_all(contents.as_bytes()).expect("failed to write zip entry");
        }
        zip.finish().expect("failed to finish zip");
    }
    buf.into_inner()
}

/// Build a gzip-compressed tarball from `(path, contents)` pairs.
pub fn tar_gz_archive(files: &[(&str, &str)]) -> Vec<u8> {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let mut data = Vec::new();
    {
        let encoder = GzEncoder::new(&mut data, Compression::default());
        let mut builder = tar::Builder::new(encoder);

        for (path, contents) in files {
            let mut header = tar::Header::new_gnu();
            header.set_path(path).expect("invalid tar path");
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append(&header, contents.as_bytes())
                .expect("failed to append tar entry");
        }

        builder
            .into_inner()
            .and_then(|encoder| encoder.finish())
            .expect("failed to finish tarball");
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::load_installed;

    #[test]
    fn test_project_fixture_writes_composer1_list() {
        let fixture = ProjectFixture::new()
            .with_installed(json!({ "name": "a/a" }))
            .composer1()
            .write();

        let packages =
            load_installed(&fixture.root().join("vendor/composer/installed.json")).unwrap();
        assert_eq!(packages.len(), 1);
        assert_eq!(packages[0].package_name(), "a/a");
    }
}
