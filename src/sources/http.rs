//! The default fetcher: HTTP(S) and local archives.
//!
//! Downloads are verified against the declared checksum before anything
//! is unpacked. Unpacking happens in a staging directory next to the
//! install path, so a broken archive never clobbers a working install.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

use crate::core::layout::{InstallLayout, LayoutError};
use crate::core::library::LibraryRecord;
use crate::core::project::Project;
use crate::sources::archive;
use crate::sources::fetcher::{FetchError, Fetcher, RemovalError};
use crate::util::config::Config;
use crate::util::hash::verify_checksum;

/// Where an archive is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ArchiveLocation {
    Remote(Url),
    Local(PathBuf),
}

/// Fetches archives over HTTP or from the local filesystem.
#[derive(Debug)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    layout: InstallLayout,
    base_dir: PathBuf,
    offline: bool,
    retries: u32,
}

impl HttpFetcher {
    /// Create a fetcher installing into `layout`.
    ///
    /// Relative local archive paths are resolved against `base_dir`.
    pub fn new(layout: InstallLayout, base_dir: impl Into<PathBuf>, config: &Config) -> Result<Self> {
        let client = build_client(config.timeout())?;
        Ok(HttpFetcher {
            client,
            layout,
            base_dir: base_dir.into(),
            offline: config.net.offline,
            retries: config.retries(),
        })
    }

    /// Create a fetcher for a project.
    pub fn for_project(project: &Project) -> Result<Self> {
        Self::new(project.layout().clone(), project.root(), project.config())
    }

    fn locate(&self, url: &str) -> Result<ArchiveLocation, FetchError> {
        match Url::parse(url) {
            // A single letter scheme is a Windows drive, not a URL.
            Ok(parsed) if parsed.scheme().len() > 1 => match parsed.scheme() {
                "http" | "https" => Ok(ArchiveLocation::Remote(parsed)),
                "file" => parsed
                    .to_file_path()
                    .map(ArchiveLocation::Local)
                    .map_err(|()| FetchError::Network {
                        url: url.to_string(),
                        message: "file URL does not name a local path".to_string(),
                    }),
                scheme => Err(FetchError::Network {
                    url: url.to_string(),
                    message: format!("unsupported URL scheme `{}`", scheme),
                }),
            },
            _ => Ok(ArchiveLocation::Local(self.base_dir.join(url))),
        }
    }

    fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        match self.locate(url)? {
            ArchiveLocation::Local(path) => {
                tracing::debug!("Reading archive from {}", path.display());
                fs::read(&path).map_err(|e| FetchError::Network {
                    url: url.to_string(),
                    message: format!("failed to read {}: {}", path.display(), e),
                })
            }
            ArchiveLocation::Remote(remote) => {
                if self.offline {
                    return Err(FetchError::Network {
                        url: url.to_string(),
                        message: "network access is disabled (offline mode)".to_string(),
                    });
                }

                let mut attempt = 0;
                loop {
                    match self.get(&remote) {
                        Ok(bytes) => return Ok(bytes),
                        Err(message) if attempt < self.retries => {
                            attempt += 1;
                            tracing::warn!(
                                "Download of {} failed ({}), retrying ({}/{})",
                                url,
                                message,
                                attempt,
                                self.retries
                            );
                        }
                        Err(message) => {
                            return Err(FetchError::Network {
                                url: url.to_string(),
                                message,
                            })
                        }
                    }
                }
            }
        }
    }

    fn get(&self, url: &Url) -> Result<Vec<u8>, String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }

        response
            .bytes()
            .map(|bytes| bytes.to_vec())
            .map_err(|e| format!("failed to read response body: {}", e))
    }
}

impl Fetcher for HttpFetcher {
    fn download(&self, record: &LibraryRecord, install_path: &Path) -> Result<(), FetchError> {
        tracing::info!(
            "Downloading {} ({}) from {}",
            record.name,
            record.version,
            record.url
        );

        let bytes = self.fetch_bytes(&record.url)?;

        if let Some(expected) = &record.shasum {
            verify_checksum(&bytes, expected).map_err(|actual| FetchError::ChecksumMismatch {
                url: record.url.clone(),
                expected: expected.clone(),
                actual,
            })?;
            tracing::debug!("Checksum verified for {}", record.name);
        }

        let parent = match install_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| FetchError::io(parent, e))?;

        let staging = tempfile::Builder::new()
            .prefix(".libinstall-")
            .tempdir_in(parent)
            .map_err(|e| FetchError::io(parent, e))?;

        let unpack_error = |e: anyhow::Error| FetchError::Unpack {
            url: record.url.clone(),
            message: format!("{:#}", e),
        };
        archive::unpack(&bytes, record.dist_type, staging.path()).map_err(unpack_error)?;
        let content = archive::content_root(staging.path()).map_err(unpack_error)?;

        match fs::symlink_metadata(install_path) {
            Ok(_) => crate::util::fs::remove_path(install_path)
                .map_err(|e| FetchError::io(install_path, e))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(FetchError::io(install_path, e)),
        }

        fs::rename(&content, install_path).map_err(|e| FetchError::io(install_path, e))?;

        tracing::debug!("Installed {} into {}", record.name, install_path.display());
        Ok(())
    }

    fn remove(&self, install_path: &Path) -> Result<(), RemovalError> {
        match fs::symlink_metadata(install_path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("{} is already gone", install_path.display());
                return Ok(());
            }
            Err(source) => {
                return Err(RemovalError {
                    path: install_path.to_path_buf(),
                    source,
                })
            }
            Ok(_) => {}
        }

        crate::util::fs::remove_path(install_path).map_err(|source| RemovalError {
            path: install_path.to_path_buf(),
            source,
        })
    }

    fn resolve_install_path(&self, name: &str) -> Result<PathBuf, LayoutError> {
        self.layout.install_path(name)
    }
}

fn build_client(timeout: Duration) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("libinstall/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::fixtures::{tar_gz_archive, zip_archive};
    use crate::util::hash::sha1_bytes;
    use tempfile::TempDir;

    fn fetcher(root: &Path) -> HttpFetcher {
        let layout = InstallLayout::new(root, "libraries/{$name}");
        HttpFetcher::new(layout, root, &Config::default()).unwrap()
    }

    fn file_url(path: &Path) -> String {
        Url::from_file_path(path).unwrap().to_string()
    }

    #[test]
    fn test_download_file_url_hoists_single_root() {
        let tmp = TempDir::new().unwrap();
        let archive = tmp.path().join("chosen-1.8.7.tar.gz");
        fs::write(
            &archive,
            tar_gz_archive(&[("chosen-1.8.7/chosen.js", "js"), ("chosen-1.8.7/docs/a.md", "a")]),
        )
        .unwrap();

        let fetcher = fetcher(tmp.path());
        let record = LibraryRecord::new("chosen", file_url(&archive), "root");
        let dest = fetcher.resolve_install_path("chosen").unwrap();

        fetcher.download(&record, &dest).unwrap();

        assert_eq!(fs::read_to_string(dest.join("chosen.js")).unwrap(), "js");
        assert!(dest.join("docs/a.md").is_file());
        // Staging directory is gone
        let leftovers: Vec<_> = fs::read_dir(dest.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("chosen")]);
    }

    #[test]
    fn test_download_relative_path_replaces_existing() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.zip"), zip_archive(&[("new.js", "new")])).unwrap();

        let fetcher = fetcher(tmp.path());
        let dest = fetcher.resolve_install_path("a").unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("stale.js"), "old").unwrap();

        let record = LibraryRecord::new("a", "a.zip", "root");
        fetcher.download(&record, &dest).unwrap();

        assert!(dest.join("new.js").is_file());
        assert!(!dest.join("stale.js").exists());
    }

    #[test]
    fn test_checksum_mismatch_leaves_install_untouched() {
        let tmp = TempDir::new().unwrap();
        let data = zip_archive(&[("a.js", "a")]);
        fs::write(tmp.path().join("a.zip"), &data).unwrap();

        let fetcher = fetcher(tmp.path());
        let dest = fetcher.resolve_install_path("a").unwrap();
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("keep.js"), "keep").unwrap();

        let record = LibraryRecord::new("a", "a.zip", "root")
            .with_shasum("0000000000000000000000000000000000000000");
        let err = fetcher.download(&record, &dest).unwrap_err();

        match err {
            FetchError::ChecksumMismatch { actual, .. } => assert_eq!(actual, sha1_bytes(&data)),
            other => panic!("unexpected error: {other}"),
        }
        assert!(dest.join("keep.js").is_file());
    }

    #[test]
    fn test_matching_checksum() {
        let tmp = TempDir::new().unwrap();
        let data = zip_archive(&[("a.js", "a")]);
        fs::write(tmp.path().join("a.zip"), &data).unwrap();

        let fetcher = fetcher(tmp.path());
        let dest = fetcher.resolve_install_path("a").unwrap();
        let record = LibraryRecord::new("a", "a.zip", "root").with_shasum(sha1_bytes(&data));

        fetcher.download(&record, &dest).unwrap();
        assert!(dest.join("a.js").is_file());
    }

    #[test]
    fn test_offline_refuses_network() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.net.offline = true;
        let fetcher =
            HttpFetcher::new(InstallLayout::new(tmp.path(), "libraries/{$name}"), tmp.path(), &config)
                .unwrap();

        let record = LibraryRecord::new("a", "https://example.invalid/a-1.0.zip", "root");
        let err = fetcher
            .download(&record, &fetcher.resolve_install_path("a").unwrap())
            .unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }));
    }

    #[test]
    fn test_missing_local_archive_is_network_error() {
        let tmp = TempDir::new().unwrap();
        let fetcher = fetcher(tmp.path());
        let record = LibraryRecord::new("a", "missing.zip", "root");

        let err = fetcher
            .download(&record, &fetcher.resolve_install_path("a").unwrap())
            .unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }));
    }

    #[test]
    fn test_unsupported_scheme() {
        let tmp = TempDir::new().unwrap();
        let fetcher = fetcher(tmp.path());
        let record = LibraryRecord::new("a", "ftp://example.com/a.zip", "root");

        let err = fetcher
            .download(&record, &fetcher.resolve_install_path("a").unwrap())
            .unwrap_err();
        assert!(matches!(err, FetchError::Network { .. }));
    }

    #[test]
    fn test_bad_archive_is_unpack_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.zip"), b"definitely not a zip").unwrap();

        let fetcher = fetcher(tmp.path());
        let record = LibraryRecord::new("a", "a.zip", "root");
        let err = fetcher
            .download(&record, &fetcher.resolve_install_path("a").unwrap())
            .unwrap_err();
        assert!(matches!(err, FetchError::Unpack { .. }));
    }

    #[test]
    fn test_remove() {
        let tmp = TempDir::new().unwrap();
        let fetcher = fetcher(tmp.path());
        let dest = fetcher.resolve_install_path("a").unwrap();
        fs::create_dir_all(dest.join("js")).unwrap();

        fetcher.remove(&dest).unwrap();
        assert!(!dest.exists());

        // Removing something already gone is fine
        fetcher.remove(&dest).unwrap();
    }

    #[test]
    fn test_names_outside_libraries_dir_are_refused() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("composer.json"), "{}").unwrap();
        fs::write(tmp.path().join("a.zip"), zip_archive(&[("a.js", "a")])).unwrap();

        let fetcher = fetcher(tmp.path());
        for name in ["..", ""] {
            let err = fetcher.resolve_install_path(name).unwrap_err();
            assert!(matches!(err, LayoutError::OutsideBase { .. }));
        }

        assert!(tmp.path().join("composer.json").is_file());
        assert!(tmp.path().join("a.zip").is_file());
    }
}
