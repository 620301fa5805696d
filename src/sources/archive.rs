//! Archive unpacking.
//!
//! Supports zip, plain tar and gzip-compressed tar. The format is taken
//! from the archive's magic bytes when they are recognizable and from
//! the declared distribution type otherwise.

use std::fs;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::library::DistributionType;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_MAGIC: &[u8] = b"PK\x05\x06";
const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const BZIP2_MAGIC: &[u8] = b"BZh";
const RAR_MAGIC: &[u8] = b"Rar!";

/// Concrete container format of downloaded bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
    TarBz2,
    Rar,
}

impl ArchiveFormat {
    /// Detect the format, trusting magic bytes over the declared type.
    pub fn detect(data: &[u8], declared: DistributionType) -> ArchiveFormat {
        if data.starts_with(ZIP_MAGIC) || data.starts_with(ZIP_EMPTY_MAGIC) {
            return ArchiveFormat::Zip;
        }
        if data.starts_with(GZIP_MAGIC) {
            return ArchiveFormat::TarGz;
        }
        if data.starts_with(BZIP2_MAGIC) {
            return ArchiveFormat::TarBz2;
        }
        if data.starts_with(RAR_MAGIC) {
            return ArchiveFormat::Rar;
        }

        match declared {
            DistributionType::Zip => ArchiveFormat::Zip,
            DistributionType::Rar => ArchiveFormat::Rar,
            DistributionType::Tar => ArchiveFormat::Tar,
            DistributionType::TarGz => ArchiveFormat::TarGz,
            DistributionType::TarBz2 => ArchiveFormat::TarBz2,
        }
    }
}

/// Unpack archive bytes into `dest`.
pub fn unpack(data: &[u8], declared: DistributionType, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)
        .with_context(|| format!("failed to create directory: {}", dest.display()))?;

    let format = ArchiveFormat::detect(data, declared);
    tracing::debug!("Unpacking {:?} archive into {}", format, dest.display());

    match format {
        ArchiveFormat::Zip => extract_zip(data, dest),
        ArchiveFormat::Tar => extract_tar(Cursor::new(data), dest),
        ArchiveFormat::TarGz => extract_tar(flate2::read::GzDecoder::new(Cursor::new(data)), dest),
        ArchiveFormat::TarBz2 => bail!("bzip2 compressed archives are not supported"),
        ArchiveFormat::Rar => bail!("rar archives are not supported"),
    }
}

/// The directory holding an unpacked archive's content.
///
/// An archive whose only top-level entry is a directory is wrapped in
/// that directory; its contents are the library.
pub fn content_root(dir: &Path) -> Result<PathBuf> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<io::Result<Vec<_>>>()
        .with_context(|| format!("failed to read directory: {}", dir.display()))?;

    if entries.len() == 1 {
        let entry = entries.remove(0);
        if entry.file_type()?.is_dir() {
            return Ok(entry.path());
        }
    }
    Ok(dir.to_path_buf())
}

fn extract_zip(data: &[u8], dest: &Path) -> Result<()> {
    let mut archive =
        zip::ZipArchive::new(Cursor::new(data)).context("failed to read zip archive")?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .with_context(|| format!("failed to read zip entry {}", i))?;

        let outpath = match file.enclosed_name() {
            Some(path) => dest.join(path),
            None => {
                tracing::warn!("Skipping zip entry with unsafe path: {}", file.name());
                continue;
            }
        };

        if file.is_dir() {
            fs::create_dir_all(&outpath)
                .with_context(|| format!("failed to create directory: {}", outpath.display()))?;
            continue;
        }

        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }

        let mut outfile = fs::File::create(&outpath)
            .with_context(|| format!("failed to create file: {}", outpath.display()))?;
        io::copy(&mut file, &mut outfile)
            .with_context(|| format!("failed to extract file: {}", outpath.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = file.unix_mode() {
                fs::set_permissions(&outpath, fs::Permissions::from_mode(mode)).with_context(
                    || format!("failed to set permissions: {}", outpath.display()),
                )?;
            }
        }
    }

    Ok(())
}

fn extract_tar<R: Read>(reader: R, dest: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(reader);

    for entry in archive.entries().context("failed to read tar entries")? {
        let mut entry = entry.context("failed to read tar entry")?;
        let path = entry
            .path()
            .context("failed to get entry path")?
            .to_path_buf();

        // Global pax headers carry no file
        if entry.header().entry_type() == tar::EntryType::XGlobalHeader {
            continue;
        }

        // unpack_in refuses paths escaping `dest`
        let unpacked = entry
            .unpack_in(dest)
            .with_context(|| format!("failed to extract {}", path.display()))?;
        if !unpacked {
            tracing::warn!("Skipping tar entry with unsafe path: {}", path.display());
        }
    }

    Ok(())
}
