//! Ignore-pattern pruning of unpacked libraries.

use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::util::fs::{remove_path, to_slash};
use crate::util::glob::GlobSet;

/// Delete every entry under `root` whose relative path matches `ignore`.
///
/// Hidden entries are visited like any other and symlinks are not
/// followed. A matched directory is removed whole and not descended into.
/// Returns the removed paths relative to `root`, with `/` separators.
pub fn prune(root: &Path, ignore: &GlobSet) -> Result<Vec<String>, (PathBuf, io::Error)> {
    let mut pruned = Vec::new();
    if ignore.is_empty() {
        return Ok(pruned);
    }

    let mut walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            let err = e
                .into_io_error()
                .unwrap_or_else(|| io::Error::other("filesystem loop"));
            (path, err)
        })?;

        let relative = match entry.path().strip_prefix(root) {
            Ok(rel) => to_slash(rel),
            Err(_) => continue,
        };

        if !ignore.is_match(&relative) {
            continue;
        }

        if entry.file_type().is_dir() {
            walker.skip_current_dir();
        }

        remove_path(entry.path()).map_err(|e| (entry.path().to_path_buf(), e))?;
        tracing::info!("Removing {}", relative);
        pruned.push(relative);
    }

    Ok(pruned)
}
