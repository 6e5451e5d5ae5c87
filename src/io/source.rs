use std::fs;
use std::io;
use std::path::Path;

use crate::error::{Error, Result};

/// Read a whole archive into memory.
///
/// A missing file is reported as [`Error::ArchiveNotFound`] so callers can
/// tell it apart from other I/O failures.
pub fn read_archive(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::ArchiveNotFound(path.to_path_buf()),
        _ => Error::Io(e),
    })
}

/// Whether `path` looks like an archive file (`.enex`, any case).
pub fn is_archive_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("enex"))
}

/// Expand inputs into archive files.
///
/// Files are taken as given; directories contribute their `.enex` entries
/// (not recursive), sorted by name so runs are reproducible.
pub fn discover_archives(inputs: &[impl AsRef<Path>]) -> Result<Vec<std::path::PathBuf>> {
    let mut archives = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        if input.is_dir() {
            let mut found: Vec<_> = fs::read_dir(input)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_archive_path(p))
                .collect();
            found.sort();
            archives.extend(found);
        } else {
            archives.push(input.to_path_buf());
        }
    }
    Ok(archives)
}
