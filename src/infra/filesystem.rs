//! Filesystem operations
//!
//! Handles file reads, writes and source tree scans.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::config::defaults::IGNORED_DIRECTORIES;
use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Write content to a file
pub fn write_file(path: &Path, content: &str) -> Result<(), FilesystemError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    std::fs::write(path, content).map_err(|e| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read content from a file
pub fn read_file(path: &Path) -> Result<String, FilesystemError> {
    std::fs::read_to_string(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

fn is_ignored(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| IGNORED_DIRECTORIES.contains(&name) || name.starts_with(".galley"))
}

/// Find files under `root` whose file name satisfies `matches`
///
/// Dependency and output directories are skipped. Results are sorted so
/// scans are reproducible.
pub fn find_files<F>(root: &Path, matches: F) -> Result<Vec<PathBuf>, FilesystemError>
where
    F: Fn(&str) -> bool,
{
    let mut found = Vec::new();

    for entry in WalkDir::new(root).into_iter().filter_entry(|e| !is_ignored(e)) {
        let entry = entry.map_err(|e| FilesystemError::Scan {
            path: root.to_path_buf(),
            error: e.to_string(),
        })?;

        if entry.file_type().is_file()
            && entry.file_name().to_str().is_some_and(&matches)
        {
            found.push(entry.into_path());
        }
    }

    found.sort();
    Ok(found)
}

/// Find files with the given exact name
pub fn find_named(root: &Path, file_name: &str) -> Result<Vec<PathBuf>, FilesystemError> {
    find_files(root, |name| name == file_name)
}

/// Find files with the given extension (without the dot)
pub fn find_with_extension(root: &Path, extension: &str) -> Result<Vec<PathBuf>, FilesystemError> {
    let suffix = format!(".{extension}");
    find_files(root, |name| name.ends_with(&suffix))
}

/// Express `path` relative to `root`, or return it unchanged
pub fn relative_to(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}
