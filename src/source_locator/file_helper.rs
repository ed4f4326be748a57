//! Read-only filesystem access. Every path handed out is normalized to `/`
//! separators so comparisons, cache keys and diagnostics agree across
//! platforms.

use super::error::LocatorError;
use std::path::{Path, PathBuf};

pub fn normalize_path(path: &Path) -> String {
    normalize_separators(&path.to_string_lossy())
}

pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}

pub fn is_readable_file(path: &Path) -> bool {
    path.is_file() && std::fs::File::open(path).is_ok()
}

pub fn read_file(path: &Path) -> Result<Vec<u8>, LocatorError> {
    if !path.is_file() {
        return Err(LocatorError::InvalidFileLocation(normalize_path(path)));
    }
    std::fs::read(path).map_err(|source| LocatorError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Directory of a normalized file name, as `__DIR__` reports it.
pub fn dir_name(file: &str) -> String {
    match file.rfind('/') {
        Some(0) => "/".to_string(),
        Some(i) => file[..i].to_string(),
        None => ".".to_string(),
    }
}

/// `.php` files below `directory`, in lexicographic path order.
pub fn php_files_in(directory: &Path) -> Vec<PathBuf> {
    walkdir::WalkDir::new(directory)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::warn!(error = %err, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("php"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_windows_separators() {
        assert_eq!(normalize_separators("C:\\src\\Foo.php"), "C:/src/Foo.php");
        assert_eq!(dir_name("/src/app/Foo.php"), "/src/app");
        assert_eq!(dir_name("/Foo.php"), "/");
    }
}
