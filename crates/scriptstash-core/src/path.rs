//! Path helpers used to derive document names and locations.
//!
//! These are pure functions of the stored location; none of them touch the
//! filesystem.
//!
//! ```ignore
//! use scriptstash_core::path::{file_name, file_extension, file_directory};
//!
//! assert_eq!(file_name("/scripts/users.sql"), "users.sql");
//! assert_eq!(file_extension("/scripts/users.sql"), ".sql");
//! assert_eq!(file_directory("/scripts/users.sql"), Some("/scripts".into()));
//! ```

use std::path::{Path, PathBuf};

/// Returns the final component of a path, or an empty string when there is none.
pub fn file_name(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Returns the extension including its leading dot (`".json"`).
///
/// Returns an empty string when the file name has no extension.
pub fn file_extension(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .extension()
        .map(|s| format!(".{}", s.to_string_lossy()))
        .unwrap_or_default()
}

/// Returns the directory holding the file, if the path has one.
pub fn file_directory(path: impl AsRef<Path>) -> Option<PathBuf> {
    path.as_ref()
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

/// Strips trailing path separators, keeping a lone root separator intact.
///
/// Works on path components, so names that are not valid UTF-8 are kept as is.
pub fn trim_trailing_separators(path: impl AsRef<Path>) -> PathBuf {
    path.as_ref().components().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("/scripts/users.sql"), "users.sql");
        assert_eq!(file_name("users.sql"), "users.sql");
        assert_eq!(file_name(""), "");
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("/tokens/set.json"), ".json");
        assert_eq!(file_extension("/tokens/archive.tar.gz"), ".gz");
        assert_eq!(file_extension("/tokens/Makefile"), "");
    }

    #[test]
    fn test_file_directory() {
        assert_eq!(
            file_directory("/scripts/users.sql"),
            Some(PathBuf::from("/scripts"))
        );
        assert_eq!(file_directory("users.sql"), None);
    }

    #[test]
    fn test_trim_trailing_separators() {
        assert_eq!(trim_trailing_separators("/scripts/"), PathBuf::from("/scripts"));
        assert_eq!(trim_trailing_separators("/scripts//"), PathBuf::from("/scripts"));
        assert_eq!(trim_trailing_separators("/"), PathBuf::from("/"));
        assert_eq!(trim_trailing_separators("scripts"), PathBuf::from("scripts"));
    }

    #[cfg(unix)]
    #[test]
    fn test_trim_keeps_non_utf8_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let raw = Path::new(OsStr::from_bytes(b"/scripts/caf\xe9/"));
        let trimmed = trim_trailing_separators(raw);
        assert_eq!(trimmed.as_os_str().as_bytes(), b"/scripts/caf\xe9");
    }
}
