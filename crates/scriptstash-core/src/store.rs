//! The file store collaborator.
//!
//! Documents and token files never touch `std::fs` directly; they go through a
//! [`FileStore`]. Two implementations are provided:
//!
//! - [`LocalFileStore`] reads and writes the local filesystem, optionally
//!   replacing files atomically.
//! - [`MemoryFileStore`] keeps every file in memory, which is useful for hosts
//!   that assemble documents without a disk and for tests.
//!
//! Both also implement [`FileLister`], so a single store can back a whole
//! document collection.
//!
//! ```ignore
//! use scriptstash_core::store::{FileStore, MemoryFileStore};
//!
//! let store = MemoryFileStore::new()
//!     .with_file("/scripts/users.sql", "SELECT *\nFROM USERS\n");
//! assert_eq!(store.read_lines("/scripts/users.sql".as_ref())?.len(), 2);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::LINE_SEPARATOR;
use crate::error::{FileError, FileResult};
use crate::logging::targets;
use crate::walk::{self, FileLister, ListOptions, glob_to_regex};
use crate::writer;

// ============================================================================
// FileStore
// ============================================================================

/// Line- and text-level access to stored files.
pub trait FileStore: Send + Sync + fmt::Debug {
    /// Reads every line of a file, without line terminators.
    ///
    /// # Errors
    ///
    /// Returns a `NotFound` error if the file does not exist, or another
    /// error if it cannot be read or is not valid UTF-8.
    fn read_lines(&self, path: &Path) -> FileResult<Vec<String>> {
        Ok(self.read_text(path)?.lines().map(str::to_string).collect())
    }

    /// Writes `lines`, each followed by the platform line separator.
    ///
    /// # Errors
    ///
    /// Returns an `AlreadyExists` error if `overwrite` is false and the file
    /// exists, or another error if the file cannot be written.
    fn write_lines(&self, path: &Path, lines: &[String], overwrite: bool) -> FileResult<()> {
        if !overwrite && self.exists(path) {
            return Err(FileError::already_exists(path));
        }
        let mut text = String::with_capacity(lines.iter().map(|l| l.len() + 2).sum());
        for line in lines {
            text.push_str(line);
            text.push_str(LINE_SEPARATOR);
        }
        self.write_text(path, &text)
    }

    /// Reads the entire contents of a file.
    fn read_text(&self, path: &Path) -> FileResult<String>;

    /// Replaces the entire contents of a file, creating it if needed.
    fn write_text(&self, path: &Path, text: &str) -> FileResult<()>;

    /// Returns true if `path` names an existing file.
    fn exists(&self, path: &Path) -> bool;

    /// Returns true if `path` names an existing directory.
    fn is_dir(&self, path: &Path) -> bool;
}

// ============================================================================
// LocalFileStore
// ============================================================================

/// A [`FileStore`] over the local filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalFileStore {
    atomic_writes: bool,
}

impl Default for LocalFileStore {
    fn default() -> Self {
        Self {
            atomic_writes: true,
        }
    }
}

impl LocalFileStore {
    /// Creates a store that replaces files atomically.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether writes go through a temporary file and rename.
    pub fn atomic_writes(mut self, atomic: bool) -> Self {
        self.atomic_writes = atomic;
        self
    }
}

impl FileStore for LocalFileStore {
    fn read_text(&self, path: &Path) -> FileResult<String> {
        tracing::trace!(target: targets::STORE, path = %path.display(), "read");
        fs::read_to_string(path).map_err(|e| FileError::from_io(e, path))
    }

    fn write_text(&self, path: &Path, text: &str) -> FileResult<()> {
        tracing::trace!(
            target: targets::STORE,
            path = %path.display(),
            bytes = text.len(),
            atomic = self.atomic_writes,
            "write"
        );
        if self.atomic_writes {
            writer::replace_file(path, text)
        } else {
            fs::write(path, text).map_err(|e| FileError::from_io(e, path))
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

impl FileLister for LocalFileStore {
    fn list_files(
        &self,
        root: &Path,
        pattern: &str,
        options: &ListOptions,
    ) -> FileResult<Vec<PathBuf>> {
        walk::list_files(root, pattern, options)
    }
}

// ============================================================================
// MemoryFileStore
// ============================================================================

/// An in-memory [`FileStore`].
///
/// Directories exist implicitly as ancestors of stored files, or explicitly
/// through [`create_dir`](Self::create_dir). Writing into a directory that
/// does not exist fails the same way the local filesystem does.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    files: RwLock<BTreeMap<PathBuf, String>>,
    dirs: RwLock<BTreeSet<PathBuf>>,
}

impl MemoryFileStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file and returns the store, for building fixtures.
    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    /// Adds or replaces a file, creating its directories.
    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        let path = path.into();
        if let Some(parent) = path.parent() {
            self.create_dir(parent);
        }
        self.files.write().insert(path, content.into());
    }

    /// Removes a file, returning true if it existed.
    pub fn remove(&self, path: impl AsRef<Path>) -> bool {
        self.files.write().remove(path.as_ref()).is_some()
    }

    /// Creates a directory and all of its ancestors.
    pub fn create_dir(&self, path: impl AsRef<Path>) {
        let mut dirs = self.dirs.write();
        for ancestor in path.as_ref().ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            dirs.insert(ancestor.to_path_buf());
        }
    }

    /// Returns the stored content of a file.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.read().get(path.as_ref()).cloned()
    }

    /// Returns the number of stored files.
    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    /// Returns true if no files are stored.
    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl FileStore for MemoryFileStore {
    fn read_text(&self, path: &Path) -> FileResult<String> {
        self.files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| FileError::not_found(path))
    }

    fn write_text(&self, path: &Path, text: &str) -> FileResult<()> {
        if self.dirs.read().contains(path) {
            return Err(FileError::is_directory(path));
        }
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !self.is_dir(parent)
        {
            return Err(FileError::not_found(path));
        }
        self.files.write().insert(path.to_path_buf(), text.to_string());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.read().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.read().contains(path)
    }
}

impl FileLister for MemoryFileStore {
    fn list_files(
        &self,
        root: &Path,
        pattern: &str,
        options: &ListOptions,
    ) -> FileResult<Vec<PathBuf>> {
        if !self.is_dir(root) {
            return Err(if self.exists(root) {
                FileError::not_directory(root)
            } else {
                FileError::not_found(root)
            });
        }
        let regex = glob_to_regex(pattern, options.case_insensitive)?;
        let limit = options.depth_limit();

        let files = self.files.read();
        let found: Vec<PathBuf> = files
            .keys()
            .filter_map(|path| {
                let relative = path.strip_prefix(root).ok()?;
                let depth = relative.components().count();
                if limit.is_some_and(|max| depth > max) {
                    return None;
                }
                if options.skip_hidden
                    && relative
                        .components()
                        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
                {
                    return None;
                }
                let name = path.file_name()?.to_string_lossy();
                regex.is_match(&name).then(|| path.clone())
            })
            .collect();

        tracing::debug!(
            target: targets::WALK,
            root = %root.display(),
            pattern,
            count = found.len(),
            "listed in-memory files"
        );
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_local_round_trip_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.sql");
        let store = LocalFileStore::new();
        let lines = vec!["SELECT *".to_string(), "FROM USERS".to_string()];

        store.write_lines(&path, &lines, true).unwrap();

        assert!(store.exists(&path));
        assert_eq!(store.read_lines(&path).unwrap(), lines);
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.ends_with(LINE_SEPARATOR));
    }

    #[test]
    fn test_local_non_atomic_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tokens.csv");
        let store = LocalFileStore::new().atomic_writes(false);

        store.write_text(&path, "\"k\",\"v\"").unwrap();

        assert_eq!(store.read_text(&path).unwrap(), "\"k\",\"v\"");
    }

    #[test]
    fn test_local_write_without_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.sql");
        fs::write(&path, "keep").unwrap();

        let err = LocalFileStore::new()
            .write_lines(&path, &["new".to_string()], false)
            .unwrap_err();

        assert_eq!(err.kind(), crate::error::FileErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep");
    }

    #[test]
    fn test_local_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = LocalFileStore::new()
            .read_lines(&dir.path().join("missing.sql"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_local_exists_is_file_only() {
        let dir = TempDir::new().unwrap();
        let store = LocalFileStore::new();
        assert!(!store.exists(dir.path()));
        assert!(store.is_dir(dir.path()));
    }

    #[test]
    fn test_memory_store_directories() {
        let store = MemoryFileStore::new().with_file("/scripts/sql/users.sql", "SELECT 1");
        assert!(store.is_dir(Path::new("/scripts")));
        assert!(store.is_dir(Path::new("/scripts/sql")));
        assert!(!store.is_dir(Path::new("/scripts/sql/users.sql")));
        assert!(store.exists(Path::new("/scripts/sql/users.sql")));
    }

    #[test]
    fn test_memory_store_write_requires_directory() {
        let store = MemoryFileStore::new();
        let err = store
            .write_text(Path::new("/missing/users.sql"), "x")
            .unwrap_err();
        assert!(err.is_not_found());

        store.create_dir("/out");
        store.write_text(Path::new("/out/users.sql"), "x").unwrap();
        assert_eq!(store.contents("/out/users.sql").as_deref(), Some("x"));
    }

    #[test]
    fn test_memory_store_lines() {
        let store = MemoryFileStore::new().with_file("/a/b.txt", "one\r\ntwo\n");
        assert_eq!(
            store.read_lines(Path::new("/a/b.txt")).unwrap(),
            vec!["one".to_string(), "two".to_string()]
        );
    }

    #[test]
    fn test_memory_store_listing() {
        let store = MemoryFileStore::new()
            .with_file("/scripts/users.sql", "")
            .with_file("/scripts/phones.sql", "")
            .with_file("/scripts/readme.txt", "")
            .with_file("/scripts/nested/monthly.sql", "")
            .with_file("/scripts/.cache/tmp.sql", "")
            .with_file("/other/users.sql", "");

        let all = store
            .list_files(Path::new("/scripts"), "*.sql", &ListOptions::default())
            .unwrap();
        assert_eq!(all.len(), 4);

        let top = store
            .list_files(
                Path::new("/scripts"),
                "*.sql",
                &ListOptions::new().recursive(false),
            )
            .unwrap();
        assert_eq!(
            top,
            vec![
                PathBuf::from("/scripts/phones.sql"),
                PathBuf::from("/scripts/users.sql")
            ]
        );

        let visible = store
            .list_files(
                Path::new("/scripts"),
                "*.sql",
                &ListOptions::new().skip_hidden(true),
            )
            .unwrap();
        assert_eq!(visible.len(), 3);
    }

    #[test]
    fn test_memory_store_listing_missing_root() {
        let store = MemoryFileStore::new();
        let err = store
            .list_files(Path::new("/nowhere"), "*", &ListOptions::default())
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
