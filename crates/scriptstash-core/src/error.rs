//! Error types for the file store and file listing collaborators.
//!
//! Every [`FileError`] carries a [`FileErrorKind`], and usually the path it
//! concerns. Failures raised by the operating system keep the original
//! [`io::Error`] as their source; failures detected here (a bad glob, a
//! malformed config) carry a message instead.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Classification of a [`FileError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileErrorKind {
    /// The file or directory does not exist.
    NotFound,
    /// The process may not access the path.
    PermissionDenied,
    /// A file is already present where none was expected.
    AlreadyExists,
    /// The path itself is malformed.
    InvalidPath,
    /// A glob pattern is empty or cannot be compiled.
    InvalidPattern,
    /// A file operation was attempted on a directory.
    IsDirectory,
    /// A directory operation was attempted on a file.
    NotDirectory,
    /// A configuration file could not be read or written as TOML.
    InvalidConfig,
    /// Any other I/O failure.
    Other,
}

impl FileErrorKind {
    fn describe(self) -> &'static str {
        match self {
            FileErrorKind::NotFound => "not found",
            FileErrorKind::PermissionDenied => "permission denied",
            FileErrorKind::AlreadyExists => "already exists",
            FileErrorKind::InvalidPath => "invalid path",
            FileErrorKind::InvalidPattern => "invalid pattern",
            FileErrorKind::IsDirectory => "is a directory",
            FileErrorKind::NotDirectory => "not a directory",
            FileErrorKind::InvalidConfig => "invalid config",
            FileErrorKind::Other => "I/O failure",
        }
    }
}

impl From<io::ErrorKind> for FileErrorKind {
    fn from(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::NotFound => FileErrorKind::NotFound,
            io::ErrorKind::PermissionDenied => FileErrorKind::PermissionDenied,
            io::ErrorKind::AlreadyExists => FileErrorKind::AlreadyExists,
            io::ErrorKind::InvalidFilename => FileErrorKind::InvalidPath,
            io::ErrorKind::IsADirectory => FileErrorKind::IsDirectory,
            io::ErrorKind::NotADirectory => FileErrorKind::NotDirectory,
            _ => FileErrorKind::Other,
        }
    }
}

impl fmt::Display for FileErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A failed store or listing operation.
#[derive(Debug)]
pub struct FileError {
    kind: FileErrorKind,
    path: Option<PathBuf>,
    detail: Option<String>,
    source: Option<io::Error>,
}

/// Result alias for store and listing operations.
pub type FileResult<T> = Result<T, FileError>;

impl FileError {
    /// Creates an error of `kind` about `path`, with no further detail.
    pub fn new(kind: FileErrorKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: Some(path.into()),
            detail: None,
            source: None,
        }
    }

    /// Wraps an operating system failure on `path`.
    pub fn from_io(err: io::Error, path: impl Into<PathBuf>) -> Self {
        Self {
            kind: err.kind().into(),
            path: Some(path.into()),
            detail: None,
            source: Some(err),
        }
    }

    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(FileErrorKind::NotFound, path)
    }

    pub fn not_directory(path: impl Into<PathBuf>) -> Self {
        Self::new(FileErrorKind::NotDirectory, path)
    }

    pub fn is_directory(path: impl Into<PathBuf>) -> Self {
        Self::new(FileErrorKind::IsDirectory, path)
    }

    pub fn already_exists(path: impl Into<PathBuf>) -> Self {
        Self::new(FileErrorKind::AlreadyExists, path)
    }

    /// A glob pattern that cannot be used, with the reason.
    pub fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        Self::new(FileErrorKind::InvalidPattern, pattern).with_detail(reason)
    }

    /// A configuration that cannot be parsed or serialized, with the reason.
    pub fn invalid_config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::new(FileErrorKind::InvalidConfig, path).with_detail(reason)
    }

    /// Attaches a human-readable reason.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn kind(&self) -> FileErrorKind {
        self.kind
    }

    /// The path the operation was working on, if known.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// The operating system error behind this failure, if there was one.
    pub fn io_error(&self) -> Option<&io::Error> {
        self.source.as_ref()
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == FileErrorKind::NotFound
    }
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.describe())?;
        if let Some(path) = &self.path {
            write!(f, ": {}", path.display())?;
        }
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<io::Error> for FileError {
    fn from(err: io::Error) -> Self {
        Self {
            kind: err.kind().into(),
            path: None,
            detail: None,
            source: Some(err),
        }
    }
}
