//! Error types for documents, token maps and collections.

use std::fmt;
use std::path::PathBuf;

use scriptstash_core::{FileError, FileErrorKind};

use crate::stash::FillMode;

/// Result type alias for ScriptStash operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required parameter was empty or out of range.
    InvalidArgument,
    /// A file or directory expected to exist is missing.
    NotFound,
    /// Token text is malformed, or a token source has an unsupported type.
    Format,
    /// A document name is already registered.
    AlreadyExists,
    /// A read or write failed on an existing path.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::InvalidArgument => "invalid argument",
            ErrorKind::NotFound => "not found",
            ErrorKind::Format => "format error",
            ErrorKind::AlreadyExists => "already exists",
            ErrorKind::Io => "I/O error",
        })
    }
}

/// Errors that can occur while loading, editing, injecting or saving documents.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required parameter was empty or out of range.
    #[error("invalid argument '{param}': {message}")]
    InvalidArgument {
        param: &'static str,
        message: String,
    },

    /// A file or directory expected to exist is missing.
    #[error("not found: {}", .path.display())]
    NotFound { path: PathBuf },

    /// Token text could not be decoded.
    #[error("malformed {format} tokens: {message}")]
    Format {
        format: &'static str,
        message: String,
    },

    /// A document used as a token source is not JSON, XML or CSV.
    #[error("token source '{file}' is not a supported type, use .json, .xml or .csv")]
    UnsupportedFormat { file: String },

    /// A document with the same name is already in the collection.
    #[error("document '{name}' is already registered")]
    AlreadyExists { name: String },

    /// Reading or writing a file failed.
    #[error("failed to access '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: FileError,
    },

    /// A fill could not complete.
    #[error(
        "fill failed for directory '{}' with pattern '{pattern}' in {mode} mode",
        .directory.display()
    )]
    Fill {
        directory: PathBuf,
        pattern: String,
        mode: FillMode,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an invalid-argument error.
    pub fn invalid_argument(param: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            param,
            message: message.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a format error.
    pub fn format(format: &'static str, message: impl Into<String>) -> Self {
        Self::Format {
            format,
            message: message.into(),
        }
    }

    /// Create an error from a file store failure.
    ///
    /// Missing files map to [`Error::NotFound`].
    pub fn io(path: impl Into<PathBuf>, source: FileError) -> Self {
        let path = path.into();
        if source.kind() == FileErrorKind::NotFound {
            return Self::NotFound { path };
        }
        Self::Io { path, source }
    }

    /// Returns the broad classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::Format { .. } | Error::UnsupportedFormat { .. } => ErrorKind::Format,
            Error::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Error::Io { source, .. } => match source.kind() {
                FileErrorKind::InvalidPath | FileErrorKind::InvalidPattern => {
                    ErrorKind::InvalidArgument
                }
                FileErrorKind::NotFound => ErrorKind::NotFound,
                _ => ErrorKind::Io,
            },
            Error::Fill { source, .. } => source.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_argument("directory", "must not be empty");
        assert_eq!(
            err.to_string(),
            "invalid argument 'directory': must not be empty"
        );
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_io_not_found_maps_to_not_found() {
        let err = Error::io("/scripts/a.sql", FileError::not_found("/scripts/a.sql"));
        assert!(matches!(err, Error::NotFound { .. }));
        assert_eq!(err.to_string(), "not found: /scripts/a.sql");
    }

    #[test]
    fn test_io_keeps_source() {
        let source = FileError::not_directory("/scripts/a.sql");
        let err = Error::io("/scripts/a.sql", source);
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_fill_kind_follows_source() {
        let err = Error::Fill {
            directory: PathBuf::from("/scripts"),
            pattern: "*.sql".to_string(),
            mode: FillMode::Refresh,
            source: Box::new(Error::not_found("/scripts")),
        };
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            err.to_string(),
            "fill failed for directory '/scripts' with pattern '*.sql' in REFRESH mode"
        );
    }

    #[test]
    fn test_unsupported_format_kind() {
        let err = Error::UnsupportedFormat {
            file: "tokens.ini".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Format);
    }
}
