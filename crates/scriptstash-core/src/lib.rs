//! Storage plumbing for ScriptStash.
//!
//! This crate provides the collaborators that the document layer is built on:
//!
//! - **File store**: line and text level reads and writes ([`store`])
//! - **File listing**: recursive glob search under a directory ([`walk`])
//! - **Errors**: [`FileError`] with a kind, the offending path and the I/O source
//! - **Configuration**: [`StashConfig`], loadable from TOML
//! - **Logging**: `tracing` target names ([`logging::targets`])
//!
//! # Example
//!
//! ```no_run
//! use scriptstash_core::{FileLister, FileStore, ListOptions, LocalFileStore};
//! use std::path::Path;
//!
//! fn main() -> Result<(), scriptstash_core::FileError> {
//!     let store = LocalFileStore::new();
//!     for path in store.list_files(Path::new("scripts"), "*.sql", &ListOptions::default())? {
//!         let lines = store.read_lines(&path)?;
//!         println!("{}: {} lines", path.display(), lines.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod path;
pub mod store;
pub mod walk;
pub mod writer;

pub use config::StashConfig;
pub use error::{FileError, FileErrorKind, FileResult};
pub use store::{FileStore, LocalFileStore, MemoryFileStore};
pub use walk::{FileLister, ListOptions, WalkDir, list_files};

/// The platform line separator used to assemble and save text.
#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";

/// The platform line separator used to assemble and save text.
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";
