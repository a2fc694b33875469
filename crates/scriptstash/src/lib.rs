//! ScriptStash - text scripts held in memory, edited by line and filled with tokens.
//!
//! This crate provides three layers:
//!
//! - [`TokenMap`]: an insertion-ordered key to value map substituted into text,
//!   readable and writable as flat JSON, XML or CSV
//! - [`TextDocument`]: a file held as lines, with index and predicate based
//!   insert, replace and remove, plus save, reload and token injection
//! - [`Stash`]: documents keyed by file name, filled from directories by glob
//!   pattern and sharing one token map
//!
//! File access goes through the [`FileStore`] and [`FileLister`] collaborators
//! from `scriptstash-core`, so collections can run over the local filesystem or
//! an in-memory store.
//!
//! # Example
//!
//! ```no_run
//! use scriptstash::{FillMode, Stash, TokenMap};
//!
//! fn main() -> scriptstash::Result<()> {
//!     let mut stash = Stash::from_dir("scripts", "*.sql")?;
//!     stash.tokens().append(&TokenMap::load_json("tokens/prod.json")?);
//!
//!     for (name, text) in stash.inject_bound() {
//!         println!("-- {name}\n{text}");
//!     }
//!
//!     stash.fill("scripts", "*.sql", FillMode::Refresh)?;
//!     Ok(())
//! }
//! ```
//!
//! Documents and collections take `&mut self` for edits and are not meant to
//! be mutated from several threads at once. A shared [`TokenMap`] is the one
//! exception: it locks internally and every holder sees updates.

pub mod document;
pub mod error;
pub mod prelude;
pub mod stash;
pub mod tokens;

pub use document::TextDocument;
pub use error::{Error, ErrorKind, Result};
pub use stash::{FillMode, Stash};
pub use tokens::{SharedTokens, TokenFormat, TokenMap};

pub use scriptstash_core::{
    FileError, FileErrorKind, FileLister, FileStore, ListOptions, LocalFileStore, MemoryFileStore,
    StashConfig, LINE_SEPARATOR,
};
