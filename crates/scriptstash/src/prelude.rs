//! Prelude module for ScriptStash.
//!
//! ```ignore
//! use scriptstash::prelude::*;
//! ```
//!
//! This provides access to:
//! - Documents and collections (`TextDocument`, `Stash`, `FillMode`)
//! - Tokens (`TokenMap`, `SharedTokens`, `TokenFormat`)
//! - Errors (`Error`, `ErrorKind`, `Result`)
//! - Storage collaborators (`FileStore`, `FileLister`, `ListOptions`)

// ============================================================================
// Documents
// ============================================================================

pub use crate::document::TextDocument;
pub use crate::stash::{FillMode, Stash};

// ============================================================================
// Tokens
// ============================================================================

pub use crate::tokens::{SharedTokens, TokenFormat, TokenMap};

// ============================================================================
// Errors
// ============================================================================

pub use crate::error::{Error, ErrorKind, Result};

// ============================================================================
// Storage
// ============================================================================

pub use scriptstash_core::{
    FileLister, FileStore, ListOptions, LocalFileStore, MemoryFileStore, StashConfig,
};
