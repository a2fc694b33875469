//! Logging facilities for ScriptStash.
//!
//! ScriptStash uses the `tracing` crate for instrumentation. The library never
//! installs a subscriber; to see logs, install one in the host application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("scriptstash=debug")
//!     .init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// File store target.
    pub const STORE: &str = "scriptstash_core::store";
    /// Directory listing target.
    pub const WALK: &str = "scriptstash_core::walk";
    /// Token map parsing and serialization target.
    pub const TOKENS: &str = "scriptstash::tokens";
    /// Text document target.
    pub const DOCUMENT: &str = "scriptstash::document";
    /// Document collection target.
    pub const STASH: &str = "scriptstash::stash";
}
