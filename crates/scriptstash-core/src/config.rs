//! Collection configuration, loadable from TOML.
//!
//! ```toml
//! atomic_save = true
//!
//! [listing]
//! recursive = true
//! skip_hidden = true
//! max_depth = 4
//! ```
//!
//! Every key is optional; missing keys take their defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FileError, FileResult};
use crate::store::{FileStore, LocalFileStore};
use crate::walk::ListOptions;

/// Settings applied when a collection is built over the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StashConfig {
    /// Whether saves replace files through a temporary file and rename.
    pub atomic_save: bool,
    /// How directories are searched during fills.
    pub listing: ListOptions,
}

impl Default for StashConfig {
    fn default() -> Self {
        Self {
            atomic_save: true,
            listing: ListOptions::default(),
        }
    }
}

impl StashConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidConfig` error if the text is not valid TOML or has
    /// values of the wrong type.
    pub fn from_toml_str(text: &str) -> FileResult<Self> {
        toml::from_str(text).map_err(|e| FileError::invalid_config("<toml>", e.to_string()))
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> FileResult<Self> {
        let path = path.as_ref();
        let content = LocalFileStore::new().read_text(path)?;
        toml::from_str(&content).map_err(|e| FileError::invalid_config(path, e.to_string()))
    }

    /// Saves the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> FileResult<()> {
        let path = path.as_ref();
        let text =
            toml::to_string_pretty(self).map_err(|e| FileError::invalid_config(path, e.to_string()))?;
        LocalFileStore::new().write_text(path, &text)
    }

    /// Builds the local file store these settings describe.
    pub fn local_store(&self) -> LocalFileStore {
        LocalFileStore::new().atomic_writes(self.atomic_save)
    }
}
