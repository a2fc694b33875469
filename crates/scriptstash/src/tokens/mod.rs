//! Token maps: the key/value pairs substituted into document text.
//!
//! A [`TokenMap`] never fails on lookup (a missing key reads as an empty
//! string) and never fails on update (setting an unknown key inserts it).
//! Pairs keep their insertion order, which is also the order in which
//! [`TokenMap::substitute`] replaces keys.
//!
//! # Formats
//!
//! Token maps convert to and from three flat textual formats:
//!
//! | Format | Single map | List of maps |
//! |--------|------------|--------------|
//! | JSON   | `{"key1":"value1","key2":"value2"}` | `[{..},{..}]` |
//! | XML    | `<root><key1>value1</key1></root>` | `<root><tokens>..</tokens>..</root>` |
//! | CSV    | `"key1","value1"` per line | not supported |
//!
//! ```ignore
//! use scriptstash::tokens::TokenMap;
//!
//! let tokens = TokenMap::parse_csv("\"{user}\",\"eurekode\"\n\"{repo}\",\"x\"")?;
//! assert_eq!(tokens.get("{user}"), "eurekode");
//! assert_eq!(tokens.substitute("GET /{user}/{repo}"), "GET /eurekode/x");
//! ```
//!
//! # Sharing
//!
//! All methods take `&self`; the pairs live behind a lock. Wrapping a map in
//! [`SharedTokens`] lets a collection and every document it loads see the
//! same pairs, including updates made through any handle.

mod csv;
mod json;
mod xml;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use scriptstash_core::logging::targets;
use scriptstash_core::{FileStore, LocalFileStore};

use crate::error::{Error, Result};

/// A token map shared by reference between a collection and its documents.
pub type SharedTokens = Arc<TokenMap>;

/// The textual formats a [`TokenMap`] can be read from and written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenFormat {
    /// A flat JSON object.
    Json,
    /// A `<root>` element with one child per pair.
    Xml,
    /// One `"key","value"` pair per line.
    Csv,
}

impl TokenFormat {
    /// Picks the format matching a file extension (`".json"`, `"xml"`, ...).
    ///
    /// Matching ignores ASCII case. Returns `None` for any other extension.
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.strip_prefix('.').unwrap_or(extension);
        if extension.eq_ignore_ascii_case("json") {
            Some(TokenFormat::Json)
        } else if extension.eq_ignore_ascii_case("xml") {
            Some(TokenFormat::Xml)
        } else if extension.eq_ignore_ascii_case("csv") {
            Some(TokenFormat::Csv)
        } else {
            None
        }
    }

    /// Returns the display name of the format.
    pub fn name(self) -> &'static str {
        match self {
            TokenFormat::Json => "JSON",
            TokenFormat::Xml => "XML",
            TokenFormat::Csv => "CSV",
        }
    }
}

impl fmt::Display for TokenFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An insertion-ordered string-to-string map with non-failing access.
#[derive(Default)]
pub struct TokenMap {
    entries: RwLock<Vec<(String, String)>>,
}

impl TokenMap {
    /// Creates an empty token map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty token map ready to be shared.
    pub fn shared() -> SharedTokens {
        Arc::new(Self::new())
    }

    /// Returns the value for `key`, or an empty string if it is absent.
    pub fn get(&self, key: &str) -> String {
        self.entries
            .read()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    }

    /// Sets `key` to `value`, overwriting an existing value or appending a new pair.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        let mut entries = self.entries.write();
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => entries.push((key, value)),
        }
    }

    /// Merges `other` into this map, overwriting on key collision.
    ///
    /// Returns the number of existing keys whose value changed. Keys that are
    /// added fresh, or overwritten with an identical value, are not counted.
    pub fn append(&self, other: &TokenMap) -> usize {
        // Snapshot first so appending a map to itself cannot deadlock.
        let incoming = other.pairs();
        let mut entries = self.entries.write();
        let mut changed = 0;
        for (key, value) in incoming {
            match entries.iter_mut().find(|(k, _)| *k == key) {
                Some((_, existing)) => {
                    if *existing != value {
                        changed += 1;
                        *existing = value;
                    }
                }
                None => entries.push((key, value)),
            }
        }
        changed
    }

    /// Returns true if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.read().iter().any(|(k, _)| k == key)
    }

    /// Returns the number of pairs.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the map has no pairs.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns the keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.entries.read().iter().map(|(k, _)| k.clone()).collect()
    }

    /// Returns a snapshot of all pairs in insertion order.
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.entries.read().clone()
    }

    /// Replaces every occurrence of every key in `text` with its value.
    ///
    /// Keys are applied one after another in insertion order, so a value
    /// containing a later key's text is itself substituted.
    pub fn substitute(&self, text: &str) -> String {
        let entries = self.entries.read();
        let mut result = text.to_string();
        if result.is_empty() {
            return result;
        }
        for (key, value) in entries.iter() {
            if !key.is_empty() && result.contains(key.as_str()) {
                result = result.replace(key.as_str(), value);
            }
        }
        result
    }

    // ========================================================================
    // Parsing
    // ========================================================================

    /// Decodes a token map from text in the given format.
    ///
    /// # Errors
    ///
    /// Returns a format error if the text is empty or malformed.
    pub fn parse(format: TokenFormat, text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Err(Error::format(format.name(), "token text is empty"));
        }
        let tokens = match format {
            TokenFormat::Json => json::parse(text)?,
            TokenFormat::Xml => xml::parse(text)?,
            TokenFormat::Csv => csv::parse(text)?,
        };
        tracing::trace!(target: targets::TOKENS, %format, count = tokens.len(), "parsed tokens");
        Ok(tokens)
    }

    /// Decodes a flat JSON object.
    pub fn parse_json(text: &str) -> Result<Self> {
        Self::parse(TokenFormat::Json, text)
    }

    /// Decodes a `<root>` element whose children are `<key>value</key>` pairs.
    pub fn parse_xml(text: &str) -> Result<Self> {
        Self::parse(TokenFormat::Xml, text)
    }

    /// Decodes one `"key","value"` pair per line.
    pub fn parse_csv(text: &str) -> Result<Self> {
        Self::parse(TokenFormat::Csv, text)
    }

    /// Decodes an ordered list of token maps.
    ///
    /// # Errors
    ///
    /// Returns a format error if the text is empty or malformed, or if the
    /// format has no list form (CSV).
    pub fn parse_array(format: TokenFormat, text: &str) -> Result<Vec<Self>> {
        if text.trim().is_empty() {
            return Err(Error::format(format.name(), "token text is empty"));
        }
        match format {
            TokenFormat::Json => json::parse_array(text),
            TokenFormat::Xml => xml::parse_array(text),
            TokenFormat::Csv => Err(Error::format(
                format.name(),
                "lists of token maps have no CSV form",
            )),
        }
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Encodes the pairs in the given format.
    ///
    /// # Errors
    ///
    /// Returns a format error if a pair cannot be encoded, such as an XML key
    /// that is not a valid element name.
    pub fn to_text(&self, format: TokenFormat) -> Result<String> {
        match format {
            TokenFormat::Json => json::to_string(self),
            TokenFormat::Xml => xml::to_string(self),
            TokenFormat::Csv => csv::to_string(self),
        }
    }

    /// Encodes the pairs as a flat JSON object.
    pub fn to_json(&self) -> Result<String> {
        json::to_string(self)
    }

    /// Encodes the pairs as `<root><key>value</key>...</root>`.
    pub fn to_xml(&self) -> Result<String> {
        xml::to_string(self)
    }

    /// Encodes the pairs as `"key","value"` lines joined by the platform separator.
    pub fn to_csv(&self) -> Result<String> {
        csv::to_string(self)
    }

    /// Encodes a list of maps as a JSON array of flat objects.
    pub fn to_json_array(maps: &[TokenMap]) -> Result<String> {
        json::to_string_array(maps)
    }

    /// Encodes a list of maps as `<root><tokens>..</tokens>..</root>`.
    pub fn to_xml_array(maps: &[TokenMap]) -> Result<String> {
        xml::to_string_array(maps)
    }

    // ========================================================================
    // Files
    // ========================================================================

    /// Loads a token map from a file in the given store.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error for an empty path, a not-found error
    /// if the file does not exist, or a format error if it is malformed.
    pub fn load_in(store: &dyn FileStore, format: TokenFormat, path: &Path) -> Result<Self> {
        let text = read_token_file(store, path)?;
        tracing::debug!(target: targets::TOKENS, path = %path.display(), %format, "loading tokens");
        Self::parse(format, &text)
    }

    /// Loads a token map from a local file.
    pub fn load(format: TokenFormat, path: impl AsRef<Path>) -> Result<Self> {
        Self::load_in(&LocalFileStore::new(), format, path.as_ref())
    }

    /// Loads a flat JSON token file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(TokenFormat::Json, path)
    }

    /// Loads a flat XML token file.
    pub fn load_xml(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(TokenFormat::Xml, path)
    }

    /// Loads a CSV token file.
    pub fn load_csv(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(TokenFormat::Csv, path)
    }

    /// Loads an ordered list of token maps from a file in the given store.
    pub fn load_array_in(
        store: &dyn FileStore,
        format: TokenFormat,
        path: &Path,
    ) -> Result<Vec<Self>> {
        let text = read_token_file(store, path)?;
        let maps = Self::parse_array(format, &text)?;
        tracing::debug!(
            target: targets::TOKENS,
            path = %path.display(),
            %format,
            count = maps.len(),
            "loaded token list"
        );
        Ok(maps)
    }

    /// Loads a JSON array of flat objects.
    pub fn load_json_array(path: impl AsRef<Path>) -> Result<Vec<Self>> {
        Self::load_array_in(&LocalFileStore::new(), TokenFormat::Json, path.as_ref())
    }

    /// Loads an XML root whose children are each a group of pairs.
    pub fn load_xml_array(path: impl AsRef<Path>) -> Result<Vec<Self>> {
        Self::load_array_in(&LocalFileStore::new(), TokenFormat::Xml, path.as_ref())
    }

    /// Loads a token file and appends it, returning the change count.
    pub fn append_file(&self, format: TokenFormat, path: impl AsRef<Path>) -> Result<usize> {
        let loaded = Self::load(format, path)?;
        Ok(self.append(&loaded))
    }

    /// Loads a JSON token file and appends it.
    pub fn append_json(&self, path: impl AsRef<Path>) -> Result<usize> {
        self.append_file(TokenFormat::Json, path)
    }

    /// Loads an XML token file and appends it.
    pub fn append_xml(&self, path: impl AsRef<Path>) -> Result<usize> {
        self.append_file(TokenFormat::Xml, path)
    }

    /// Loads a CSV token file and appends it.
    pub fn append_csv(&self, path: impl AsRef<Path>) -> Result<usize> {
        self.append_file(TokenFormat::Csv, path)
    }

    /// Writes the pairs to a file in the given store.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error for an empty path, or an I/O error
    /// if the write fails.
    pub fn save_in(&self, store: &dyn FileStore, format: TokenFormat, path: &Path) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Err(Error::invalid_argument("path", "token file path must not be empty"));
        }
        let text = self.to_text(format)?;
        store
            .write_text(path, &text)
            .map_err(|e| Error::io(path, e))?;
        tracing::debug!(target: targets::TOKENS, path = %path.display(), %format, "saved tokens");
        Ok(())
    }

    /// Writes the pairs to a local file.
    pub fn save(&self, format: TokenFormat, path: impl AsRef<Path>) -> Result<()> {
        self.save_in(&LocalFileStore::new(), format, path.as_ref())
    }

    /// Writes the pairs as a JSON file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save(TokenFormat::Json, path)
    }

    /// Writes the pairs as an XML file.
    pub fn save_xml(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save(TokenFormat::Xml, path)
    }

    /// Writes the pairs as a CSV file.
    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save(TokenFormat::Csv, path)
    }
}

fn read_token_file(store: &dyn FileStore, path: &Path) -> Result<String> {
    if path.as_os_str().is_empty() {
        return Err(Error::invalid_argument("path", "token file path must not be empty"));
    }
    if !store.exists(path) {
        return Err(Error::not_found(path));
    }
    store.read_text(path).map_err(|e| Error::io(path, e))
}

impl Clone for TokenMap {
    fn clone(&self) -> Self {
        Self {
            entries: RwLock::new(self.pairs()),
        }
    }
}

impl PartialEq for TokenMap {
    /// Two maps are equal when they hold the same pairs, in any order.
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        let theirs = other.pairs();
        let ours = self.entries.read();
        ours.len() == theirs.len()
            && theirs
                .iter()
                .all(|(k, v)| ours.iter().any(|(ok, ov)| ok == k && ov == v))
    }
}

impl Eq for TokenMap {}

impl fmt::Debug for TokenMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.read();
        f.debug_map()
            .entries(entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl<K, V> FromIterator<(K, V)> for TokenMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let tokens = TokenMap::new();
        for (key, value) in iter {
            tokens.set(key, value);
        }
        tokens
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for TokenMap
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}
