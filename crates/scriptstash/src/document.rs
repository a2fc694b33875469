//! In-memory text documents bound to a file location.
//!
//! A [`TextDocument`] holds a file as an ordered list of lines. Lines can be
//! queried and edited by index or by predicate, the whole text can be
//! assembled or written back, and tokens can be substituted into a copy of the
//! text without touching the stored lines.
//!
//! # Editing
//!
//! ```ignore
//! use scriptstash::TextDocument;
//!
//! let mut doc = TextDocument::open("scripts/users.sql")?;
//!
//! // Put a comment above every SELECT
//! let inserted = doc.insert_where("-- generated", |line| line.starts_with("SELECT"));
//!
//! // Drop every blank line
//! let removed = doc.remove_where(|line| line.trim().is_empty());
//!
//! doc.save()?;
//! ```
//!
//! # Index policy
//!
//! Insert and replace by index never fail: an index past the last line
//! appends instead. Removal by index fails for an index past the last line.
//!
//! # Token injection
//!
//! ```ignore
//! use scriptstash::{TextDocument, TokenMap};
//!
//! let doc = TextDocument::from_lines("request.rest", ["GET /{user}/{repo}"]);
//! let tokens = TokenMap::from([("{user}", "eurekode"), ("{repo}", "x")]);
//! assert_eq!(doc.inject(&tokens), "GET /eurekode/x");
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use scriptstash_core::logging::targets;
use scriptstash_core::{FileStore, LINE_SEPARATOR, LocalFileStore, path};

use crate::error::{Error, Result};
use crate::tokens::{SharedTokens, TokenFormat, TokenMap};

/// An ordered, editable list of lines bound to a file location.
#[derive(Clone)]
pub struct TextDocument {
    lines: Vec<String>,
    location: PathBuf,
    pattern: Option<String>,
    tokens: Option<SharedTokens>,
    store: Arc<dyn FileStore>,
}

impl TextDocument {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Loads a document from a local file.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error for an empty path, a not-found error
    /// if the file is missing, or an I/O error if it cannot be read.
    pub fn open(location: impl AsRef<Path>) -> Result<Self> {
        Self::open_in(Arc::new(LocalFileStore::new()), location, None)
    }

    /// Loads a document from a local file and binds it to shared tokens.
    pub fn open_with_tokens(location: impl AsRef<Path>, tokens: SharedTokens) -> Result<Self> {
        Self::open_in(Arc::new(LocalFileStore::new()), location, Some(tokens))
    }

    /// Loads a document through the given file store.
    pub fn open_in(
        store: Arc<dyn FileStore>,
        location: impl AsRef<Path>,
        tokens: Option<SharedTokens>,
    ) -> Result<Self> {
        let location = location.as_ref();
        if location.as_os_str().is_empty() {
            return Err(Error::invalid_argument("location", "document path must not be empty"));
        }
        let lines = read_lines(store.as_ref(), location)?;
        Ok(Self {
            lines,
            location: location.to_path_buf(),
            pattern: None,
            tokens,
            store,
        })
    }

    /// Creates a document over in-memory lines without reading any file.
    ///
    /// The location is used by [`save`](Self::save) and for the path accessors.
    pub fn from_lines<I, S>(location: impl Into<PathBuf>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            location: location.into(),
            pattern: None,
            tokens: None,
            store: Arc::new(LocalFileStore::new()),
        }
    }

    /// Replaces the file store used by later saves and reloads.
    pub fn with_store(mut self, store: Arc<dyn FileStore>) -> Self {
        self.store = store;
        self
    }

    /// Binds the document to a token map, or unbinds it with `None`.
    pub fn bind_tokens(&mut self, tokens: Option<SharedTokens>) {
        self.tokens = tokens;
    }

    pub(crate) fn set_pattern(&mut self, pattern: &str) {
        self.pattern = Some(pattern.to_string());
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns the line at `index`, if any.
    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    /// Overwrites the line at `index`. Does nothing and returns false when
    /// the index is out of range.
    pub fn set_line(&mut self, index: usize, text: impl Into<String>) -> bool {
        match self.lines.get_mut(index) {
            Some(line) => {
                *line = text.into();
                true
            }
            None => false,
        }
    }

    /// Returns all lines.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Returns the number of lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns true if the document has no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the lines joined by the platform line separator, with no
    /// separator after the last line.
    pub fn text(&self) -> String {
        self.lines.join(LINE_SEPARATOR)
    }

    /// Returns the bound file location.
    pub fn path(&self) -> &Path {
        &self.location
    }

    /// Returns the file name of the bound location.
    pub fn file_name(&self) -> String {
        path::file_name(&self.location)
    }

    /// Returns the extension of the bound location, with its leading dot.
    pub fn file_extension(&self) -> String {
        path::file_extension(&self.location)
    }

    /// Returns the directory of the bound location.
    pub fn file_directory(&self) -> Option<PathBuf> {
        path::file_directory(&self.location)
    }

    /// Returns the glob pattern the document was discovered with, if any.
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    /// Returns the bound token map, if any.
    pub fn tokens(&self) -> Option<&SharedTokens> {
        self.tokens.as_ref()
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Returns the index of the first line matching `predicate`.
    pub fn first_index_where<P>(&self, predicate: P) -> Option<usize>
    where
        P: Fn(&str) -> bool,
    {
        self.lines.iter().position(|line| predicate(line))
    }

    /// Returns the index of the last line matching `predicate`.
    pub fn last_index_where<P>(&self, predicate: P) -> Option<usize>
    where
        P: Fn(&str) -> bool,
    {
        self.lines.iter().rposition(|line| predicate(line))
    }

    /// Returns the ascending indexes of every line matching `predicate`.
    pub fn all_indexes_where<P>(&self, predicate: P) -> Vec<usize>
    where
        P: Fn(&str) -> bool,
    {
        let mut found = Vec::new();
        let mut start = 0;
        // Each search resumes just past the previous hit.
        while let Some(offset) = self.lines[start..].iter().position(|line| predicate(line)) {
            let index = start + offset;
            found.push(index);
            start = index + 1;
        }
        found
    }

    /// Returns true if any line matches `predicate`.
    pub fn any_line<P>(&self, predicate: P) -> bool
    where
        P: Fn(&str) -> bool,
    {
        self.lines.iter().any(|line| predicate(line))
    }

    // ========================================================================
    // Index edits
    // ========================================================================

    /// Appends a line.
    pub fn append_line(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }

    /// Inserts a line before `index`, shifting later lines down.
    ///
    /// An index past the last line appends instead.
    pub fn insert_at(&mut self, index: usize, text: impl Into<String>) {
        if index >= self.lines.len() {
            self.lines.push(text.into());
        } else {
            self.lines.insert(index, text.into());
        }
    }

    /// Removes and returns the line at `index`.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error if `index` is past the last line.
    pub fn remove_at(&mut self, index: usize) -> Result<String> {
        if index >= self.lines.len() {
            return Err(Error::invalid_argument(
                "index",
                format!(
                    "line {index} is out of range for '{}' with {} lines",
                    self.location.display(),
                    self.lines.len()
                ),
            ));
        }
        Ok(self.lines.remove(index))
    }

    /// Overwrites the line at `index`.
    ///
    /// An index past the last line appends instead.
    pub fn replace_at(&mut self, index: usize, text: impl Into<String>) {
        match self.lines.get_mut(index) {
            Some(line) => *line = text.into(),
            None => self.lines.push(text.into()),
        }
    }

    // ========================================================================
    // Predicate edits
    // ========================================================================

    /// Inserts a line before the first match. Returns the insertion index.
    pub fn insert_on_first_where<P>(&mut self, text: impl Into<String>, predicate: P) -> Option<usize>
    where
        P: Fn(&str) -> bool,
    {
        let index = self.first_index_where(predicate)?;
        self.insert_at(index, text);
        Some(index)
    }

    /// Inserts a line before the last match. Returns the insertion index.
    pub fn insert_on_last_where<P>(&mut self, text: impl Into<String>, predicate: P) -> Option<usize>
    where
        P: Fn(&str) -> bool,
    {
        let index = self.last_index_where(predicate)?;
        self.insert_at(index, text);
        Some(index)
    }

    /// Inserts a line before every match.
    ///
    /// Returns the final index of each inserted line, ascending. Matches are
    /// collected first; each insertion then shifts the remaining matches down
    /// by one.
    pub fn insert_where<P>(&mut self, text: impl Into<String>, predicate: P) -> Vec<usize>
    where
        P: Fn(&str) -> bool,
    {
        let text = text.into();
        let mut indexes = self.all_indexes_where(predicate);
        for (shift, index) in indexes.iter_mut().enumerate() {
            *index += shift;
            self.lines.insert(*index, text.clone());
        }
        indexes
    }

    /// Replaces the first match. Returns its index.
    pub fn replace_on_first_where<P>(&mut self, text: impl Into<String>, predicate: P) -> Option<usize>
    where
        P: Fn(&str) -> bool,
    {
        let index = self.first_index_where(predicate)?;
        self.lines[index] = text.into();
        Some(index)
    }

    /// Replaces the last match. Returns its index.
    pub fn replace_on_last_where<P>(&mut self, text: impl Into<String>, predicate: P) -> Option<usize>
    where
        P: Fn(&str) -> bool,
    {
        let index = self.last_index_where(predicate)?;
        self.lines[index] = text.into();
        Some(index)
    }

    /// Replaces every match. Returns the replaced indexes, ascending.
    pub fn replace_where<P>(&mut self, text: impl Into<String>, predicate: P) -> Vec<usize>
    where
        P: Fn(&str) -> bool,
    {
        let text = text.into();
        let indexes = self.all_indexes_where(predicate);
        for &index in &indexes {
            self.lines[index].clone_from(&text);
        }
        indexes
    }

    /// Removes the first match. Returns its index.
    pub fn remove_on_first_where<P>(&mut self, predicate: P) -> Option<usize>
    where
        P: Fn(&str) -> bool,
    {
        let index = self.first_index_where(predicate)?;
        self.lines.remove(index);
        Some(index)
    }

    /// Removes the last match. Returns its index.
    pub fn remove_on_last_where<P>(&mut self, predicate: P) -> Option<usize>
    where
        P: Fn(&str) -> bool,
    {
        let index = self.last_index_where(predicate)?;
        self.lines.remove(index);
        Some(index)
    }

    /// Removes every match.
    ///
    /// Returns the indexes the removed lines had before any removal, ascending.
    pub fn remove_where<P>(&mut self, predicate: P) -> Vec<usize>
    where
        P: Fn(&str) -> bool,
    {
        let indexes = self.all_indexes_where(predicate);
        for (offset, &index) in indexes.iter().enumerate() {
            self.lines.remove(index - offset);
        }
        indexes
    }

    // ========================================================================
    // File operations
    // ========================================================================

    /// Writes the lines to the bound location, replacing its content.
    ///
    /// # Errors
    ///
    /// Returns an I/O error naming the location if the write fails.
    pub fn save(&self) -> Result<()> {
        self.store
            .write_lines(&self.location, &self.lines, true)
            .map_err(|e| Error::io(&self.location, e))?;
        tracing::debug!(
            target: targets::DOCUMENT,
            path = %self.location.display(),
            lines = self.lines.len(),
            "saved document"
        );
        Ok(())
    }

    /// Rebinds the document to `location` and saves it there.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error for an empty path, or an I/O error
    /// if the write fails.
    pub fn save_as(&mut self, location: impl AsRef<Path>) -> Result<()> {
        let location = location.as_ref();
        if location.as_os_str().is_empty() {
            return Err(Error::invalid_argument("location", "new document path must not be empty"));
        }
        self.location = location.to_path_buf();
        self.save()
    }

    /// Replaces the lines with the current content of the bound location,
    /// discarding unsaved edits.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the file no longer exists, or an I/O
    /// error if it cannot be read. The lines are unchanged on failure.
    pub fn reload(&mut self) -> Result<()> {
        if !self.store.exists(&self.location) {
            return Err(Error::not_found(&self.location));
        }
        self.lines = read_lines(self.store.as_ref(), &self.location)?;
        Ok(())
    }

    /// Rebinds the document to the file of the same name in `directory` and
    /// reloads it from there.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error for an empty directory, or a
    /// not-found error if the directory or the file in it is missing.
    pub fn reload_from(&mut self, directory: impl AsRef<Path>) -> Result<()> {
        let directory = directory.as_ref();
        if directory.as_os_str().is_empty() {
            return Err(Error::invalid_argument("directory", "reload directory must not be empty"));
        }
        let directory = path::trim_trailing_separators(directory);
        if !self.store.is_dir(&directory) {
            return Err(Error::not_found(directory));
        }
        let location = directory.join(self.file_name());
        if !self.store.exists(&location) {
            return Err(Error::not_found(location));
        }
        self.location = location;
        self.reload()
    }

    // ========================================================================
    // Token injection
    // ========================================================================

    /// Returns the text with the bound tokens substituted.
    ///
    /// Without bound tokens the text is returned unchanged.
    pub fn inject_bound(&self) -> String {
        match &self.tokens {
            Some(tokens) => tokens.substitute(&self.text()),
            None => self.text(),
        }
    }

    /// Returns the text with `tokens` substituted.
    pub fn inject(&self, tokens: &TokenMap) -> String {
        tokens.substitute(&self.text())
    }

    /// Returns one injected text per token map, in order.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error if no token maps are given.
    pub fn inject_each<'a, I>(&self, token_sets: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = &'a TokenMap>,
    {
        let text = self.text();
        let results: Vec<String> = token_sets
            .into_iter()
            .map(|tokens| tokens.substitute(&text))
            .collect();
        if results.is_empty() {
            return Err(Error::invalid_argument("token_sets", "at least one token map is required"));
        }
        Ok(results)
    }

    /// Returns the text with tokens read from another document.
    ///
    /// The source's extension picks the format: `.json`, `.xml` or `.csv`.
    ///
    /// # Errors
    ///
    /// Returns an unsupported-format error for any other extension, or a
    /// format error if the source text is malformed.
    pub fn inject_source(&self, source: &TextDocument) -> Result<String> {
        let tokens = source.as_tokens()?;
        Ok(self.inject(&tokens))
    }

    /// Returns one injected text per token source document, in order.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error if no sources are given, or the
    /// first error raised by a source.
    pub fn inject_sources<'a, I>(&self, sources: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = &'a TextDocument>,
    {
        let results = sources
            .into_iter()
            .map(|source| self.inject_source(source))
            .collect::<Result<Vec<_>>>()?;
        if results.is_empty() {
            return Err(Error::invalid_argument("sources", "at least one token source is required"));
        }
        Ok(results)
    }

    /// Decodes this document's text as a token map, using its extension.
    pub fn as_tokens(&self) -> Result<TokenMap> {
        let format = TokenFormat::from_extension(&self.file_extension()).ok_or_else(|| {
            Error::UnsupportedFormat {
                file: self.file_name(),
            }
        })?;
        TokenMap::parse(format, &self.text())
    }
}

fn read_lines(store: &dyn FileStore, location: &Path) -> Result<Vec<String>> {
    let lines = store
        .read_lines(location)
        .map_err(|e| Error::io(location, e))?;
    tracing::debug!(
        target: targets::DOCUMENT,
        path = %location.display(),
        lines = lines.len(),
        "loaded document"
    );
    Ok(lines)
}

impl fmt::Debug for TextDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextDocument")
            .field("location", &self.location)
            .field("lines", &self.lines.len())
            .field("pattern", &self.pattern)
            .field("tokens", &self.tokens.as_ref().map(|t| t.len()))
            .finish_non_exhaustive()
    }
}
