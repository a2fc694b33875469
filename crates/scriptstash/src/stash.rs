//! Named collections of documents filled from directories.
//!
//! A [`Stash`] keeps documents keyed by file name, all bound to one shared
//! [`TokenMap`]. It fills itself by listing files that match a glob pattern
//! under one or more directories, and offers bulk save, reload and injection,
//! optionally filtered by a document predicate or a line predicate.
//!
//! # Fill modes
//!
//! - [`FillMode::Append`] loads files whose name is not yet known and leaves
//!   known documents untouched. The first directory to provide a name wins.
//! - [`FillMode::Refresh`] reloads known documents from where they were found,
//!   loads new ones, then drops documents whose name was not found at all.
//!   The last directory to provide a name wins.
//!
//! ```ignore
//! use scriptstash::{FillMode, Stash};
//!
//! let mut stash = Stash::from_dir("scripts", "*.sql")?;
//! stash.tokens().set("[SCHEMA]", "reporting");
//!
//! // Pick up files added or deleted on disk
//! stash.fill("scripts", "*.sql", FillMode::Refresh)?;
//!
//! for (name, text) in stash.inject_bound() {
//!     println!("-- {name}\n{text}");
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use scriptstash_core::logging::targets;
use scriptstash_core::{FileLister, FileStore, ListOptions, LocalFileStore, StashConfig, path};

use crate::document::TextDocument;
use crate::error::{Error, Result};
use crate::tokens::{SharedTokens, TokenMap};

/// How a fill treats documents that are already in the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillMode {
    /// Load unknown files only. Never removes documents.
    Append,
    /// Reload known files, load unknown ones, drop vanished ones.
    Refresh,
}

impl fmt::Display for FillMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FillMode::Append => "APPEND",
            FillMode::Refresh => "REFRESH",
        })
    }
}

/// A collection of documents keyed by file name, sharing one token map.
#[derive(Debug)]
pub struct Stash {
    documents: BTreeMap<String, TextDocument>,
    tokens: SharedTokens,
    store: Arc<dyn FileStore>,
    lister: Arc<dyn FileLister>,
    listing: ListOptions,
}

impl Default for Stash {
    fn default() -> Self {
        Self::new()
    }
}

impl Stash {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Creates an empty collection over the local filesystem.
    pub fn new() -> Self {
        let local = Arc::new(LocalFileStore::new());
        Self::with_store(local.clone(), local)
    }

    /// Creates an empty collection over the local filesystem, configured by
    /// `config`.
    pub fn with_config(config: &StashConfig) -> Self {
        let local = Arc::new(config.local_store());
        Self::with_store(local.clone(), local).with_listing(config.listing.clone())
    }

    /// Creates an empty collection over the given collaborators.
    pub fn with_store(store: Arc<dyn FileStore>, lister: Arc<dyn FileLister>) -> Self {
        Self {
            documents: BTreeMap::new(),
            tokens: TokenMap::shared(),
            store,
            lister,
            listing: ListOptions::default(),
        }
    }

    /// Sets the listing options used by later fills.
    pub fn with_listing(mut self, listing: ListOptions) -> Self {
        self.listing = listing;
        self
    }

    /// Replaces the shared token map. Documents loaded afterwards bind to it.
    pub fn with_tokens(mut self, tokens: SharedTokens) -> Self {
        self.tokens = tokens;
        self
    }

    /// Creates a local collection filled from one directory and pattern.
    pub fn from_dir(directory: impl AsRef<Path>, pattern: &str) -> Result<Self> {
        let mut stash = Self::new();
        stash.fill(directory, pattern, FillMode::Append)?;
        Ok(stash)
    }

    /// Creates a local collection filled from one directory and several patterns.
    pub fn from_dir_patterns<P: AsRef<str>>(
        directory: impl AsRef<Path>,
        patterns: &[P],
    ) -> Result<Self> {
        let mut stash = Self::new();
        stash.fill_patterns(directory, patterns, FillMode::Append)?;
        Ok(stash)
    }

    /// Creates a local collection filled from several directories and one pattern.
    pub fn from_dirs<D: AsRef<Path>>(directories: &[D], pattern: &str) -> Result<Self> {
        let mut stash = Self::new();
        stash.fill_dirs(directories, pattern, FillMode::Append)?;
        Ok(stash)
    }

    /// Creates a local collection filled from several directories and patterns.
    pub fn from_dirs_patterns<D, P>(directories: &[D], patterns: &[P]) -> Result<Self>
    where
        D: AsRef<Path>,
        P: AsRef<str>,
    {
        let mut stash = Self::new();
        stash.fill_all(directories, patterns, FillMode::Append)?;
        Ok(stash)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Returns the shared token map.
    pub fn tokens(&self) -> &SharedTokens {
        &self.tokens
    }

    /// Returns the listing options used by fills.
    pub fn listing(&self) -> &ListOptions {
        &self.listing
    }

    /// Returns the document registered under `name`.
    pub fn get(&self, name: &str) -> Option<&TextDocument> {
        self.documents.get(name)
    }

    /// Returns the document registered under `name` for editing.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut TextDocument> {
        self.documents.get_mut(name)
    }

    /// Returns true if a document is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.documents.contains_key(name)
    }

    /// Iterates over the documents, ordered by name.
    pub fn documents(&self) -> impl Iterator<Item = &TextDocument> {
        self.documents.values()
    }

    /// Iterates over the registered names, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    /// Returns the number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Returns true if the collection has no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    // ========================================================================
    // Filling
    // ========================================================================

    /// Fills from the files matching `pattern` under `directory`.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error for an empty directory or pattern.
    /// Listing and loading failures are wrapped in [`Error::Fill`].
    pub fn fill(&mut self, directory: impl AsRef<Path>, pattern: &str, mode: FillMode) -> Result<()> {
        self.fill_all(&[directory], &[pattern], mode)
    }

    /// Fills from one directory with each of `patterns`, in order.
    pub fn fill_patterns<P: AsRef<str>>(
        &mut self,
        directory: impl AsRef<Path>,
        patterns: &[P],
        mode: FillMode,
    ) -> Result<()> {
        self.fill_all(&[directory], patterns, mode)
    }

    /// Fills from each of `directories` with one pattern, in order.
    pub fn fill_dirs<D: AsRef<Path>>(
        &mut self,
        directories: &[D],
        pattern: &str,
        mode: FillMode,
    ) -> Result<()> {
        self.fill_all(directories, &[pattern], mode)
    }

    /// Fills from every directory with every pattern, directories outermost.
    ///
    /// In [`FillMode::Refresh`] the documents to drop are decided once, after
    /// every directory and pattern has been listed.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error if either list is empty or holds an
    /// empty entry; nothing is filled in that case.
    pub fn fill_all<D, P>(&mut self, directories: &[D], patterns: &[P], mode: FillMode) -> Result<()>
    where
        D: AsRef<Path>,
        P: AsRef<str>,
    {
        if directories.is_empty() {
            return Err(Error::invalid_argument("directories", "at least one directory is required"));
        }
        if patterns.is_empty() {
            return Err(Error::invalid_argument("patterns", "at least one pattern is required"));
        }
        if directories.iter().any(|d| d.as_ref().as_os_str().is_empty()) {
            return Err(Error::invalid_argument("directory", "fill directory must not be empty"));
        }
        if patterns.iter().any(|p| p.as_ref().is_empty()) {
            return Err(Error::invalid_argument("pattern", "fill pattern must not be empty"));
        }

        let mut found = BTreeSet::new();
        for directory in directories {
            for pattern in patterns {
                let (directory, pattern) = (directory.as_ref(), pattern.as_ref());
                self.fill_one(directory, pattern, mode, &mut found)
                    .map_err(|source| Error::Fill {
                        directory: directory.to_path_buf(),
                        pattern: pattern.to_string(),
                        mode,
                        source: Box::new(source),
                    })?;
            }
        }

        if mode == FillMode::Refresh {
            self.documents.retain(|name, document| {
                let keep = found.contains(name);
                if !keep {
                    tracing::warn!(
                        target: targets::STASH,
                        name = %name,
                        path = %document.path().display(),
                        "dropping document no longer found on refresh"
                    );
                }
                keep
            });
        }

        tracing::debug!(
            target: targets::STASH,
            %mode,
            found = found.len(),
            documents = self.documents.len(),
            "fill complete"
        );
        Ok(())
    }

    fn fill_one(
        &mut self,
        directory: &Path,
        pattern: &str,
        mode: FillMode,
        found: &mut BTreeSet<String>,
    ) -> Result<()> {
        let paths = self
            .lister
            .list_files(directory, pattern, &self.listing)
            .map_err(|e| Error::io(directory, e))?;

        for location in paths {
            let name = path::file_name(&location);
            found.insert(name.clone());

            match self.documents.get_mut(&name) {
                Some(_) if mode == FillMode::Append => {
                    tracing::trace!(target: targets::STASH, name = %name, "already registered, skipped");
                }
                Some(document) => {
                    match path::file_directory(&location) {
                        Some(parent) => document.reload_from(parent)?,
                        None => document.reload()?,
                    }
                    document.set_pattern(pattern);
                    tracing::trace!(target: targets::STASH, name = %name, "reloaded");
                }
                None => {
                    let mut document = TextDocument::open_in(
                        Arc::clone(&self.store),
                        &location,
                        Some(Arc::clone(&self.tokens)),
                    )?;
                    document.set_pattern(pattern);
                    self.documents.insert(name.clone(), document);
                    tracing::trace!(target: targets::STASH, name = %name, "registered");
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Removes every document. The shared token map is untouched.
    pub fn clear(&mut self) {
        self.documents.clear();
    }

    /// Registers a document under its file name.
    ///
    /// # Errors
    ///
    /// Returns an already-exists error if the name is taken.
    pub fn add(&mut self, document: TextDocument) -> Result<()> {
        let name = document.file_name();
        if self.documents.contains_key(&name) {
            return Err(Error::AlreadyExists { name });
        }
        tracing::trace!(target: targets::STASH, name = %name, "added");
        self.documents.insert(name, document);
        Ok(())
    }

    /// Loads the file at `location` and registers it under its file name,
    /// bound to the shared token map when `use_shared_tokens` is set.
    ///
    /// # Errors
    ///
    /// Returns a not-found error if the file is missing, or an already-exists
    /// error if the name is taken.
    pub fn add_path(&mut self, location: impl AsRef<Path>, use_shared_tokens: bool) -> Result<()> {
        let location = location.as_ref();
        if location.as_os_str().is_empty() {
            return Err(Error::invalid_argument("location", "document path must not be empty"));
        }
        if !self.store.exists(location) {
            return Err(Error::not_found(location));
        }
        let tokens = use_shared_tokens.then(|| Arc::clone(&self.tokens));
        let document = TextDocument::open_in(Arc::clone(&self.store), location, tokens)?;
        self.add(document)
    }

    /// Removes and returns the document registered under `name`.
    pub fn remove(&mut self, name: &str) -> Option<TextDocument> {
        self.documents.remove(name)
    }

    // ========================================================================
    // Bulk file operations
    // ========================================================================

    /// Saves every document. Returns the number saved.
    pub fn save_all(&self) -> Result<usize> {
        self.save_matching(|_| true)
    }

    /// Reloads every document. Returns the number reloaded.
    pub fn reload_all(&mut self) -> Result<usize> {
        self.reload_matching(|_| true)
    }

    /// Saves every document into `target` under its own file name, rebinding
    /// each document to its new location.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error for an empty target, or a not-found
    /// error if the target directory does not exist.
    pub fn save_to_folder(&mut self, target: impl AsRef<Path>) -> Result<usize> {
        self.save_to_folder_matching(target.as_ref(), |_| true)
    }

    /// Saves the documents matching `predicate`.
    pub fn save_on_document_match<F>(&self, predicate: F) -> Result<usize>
    where
        F: Fn(&TextDocument) -> bool,
    {
        self.save_matching(predicate)
    }

    /// Reloads the documents matching `predicate`.
    pub fn reload_on_document_match<F>(&mut self, predicate: F) -> Result<usize>
    where
        F: Fn(&TextDocument) -> bool,
    {
        self.reload_matching(predicate)
    }

    /// Saves the documents matching `predicate` into `target`.
    pub fn save_to_folder_on_document_match<F>(
        &mut self,
        target: impl AsRef<Path>,
        predicate: F,
    ) -> Result<usize>
    where
        F: Fn(&TextDocument) -> bool,
    {
        self.save_to_folder_matching(target.as_ref(), predicate)
    }

    /// Saves the documents with at least one line matching `predicate`.
    pub fn save_on_line_match<F>(&self, predicate: F) -> Result<usize>
    where
        F: Fn(&str) -> bool,
    {
        self.save_matching(|document| document.any_line(&predicate))
    }

    /// Reloads the documents with at least one line matching `predicate`.
    ///
    /// Lines are tested as currently held in memory, before reloading.
    pub fn reload_on_line_match<F>(&mut self, predicate: F) -> Result<usize>
    where
        F: Fn(&str) -> bool,
    {
        self.reload_matching(|document| document.any_line(&predicate))
    }

    /// Saves the documents with at least one line matching `predicate` into
    /// `target`.
    pub fn save_to_folder_on_line_match<F>(
        &mut self,
        target: impl AsRef<Path>,
        predicate: F,
    ) -> Result<usize>
    where
        F: Fn(&str) -> bool,
    {
        self.save_to_folder_matching(target.as_ref(), |document| document.any_line(&predicate))
    }

    fn save_matching<F>(&self, filter: F) -> Result<usize>
    where
        F: Fn(&TextDocument) -> bool,
    {
        let mut saved = 0;
        for document in self.documents.values() {
            if !filter(document) {
                continue;
            }
            document.save()?;
            saved += 1;
        }
        tracing::debug!(target: targets::STASH, saved, "saved documents");
        Ok(saved)
    }

    fn reload_matching<F>(&mut self, filter: F) -> Result<usize>
    where
        F: Fn(&TextDocument) -> bool,
    {
        let mut reloaded = 0;
        for document in self.documents.values_mut() {
            if !filter(document) {
                continue;
            }
            document.reload()?;
            reloaded += 1;
        }
        tracing::debug!(target: targets::STASH, reloaded, "reloaded documents");
        Ok(reloaded)
    }

    fn save_to_folder_matching<F>(&mut self, target: &Path, filter: F) -> Result<usize>
    where
        F: Fn(&TextDocument) -> bool,
    {
        if target.as_os_str().is_empty() {
            return Err(Error::invalid_argument("target", "target folder must not be empty"));
        }
        if !self.store.is_dir(target) {
            return Err(Error::not_found(target));
        }
        let mut saved = 0;
        for document in self.documents.values_mut() {
            if !filter(document) {
                continue;
            }
            let location = target.join(document.file_name());
            document.save_as(location)?;
            saved += 1;
        }
        tracing::debug!(
            target: targets::STASH,
            folder = %target.display(),
            saved,
            "saved documents to folder"
        );
        Ok(saved)
    }

    // ========================================================================
    // Injection
    // ========================================================================

    /// Injects `tokens` into every document. Returns name to text.
    pub fn inject(&self, tokens: &TokenMap) -> BTreeMap<String, String> {
        self.documents
            .iter()
            .map(|(name, document)| (name.clone(), document.inject(tokens)))
            .collect()
    }

    /// Injects each document's bound tokens. Returns name to text.
    pub fn inject_bound(&self) -> BTreeMap<String, String> {
        self.documents
            .iter()
            .map(|(name, document)| (name.clone(), document.inject_bound()))
            .collect()
    }

    /// Injects the tokens read from `source` into every document.
    ///
    /// # Errors
    ///
    /// Fails as [`TextDocument::inject_source`] does.
    pub fn inject_source(&self, source: &TextDocument) -> Result<BTreeMap<String, String>> {
        let tokens = source.as_tokens()?;
        Ok(self.inject(&tokens))
    }

    /// Injects each token map into every document. Returns name to texts,
    /// one per token map.
    ///
    /// # Errors
    ///
    /// Returns an invalid-argument error if no token maps are given.
    pub fn inject_each<'a, I>(&self, token_sets: I) -> Result<BTreeMap<String, Vec<String>>>
    where
        I: IntoIterator<Item = &'a TokenMap>,
    {
        let token_sets = collect_token_sets(token_sets)?;
        self.inject_each_matching(&token_sets, |_| true)
    }

    /// Injects `tokens` into the documents matching `predicate`.
    pub fn inject_on_document_match<F>(&self, tokens: &TokenMap, predicate: F) -> BTreeMap<String, String>
    where
        F: Fn(&TextDocument) -> bool,
    {
        self.map_matching(predicate, |document| document.inject(tokens))
    }

    /// Injects bound tokens into the documents matching `predicate`.
    pub fn inject_bound_on_document_match<F>(&self, predicate: F) -> BTreeMap<String, String>
    where
        F: Fn(&TextDocument) -> bool,
    {
        self.map_matching(predicate, TextDocument::inject_bound)
    }

    /// Injects the tokens read from `source` into the documents matching
    /// `predicate`.
    pub fn inject_source_on_document_match<F>(
        &self,
        source: &TextDocument,
        predicate: F,
    ) -> Result<BTreeMap<String, String>>
    where
        F: Fn(&TextDocument) -> bool,
    {
        let tokens = source.as_tokens()?;
        Ok(self.inject_on_document_match(&tokens, predicate))
    }

    /// Injects each token map into the documents matching `predicate`.
    pub fn inject_each_on_document_match<'a, I, F>(
        &self,
        token_sets: I,
        predicate: F,
    ) -> Result<BTreeMap<String, Vec<String>>>
    where
        I: IntoIterator<Item = &'a TokenMap>,
        F: Fn(&TextDocument) -> bool,
    {
        let token_sets = collect_token_sets(token_sets)?;
        self.inject_each_matching(&token_sets, predicate)
    }

    /// Injects `tokens` into the documents with a line matching `predicate`.
    pub fn inject_on_line_match<F>(&self, tokens: &TokenMap, predicate: F) -> BTreeMap<String, String>
    where
        F: Fn(&str) -> bool,
    {
        self.inject_on_document_match(tokens, |document| document.any_line(&predicate))
    }

    /// Injects bound tokens into the documents with a line matching `predicate`.
    pub fn inject_bound_on_line_match<F>(&self, predicate: F) -> BTreeMap<String, String>
    where
        F: Fn(&str) -> bool,
    {
        self.inject_bound_on_document_match(|document| document.any_line(&predicate))
    }

    /// Injects the tokens read from `source` into the documents with a line
    /// matching `predicate`.
    pub fn inject_source_on_line_match<F>(
        &self,
        source: &TextDocument,
        predicate: F,
    ) -> Result<BTreeMap<String, String>>
    where
        F: Fn(&str) -> bool,
    {
        self.inject_source_on_document_match(source, |document| document.any_line(&predicate))
    }

    /// Injects each token map into the documents with a line matching
    /// `predicate`.
    pub fn inject_each_on_line_match<'a, I, F>(
        &self,
        token_sets: I,
        predicate: F,
    ) -> Result<BTreeMap<String, Vec<String>>>
    where
        I: IntoIterator<Item = &'a TokenMap>,
        F: Fn(&str) -> bool,
    {
        self.inject_each_on_document_match(token_sets, |document| document.any_line(&predicate))
    }

    fn map_matching<F, T>(&self, filter: F, map: impl Fn(&TextDocument) -> T) -> BTreeMap<String, T>
    where
        F: Fn(&TextDocument) -> bool,
    {
        self.documents
            .iter()
            .filter(|&(_, document)| filter(document))
            .map(|(name, document)| (name.clone(), map(document)))
            .collect()
    }

    fn inject_each_matching<F>(
        &self,
        token_sets: &[&TokenMap],
        filter: F,
    ) -> Result<BTreeMap<String, Vec<String>>>
    where
        F: Fn(&TextDocument) -> bool,
    {
        self.map_matching(filter, |document| document.inject_each(token_sets.iter().copied()))
            .into_iter()
            .map(|(name, texts)| Ok((name, texts?)))
            .collect()
    }
}

fn collect_token_sets<'a, I>(token_sets: I) -> Result<Vec<&'a TokenMap>>
where
    I: IntoIterator<Item = &'a TokenMap>,
{
    let token_sets: Vec<&TokenMap> = token_sets.into_iter().collect();
    if token_sets.is_empty() {
        return Err(Error::invalid_argument("token_sets", "at least one token map is required"));
    }
    Ok(token_sets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use scriptstash_core::{LINE_SEPARATOR, MemoryFileStore};

    fn fixture() -> Arc<MemoryFileStore> {
        Arc::new(
            MemoryFileStore::new()
                .with_file("/scripts/a.sql", "SELECT [COLS]\nFROM A")
                .with_file("/scripts/b.sql", "DELETE FROM B")
                .with_file("/scripts/c.sql", "SELECT 1")
                .with_file("/scripts/notes.txt", "not a script")
                .with_file("/other/a.sql", "SELECT 'other'")
                .with_file("/other/d.sql", "SELECT 'd'"),
        )
    }

    fn stash_over(store: &Arc<MemoryFileStore>) -> Stash {
        Stash::with_store(store.clone(), store.clone())
    }

    fn names(stash: &Stash) -> Vec<&str> {
        stash.names().collect()
    }

    #[test]
    fn test_fill_mode_display() {
        assert_eq!(FillMode::Append.to_string(), "APPEND");
        assert_eq!(FillMode::Refresh.to_string(), "REFRESH");
    }

    #[test]
    fn test_append_is_idempotent() {
        let store = fixture();
        let mut stash = stash_over(&store);
        stash.fill("/scripts", "*.sql", FillMode::Append).unwrap();
        assert_eq!(names(&stash), ["a.sql", "b.sql", "c.sql"]);

        stash.get_mut("a.sql").unwrap().append_line("-- edited");
        stash.fill("/scripts", "*.sql", FillMode::Append).unwrap();
        assert_eq!(stash.len(), 3);
        assert_eq!(stash.get("a.sql").unwrap().line_count(), 3);
        assert_eq!(stash.get("a.sql").unwrap().pattern(), Some("*.sql"));
    }

    #[test]
    fn test_refresh_drops_vanished_and_reloads() {
        let store = fixture();
        let mut stash = stash_over(&store);
        stash.fill("/scripts", "*.sql", FillMode::Append).unwrap();
        stash.get_mut("a.sql").unwrap().append_line("-- unsaved");

        store.remove("/scripts/b.sql");
        stash.fill("/scripts", "*.sql", FillMode::Refresh).unwrap();
        assert_eq!(names(&stash), ["a.sql", "c.sql"]);
        assert_eq!(stash.get("a.sql").unwrap().line_count(), 2);
    }

    #[test]
    fn test_refresh_with_nothing_found_empties() {
        let store = fixture();
        let mut stash = stash_over(&store);
        stash.fill("/scripts", "*.sql", FillMode::Append).unwrap();
        stash.fill("/scripts", "*.none", FillMode::Refresh).unwrap();
        assert!(stash.is_empty());
    }

    #[test]
    fn test_duplicates_across_directories() {
        let store = fixture();
        let dirs = ["/scripts", "/other"];

        let mut stash = stash_over(&store);
        stash.fill_dirs(&dirs, "*.sql", FillMode::Append).unwrap();
        assert_eq!(names(&stash), ["a.sql", "b.sql", "c.sql", "d.sql"]);
        assert_eq!(stash.get("a.sql").unwrap().path(), Path::new("/scripts/a.sql"));

        stash.fill_dirs(&dirs, "*.sql", FillMode::Refresh).unwrap();
        assert_eq!(stash.len(), 4);
        let a = stash.get("a.sql").unwrap();
        assert_eq!(a.path(), Path::new("/other/a.sql"));
        assert_eq!(a.lines(), ["SELECT 'other'"]);
    }

    #[test]
    fn test_refresh_over_patterns_collects_union() {
        let store = fixture();
        let mut stash = stash_over(&store);
        stash
            .fill_patterns("/scripts", &["*.sql", "*.txt"], FillMode::Refresh)
            .unwrap();
        assert_eq!(names(&stash), ["a.sql", "b.sql", "c.sql", "notes.txt"]);
        assert_eq!(stash.get("notes.txt").unwrap().pattern(), Some("*.txt"));
    }

    #[test]
    fn test_fill_argument_errors() {
        let store = fixture();
        let mut stash = stash_over(&store);
        let err = stash.fill("", "*.sql", FillMode::Append).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err = stash.fill("/scripts", "", FillMode::Append).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let none: [&str; 0] = [];
        let err = stash
            .fill_patterns("/scripts", &none, FillMode::Append)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(stash.is_empty());
    }

    #[test]
    fn test_fill_wraps_listing_failure() {
        let store = fixture();
        let mut stash = stash_over(&store);
        let err = stash.fill("/missing", "*.sql", FillMode::Refresh).unwrap_err();
        assert!(matches!(err, Error::Fill { mode: FillMode::Refresh, .. }));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().contains("/missing"));
        assert!(err.to_string().contains("*.sql"));
    }

    #[test]
    fn test_documents_share_tokens() {
        let store = fixture();
        let mut stash = stash_over(&store);
        stash.fill("/scripts", "*.sql", FillMode::Append).unwrap();
        stash.tokens().set("[COLS]", "ID, NAME");
        let injected = stash.inject_bound();
        assert_eq!(
            injected["a.sql"],
            format!("SELECT ID, NAME{LINE_SEPARATOR}FROM A")
        );
        assert_eq!(injected["b.sql"], "DELETE FROM B");
    }

    #[test]
    fn test_add_and_add_path() {
        let store = fixture();
        let mut stash = stash_over(&store);
        stash.add_path("/scripts/a.sql", false).unwrap();
        assert!(stash.get("a.sql").unwrap().tokens().is_none());

        let err = stash.add_path("/other/a.sql", true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
        let err = stash.add_path("/scripts/zzz.sql", true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        stash.add_path("/other/d.sql", true).unwrap();
        assert!(stash.get("d.sql").unwrap().tokens().is_some());

        let doc = TextDocument::from_lines("/tmp/d.sql", ["x"]);
        assert_eq!(stash.add(doc).unwrap_err().kind(), ErrorKind::AlreadyExists);

        stash.tokens().set("k", "v");
        stash.clear();
        assert!(stash.is_empty());
        assert_eq!(stash.tokens().get("k"), "v");
    }

    #[test]
    fn test_save_and_reload_filters() {
        let store = fixture();
        let mut stash = stash_over(&store);
        stash.fill("/scripts", "*.sql", FillMode::Append).unwrap();
        for document in ["a.sql", "b.sql"] {
            stash.get_mut(document).unwrap().append_line("-- touched");
        }

        let saved = stash
            .save_on_line_match(|line| line.starts_with("DELETE"))
            .unwrap();
        assert_eq!(saved, 1);
        assert_eq!(
            store.contents("/scripts/b.sql").unwrap(),
            format!("DELETE FROM B{LINE_SEPARATOR}-- touched{LINE_SEPARATOR}")
        );

        let reloaded = stash
            .reload_on_document_match(|d| d.file_name() == "a.sql")
            .unwrap();
        assert_eq!(reloaded, 1);
        assert_eq!(stash.get("a.sql").unwrap().line_count(), 2);

        assert_eq!(stash.save_all().unwrap(), 3);
        assert_eq!(stash.reload_all().unwrap(), 3);
    }

    #[test]
    fn test_save_to_folder() {
        let store = fixture();
        let mut stash = stash_over(&store);
        stash.fill("/scripts", "*.sql", FillMode::Append).unwrap();

        assert_eq!(
            stash.save_to_folder("").unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            stash.save_to_folder("/out").unwrap_err().kind(),
            ErrorKind::NotFound
        );

        store.create_dir("/out");
        let saved = stash
            .save_to_folder_on_line_match("/out", |line| line.starts_with("SELECT"))
            .unwrap();
        assert_eq!(saved, 2);
        assert!(store.contents("/out/a.sql").is_some());
        assert!(store.contents("/out/b.sql").is_none());
        assert_eq!(stash.get("c.sql").unwrap().path(), Path::new("/out/c.sql"));
        assert_eq!(stash.get("b.sql").unwrap().path(), Path::new("/scripts/b.sql"));
    }

    #[test]
    fn test_inject_variants() {
        let store = fixture();
        let mut stash = stash_over(&store);
        stash.fill("/scripts", "*.sql", FillMode::Append).unwrap();
        let tokens = TokenMap::from([("[COLS]", "*")]);

        let all = stash.inject(&tokens);
        assert_eq!(all.len(), 3);
        assert!(all["a.sql"].starts_with("SELECT *"));

        let selects = stash.inject_on_line_match(&tokens, |l| l.contains("[COLS]"));
        assert_eq!(selects.keys().collect::<Vec<_>>(), ["a.sql"]);

        let named = stash.inject_on_document_match(&tokens, |d| d.file_name() == "c.sql");
        assert_eq!(named["c.sql"], "SELECT 1");

        let sets = [TokenMap::from([("[COLS]", "A")]), TokenMap::from([("[COLS]", "B")])];
        let each = stash
            .inject_each_on_line_match(&sets, |l| l.contains("[COLS]"))
            .unwrap();
        assert_eq!(each["a.sql"].len(), 2);
        assert!(each["a.sql"][1].starts_with("SELECT B"));

        let none: [TokenMap; 0] = [];
        assert_eq!(
            stash.inject_each(&none).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );

        let source = TextDocument::from_lines("/t/cols.json", [r#"{"[COLS]":"ID"}"#]);
        let from_source = stash
            .inject_source_on_document_match(&source, |d| d.file_name() == "a.sql")
            .unwrap();
        assert!(from_source["a.sql"].starts_with("SELECT ID"));

        let bad = TextDocument::from_lines("/t/cols.yaml", ["x: y"]);
        assert_eq!(
            stash.inject_source(&bad).unwrap_err().kind(),
            ErrorKind::Format
        );
    }

    #[test]
    fn test_save_on_document_match() {
        let store = fixture();
        let mut stash = stash_over(&store);
        stash.fill("/scripts", "*.sql", FillMode::Append).unwrap();
        for document in ["a.sql", "b.sql"] {
            stash.get_mut(document).unwrap().append_line("-- touched");
        }

        let saved = stash
            .save_on_document_match(|d| d.file_name() == "b.sql")
            .unwrap();
        assert_eq!(saved, 1);
        assert_eq!(
            store.contents("/scripts/b.sql").unwrap(),
            format!("DELETE FROM B{LINE_SEPARATOR}-- touched{LINE_SEPARATOR}")
        );
        assert_eq!(store.contents("/scripts/a.sql").unwrap(), "SELECT [COLS]\nFROM A");
    }

    #[test]
    fn test_save_to_folder_on_document_match() {
        let store = fixture();
        let mut stash = stash_over(&store);
        stash.fill("/scripts", "*.sql", FillMode::Append).unwrap();
        store.create_dir("/out");

        let saved = stash
            .save_to_folder_on_document_match("/out", |d| d.file_name() == "c.sql")
            .unwrap();
        assert_eq!(saved, 1);
        assert_eq!(
            store.contents("/out/c.sql").unwrap(),
            format!("SELECT 1{LINE_SEPARATOR}")
        );
        assert!(store.contents("/out/a.sql").is_none());
        assert_eq!(stash.get("c.sql").unwrap().path(), Path::new("/out/c.sql"));
        assert_eq!(stash.get("a.sql").unwrap().path(), Path::new("/scripts/a.sql"));
    }

    #[test]
    fn test_inject_source_on_line_match() {
        let store = fixture();
        let mut stash = stash_over(&store);
        stash.fill("/scripts", "*.sql", FillMode::Append).unwrap();

        let source = TextDocument::from_lines("/t/cols.csv", ["\"[COLS]\",\"ID, NAME\""]);
        let injected = stash
            .inject_source_on_line_match(&source, |l| l.contains("[COLS]"))
            .unwrap();
        assert_eq!(injected.keys().collect::<Vec<_>>(), ["a.sql"]);
        assert_eq!(
            injected["a.sql"],
            format!("SELECT ID, NAME{LINE_SEPARATOR}FROM A")
        );
    }

    #[test]
    fn test_from_dirs_patterns_walks_every_directory_and_pattern() {
        let first = tempfile::TempDir::new().unwrap();
        let second = tempfile::TempDir::new().unwrap();
        std::fs::write(first.path().join("a.sql"), "SELECT 'first'").unwrap();
        std::fs::write(first.path().join("notes.txt"), "first notes").unwrap();
        std::fs::write(second.path().join("a.sql"), "SELECT 'second'").unwrap();
        std::fs::write(second.path().join("b.txt"), "second notes").unwrap();
        std::fs::write(second.path().join("c.md"), "ignored").unwrap();

        let stash =
            Stash::from_dirs_patterns(&[first.path(), second.path()], &["*.sql", "*.txt"]).unwrap();
        assert_eq!(names(&stash), ["a.sql", "b.txt", "notes.txt"]);

        let a = stash.get("a.sql").unwrap();
        assert_eq!(a.path(), first.path().join("a.sql"));
        assert_eq!(a.lines(), ["SELECT 'first'"]);
        assert_eq!(a.pattern(), Some("*.sql"));
        assert_eq!(stash.get("b.txt").unwrap().pattern(), Some("*.txt"));
        assert!(stash.documents().all(|d| d.tokens().is_some()));
    }
}
