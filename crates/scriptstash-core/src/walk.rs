//! Recursive file listing with glob filtering.
//!
//! This is the file listing collaborator used to fill document collections:
//! given a root directory and a glob pattern it returns every matching file
//! below the root.
//!
//! ```ignore
//! use scriptstash_core::walk::{list_files, ListOptions};
//!
//! // Every SQL script under `scripts/`, including subdirectories
//! for path in list_files("scripts", "*.sql", &ListOptions::default())? {
//!     println!("{}", path.display());
//! }
//!
//! // Top level only, skipping dot files
//! let options = ListOptions::new().recursive(false).skip_hidden(true);
//! let found = list_files("scripts", "query_??.sql", &options)?;
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FileError, FileResult};
use crate::logging::targets;

// ============================================================================
// FileLister
// ============================================================================

/// Lists files matching a glob pattern under a root directory.
pub trait FileLister: Send + Sync + fmt::Debug {
    /// Returns the paths of all files under `root` whose file name matches
    /// `pattern`, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` does not exist or is not a directory, if the
    /// pattern is empty or malformed, or if a directory cannot be read.
    fn list_files(
        &self,
        root: &Path,
        pattern: &str,
        options: &ListOptions,
    ) -> FileResult<Vec<PathBuf>>;
}

// ============================================================================
// ListOptions
// ============================================================================

/// Configuration options for file listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListOptions {
    /// Whether to descend into subdirectories.
    pub recursive: bool,
    /// Maximum depth to descend into subdirectories (None = unlimited).
    pub max_depth: Option<usize>,
    /// Whether to follow symbolic links to directories.
    pub follow_symlinks: bool,
    /// Whether to skip hidden files and directories (starting with '.').
    pub skip_hidden: bool,
    /// Whether glob matching ignores ASCII case.
    pub case_insensitive: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            max_depth: None,
            follow_symlinks: false,
            skip_hidden: false,
            case_insensitive: cfg!(windows),
        }
    }
}

impl ListOptions {
    /// Creates a new `ListOptions` with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether subdirectories are searched.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Sets the maximum depth to descend.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Sets whether to follow symbolic links to directories.
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Sets whether to skip hidden entries.
    pub fn skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    /// Sets whether glob matching ignores case.
    pub fn case_insensitive(mut self, ignore_case: bool) -> Self {
        self.case_insensitive = ignore_case;
        self
    }

    /// The effective depth limit, where entries directly in the root are at depth 1.
    pub(crate) fn depth_limit(&self) -> Option<usize> {
        if self.recursive {
            self.max_depth
        } else {
            Some(1)
        }
    }
}

// ============================================================================
// WalkDir - Recursive directory iterator
// ============================================================================

/// An entry yielded by [`WalkDir`].
#[derive(Debug, Clone)]
pub struct WalkEntry {
    path: PathBuf,
    depth: usize,
    is_dir: bool,
    is_symlink: bool,
}

impl WalkEntry {
    /// Returns the full path of this entry.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the file name of this entry.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Returns the depth of this entry relative to the walk root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns true if this entry is a directory (following symlinks).
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Returns true if this entry is a symbolic link.
    pub fn is_symlink(&self) -> bool {
        self.is_symlink
    }

    /// Consumes the entry and returns its path.
    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

/// A breadth-first iterator over the files below a directory.
///
/// Directories are traversed but never yielded.
pub struct WalkDir {
    /// Queue of directories to visit (path, depth).
    queue: VecDeque<(PathBuf, usize)>,
    /// Current directory iterator.
    current: Option<(fs::ReadDir, PathBuf, usize)>,
    /// Configuration options.
    options: ListOptions,
    /// Compiled glob pattern (if any).
    glob_regex: Option<regex::Regex>,
}

impl WalkDir {
    /// Creates a new walker over `root` with options.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` is missing or is not a directory.
    pub fn new(root: impl AsRef<Path>, options: ListOptions) -> FileResult<Self> {
        let root = root.as_ref().to_path_buf();

        let metadata = fs::metadata(&root).map_err(|e| FileError::from_io(e, &root))?;
        if !metadata.is_dir() {
            return Err(FileError::not_directory(root));
        }

        let mut queue = VecDeque::new();
        // Entries directly in root are at depth 1
        queue.push_back((root, 1));

        Ok(Self {
            queue,
            current: None,
            options,
            glob_regex: None,
        })
    }

    /// Restricts yielded files to names matching `pattern`.
    ///
    /// # Errors
    ///
    /// Returns an error if the glob pattern cannot be compiled.
    pub fn glob(mut self, pattern: &str) -> FileResult<Self> {
        self.glob_regex = Some(glob_to_regex(pattern, self.options.case_insensitive)?);
        Ok(self)
    }

    fn is_hidden(&self, entry: &WalkEntry) -> bool {
        self.options.skip_hidden && entry.name().starts_with('.')
    }

    fn should_include(&self, entry: &WalkEntry) -> bool {
        if entry.is_dir() || self.is_hidden(entry) {
            return false;
        }
        match self.glob_regex {
            Some(ref regex) => regex.is_match(&entry.name()),
            None => true,
        }
    }

    fn should_descend(&self, entry: &WalkEntry, depth: usize) -> bool {
        if let Some(max_depth) = self.options.depth_limit()
            && depth >= max_depth
        {
            return false;
        }
        if !entry.is_dir() {
            return false;
        }
        if entry.is_symlink() && !self.options.follow_symlinks {
            return false;
        }
        !self.is_hidden(entry)
    }

    fn classify(fs_entry: &fs::DirEntry, depth: usize) -> FileResult<WalkEntry> {
        let path = fs_entry.path();
        let file_type = fs_entry
            .file_type()
            .map_err(|e| FileError::from_io(e, &path))?;
        let is_symlink = file_type.is_symlink();
        let is_dir = if is_symlink {
            // Dangling links are reported as files and skipped by the glob.
            fs::metadata(&path).map(|m| m.is_dir()).unwrap_or(false)
        } else {
            file_type.is_dir()
        };
        Ok(WalkEntry {
            path,
            depth,
            is_dir,
            is_symlink,
        })
    }
}

impl Iterator for WalkDir {
    type Item = FileResult<WalkEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((ref mut read_dir, ref dir_path, depth)) = self.current {
                match read_dir.next() {
                    Some(Ok(fs_entry)) => {
                        let entry = match Self::classify(&fs_entry, depth) {
                            Ok(entry) => entry,
                            Err(e) => return Some(Err(e)),
                        };

                        if self.should_descend(&entry, depth) {
                            self.queue.push_back((entry.path.clone(), depth + 1));
                        }

                        if self.should_include(&entry) {
                            return Some(Ok(entry));
                        }
                        continue;
                    }
                    Some(Err(e)) => {
                        return Some(Err(FileError::from_io(e, dir_path)));
                    }
                    None => {
                        self.current = None;
                    }
                }
            }

            let (path, depth) = self.queue.pop_front()?;
            match fs::read_dir(&path) {
                Ok(read_dir) => self.current = Some((read_dir, path, depth)),
                Err(e) => return Some(Err(FileError::from_io(e, path))),
            }
        }
    }
}

impl fmt::Debug for WalkDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalkDir")
            .field("pending_dirs", &self.queue.len())
            .field("options", &self.options)
            .field("glob", &self.glob_regex.as_ref().map(|r| r.as_str()))
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Glob Pattern Conversion
// ============================================================================

/// Compiles a glob into a regex anchored on a whole file name.
///
/// | Glob | Matches |
/// |------|---------|
/// | `*` | any run of characters within one path component |
/// | `**` | any run of characters, separators included |
/// | `?` | one character other than a separator |
/// | `[abc]`, `[a-z]` | one character from the set or range |
/// | `[!abc]`, `[^abc]` | one character outside the set |
///
/// Everything else matches itself.
///
/// # Errors
///
/// Returns an `InvalidPattern` error for an empty pattern or an unclosed set.
pub fn glob_to_regex(pattern: &str, case_insensitive: bool) -> FileResult<regex::Regex> {
    const NOT_SEPARATOR: &str = r"[^/\\]";

    if pattern.is_empty() {
        return Err(FileError::invalid_pattern(pattern, "empty glob pattern"));
    }

    let mut source = String::from("^");
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' if chars.next_if_eq(&'*').is_some() => source.push_str(".*"),
            '*' => {
                source.push_str(NOT_SEPARATOR);
                source.push('*');
            }
            '?' => source.push_str(NOT_SEPARATOR),
            '[' => {
                source.push('[');
                if chars.next_if(|&n| n == '!' || n == '^').is_some() {
                    source.push('^');
                }
                let mut closed = false;
                for member in chars.by_ref() {
                    if member == ']' {
                        closed = true;
                        break;
                    }
                    // '-' stays unescaped so ranges keep working
                    if member == '-' {
                        source.push('-');
                    } else {
                        source.push_str(&regex::escape(&member.to_string()));
                    }
                }
                if !closed {
                    return Err(FileError::invalid_pattern(pattern, "unclosed character set"));
                }
                source.push(']');
            }
            literal => source.push_str(&regex::escape(&literal.to_string())),
        }
    }
    source.push('$');

    regex::RegexBuilder::new(&source)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| FileError::invalid_pattern(pattern, e.to_string()))
}

// ============================================================================
// Standalone Functions
// ============================================================================

/// Lists every file below `root` whose name matches `pattern`, sorted by path.
///
/// # Errors
///
/// Returns an error if `root` is missing or not a directory, if the pattern
/// is invalid, or if a directory cannot be read.
pub fn list_files(
    root: impl AsRef<Path>,
    pattern: &str,
    options: &ListOptions,
) -> FileResult<Vec<PathBuf>> {
    let root = root.as_ref();
    let mut found = Vec::new();
    for entry in WalkDir::new(root, options.clone())?.glob(pattern)? {
        let entry = entry?;
        tracing::trace!(target: targets::WALK, path = %entry.path().display(), "matched");
        found.push(entry.into_path());
    }
    found.sort();
    tracing::debug!(
        target: targets::WALK,
        root = %root.display(),
        pattern,
        count = found.len(),
        "listed files"
    );
    Ok(found)
}
