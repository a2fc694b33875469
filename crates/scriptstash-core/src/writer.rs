//! Whole-file replacement through a staged sibling file.
//!
//! Scripts are always written in full. [`StagedFile`] collects the new text in
//! a hidden file next to the target and renames it over the target on
//! [`commit`](StagedFile::commit), so readers never see a half-written script.
//! A stage that is dropped without committing removes its file.
//!
//! ```ignore
//! use scriptstash_core::writer::{replace_file, StagedFile};
//!
//! replace_file("users.sql", "SELECT *\nFROM USERS\n")?;
//!
//! let mut staged = StagedFile::create("phones.sql")?;
//! staged.append_lines(&["SELECT PHONE", "FROM USERS"], "\n")?;
//! staged.commit()?;
//! ```

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{FileError, FileResult};

/// Replaces the content of `target` with `text` in one step.
///
/// # Errors
///
/// Fails if the target directory is missing or not writable. The target is
/// unchanged on failure.
pub fn replace_file(target: &Path, text: &str) -> FileResult<()> {
    let mut staged = StagedFile::create(target)?;
    staged.append(text)?;
    staged.commit()
}

/// New content for a file, staged beside it until committed.
pub struct StagedFile {
    target: PathBuf,
    stage: PathBuf,
    out: BufWriter<fs::File>,
    committed: bool,
}

impl StagedFile {
    /// Opens a stage for `target` in the target's own directory.
    pub fn create(target: impl AsRef<Path>) -> FileResult<Self> {
        let target = target.as_ref().to_path_buf();
        let stage = stage_path(&target);
        let file = fs::File::create(&stage).map_err(|e| FileError::from_io(e, &target))?;
        Ok(Self {
            target,
            stage,
            out: BufWriter::new(file),
            committed: false,
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Appends raw text.
    pub fn append(&mut self, text: &str) -> FileResult<()> {
        self.out
            .write_all(text.as_bytes())
            .map_err(|e| FileError::from_io(e, &self.target))
    }

    /// Appends each line followed by `separator`.
    pub fn append_lines<S: AsRef<str>>(&mut self, lines: &[S], separator: &str) -> FileResult<()> {
        for line in lines {
            self.append(line.as_ref())?;
            self.append(separator)?;
        }
        Ok(())
    }

    /// Flushes the stage to disk and renames it over the target.
    pub fn commit(mut self) -> FileResult<()> {
        let target = self.target.clone();
        let io_err = |e| FileError::from_io(e, &target);
        self.out.flush().map_err(io_err)?;
        self.out.get_ref().sync_all().map_err(io_err)?;
        fs::rename(&self.stage, &self.target).map_err(io_err)?;
        self.committed = true;
        Ok(())
    }
}

/// `dir/name` stages at `dir/.name.<pid>.stage`.
fn stage_path(target: &Path) -> PathBuf {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dir.join(format!(".{name}.{}.stage", std::process::id()))
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.stage);
        }
    }
}

impl std::fmt::Debug for StagedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagedFile")
            .field("target", &self.target)
            .field("stage", &self.stage)
            .field("committed", &self.committed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entries(dir: &Path) -> usize {
        fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_replace_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.sql");
        fs::write(&path, "old").unwrap();

        replace_file(&path, "SELECT 1\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "SELECT 1\n");
        assert_eq!(entries(dir.path()), 1);
    }

    #[test]
    fn test_append_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("phones.sql");
        let mut staged = StagedFile::create(&path).unwrap();
        staged.append_lines(&["SELECT PHONE", "FROM USERS"], "\r\n").unwrap();
        staged.commit().unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "SELECT PHONE\r\nFROM USERS\r\n"
        );
    }

    #[test]
    fn test_dropped_stage_leaves_target() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("users.sql");
        fs::write(&path, "kept").unwrap();

        {
            let mut staged = StagedFile::create(&path).unwrap();
            staged.append("partial").unwrap();
            assert_eq!(entries(dir.path()), 2);
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "kept");
        assert_eq!(entries(dir.path()), 1);
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("users.sql");
        let err = replace_file(&path, "x").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.path(), Some(path.as_path()));
    }
}
