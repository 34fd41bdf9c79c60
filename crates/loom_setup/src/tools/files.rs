//! File-system capability scoped to the project directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{SandboxError, SandboxResult};
use crate::paths::ProjectRoot;

/// Content accepted by [`FileTools::write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Text(String),
    /// Lines joined with `\n`.
    Lines(Vec<String>),
}

impl FileContent {
    pub fn into_text(self) -> String {
        match self {
            FileContent::Text(text) => text,
            FileContent::Lines(lines) => lines.join("\n"),
        }
    }
}

impl From<&str> for FileContent {
    fn from(text: &str) -> Self {
        FileContent::Text(text.to_string())
    }
}

impl From<String> for FileContent {
    fn from(text: String) -> Self {
        FileContent::Text(text)
    }
}

impl From<Vec<String>> for FileContent {
    fn from(lines: Vec<String>) -> Self {
        FileContent::Lines(lines)
    }
}

impl From<Vec<&str>> for FileContent {
    fn from(lines: Vec<&str>) -> Self {
        FileContent::Lines(lines.into_iter().map(str::to_string).collect())
    }
}

/// `tools.files`
#[derive(Debug, Clone)]
pub struct FileTools {
    root: ProjectRoot,
}

impl FileTools {
    pub fn new(root: ProjectRoot) -> Self {
        Self { root }
    }

    pub fn read(&self, path: &str) -> SandboxResult<String> {
        let path = self.root.resolve(path)?;
        read_existing(&path)
    }

    pub fn write(&self, path: &str, content: impl Into<FileContent>) -> SandboxResult<()> {
        let path = self.root.resolve_entry(path, "files.write")?;
        write_creating_parents(&path, content.into().into_text())?;
        debug!("Wrote {}", self.root.display(&path));
        Ok(())
    }

    /// Copy a file or directory. An existing destination is an error unless
    /// `overwrite` is set. Returns the number of files copied.
    pub fn copy(&self, from: &str, to: &str, overwrite: bool) -> SandboxResult<usize> {
        let source = self.root.resolve(from)?;
        let target = self.root.resolve_entry(to, "files.copy")?;
        let copied = copy_tree(&source, &target, overwrite)?;
        debug!(
            "Copied {} -> {} ({} file(s))",
            self.root.display(&source),
            self.root.display(&target),
            copied
        );
        Ok(copied)
    }

    /// Move a file or directory.
    pub fn move_path(&self, from: &str, to: &str, overwrite: bool) -> SandboxResult<()> {
        let source = self.root.resolve_entry(from, "files.move")?;
        let target = self.root.resolve_entry(to, "files.move")?;
        if !source.exists() {
            return Err(SandboxError::FileNotFound(source));
        }
        if target.exists() {
            if !overwrite {
                return Err(SandboxError::AlreadyExists(target));
            }
            remove_any(&target)?;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(&source, &target)?;
        debug!("Moved {} -> {}", self.root.display(&source), self.root.display(&target));
        Ok(())
    }

    /// Remove a file or directory tree. Returns `false` when nothing existed.
    pub fn remove(&self, path: &str) -> SandboxResult<bool> {
        let path = self.root.resolve_entry(path, "files.remove")?;
        if !path.exists() {
            return Ok(false);
        }
        remove_any(&path)?;
        debug!("Removed {}", self.root.display(&path));
        Ok(true)
    }

    pub fn ensure_dirs<S: AsRef<str>>(&self, paths: &[S]) -> SandboxResult<()> {
        for path in paths {
            let dir = self.root.resolve(path.as_ref())?;
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    pub fn exists(&self, path: &str) -> SandboxResult<bool> {
        Ok(self.root.resolve(path)?.exists())
    }
}

pub(crate) fn read_existing(path: &Path) -> SandboxResult<String> {
    if !path.is_file() {
        return Err(SandboxError::FileNotFound(path.to_path_buf()));
    }
    Ok(fs::read_to_string(path)?)
}

pub(crate) fn write_creating_parents(path: &Path, content: impl AsRef<[u8]>) -> SandboxResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

fn remove_any(path: &Path) -> SandboxResult<()> {
    if path.is_dir() {
        fs::remove_dir_all(path)?;
    } else {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Copy a file or a directory tree. Conflicts are checked before anything
/// is written.
pub(crate) fn copy_tree(source: &Path, target: &Path, overwrite: bool) -> SandboxResult<usize> {
    if !source.exists() {
        return Err(SandboxError::FileNotFound(source.to_path_buf()));
    }

    if source.is_file() {
        if target.exists() && !overwrite {
            return Err(SandboxError::AlreadyExists(target.to_path_buf()));
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(source, target)?;
        return Ok(1);
    }

    if target.starts_with(source) {
        return Err(SandboxError::invalid_argument(
            "copy",
            "cannot copy a directory into itself",
        ));
    }

    let mut plan: Vec<(PathBuf, PathBuf)> = Vec::new();
    for entry in WalkDir::new(source)
        .min_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let destination = target.join(relative);
        if destination.exists() && !overwrite {
            return Err(SandboxError::AlreadyExists(destination));
        }
        plan.push((entry.path().to_path_buf(), destination));
    }

    fs::create_dir_all(target)?;
    for (from, to) in &plan {
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(from, to)?;
    }
    Ok(plan.len())
}
