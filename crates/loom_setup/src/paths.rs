//! Path containment for tool calls.
//!
//! Every path handed to a tool is resolved lexically against the project
//! root: `.` is dropped, `..` pops a component, and the result must still lie
//! under the root. Symlinks are not followed.

use std::path::{Component, Path, PathBuf};

use crate::error::{SandboxError, SandboxResult};

/// The directory all tool operations are confined to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRoot {
    root: PathBuf,
}

impl ProjectRoot {
    /// Create a root; relative roots are anchored at the current directory.
    pub fn new(root: impl AsRef<Path>) -> SandboxResult<Self> {
        let root = root.as_ref();
        let absolute = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()?.join(root)
        };
        Ok(Self {
            root: normalize(&absolute),
        })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolve `input` to an absolute path inside the root.
    pub fn resolve(&self, input: impl AsRef<Path>) -> SandboxResult<PathBuf> {
        let input = input.as_ref();
        let joined = if input.is_absolute() {
            input.to_path_buf()
        } else {
            self.root.join(input)
        };

        let resolved = normalize(&joined);
        if resolved.starts_with(&self.root) && !escapes(&joined, &self.root) {
            Ok(resolved)
        } else {
            Err(SandboxError::PathEscape(input.display().to_string()))
        }
    }

    /// Like [`resolve`](Self::resolve) but refuses the root itself.
    pub fn resolve_entry(&self, input: impl AsRef<Path>, operation: &str) -> SandboxResult<PathBuf> {
        let resolved = self.resolve(input.as_ref())?;
        if resolved == self.root {
            return Err(SandboxError::invalid_argument(
                operation,
                "the project root itself cannot be the target",
            ));
        }
        Ok(resolved)
    }

    /// A sub-root for a directory under this root.
    pub fn child(&self, input: impl AsRef<Path>) -> SandboxResult<ProjectRoot> {
        Ok(ProjectRoot {
            root: self.resolve(input)?,
        })
    }

    /// Path relative to the root, for messages and logs.
    pub fn display(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Whether a `..` walks above the root at any point, even if a later
/// component would come back inside.
fn escapes(path: &Path, root: &Path) -> bool {
    let mut current = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if current == root || !current.starts_with(root) {
                    return true;
                }
                current.pop();
            }
            other => current.push(other.as_os_str()),
        }
    }
    false
}
