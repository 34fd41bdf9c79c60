//! Placeholder substitution over project files.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{SandboxError, SandboxResult};
use crate::paths::ProjectRoot;
use crate::tools::files::read_existing;
use crate::tools::templates::TemplateRenderer;

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// `tools.placeholders`
///
/// File arguments are project-relative paths or glob patterns. Glob matches
/// that are not UTF-8 text are skipped.
#[derive(Debug, Clone)]
pub struct PlaceholderTools {
    root: ProjectRoot,
    renderer: TemplateRenderer,
    inputs: BTreeMap<String, String>,
}

impl PlaceholderTools {
    pub fn new(root: ProjectRoot, renderer: TemplateRenderer, inputs: BTreeMap<String, String>) -> Self {
        Self {
            root,
            renderer,
            inputs,
        }
    }

    /// Substitute the resolved input values. Returns the number of files changed.
    pub fn apply_inputs<S: AsRef<str>>(&self, files: &[S]) -> SandboxResult<usize> {
        self.substitute(files, &self.inputs)
    }

    /// Substitute an explicit token map. Returns the number of files changed.
    pub fn replace_all<S: AsRef<str>>(&self, values: &BTreeMap<String, String>, files: &[S]) -> SandboxResult<usize> {
        self.substitute(files, values)
    }

    /// Substitute `values` in one file. Returns whether it changed.
    pub fn replace_in_file(&self, file: &str, values: &BTreeMap<String, String>) -> SandboxResult<bool> {
        let path = self.root.resolve(file)?;
        let content = read_existing(&path)?;
        self.rewrite(&path, &content, values)
    }

    fn substitute<S: AsRef<str>>(&self, files: &[S], values: &BTreeMap<String, String>) -> SandboxResult<usize> {
        let mut changed = 0;
        for file in files {
            let file = file.as_ref();
            if is_glob(file) {
                for path in self.expand(file)? {
                    let Ok(content) = fs::read_to_string(&path) else {
                        debug!("Skipping non-text file {}", self.root.display(&path));
                        continue;
                    };
                    if self.rewrite(&path, &content, values)? {
                        changed += 1;
                    }
                }
            } else {
                let path = self.root.resolve(file)?;
                let content = read_existing(&path)?;
                if self.rewrite(&path, &content, values)? {
                    changed += 1;
                }
            }
        }
        debug!("Substituted placeholders in {} file(s)", changed);
        Ok(changed)
    }

    fn rewrite(&self, path: &Path, content: &str, values: &BTreeMap<String, String>) -> SandboxResult<bool> {
        let rendered = self.renderer.render(content, values);
        if rendered == content {
            return Ok(false);
        }
        fs::write(path, rendered)?;
        Ok(true)
    }

    fn expand(&self, pattern: &str) -> SandboxResult<Vec<PathBuf>> {
        self.root.resolve(pattern)?;
        let matcher = glob::Pattern::new(pattern.trim_start_matches("./"))
            .map_err(|e| SandboxError::invalid_argument("placeholders", format!("bad pattern '{}': {}", pattern, e)))?;

        Ok(WalkDir::new(self.root.path())
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                let relative = e.path().strip_prefix(self.root.path()).unwrap_or(e.path());
                matcher.matches_path(relative)
            })
            .map(|e| e.into_path())
            .collect())
    }
}
