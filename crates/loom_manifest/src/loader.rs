//! Manifest loading from template directories.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ManifestError, ManifestResult};
use crate::model::RawManifest;

/// File names probed, in order, inside a template directory.
pub const MANIFEST_FILE_NAMES: [&str; 3] = ["template.yaml", "template.yml", "template.json"];

/// Locates and reads the manifest of a template directory.
pub struct ManifestLoader {
    template_dir: PathBuf,
}

impl ManifestLoader {
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_dir: template_dir.into(),
        }
    }

    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    /// Path of the first manifest file that exists.
    pub fn manifest_path(&self) -> ManifestResult<PathBuf> {
        MANIFEST_FILE_NAMES
            .iter()
            .map(|name| self.template_dir.join(name))
            .find(|path| path.is_file())
            .ok_or_else(|| ManifestError::NotFound(self.template_dir.join(MANIFEST_FILE_NAMES[0])))
    }

    /// Read the manifest document without validating it.
    pub fn load(&self) -> ManifestResult<RawManifest> {
        let path = self.manifest_path()?;
        Self::load_file(&path)
    }

    /// Read a manifest document from an explicit file.
    pub fn load_file(path: &Path) -> ManifestResult<RawManifest> {
        if !path.is_file() {
            return Err(ManifestError::NotFound(path.to_path_buf()));
        }
        debug!("Loading manifest from {:?}", path);
        let content = fs::read_to_string(path)?;
        RawManifest::from_str_for_path(&content, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_manifest() {
        let temp = tempdir().unwrap();
        let loader = ManifestLoader::new(temp.path());
        assert!(matches!(loader.load(), Err(ManifestError::NotFound(_))));
    }

    #[test]
    fn test_prefers_yaml_then_json() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("template.json"), r#"{"id": "from-json"}"#).unwrap();
        let loader = ManifestLoader::new(temp.path());
        assert_eq!(loader.load().unwrap().as_value()["id"], "from-json");

        fs::write(temp.path().join("template.yaml"), "id: from-yaml\n").unwrap();
        assert_eq!(loader.load().unwrap().as_value()["id"], "from-yaml");
    }
}
