use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use super::builtin::builtin_extractors;
use super::definition::CustomExtractor;
use super::registry::ExtractorRegistry;
use crate::{PithError, Result};

/// A definition file holds one extractor or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum DefinitionFile {
    Many(Vec<CustomExtractor>),
    One(Box<CustomExtractor>),
}

/// Builds an [`ExtractorRegistry`] from the builtin table and a directory of
/// JSON definitions.
///
/// Sources are applied in order: builtin table first, then the custom
/// directory's `*.json` files sorted by file name. A later definition for a
/// domain replaces an earlier one.
#[derive(Debug, Clone)]
pub struct RegistryLoader {
    /// Directory of user definitions
    custom_dir: Option<PathBuf>,
    /// Whether to start from the builtin table
    include_builtin: bool,
}

impl RegistryLoader {
    /// Loader with the builtin table and no custom directory.
    pub fn new() -> Self {
        Self { custom_dir: None, include_builtin: true }
    }

    pub fn custom_dir(&self) -> Option<&Path> {
        self.custom_dir.as_deref()
    }

    /// Load every source into a fresh registry.
    ///
    /// Unreadable or invalid definition files are skipped with a warning. A
    /// missing custom directory is not an error.
    pub fn load(&self) -> Result<ExtractorRegistry> {
        let mut registry = ExtractorRegistry::new();

        if self.include_builtin {
            for extractor in builtin_extractors()? {
                registry.register(extractor)?;
            }
        }

        if let Some(dir) = &self.custom_dir {
            for path in definition_files(dir)? {
                match load_file(&path) {
                    Ok(extractors) => {
                        debug!(path = %path.display(), count = extractors.len(), "loaded extractor definitions");
                        for extractor in extractors {
                            registry.register(extractor)?;
                        }
                    }
                    Err(e) => warn!(path = %path.display(), error = %e, "skipping extractor definition file"),
                }
            }
        }

        Ok(registry)
    }

    /// Default custom directory (~/.config/pith/extractors)
    fn default_custom_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("pith").join("extractors"))
    }
}

/// Parse and validate one definition file.
///
/// Every definition in the file must validate, otherwise none are returned.
pub fn load_file(path: &Path) -> Result<Vec<CustomExtractor>> {
    if !path.exists() {
        return Err(PithError::FileNotFound(path.to_path_buf()));
    }

    let json = fs::read_to_string(path)?;
    let extractors = match serde_json::from_str(&json)? {
        DefinitionFile::Many(extractors) => extractors,
        DefinitionFile::One(extractor) => vec![*extractor],
    };

    for extractor in &extractors {
        extractor.validate()?;
    }

    Ok(extractors)
}

fn definition_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        debug!(dir = %dir.display(), "custom extractor directory not found");
        return Ok(Vec::new());
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    Ok(files)
}

/// Builder for RegistryLoader
#[derive(Debug)]
pub struct RegistryLoaderBuilder {
    custom_dir: Option<PathBuf>,
    include_builtin: bool,
}

impl RegistryLoaderBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self { custom_dir: None, include_builtin: true }
    }

    /// Set custom definition directory
    pub fn custom_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.custom_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Include the builtin table (default: true)
    pub fn include_builtin(mut self, include: bool) -> Self {
        self.include_builtin = include;
        self
    }

    /// Build the RegistryLoader
    pub fn build(self) -> RegistryLoader {
        RegistryLoader { custom_dir: self.custom_dir, include_builtin: self.include_builtin }
    }
}

impl Default for RegistryLoaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for RegistryLoader {
    fn default() -> Self {
        let mut builder = RegistryLoaderBuilder::new();

        if let Some(custom_dir) = Self::default_custom_dir() {
            builder = builder.custom_dir(custom_dir);
        }

        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_loader_builder() {
        let temp_dir = TempDir::new().unwrap();
        let loader = RegistryLoaderBuilder::new().custom_dir(temp_dir.path()).include_builtin(false).build();

        assert_eq!(loader.custom_dir(), Some(temp_dir.path()));
        assert!(loader.load().unwrap().is_empty());
    }

    #[test]
    fn test_default_loader_points_at_config_dir() {
        let loader = RegistryLoader::default();
        if let Some(dir) = loader.custom_dir() {
            assert!(dir.ends_with(".config/pith/extractors"));
        }
    }

    #[test]
    fn test_load_single_and_list_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("a.json"),
            r#"{"domain": "example.com", "content": {"selectors": ["article"]}}"#,
        )
        .unwrap();
        fs::write(
            temp_dir.path().join("b.json"),
            r#"[{"domain": "one.test"}, {"domain": "two.test", "supported_domains": ["www.two.test"]}]"#,
        )
        .unwrap();
        fs::write(temp_dir.path().join("notes.txt"), "ignored").unwrap();

        let registry = RegistryLoaderBuilder::new().custom_dir(temp_dir.path()).include_builtin(false).build().load().unwrap();

        assert_eq!(registry.domains(), vec!["example.com", "one.test", "two.test", "www.two.test"]);
    }

    #[test]
    fn test_bad_files_are_skipped() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("broken.json"), "{ not json").unwrap();
        fs::write(
            temp_dir.path().join("invalid.json"),
            r#"[{"domain": "fine.test"}, {"domain": "bad.test", "title": {"selectors": ["h1[["]}}]"#,
        )
        .unwrap();
        fs::write(temp_dir.path().join("good.json"), r#"{"domain": "good.test"}"#).unwrap();

        let registry = RegistryLoaderBuilder::new().custom_dir(temp_dir.path()).include_builtin(false).build().load().unwrap();

        assert_eq!(registry.domains(), vec!["good.test"]);
    }

    #[test]
    fn test_custom_dir_overrides_builtin() {
        let builtin = RegistryLoaderBuilder::new().build().load().unwrap();
        let domain = builtin.domains()[0].to_string();

        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join("override.json"),
            format!(r#"{{"domain": "{domain}", "title": {{"selectors": ["h1.override"]}}}}"#),
        )
        .unwrap();

        let registry = RegistryLoaderBuilder::new().custom_dir(temp_dir.path()).build().load().unwrap();
        let title = registry.get(&domain).and_then(|e| e.title.as_ref()).unwrap();
        assert_eq!(title.selectors.len(), 1);
        assert_eq!(registry.len(), builtin.len());
    }

    #[test]
    fn test_missing_dir_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let loader = RegistryLoaderBuilder::new().custom_dir(temp_dir.path().join("absent")).include_builtin(false).build();
        assert!(loader.load().unwrap().is_empty());
    }

    #[test]
    fn test_load_file_missing() {
        let result = load_file(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(PithError::FileNotFound(_))));
    }
}
