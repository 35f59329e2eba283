//! Configuration types for request pipelines.

use crate::context::DEFAULT_MAX_FORM_BYTES;
use crate::errors::ConfigError;
use crate::ports::LocalFileResolver;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Allowed languages and the archive entry name each one is stored under.
///
/// The keys of the table are the allowed language set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageTable {
    entries: BTreeMap<String, String>,
}

impl Default for LanguageTable {
    fn default() -> Self {
        Self::new()
            .with_language("go", "main.go")
            .with_language("python", "main.py")
    }
}

impl LanguageTable {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Adds a language with its archive entry name.
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>, entry_name: impl Into<String>) -> Self {
        self.entries.insert(language.into(), entry_name.into());
        self
    }

    /// Returns true if `language` is allowed.
    #[must_use]
    pub fn contains(&self, language: &str) -> bool {
        self.entries.contains_key(language)
    }

    /// Returns the archive entry name for `language`.
    #[must_use]
    pub fn entry_name(&self, language: &str) -> Option<&str> {
        self.entries.get(language).map(String::as_str)
    }

    /// Returns the allowed languages in sorted order.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the number of languages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no language is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Validates the table.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is empty or an entry name is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.entries.is_empty() {
            return Err(ConfigError::EmptyLanguageTable);
        }
        if let Some((language, _)) = self.entries.iter().find(|(_, name)| name.is_empty()) {
            return Err(ConfigError::EmptyEntryName {
                language: language.clone(),
            });
        }
        Ok(())
    }
}

/// Startup configuration for a code-runner pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Allowed languages and their archive entry names.
    #[serde(default)]
    pub languages: LanguageTable,
    /// Maximum size of a request body read as a form.
    #[serde(default = "default_max_form_bytes")]
    pub max_form_bytes: usize,
    /// Root directory for resolving test and stdin paths.
    #[serde(default = "default_file_root")]
    pub file_root: PathBuf,
}

fn default_max_form_bytes() -> usize {
    DEFAULT_MAX_FORM_BYTES
}

fn default_file_root() -> PathBuf {
    PathBuf::from(".")
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            languages: LanguageTable::default(),
            max_form_bytes: default_max_form_bytes(),
            file_root: default_file_root(),
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or validation fails.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Sets the language table.
    #[must_use]
    pub fn with_languages(mut self, languages: LanguageTable) -> Self {
        self.languages = languages;
        self
    }

    /// Sets the form size bound.
    #[must_use]
    pub const fn with_max_form_bytes(mut self, max_form_bytes: usize) -> Self {
        self.max_form_bytes = max_form_bytes;
        self
    }

    /// Sets the resolver root directory.
    #[must_use]
    pub fn with_file_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.file_root = root.into();
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.languages.validate()?;
        if self.max_form_bytes == 0 {
            return Err(ConfigError::InvalidFormLimit);
        }
        Ok(())
    }

    /// Builds a filesystem resolver rooted at `file_root`.
    #[must_use]
    pub fn file_resolver(&self) -> LocalFileResolver {
        LocalFileResolver::new(&self.file_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_table() {
        let table = LanguageTable::default();
        assert_eq!(table.languages().collect::<Vec<_>>(), vec!["go", "python"]);
        assert_eq!(table.entry_name("python"), Some("main.py"));
        assert_eq!(table.entry_name("go"), Some("main.go"));
        assert!(!table.contains("rust"));
    }

    #[test]
    fn test_empty_table_is_invalid() {
        assert!(matches!(
            LanguageTable::new().validate(),
            Err(ConfigError::EmptyLanguageTable)
        ));
    }

    #[test]
    fn test_empty_entry_name_is_invalid() {
        let table = LanguageTable::new().with_language("c", "");
        assert!(matches!(
            table.validate(),
            Err(ConfigError::EmptyEntryName { language }) if language == "c"
        ));
    }

    #[test]
    fn test_config_defaults_from_empty_json() {
        let config = PipelineConfig::from_json_str("{}").unwrap();
        assert_eq!(config.max_form_bytes, 16 * 1024 * 1024);
        assert_eq!(config.file_root, PathBuf::from("."));
        assert_eq!(config.languages, LanguageTable::default());
    }

    #[test]
    fn test_config_from_json() {
        let config = PipelineConfig::from_json_str(
            r#"{
                "languages": { "rust": "main.rs" },
                "max_form_bytes": 1024,
                "file_root": "/srv/runner"
            }"#,
        )
        .unwrap();

        assert_eq!(config.languages.entry_name("rust"), Some("main.rs"));
        assert!(!config.languages.contains("go"));
        assert_eq!(config.max_form_bytes, 1024);
        assert_eq!(config.file_resolver().root(), Path::new("/srv/runner"));
    }

    #[test]
    fn test_zero_form_limit_is_invalid() {
        let result = PipelineConfig::from_json_str(r#"{ "max_form_bytes": 0 }"#);
        assert!(matches!(result, Err(ConfigError::InvalidFormLimit)));
    }

    #[test]
    fn test_invalid_json() {
        let result = PipelineConfig::from_json_str("{ nope");
        assert!(matches!(result, Err(ConfigError::Serialization(_))));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runner.json");
        std::fs::write(&path, r#"{ "languages": { "go": "main.go" } }"#).unwrap();

        let config = PipelineConfig::from_path(&path).unwrap();
        assert_eq!(config.languages.len(), 1);

        let missing = PipelineConfig::from_path(dir.path().join("absent.json"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
