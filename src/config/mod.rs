//! Configuration management for evented-loader
//!
//! Handles configuration loading and validation for the loader, the filesystem
//! resolver and logging.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Loader configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Base directory names are resolved against (default: current directory)
    #[serde(default)]
    pub base_dir: Option<String>,

    /// Package directory searched for bare module names
    #[serde(default = "default_modules_dir")]
    pub modules_dir: String,

    /// File extensions probed when a name has none, in order
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Manifest file name inside package directories
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,

    /// Logging configuration
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

fn default_modules_dir() -> String {
    "modules".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["json".to_string(), "toml".to_string()]
}

fn default_manifest_file() -> String {
    "module.toml".to_string()
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            modules_dir: default_modules_dir(),
            extensions: default_extensions(),
            manifest_file: default_manifest_file(),
            logging: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter (e.g., "info", "evented_loader=debug"); RUST_LOG takes precedence
    #[serde(default)]
    pub filter: Option<String>,

    /// Emit JSON lines (requires the `json-logging` feature)
    #[serde(default)]
    pub json_format: bool,
}

impl LoaderConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e)
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let config: LoaderConfig = toml::from_str(contents)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.modules_dir.trim().is_empty() {
            return Err(anyhow::anyhow!("modules_dir cannot be empty"));
        }
        if self.manifest_file.trim().is_empty() {
            return Err(anyhow::anyhow!("manifest_file cannot be empty"));
        }
        if self.extensions.is_empty() {
            return Err(anyhow::anyhow!(
                "extensions must list at least one file extension"
            ));
        }
        for extension in &self.extensions {
            if extension.is_empty()
                || extension.starts_with('.')
                || extension.contains(['/', '\\'])
            {
                return Err(anyhow::anyhow!(
                    "Invalid extension '{}': expected a bare extension such as \"json\"",
                    extension
                ));
            }
        }
        Ok(())
    }

    /// Base directory as a path, if configured
    pub fn base_dir_path(&self) -> Option<PathBuf> {
        self.base_dir.as_ref().map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LoaderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.modules_dir, "modules");
        assert_eq!(config.extensions, vec!["json", "toml"]);
        assert_eq!(config.manifest_file, "module.toml");
        assert_eq!(config.base_dir_path(), None);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = LoaderConfig::from_toml_str(
            r#"
base_dir = "plugins"

[logging]
filter = "evented_loader=debug"
"#,
        )
        .unwrap();

        assert_eq!(config.base_dir_path(), Some(PathBuf::from("plugins")));
        assert_eq!(config.modules_dir, "modules");
        assert_eq!(
            config.logging,
            Some(LoggingConfig {
                filter: Some("evented_loader=debug".to_string()),
                json_format: false,
            })
        );
    }

    #[test]
    fn test_rejects_dotted_extension() {
        let err = LoaderConfig::from_toml_str("extensions = [\".json\"]").unwrap_err();
        assert!(err.to_string().contains(".json"));
    }

    #[test]
    fn test_rejects_empty_extensions() {
        assert!(LoaderConfig::from_toml_str("extensions = []").is_err());
    }

    #[test]
    fn test_rejects_empty_modules_dir() {
        assert!(LoaderConfig::from_toml_str("modules_dir = \"\"").is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("loader.toml");
        std::fs::write(&path, "modules_dir = \"plugins\"\n").unwrap();

        let config = LoaderConfig::from_file(&path).unwrap();
        assert_eq!(config.modules_dir, "plugins");

        assert!(LoaderConfig::from_file(dir.path().join("missing.toml")).is_err());
    }
}
