//! Module manifest parsing and validation
//!
//! Handles parsing `module.toml` manifests, which turn a directory into a
//! package whose entry point is loaded when the directory is requested.

use crate::module::traits::ResolveError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Module manifest (module.toml structure)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleManifest {
    /// Package name
    pub name: String,
    /// Package version (semantic versioning)
    #[serde(default)]
    pub version: String,
    /// Human-readable description
    pub description: Option<String>,
    /// Package author
    pub author: Option<String>,
    /// File to load when the package directory is requested, relative to it
    pub entry_point: String,
    /// Declared dependencies (package names with versions)
    #[serde(default)]
    pub dependencies: HashMap<String, String>,
}

impl ModuleManifest {
    /// Load manifest from file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ResolveError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| ResolveError::InvalidManifest {
                path: path.to_path_buf(),
                reason: format!("Failed to read manifest file: {}", e),
            })?;

        let manifest: ModuleManifest =
            toml::from_str(&contents).map_err(|e| ResolveError::InvalidManifest {
                path: path.to_path_buf(),
                reason: format!("Failed to parse manifest TOML: {}", e),
            })?;

        // Validate required fields
        if manifest.name.trim().is_empty() {
            return Err(ResolveError::InvalidManifest {
                path: path.to_path_buf(),
                reason: "Module name cannot be empty".to_string(),
            });
        }
        if manifest.entry_point.trim().is_empty() {
            return Err(ResolveError::InvalidManifest {
                path: path.to_path_buf(),
                reason: "Entry point cannot be empty".to_string(),
            });
        }

        Ok(manifest)
    }
}
