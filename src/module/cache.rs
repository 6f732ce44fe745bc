//! Module store: the filesystem load primitive and its location-keyed cache
//!
//! Evaluates `.json` and `.toml` module files into a JSON value and memoizes
//! the result per [`ModuleLocation`]. The store is append-only; nothing is ever
//! evicted while it is alive.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::debug;

use crate::module::traits::{LoadError, ModuleCache, ModuleLocation};

/// Loaded module value, shared between every caller that asks for the location
pub type ModuleValue = Arc<serde_json::Value>;

static GLOBAL_STORE: OnceLock<Arc<ModuleStore>> = OnceLock::new();

/// Location-keyed module cache backed by the filesystem
#[derive(Debug, Default)]
pub struct ModuleStore {
    modules: RwLock<HashMap<ModuleLocation, ModuleValue>>,
}

impl ModuleStore {
    /// Create an isolated store
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide store shared by every loader built with [`EventedLoader::new`]
    ///
    /// [`EventedLoader::new`]: crate::module::loader::EventedLoader::new
    pub fn global() -> Arc<ModuleStore> {
        Arc::clone(GLOBAL_STORE.get_or_init(|| Arc::new(ModuleStore::new())))
    }

    /// Number of loaded modules
    pub fn len(&self) -> usize {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, location: &ModuleLocation) -> bool {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(location)
    }

    /// Read and evaluate a module file according to its extension
    pub fn evaluate(path: &Path) -> Result<serde_json::Value, LoadError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        let parse = match extension.as_deref() {
            Some("json") => parse_json,
            Some("toml") => parse_toml,
            _ => {
                return Err(LoadError::UnsupportedFormat {
                    path: path.to_path_buf(),
                })
            }
        };

        let contents = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        parse(&contents).map_err(|message| LoadError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }
}

fn parse_json(contents: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(contents).map_err(|e| e.to_string())
}

fn parse_toml(contents: &str) -> Result<serde_json::Value, String> {
    toml::from_str(contents).map_err(|e| e.to_string())
}

impl ModuleCache for ModuleStore {
    type Value = ModuleValue;

    fn is_cached(&self, location: &ModuleLocation) -> bool {
        self.contains(location)
    }

    fn cached_value(&self, location: &ModuleLocation) -> Option<ModuleValue> {
        self.modules
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(location)
            .cloned()
    }

    fn load(&self, location: &ModuleLocation) -> Result<ModuleValue, LoadError> {
        debug!("Evaluating module at {}", location);
        let value = Arc::new(Self::evaluate(location.path())?);

        let mut modules = self
            .modules
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        // First insertion wins if another caller loaded the same location meanwhile.
        let stored = Arc::clone(modules.entry(location.clone()).or_insert(value));
        debug!("Module cached: {} ({} total)", location, modules.len());
        Ok(stored)
    }
}
