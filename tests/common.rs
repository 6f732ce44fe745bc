//! Shared fixtures for loader integration and property tests

#![allow(dead_code)]

use evented_loader::{EventedLoader, FsResolver, ModuleStore, Signal};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Isolated module tree with its own store
///
/// Loaders built from the same fixture share the store, like loaders sharing
/// the process-wide store, without leaking state between tests.
pub struct LoaderFixture {
    pub temp_dir: TempDir,
    pub store: Arc<ModuleStore>,
}

impl LoaderFixture {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Self {
            temp_dir: TempDir::new()?,
            store: Arc::new(ModuleStore::new()),
        })
    }

    /// Canonical fixture root
    pub fn root(&self) -> PathBuf {
        self.temp_dir
            .path()
            .canonicalize()
            .unwrap_or_else(|_| self.temp_dir.path().to_path_buf())
    }

    /// Write a module file relative to the root, returning its canonical path
    pub fn write_module(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, contents).unwrap();
        path.canonicalize().unwrap()
    }

    /// Write `modules/<name>/module.toml` plus its entry point file
    pub fn write_package(&self, name: &str, entry_point: &str, contents: &str) -> PathBuf {
        self.write_module(
            &format!("modules/{}/module.toml", name),
            &format!(
                "name = \"{}\"\nversion = \"0.1.0\"\nentry_point = \"{}\"\n",
                name, entry_point
            ),
        );
        self.write_module(&format!("modules/{}/{}", name, entry_point), contents)
    }

    /// Loader rooted at the fixture, sharing the fixture store
    pub fn loader(&self) -> EventedLoader {
        self.loader_at(&self.root())
    }

    pub fn loader_at(&self, base_dir: &Path) -> EventedLoader {
        EventedLoader::with_collaborators(
            Some(base_dir.to_path_buf()),
            Arc::new(FsResolver::new()),
            Arc::clone(&self.store),
        )
    }
}

/// Subscribe to every signal, recording `signal:name`
pub fn record_signals(loader: &EventedLoader) -> Arc<Mutex<Vec<String>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    for signal in Signal::ALL {
        let log = Arc::clone(&log);
        loader.on(signal, move |event| {
            log.lock()
                .unwrap()
                .push(format!("{}:{}", event.signal(), event.name()));
            Ok(())
        });
    }
    log
}

pub fn recorded(log: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    log.lock().unwrap().clone()
}
