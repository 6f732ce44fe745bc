//! Evented module loader
//!
//! Resolves a requested name, loads it at most once per resolved location, and
//! reports each stage to listeners through the `before`, `success`, `exists`
//! and `failure` signals.

use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::LoaderConfig;
use crate::module::api::events::{EventManager, LoadEvent};
use crate::module::cache::ModuleStore;
use crate::module::registry::FsResolver;
use crate::module::traits::{
    ListenerError, ModuleCache, ModuleError, ModuleLocation, ModuleResolver, Signal,
};

/// Lifecycle-instrumented module loader
///
/// Reported failures (resolution or load errors) never escape as errors: they
/// are delivered to `failure` listeners and the call returns `Ok(None)`. A
/// listener that returns an error aborts the in-progress call with
/// [`ListenerError`].
///
/// Cloning produces another handle to the same loader: base directory,
/// collaborators and listener registry are all shared.
pub struct EventedLoader<C: ModuleCache = ModuleStore> {
    /// Directory names are resolved against; `None` defers to the resolver
    base_dir: Option<PathBuf>,
    resolver: Arc<dyn ModuleResolver>,
    cache: Arc<C>,
    events: Arc<EventManager<C::Value>>,
}

impl EventedLoader<ModuleStore> {
    /// Create a loader using the filesystem resolver and the process-wide store
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self::with_collaborators(base_dir, Arc::new(FsResolver::new()), ModuleStore::global())
    }

    /// Create a loader from configuration, sharing the process-wide store
    pub fn from_config(config: &LoaderConfig) -> Self {
        Self::with_collaborators(
            config.base_dir_path(),
            Arc::new(FsResolver::from_config(config)),
            ModuleStore::global(),
        )
    }
}

impl<C: ModuleCache> EventedLoader<C> {
    /// Create a loader over injected collaborators
    pub fn with_collaborators(
        base_dir: Option<PathBuf>,
        resolver: Arc<dyn ModuleResolver>,
        cache: Arc<C>,
    ) -> Self {
        Self {
            base_dir,
            resolver,
            cache,
            events: Arc::new(EventManager::new()),
        }
    }

    pub fn base_dir(&self) -> Option<&Path> {
        self.base_dir.as_deref()
    }

    pub fn cache(&self) -> &Arc<C> {
        &self.cache
    }

    /// Register a listener for `signal`
    ///
    /// Listeners run in registration order. Returning an error stops dispatch
    /// for that emission and aborts the `load` call that triggered it.
    pub fn on<F>(&self, signal: Signal, listener: F) -> &Self
    where
        F: Fn(&LoadEvent<'_, C::Value>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.events.subscribe(signal, Arc::new(listener));
        self
    }

    /// Register a `before(name)` listener
    pub fn on_before<F>(&self, listener: F) -> &Self
    where
        F: Fn(&str) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on(Signal::Before, move |event| match event {
            LoadEvent::Before { name } => listener(name),
            _ => Ok(()),
        })
    }

    /// Register a `success(name, value)` listener
    pub fn on_success<F>(&self, listener: F) -> &Self
    where
        F: Fn(&str, &C::Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on(Signal::Success, move |event| match event {
            LoadEvent::Success { name, value } => listener(name, value),
            _ => Ok(()),
        })
    }

    /// Register an `exists(name, location)` listener
    pub fn on_exists<F>(&self, listener: F) -> &Self
    where
        F: Fn(&str, &ModuleLocation) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on(Signal::Exists, move |event| match event {
            LoadEvent::Exists { name, location } => listener(name, location),
            _ => Ok(()),
        })
    }

    /// Register a `failure(name, error)` listener
    pub fn on_failure<F>(&self, listener: F) -> &Self
    where
        F: Fn(&str, &ModuleError) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on(Signal::Failure, move |event| match event {
            LoadEvent::Failure { name, error } => listener(name, error),
            _ => Ok(()),
        })
    }

    pub fn listener_count(&self, signal: Signal) -> usize {
        self.events.listener_count(signal)
    }

    /// Load a single module
    ///
    /// Returns `Ok(Some(value))` on success or when the location was already
    /// cached, `Ok(None)` when resolution or loading failed, and `Err` when a
    /// listener failed.
    pub fn load(&self, name: &str) -> Result<Option<C::Value>, ListenerError> {
        self.events.publish(&LoadEvent::Before { name })?;

        let location = match self.resolver.resolve(name, self.base_dir()) {
            Ok(location) => location,
            Err(e) => return self.report_failure(name, e.into()),
        };

        if let Some(value) = self.cache.cached_value(&location) {
            debug!("Module {} already loaded from {}", name, location);
            self.events.publish(&LoadEvent::Exists {
                name,
                location: &location,
            })?;
            return Ok(Some(value));
        }

        match self.cache.load(&location) {
            Ok(value) => {
                info!("Loaded module {} from {}", name, location);
                self.events.publish(&LoadEvent::Success {
                    name,
                    value: &value,
                })?;
                Ok(Some(value))
            }
            Err(e) => self.report_failure(name, e.into()),
        }
    }

    /// Load modules in order, collecting one entry per distinct name
    ///
    /// Every name goes through [`load`](Self::load), repeats included, so the
    /// location cache decides between `success` and `exists`. Failed names map
    /// to `None` and do not stop the batch; a listener error does.
    pub fn load_all<I, S>(
        &self,
        names: I,
    ) -> Result<IndexMap<String, Option<C::Value>>, ListenerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut results = IndexMap::new();
        for name in names {
            let name = name.as_ref();
            let result = self.load(name)?;
            results.insert(name.to_string(), result);
        }

        let failed = results.values().filter(|result| result.is_none()).count();
        info!("Loaded {} modules ({} failed)", results.len(), failed);
        Ok(results)
    }

    fn report_failure(
        &self,
        name: &str,
        error: ModuleError,
    ) -> Result<Option<C::Value>, ListenerError> {
        warn!("Failed to load module {}: {}", name, error);
        self.events.publish(&LoadEvent::Failure {
            name,
            error: &error,
        })?;
        Ok(None)
    }
}

impl<C: ModuleCache> Clone for EventedLoader<C> {
    fn clone(&self) -> Self {
        Self {
            base_dir: self.base_dir.clone(),
            resolver: Arc::clone(&self.resolver),
            cache: Arc::clone(&self.cache),
            events: Arc::clone(&self.events),
        }
    }
}
