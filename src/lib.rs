//! Evented Loader - lifecycle-instrumented module loading
//!
//! This crate wraps a module-loading primitive with named lifecycle signals.
//! Given a module name (or path) the loader resolves it to a concrete location,
//! loads it exactly once per location, and notifies listeners of each stage.
//!
//! ## Architecture
//!
//! - **Resolution**: [`ModuleResolver`] maps a name + base directory to a [`ModuleLocation`]
//! - **Load primitive**: [`ModuleCache`] turns a location into a value, memoized per location
//! - **Signals**: `before`, `success`, `exists`, `failure`, dispatched synchronously in
//!   registration order, fail-fast
//! - **Batching**: [`EventedLoader::load_all`] loads names in order into an ordered mapping
//!
//! ## Example
//!
//! ```rust,no_run
//! use evented_loader::EventedLoader;
//!
//! let loader = EventedLoader::new(Some("plugins".into()));
//! loader.on_success(|name, value| {
//!     println!("loaded {name}: {value}");
//!     Ok(())
//! });
//!
//! let results = loader.load_all(["./core.json", "metrics"])?;
//! # Ok::<(), evented_loader::ListenerError>(())
//! ```

pub mod config;
pub mod module;
pub mod utils;

pub use config::{LoaderConfig, LoggingConfig};
pub use module::{
    EventedLoader, FsResolver, ListenerError, LoadError, LoadEvent, ModuleCache, ModuleError,
    ModuleLocation, ModuleResolver, ModuleStore, ModuleValue, ResolveError, Signal,
};
