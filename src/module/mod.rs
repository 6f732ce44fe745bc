//! Module system for evented-loader
//!
//! Splits module loading into two injected collaborators and the lifecycle core
//! that composes them.
//!
//! ## Architecture
//!
//! - **Resolution** (`registry`): maps a requested name to an absolute location
//! - **Load cache** (`cache`): loads a location once and memoizes it, shared by every loader
//! - **Signals** (`api`): ordered, synchronous, fail-fast listener dispatch
//! - **Loader** (`loader`): `load` / `load_all`, the only place the pieces meet

pub mod api;
pub mod cache;
pub mod loader;
pub mod registry;
pub mod traits;

pub use api::events::{EventManager, LoadEvent};
pub use cache::{ModuleStore, ModuleValue};
pub use loader::EventedLoader;
pub use registry::{FsResolver, ModuleManifest};
pub use traits::{
    ListenerError, LoadError, ModuleCache, ModuleError, ModuleLocation, ModuleResolver,
    ResolveError, Signal,
};
