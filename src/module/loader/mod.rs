//! Module loading system
//!
//! The lifecycle core: resolution, cache lookup, loading and signal emission.

pub mod loader;

pub use loader::EventedLoader;
