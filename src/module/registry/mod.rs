//! Module registry and discovery
//!
//! Handles name resolution, package discovery and manifest parsing.

pub mod discovery;
pub mod manifest;

pub use discovery::{DiscoveredModule, FsResolver};
pub use manifest::ModuleManifest;
