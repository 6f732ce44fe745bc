//! Listener-facing API
//!
//! Signal subscription and dispatch used by the loader.

pub mod events;

pub use events::{EventManager, LoadEvent, Listener};
