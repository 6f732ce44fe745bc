//! Lifecycle signal dispatch
//!
//! Keeps the listener registry and delivers events to listeners synchronously,
//! in registration order. Dispatch is fail-fast: the first listener that returns
//! an error stops the emission and the error goes straight back to the caller.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, trace};

use crate::module::traits::{ListenerError, ModuleError, ModuleLocation, Signal};

/// Event payload handed to listeners
///
/// One variant per [`Signal`], carrying that signal's positional arguments.
#[derive(Debug)]
pub enum LoadEvent<'a, V> {
    /// `before(name)`
    Before { name: &'a str },
    /// `success(name, value)`
    Success { name: &'a str, value: &'a V },
    /// `exists(name, location)`
    Exists {
        name: &'a str,
        location: &'a ModuleLocation,
    },
    /// `failure(name, error)`
    Failure {
        name: &'a str,
        error: &'a ModuleError,
    },
}

impl<'a, V> LoadEvent<'a, V> {
    pub fn signal(&self) -> Signal {
        match self {
            LoadEvent::Before { .. } => Signal::Before,
            LoadEvent::Success { .. } => Signal::Success,
            LoadEvent::Exists { .. } => Signal::Exists,
            LoadEvent::Failure { .. } => Signal::Failure,
        }
    }

    /// Requested module name the event refers to
    pub fn name(&self) -> &'a str {
        match self {
            LoadEvent::Before { name }
            | LoadEvent::Success { name, .. }
            | LoadEvent::Exists { name, .. }
            | LoadEvent::Failure { name, .. } => *name,
        }
    }
}

/// Listener callback; returning `Err` aborts the emitting call
pub type Listener<V> = Arc<dyn Fn(&LoadEvent<'_, V>) -> anyhow::Result<()> + Send + Sync>;

/// Listener registry, one ordered list per signal
pub struct EventManager<V> {
    listeners: RwLock<HashMap<Signal, Vec<Listener<V>>>>,
}

impl<V> EventManager<V> {
    /// Create a new event manager
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
        }
    }

    /// Append a listener for `signal`
    pub fn subscribe(&self, signal: Signal, listener: Listener<V>) {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let list = listeners.entry(signal).or_default();
        list.push(listener);
        debug!("Listener subscribed to {} ({} total)", signal, list.len());
    }

    /// Number of listeners registered for `signal`
    pub fn listener_count(&self, signal: Signal) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&signal)
            .map_or(0, Vec::len)
    }

    /// Deliver `event` to every listener of its signal
    ///
    /// The listener list is snapshotted first and no lock is held while
    /// listeners run, so a listener may load modules or subscribe further
    /// listeners; new subscriptions apply from the next emission.
    pub fn publish(&self, event: &LoadEvent<'_, V>) -> Result<(), ListenerError> {
        let signal = event.signal();
        let snapshot: Vec<Listener<V>> = {
            let listeners = self
                .listeners
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            match listeners.get(&signal) {
                Some(list) => list.clone(),
                None => return Ok(()),
            }
        };

        trace!(
            "Publishing {} for {} to {} listeners",
            signal,
            event.name(),
            snapshot.len()
        );

        for (index, listener) in snapshot.iter().enumerate() {
            listener(event).map_err(|source| {
                debug!(
                    "Listener #{} for {} failed on {}: {}",
                    index,
                    signal,
                    event.name(),
                    source
                );
                ListenerError {
                    signal,
                    name: event.name().to_string(),
                    source,
                }
            })?;
        }

        Ok(())
    }
}

impl<V> Default for EventManager<V> {
    fn default() -> Self {
        Self::new()
    }
}
