//! Module system traits and interfaces
//!
//! Defines the two collaborators the loader is built on (resolution and the
//! load cache), the lifecycle signals, and the error types that flow between them.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Absolute, canonical identifier of a concrete loadable unit
///
/// Two different requested names may resolve to the same location; the load
/// cache is keyed by this type, never by the requested name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleLocation(PathBuf);

impl ModuleLocation {
    /// Wrap an already-resolved path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ModuleLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl AsRef<Path> for ModuleLocation {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

/// Lifecycle signals emitted by the loader
///
/// A closed set: listeners can only subscribe to these four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// Emitted with the requested name before resolution starts
    Before,
    /// Module was not cached and has just been loaded
    Success,
    /// Module location was already in the load cache
    Exists,
    /// Resolution or loading failed
    Failure,
}

impl Signal {
    pub const ALL: [Signal; 4] = [Signal::Before, Signal::Success, Signal::Exists, Signal::Failure];

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Before => "before",
            Signal::Success => "success",
            Signal::Exists => "exists",
            Signal::Failure => "failure",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Signal {
    type Err = UnknownSignal;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "before" => Ok(Signal::Before),
            "success" => Ok(Signal::Success),
            "exists" => Ok(Signal::Exists),
            "failure" => Ok(Signal::Failure),
            other => Err(UnknownSignal(other.to_string())),
        }
    }
}

/// Returned when parsing a signal name outside the closed set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown signal: {0} (expected before, success, exists or failure)")]
pub struct UnknownSignal(pub String);

/// Resolution collaborator
///
/// Maps a requested name plus an optional base directory to a location. When
/// `base_dir` is `None` the implementation picks its own default base.
pub trait ModuleResolver: Send + Sync {
    fn resolve(&self, name: &str, base_dir: Option<&Path>) -> Result<ModuleLocation, ResolveError>;
}

/// Load collaborator: the load primitive plus its location-keyed cache
///
/// Implementations must keep the cache append-only: once `load` succeeds for a
/// location, `cached_value` returns that same value for as long as the cache lives.
pub trait ModuleCache: Send + Sync {
    /// Value produced by loading a module
    type Value: Clone + Send + Sync + 'static;

    /// Whether `location` has already been loaded
    fn is_cached(&self, location: &ModuleLocation) -> bool {
        self.cached_value(location).is_some()
    }

    /// The cached value for `location`, if it has been loaded
    fn cached_value(&self, location: &ModuleLocation) -> Option<Self::Value>;

    /// Load `location` and insert the result into the cache
    fn load(&self, location: &ModuleLocation) -> Result<Self::Value, LoadError>;
}

/// Resolution failures
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Module not found: {name} (tried {} locations)", tried.len())]
    NotFound { name: String, tried: Vec<PathBuf> },

    #[error("Invalid module manifest {}: {reason}", path.display())]
    InvalidManifest { path: PathBuf, reason: String },

    #[error("IO error resolving {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Load primitive failures
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read module {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse module {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported module format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    #[error("Module evaluation failed: {0}")]
    Evaluation(String),
}

/// Reported failure delivered to `failure` listeners
///
/// These never escape `load` as errors; they become the failure marker.
#[derive(Debug, Error)]
pub enum ModuleError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

impl ModuleError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ModuleError::Resolve(ResolveError::NotFound { .. }))
    }
}

/// A listener returned an error
///
/// Listener errors are never caught by the loader; they abort the in-progress
/// `load`/`load_all` call and carry the signal being dispatched and the module
/// name the call was made with.
#[derive(Debug, Error)]
#[error("{signal} listener failed for module '{name}': {source}")]
pub struct ListenerError {
    pub signal: Signal,
    pub name: String,
    #[source]
    pub source: anyhow::Error,
}
