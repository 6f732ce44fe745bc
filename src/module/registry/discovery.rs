//! Filesystem module resolution and package discovery
//!
//! Maps requested names onto files under a base directory and scans package
//! directories for manifests.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::LoaderConfig;
use crate::module::registry::manifest::ModuleManifest;
use crate::module::traits::{ModuleLocation, ModuleResolver, ResolveError};

/// Package found by [`FsResolver::discover`]
#[derive(Debug, Clone)]
pub struct DiscoveredModule {
    /// Package directory path
    pub directory: PathBuf,
    /// Package manifest
    pub manifest: ModuleManifest,
}

/// Resolves module names against the filesystem
///
/// - `/abs`, `./rel` and `../rel` names are paths from the base directory
/// - bare names are looked up in `<dir>/<modules_dir>/` for the base directory
///   and each of its ancestors, nearest first
///
/// Each candidate is tried as a file (exact, then with every extension
/// appended) and then as a package directory (manifest entry point, then
/// `index.<ext>`).
#[derive(Debug, Clone)]
pub struct FsResolver {
    /// Package directory name searched for bare names
    modules_dir: String,
    /// Extensions probed in order, without leading dot
    extensions: Vec<String>,
    /// Manifest file name inside package directories
    manifest_file: String,
}

impl FsResolver {
    /// Create a resolver with default settings
    pub fn new() -> Self {
        Self::from_config(&LoaderConfig::default())
    }

    /// Create a resolver from loader configuration
    pub fn from_config(config: &LoaderConfig) -> Self {
        Self {
            modules_dir: config.modules_dir.clone(),
            extensions: config.extensions.clone(),
            manifest_file: config.manifest_file.clone(),
        }
    }

    pub fn with_modules_dir(mut self, modules_dir: impl Into<String>) -> Self {
        self.modules_dir = modules_dir.into();
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_manifest_file(mut self, manifest_file: impl Into<String>) -> Self {
        self.manifest_file = manifest_file.into();
        self
    }

    /// Discover every package in `<base_dir>/<modules_dir>`
    ///
    /// Directories without a manifest are skipped; unreadable manifests are
    /// logged and skipped.
    pub fn discover(&self, base_dir: Option<&Path>) -> Result<Vec<DiscoveredModule>, ResolveError> {
        let packages_dir = Self::base_or_default(base_dir)?.join(&self.modules_dir);
        info!("Discovering modules in {:?}", packages_dir);

        if !packages_dir.is_dir() {
            debug!("Modules directory does not exist: {:?}", packages_dir);
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&packages_dir).map_err(|source| ResolveError::Io {
            path: packages_dir.clone(),
            source,
        })?;

        let mut modules = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ResolveError::Io {
                path: packages_dir.clone(),
                source,
            })?;

            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            let manifest_path = path.join(&self.manifest_file);
            if !manifest_path.is_file() {
                debug!("No {} found in {:?}, skipping", self.manifest_file, path);
                continue;
            }

            match ModuleManifest::from_file(&manifest_path) {
                Ok(manifest) => modules.push(DiscoveredModule {
                    directory: path,
                    manifest,
                }),
                Err(e) => {
                    warn!("Failed to parse manifest in {:?}: {}", path, e);
                    continue;
                }
            }
        }

        // read_dir order is platform dependent
        modules.sort_by(|a, b| a.directory.cmp(&b.directory));
        info!("Discovered {} modules", modules.len());
        Ok(modules)
    }

    /// Absolute base directory; relative bases are taken from the current directory
    fn base_or_default(base_dir: Option<&Path>) -> Result<PathBuf, ResolveError> {
        if let Some(dir) = base_dir.filter(|dir| dir.is_absolute()) {
            return Ok(dir.to_path_buf());
        }
        let cwd = std::env::current_dir().map_err(|source| ResolveError::Io {
            path: PathBuf::from("."),
            source,
        })?;
        Ok(Self::absolute_base(base_dir, &cwd))
    }

    fn absolute_base(base_dir: Option<&Path>, cwd: &Path) -> PathBuf {
        match base_dir {
            Some(dir) => cwd.join(dir),
            None => cwd.to_path_buf(),
        }
    }

    fn is_path_like(name: &str) -> bool {
        name == "."
            || name == ".."
            || name.starts_with("./")
            || name.starts_with("../")
            || Path::new(name).is_absolute()
    }

    fn with_extension_appended(path: &Path, extension: &str) -> PathBuf {
        let mut raw: OsString = path.as_os_str().to_owned();
        raw.push(".");
        raw.push(extension);
        PathBuf::from(raw)
    }

    fn resolve_as_file(&self, path: &Path, tried: &mut Vec<PathBuf>) -> Option<PathBuf> {
        tried.push(path.to_path_buf());
        if path.is_file() {
            return Some(path.to_path_buf());
        }

        for extension in &self.extensions {
            let candidate = Self::with_extension_appended(path, extension);
            tried.push(candidate.clone());
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        None
    }

    fn resolve_as_directory(
        &self,
        dir: &Path,
        tried: &mut Vec<PathBuf>,
    ) -> Result<Option<PathBuf>, ResolveError> {
        if !dir.is_dir() {
            return Ok(None);
        }

        let manifest_path = dir.join(&self.manifest_file);
        if manifest_path.is_file() {
            let manifest = ModuleManifest::from_file(&manifest_path)?;
            debug!(
                "Package {} at {:?} declares entry point {}",
                manifest.name, dir, manifest.entry_point
            );
            if let Some(hit) = self.resolve_as_file(&dir.join(&manifest.entry_point), tried) {
                return Ok(Some(hit));
            }
        }

        for extension in &self.extensions {
            let index = dir.join(format!("index.{}", extension));
            tried.push(index.clone());
            if index.is_file() {
                return Ok(Some(index));
            }
        }

        Ok(None)
    }

    fn resolve_path(
        &self,
        path: &Path,
        tried: &mut Vec<PathBuf>,
    ) -> Result<Option<PathBuf>, ResolveError> {
        if let Some(hit) = self.resolve_as_file(path, tried) {
            return Ok(Some(hit));
        }
        self.resolve_as_directory(path, tried)
    }

    fn package_dirs(&self, base: &Path) -> Vec<PathBuf> {
        base.ancestors()
            .filter(|dir| dir.file_name().map_or(true, |n| n != self.modules_dir.as_str()))
            .map(|dir| dir.join(&self.modules_dir))
            .collect()
    }
}

impl Default for FsResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleResolver for FsResolver {
    fn resolve(&self, name: &str, base_dir: Option<&Path>) -> Result<ModuleLocation, ResolveError> {
        let base = Self::base_or_default(base_dir)?;
        let mut tried = Vec::new();

        let hit = if name.is_empty() {
            None
        } else if Self::is_path_like(name) {
            self.resolve_path(&base.join(name), &mut tried)?
        } else {
            let mut hit = None;
            for packages in self.package_dirs(&base) {
                if let Some(found) = self.resolve_path(&packages.join(name), &mut tried)? {
                    hit = Some(found);
                    break;
                }
            }
            hit
        };

        let Some(path) = hit else {
            debug!("Module {} not found after {} candidates", name, tried.len());
            return Err(ResolveError::NotFound {
                name: name.to_string(),
                tried,
            });
        };

        let canonical = path
            .canonicalize()
            .map_err(|source| ResolveError::Io { path, source })?;
        debug!("Resolved {} to {:?}", name, canonical);
        Ok(ModuleLocation::new(canonical))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str, contents: &str) -> PathBuf {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path.canonicalize().unwrap()
    }

    #[test]
    fn test_resolve_relative_exact_file() {
        let dir = TempDir::new().unwrap();
        let expected = touch(dir.path(), "fixtures/foo.json", "\"foo\"");

        let location = FsResolver::new()
            .resolve("./fixtures/foo.json", Some(dir.path()))
            .unwrap();
        assert_eq!(location.path(), expected);
    }

    #[test]
    fn test_resolve_probes_extensions_in_order() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "settings.toml", "a = 1");
        let json = touch(dir.path(), "settings.json", "{}");

        let location = FsResolver::new().resolve("./settings", Some(dir.path())).unwrap();
        assert_eq!(location.path(), json);

        let location = FsResolver::new()
            .with_extensions(["toml", "json"])
            .resolve("./settings", Some(dir.path()))
            .unwrap();
        assert!(location.path().ends_with("settings.toml"));
    }

    #[test]
    fn test_resolve_absolute_path_ignores_base() {
        let dir = TempDir::new().unwrap();
        let expected = touch(dir.path(), "abs.json", "1");

        let location = FsResolver::new()
            .resolve(expected.to_str().unwrap(), Some(Path::new("/nonexistent")))
            .unwrap();
        assert_eq!(location.path(), expected);
    }

    #[test]
    fn test_resolve_package_entry_point() {
        let dir = TempDir::new().unwrap();
        touch(
            dir.path(),
            "modules/metrics/module.toml",
            "name = \"metrics\"\nentry_point = \"lib/main\"\n",
        );
        let expected = touch(dir.path(), "modules/metrics/lib/main.json", "{}");

        let location = FsResolver::new().resolve("metrics", Some(dir.path())).unwrap();
        assert_eq!(location.path(), expected);
    }

    #[test]
    fn test_resolve_package_index_fallback() {
        let dir = TempDir::new().unwrap();
        let expected = touch(dir.path(), "modules/core/index.toml", "x = 1");

        let location = FsResolver::new().resolve("core", Some(dir.path())).unwrap();
        assert_eq!(location.path(), expected);
    }

    #[test]
    fn test_resolve_bare_name_searches_ancestors() {
        let dir = TempDir::new().unwrap();
        let expected = touch(dir.path(), "modules/shared.json", "true");
        let nested = dir.path().join("app/src");
        fs::create_dir_all(&nested).unwrap();

        let location = FsResolver::new().resolve("shared", Some(&nested)).unwrap();
        assert_eq!(location.path(), expected);
    }

    #[test]
    fn test_relative_base_searches_above_current_dir() {
        let resolver = FsResolver::new();
        let base = FsResolver::absolute_base(Some(Path::new("plugins")), Path::new("/srv/app"));
        assert_eq!(base, PathBuf::from("/srv/app/plugins"));

        let dirs = resolver.package_dirs(&base);
        assert!(dirs.contains(&PathBuf::from("/srv/app/modules")));
        assert!(dirs.contains(&PathBuf::from("/srv/modules")));
        assert!(dirs.contains(&PathBuf::from("/modules")));

        let base = FsResolver::absolute_base(None, Path::new("/srv/app"));
        assert_eq!(base, PathBuf::from("/srv/app"));
    }

    #[test]
    fn test_resolve_bare_name_from_relative_base() {
        // Tree lives under the current directory so it can be named relatively
        let dir = tempfile::Builder::new()
            .prefix("relative-base")
            .tempdir_in(".")
            .unwrap();
        let expected = touch(dir.path(), "modules/shared.json", "true");
        fs::create_dir_all(dir.path().join("app/plugins")).unwrap();
        let relative = Path::new(dir.path().file_name().unwrap()).join("app/plugins");
        assert!(relative.is_relative());

        let location = FsResolver::new().resolve("shared", Some(&relative)).unwrap();
        assert_eq!(location.path(), expected);

        let absolute_base = dir.path().canonicalize().unwrap().join("app/plugins");
        let absolute = FsResolver::new()
            .resolve("shared", Some(&absolute_base))
            .unwrap();
        assert_eq!(location, absolute);
    }

    #[test]
    fn test_relative_and_bare_names_share_location() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "modules/shared.json", "true");
        let resolver = FsResolver::new();

        let bare = resolver.resolve("shared", Some(dir.path())).unwrap();
        let relative = resolver
            .resolve("./modules/shared.json", Some(dir.path()))
            .unwrap();
        assert_eq!(bare, relative);
    }

    #[test]
    fn test_resolve_not_found_lists_candidates() {
        let dir = TempDir::new().unwrap();

        let err = FsResolver::new()
            .resolve("./no-exist.json", Some(dir.path()))
            .unwrap_err();
        match err {
            ResolveError::NotFound { name, tried } => {
                assert_eq!(name, "./no-exist.json");
                assert_eq!(tried.len(), 3);
                assert_eq!(tried[0], dir.path().join("./no-exist.json"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_empty_name_not_found() {
        let dir = TempDir::new().unwrap();
        let err = FsResolver::new().resolve("", Some(dir.path())).unwrap_err();
        assert!(matches!(err, ResolveError::NotFound { ref tried, .. } if tried.is_empty()));
    }

    #[test]
    fn test_resolve_invalid_manifest() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "modules/bad/module.toml", "name = \"bad\"\n");

        let err = FsResolver::new().resolve("bad", Some(dir.path())).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidManifest { .. }));
    }

    #[test]
    fn test_discover_packages() {
        let dir = TempDir::new().unwrap();
        touch(
            dir.path(),
            "modules/b-plugin/module.toml",
            "name = \"b-plugin\"\nentry_point = \"index.json\"\n",
        );
        touch(
            dir.path(),
            "modules/a-plugin/module.toml",
            "name = \"a-plugin\"\nentry_point = \"index.json\"\n",
        );
        touch(dir.path(), "modules/no-manifest/index.json", "{}");
        touch(dir.path(), "modules/broken/module.toml", "name = ");

        let discovered = FsResolver::new().discover(Some(dir.path())).unwrap();
        let names: Vec<_> = discovered.iter().map(|m| m.manifest.name.as_str()).collect();
        assert_eq!(names, vec!["a-plugin", "b-plugin"]);
    }

    #[test]
    fn test_discover_missing_modules_dir() {
        let dir = TempDir::new().unwrap();
        assert!(FsResolver::new().discover(Some(dir.path())).unwrap().is_empty());
    }
}
