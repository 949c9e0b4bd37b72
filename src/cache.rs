//! Installed-package cache with generation-checked invalidation
//!
//! The cache holds the aggregated package list of a workspace. Every
//! invalidation bumps a generation counter; a load that started under an
//! older generation is discarded instead of overwriting newer state.

use crate::domain::InstalledPackage;
use crate::manifest::DiscoveredManifest;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Subset of the workspace a refresh applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageScope {
    /// Entries read from one manifest file
    Manifest(PathBuf),
    /// Entries owned by one workspace folder
    WorkspaceFolder(PathBuf),
}

impl PackageScope {
    pub fn matches(&self, package: &InstalledPackage) -> bool {
        match self {
            PackageScope::Manifest(path) => package.package_json_path == *path,
            PackageScope::WorkspaceFolder(folder) => package.workspace_folder_path == *folder,
        }
    }

    pub fn contains_manifest(&self, manifest: &DiscoveredManifest) -> bool {
        match self {
            PackageScope::Manifest(path) => manifest.path == *path,
            PackageScope::WorkspaceFolder(folder) => manifest.workspace_folder == *folder,
        }
    }
}

#[derive(Debug, Default)]
struct CacheState {
    packages: Option<Arc<Vec<InstalledPackage>>>,
    generation: u64,
}

/// Shared cache of installed packages.
///
/// Loads are serialized through [`InstalledPackageCache::lock_loader`] so
/// concurrent callers share one load instead of each reading every manifest.
#[derive(Debug, Default)]
pub struct InstalledPackageCache {
    state: Mutex<CacheState>,
    loader: tokio::sync::Mutex<()>,
}

impl InstalledPackageCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current package list, if loaded
    pub fn snapshot(&self) -> Option<Arc<Vec<InstalledPackage>>> {
        self.state().packages.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.state().packages.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.state().generation
    }

    /// Waits for any in-flight load to finish
    pub async fn lock_loader(&self) -> tokio::sync::MutexGuard<'_, ()> {
        self.loader.lock().await
    }

    /// Drops the cached list; loads started before this call will not be stored
    pub fn invalidate(&self) {
        let mut state = self.state();
        state.packages = None;
        state.generation += 1;
        tracing::debug!("installed package cache invalidated (generation {})", state.generation);
    }

    /// Starts a scoped refresh: later full loads and other scoped refreshes
    /// that began earlier become stale. Returns the generation to merge under.
    pub fn begin_scoped_refresh(&self) -> u64 {
        let mut state = self.state();
        state.generation += 1;
        state.generation
    }

    /// Stores a full load taken at `generation`. Returns `None` when the
    /// cache was invalidated in the meantime.
    pub fn store(
        &self,
        generation: u64,
        packages: Vec<InstalledPackage>,
    ) -> Option<Arc<Vec<InstalledPackage>>> {
        let mut state = self.state();
        if state.generation != generation {
            tracing::debug!(
                "discarding stale load (generation {} != {})",
                generation,
                state.generation
            );
            return None;
        }
        let packages = Arc::new(packages);
        state.packages = Some(packages.clone());
        Some(packages)
    }

    /// Replaces the entries matching `scope` with `fresh`, keeping the rest.
    ///
    /// Returns `None` when the cache is empty or an invalidation happened
    /// after `generation` was taken.
    pub fn merge_scope(
        &self,
        generation: u64,
        scope: &PackageScope,
        fresh: Vec<InstalledPackage>,
    ) -> Option<Arc<Vec<InstalledPackage>>> {
        let mut state = self.state();
        if state.generation != generation {
            return None;
        }
        let current = state.packages.as_ref()?;

        let mut merged: Vec<InstalledPackage> = current
            .iter()
            .filter(|pkg| !scope.matches(pkg))
            .cloned()
            .collect();
        merged.extend(fresh);

        let merged = Arc::new(merged);
        state.packages = Some(merged.clone());
        Some(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DependencyType, ManifestKind, ManifestOrigin};

    fn package(name: &str, version: &str, manifest: &str, folder: &str) -> InstalledPackage {
        let origin = ManifestOrigin::new(manifest, folder, ManifestKind::PaketDependencies);
        InstalledPackage::pinned(name, version, DependencyType::Dependencies, &origin)
    }

    #[test]
    fn test_store_and_snapshot() {
        let cache = InstalledPackageCache::new();
        assert!(cache.snapshot().is_none());

        let generation = cache.generation();
        cache.store(generation, vec![package("a", "1.0.0", "/r/paket.dependencies", "/r")]);
        assert_eq!(cache.snapshot().unwrap().len(), 1);
        assert!(cache.is_loaded());
    }

    #[test]
    fn test_stale_store_is_discarded() {
        let cache = InstalledPackageCache::new();
        let generation = cache.generation();
        cache.invalidate();

        let stored = cache.store(
            generation,
            vec![package("a", "1.0.0", "/r/paket.dependencies", "/r")],
        );
        assert!(stored.is_none());
        assert!(cache.snapshot().is_none());
    }

    #[test]
    fn test_merge_scope_replaces_only_scope() {
        let cache = InstalledPackageCache::new();
        cache.store(
            cache.generation(),
            vec![
                package("a", "1.0.0", "/r/one/paket.dependencies", "/r"),
                package("b", "1.0.0", "/r/two/paket.dependencies", "/r"),
            ],
        );

        let scope = PackageScope::Manifest(PathBuf::from("/r/one/paket.dependencies"));
        let generation = cache.begin_scoped_refresh();
        let merged = cache
            .merge_scope(
                generation,
                &scope,
                vec![package("a", "2.0.0", "/r/one/paket.dependencies", "/r")],
            )
            .unwrap();

        assert_eq!(merged.len(), 2);
        let a = merged.iter().find(|p| p.name == "a").unwrap();
        assert_eq!(a.current_version, "2.0.0");
        assert!(merged.iter().any(|p| p.name == "b"));
    }

    #[test]
    fn test_intervening_invalidation_wins_over_scoped_merge() {
        let cache = InstalledPackageCache::new();
        cache.store(cache.generation(), vec![package("a", "1.0.0", "/r/paket.dependencies", "/r")]);

        let scope = PackageScope::WorkspaceFolder(PathBuf::from("/r"));
        let generation = cache.begin_scoped_refresh();
        cache.invalidate();

        assert!(cache.merge_scope(generation, &scope, Vec::new()).is_none());
        assert!(cache.snapshot().is_none());
    }

    #[test]
    fn test_scope_matching() {
        let pkg = package("a", "1.0.0", "/r/app/paket.dependencies", "/r");
        assert!(PackageScope::Manifest(PathBuf::from("/r/app/paket.dependencies")).matches(&pkg));
        assert!(PackageScope::WorkspaceFolder(PathBuf::from("/r")).matches(&pkg));
        assert!(!PackageScope::WorkspaceFolder(PathBuf::from("/other")).matches(&pkg));
    }
}
