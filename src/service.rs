//! Workspace service coordinating discovery, aggregation, update checks and
//! the project graph
//!
//! This module provides:
//! - Cached installed-package aggregation with scoped refresh
//! - Registry-backed update checks in bounded batches
//! - The workspace project graph and version alignment writes
//! - Change-event handling for manifest create/change/delete notifications

use crate::cache::{InstalledPackageCache, PackageScope};
use crate::config::EngineConfig;
use crate::domain::{InstalledPackage, ManifestKind, WorkspaceProjectGraph};
use crate::error::{ConfigError, ManifestError};
use crate::manifest::{
    apply_version_update, detect_nuget_management_style, discover_manifests,
    discover_package_json_manifests, read_installed_packages, root_package_name,
    select_nuget_install_target, update_package_json, DiscoveredManifest, ManifestFs,
    NuGetInstallTarget, NuGetManagementStyle, WriteResult,
};
use crate::registry::RegistryClient;
use crate::update::{annotate_updates, fetch_latest_versions, update_candidates};
use crate::workspace::build_workspace_project_graph;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::mpsc;

/// File-system notification the service reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    ManifestCreated(PathBuf),
    ManifestChanged(PathBuf),
    ManifestDeleted(PathBuf),
    WorkspaceFoldersChanged(Vec<PathBuf>),
}

/// Result of an update check
#[derive(Debug, Clone, Default)]
pub struct UpdateCheck {
    /// Every checked entry, annotated with the latest version when known
    pub packages: Vec<InstalledPackage>,
    /// Package names whose registry lookup failed
    pub failed_lookups: Vec<String>,
}

impl UpdateCheck {
    pub fn updatable(&self) -> impl Iterator<Item = &InstalledPackage> {
        self.packages.iter().filter(|p| p.has_update)
    }
}

/// Result of aligning one dependency across the workspace
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignmentOutcome {
    /// Manifests that were rewritten
    pub updated_manifests: Vec<PathBuf>,
    /// Manifests whose write failed
    pub failed_manifests: Vec<PathBuf>,
}

impl AlignmentOutcome {
    pub fn updated_count(&self) -> usize {
        self.updated_manifests.len()
    }
}

/// Dependency view of a set of workspace folders
pub struct WorkspaceService {
    fs: Arc<dyn ManifestFs>,
    folders: RwLock<Vec<PathBuf>>,
    registry: Option<Arc<dyn RegistryClient>>,
    cache: Arc<InstalledPackageCache>,
    config: EngineConfig,
}

impl WorkspaceService {
    /// Creates a service without a registry; update checks fail until one is set
    pub fn new(fs: Arc<dyn ManifestFs>, folders: Vec<PathBuf>, config: EngineConfig) -> Self {
        Self {
            fs,
            folders: RwLock::new(folders),
            registry: None,
            cache: Arc::new(InstalledPackageCache::new()),
            config,
        }
    }

    /// Sets the registry consulted for latest versions
    pub fn with_registry(mut self, registry: Arc<dyn RegistryClient>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Shares an existing cache instance
    pub fn with_cache(mut self, cache: Arc<InstalledPackageCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn cache(&self) -> &Arc<InstalledPackageCache> {
        &self.cache
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn workspace_folders(&self) -> Vec<PathBuf> {
        self.folders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the workspace folder set and drops cached packages
    pub fn set_workspace_folders(&self, folders: Vec<PathBuf>) {
        *self.folders.write().unwrap_or_else(PoisonError::into_inner) = folders;
        self.cache.invalidate();
    }

    /// Every supported manifest under the workspace folders
    pub fn discover_manifests(&self) -> Vec<DiscoveredManifest> {
        discover_manifests(
            self.fs.as_ref(),
            &self.workspace_folders(),
            &self.config.exclude,
        )
    }

    fn load_packages(&self, scope: Option<&PackageScope>) -> Vec<InstalledPackage> {
        let manifests: Vec<DiscoveredManifest> = self
            .discover_manifests()
            .into_iter()
            .filter(|m| scope.is_none_or(|s| s.contains_manifest(m)))
            .collect();

        let mut root_names: HashMap<PathBuf, Option<String>> = HashMap::new();
        let mut packages = Vec::new();

        for manifest in &manifests {
            let root_name = root_names
                .entry(manifest.workspace_folder.clone())
                .or_insert_with(|| {
                    root_package_name(self.fs.as_ref(), &manifest.workspace_folder)
                });

            match read_installed_packages(self.fs.as_ref(), manifest, root_name.as_deref()) {
                Ok(found) => packages.extend(found),
                Err(e) => tracing::warn!("skipping {}: {}", manifest.path.display(), e),
            }
        }

        tracing::debug!(
            "read {} packages from {} manifests",
            packages.len(),
            manifests.len()
        );
        packages
    }

    /// Installed packages across all manifests, loaded once and cached.
    ///
    /// Concurrent callers wait for the same load.
    pub async fn get_installed_packages(&self) -> Vec<InstalledPackage> {
        if let Some(packages) = self.cache.snapshot() {
            return packages.to_vec();
        }

        let _loader = self.cache.lock_loader().await;
        if let Some(packages) = self.cache.snapshot() {
            return packages.to_vec();
        }

        let generation = self.cache.generation();
        let packages = self.load_packages(None);
        self.cache.store(generation, packages.clone());
        packages
    }

    /// Reloads all packages, or only those in `scope` when the cache is warm
    pub async fn refresh_installed_packages(
        &self,
        scope: Option<PackageScope>,
    ) -> Vec<InstalledPackage> {
        let Some(scope) = scope else {
            self.cache.invalidate();
            return self.get_installed_packages().await;
        };

        if !self.cache.is_loaded() {
            return self.get_installed_packages().await;
        }

        let merged = {
            let _loader = self.cache.lock_loader().await;
            let generation = self.cache.begin_scoped_refresh();
            let fresh = self.load_packages(Some(&scope));
            self.cache.merge_scope(generation, &scope, fresh)
        };

        match merged {
            Some(packages) => packages.to_vec(),
            None => self.get_installed_packages().await,
        }
    }

    async fn refresh_if_loaded(&self, scope: PackageScope) {
        if self.cache.is_loaded() {
            self.refresh_installed_packages(Some(scope)).await;
        }
    }

    async fn packages_in_scope(&self, scope: Option<&PackageScope>) -> Vec<InstalledPackage> {
        let packages = self.get_installed_packages().await;
        match scope {
            Some(scope) => packages.into_iter().filter(|p| scope.matches(p)).collect(),
            None => packages,
        }
    }

    /// Looks up the latest version of every registry-resolvable entry.
    ///
    /// Lookups run `batch_size` at a time; a failed lookup leaves its entries
    /// without update information and is listed in
    /// [`UpdateCheck::failed_lookups`].
    pub async fn check_updates(
        &self,
        scope: Option<PackageScope>,
    ) -> Result<UpdateCheck, ConfigError> {
        let registry = self
            .registry
            .as_ref()
            .ok_or(ConfigError::RegistryNotConfigured)?;

        let packages = self.packages_in_scope(scope.as_ref()).await;
        let candidates = update_candidates(&packages);
        let latest =
            fetch_latest_versions(registry.as_ref(), &candidates, self.config.batch_size).await;

        let failed_lookups = latest.failed.iter().map(|(_, name)| name.clone()).collect();
        Ok(UpdateCheck {
            packages: annotate_updates(candidates, &latest),
            failed_lookups,
        })
    }

    /// Entries with a newer version available
    pub async fn get_updatable_packages(
        &self,
        scope: Option<PackageScope>,
    ) -> Result<Vec<InstalledPackage>, ConfigError> {
        let check = self.check_updates(scope).await?;
        Ok(check.packages.into_iter().filter(|p| p.has_update).collect())
    }

    /// Project graph over the package.json manifests of every workspace folder
    pub fn get_workspace_project_graph(&self) -> WorkspaceProjectGraph {
        let folders = self.workspace_folders();
        let manifests: Vec<PathBuf> = folders
            .iter()
            .flat_map(|folder| {
                discover_package_json_manifests(self.fs.as_ref(), folder, &self.config.exclude)
            })
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        build_workspace_project_graph(self.fs.as_ref(), &folders, &manifests)
    }

    fn align_manifest(
        &self,
        path: &Path,
        package_name: &str,
        target_spec: &str,
    ) -> Result<bool, ManifestError> {
        let content = self.fs.read_to_string(path)?;
        match update_package_json(&content, path, package_name, target_spec, true)? {
            Some(updated) => {
                self.fs.write(path, &updated)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Sets `package_name` to `target_spec` in every package.json that
    /// declares it with a registry-resolvable spec.
    ///
    /// The cache is invalidated only when at least one manifest changed.
    pub async fn align_workspace_dependency_versions(
        &self,
        package_name: &str,
        target_spec: &str,
    ) -> AlignmentOutcome {
        let mut outcome = AlignmentOutcome::default();

        let manifests = self
            .discover_manifests()
            .into_iter()
            .filter(|m| m.kind == ManifestKind::PackageJson);

        for manifest in manifests {
            match self.align_manifest(&manifest.path, package_name, target_spec) {
                Ok(true) => outcome.updated_manifests.push(manifest.path),
                Ok(false) => {}
                Err(e @ ManifestError::WriteError { .. }) => {
                    tracing::warn!("{}", e);
                    outcome.failed_manifests.push(manifest.path);
                }
                Err(e) => tracing::warn!("skipping {}: {}", manifest.path.display(), e),
            }
        }

        if !outcome.updated_manifests.is_empty() {
            self.cache.invalidate();
        }
        tracing::debug!(
            "aligned {} to {} in {} manifests",
            package_name,
            target_spec,
            outcome.updated_count()
        );
        outcome
    }

    /// Writes a new registry version for one dependency of one manifest
    pub async fn update_dependency_version(
        &self,
        manifest: &Path,
        package_name: &str,
        version: &str,
    ) -> Result<WriteResult, ManifestError> {
        let result = apply_version_update(self.fs.as_ref(), manifest, package_name, version)?;
        if result.file_modified {
            self.refresh_if_loaded(PackageScope::Manifest(manifest.to_path_buf()))
                .await;
        }
        Ok(result)
    }

    /// NuGet package management style in effect at `context`
    pub fn nuget_management_style(&self, context: &Path) -> NuGetManagementStyle {
        detect_nuget_management_style(self.fs.as_ref(), context, &self.workspace_folders())
    }

    /// File a NuGet install in `folder` should edit, if the folder has one
    pub fn nuget_install_target(&self, folder: &Path) -> Option<NuGetInstallTarget> {
        select_nuget_install_target(&self.fs.list_dir(folder))
    }

    /// Applies one change notification to the cache
    pub async fn handle_change(&self, event: ChangeEvent) {
        tracing::debug!("change event: {:?}", event);
        match event {
            ChangeEvent::ManifestChanged(path) => {
                if ManifestKind::from_path(&path).is_some() {
                    self.refresh_if_loaded(PackageScope::Manifest(path)).await;
                }
            }
            ChangeEvent::ManifestCreated(path) | ChangeEvent::ManifestDeleted(path) => {
                if ManifestKind::from_path(&path).is_some() {
                    self.cache.invalidate();
                }
            }
            ChangeEvent::WorkspaceFoldersChanged(folders) => self.set_workspace_folders(folders),
        }
    }

    /// Consumes change notifications until the sender side is dropped
    pub async fn watch(&self, mut events: mpsc::Receiver<ChangeEvent>) {
        while let Some(event) = events.recv().await {
            self.handle_change(event).await;
        }
    }
}
