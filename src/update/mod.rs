//! Update detection
//!
//! This module provides:
//! - Version ordering and update-type classification
//! - Batched latest-version lookups against the registry capability
//! - Re-attaching lookup results to every manifest entry of a package

mod version;

pub use version::{
    compare_versions, get_update_type, parse_version_components, select_latest_version,
    version_ordering, VersionComponents,
};

use crate::domain::{Ecosystem, InstalledPackage};
use crate::registry::RegistryClient;
use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};

/// Number of concurrent registry lookups per batch
pub const DEFAULT_BATCH_SIZE: usize = 8;

/// Registry lookup key: the same name in two ecosystems is two packages
pub type PackageKey = (Ecosystem, String);

/// Outcome of a batched lookup run
#[derive(Debug, Default)]
pub struct LatestVersions {
    /// Latest version per package that resolved
    pub versions: HashMap<PackageKey, String>,
    /// Packages whose lookup failed
    pub failed: Vec<PackageKey>,
}

/// Entries eligible for an update check: registry-resolvable with a concrete version
pub fn update_candidates(packages: &[InstalledPackage]) -> Vec<InstalledPackage> {
    packages
        .iter()
        .filter(|p| p.is_registry_resolvable && p.resolved_version.is_some())
        .cloned()
        .collect()
}

/// Looks up latest versions for each distinct package, `batch_size` at a time.
///
/// Requests within a batch run concurrently; batches run one after another.
/// A failed lookup is logged and recorded in [`LatestVersions::failed`]
/// without affecting the rest of the batch.
pub async fn fetch_latest_versions(
    registry: &dyn RegistryClient,
    packages: &[InstalledPackage],
    batch_size: usize,
) -> LatestVersions {
    let keys: Vec<PackageKey> = packages
        .iter()
        .map(|p| (p.ecosystem, p.name.clone()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut result = LatestVersions::default();

    for batch in keys.chunks(batch_size.max(1)) {
        let lookups = batch.iter().map(|(ecosystem, name)| async move {
            let outcome = registry.latest_version(*ecosystem, name).await;
            ((*ecosystem, name.clone()), outcome)
        });

        for (key, outcome) in join_all(lookups).await {
            match outcome {
                Ok(Some(version)) => {
                    result.versions.insert(key, version);
                }
                Ok(None) => {
                    tracing::debug!("no latest version published for {}", key.1);
                }
                Err(e) => {
                    tracing::warn!("latest version lookup failed for {}: {}", key.1, e);
                    result.failed.push(key);
                }
            }
        }
    }

    result
}

/// Attaches latest version and update type to each entry
pub fn annotate_updates(
    packages: Vec<InstalledPackage>,
    latest: &LatestVersions,
) -> Vec<InstalledPackage> {
    packages
        .into_iter()
        .map(|pkg| {
            let key = (pkg.ecosystem, pkg.name.clone());
            match (latest.versions.get(&key), pkg.resolved_version.as_deref()) {
                (Some(latest_version), Some(current)) => {
                    let update_type = get_update_type(current, latest_version);
                    pkg.with_latest(Some(latest_version.clone()), update_type)
                }
                _ => pkg,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DependencyType, ManifestKind, ManifestOrigin, UpdateType};
    use crate::error::RegistryError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakeRegistry {
        versions: HashMap<String, String>,
        calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeRegistry {
        fn new(entries: &[(&str, &str)]) -> Self {
            Self {
                versions: entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                calls: Mutex::new(Vec::new()),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RegistryClient for FakeRegistry {
        async fn latest_version(
            &self,
            _ecosystem: Ecosystem,
            package: &str,
        ) -> Result<Option<String>, RegistryError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.calls.lock().unwrap().push(package.to_string());
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if package == "broken" {
                return Err(RegistryError::network_error(package, "npm", "boom"));
            }
            Ok(self.versions.get(package).cloned())
        }
    }

    fn package(name: &str, version: &str, manifest: &str) -> InstalledPackage {
        let origin = ManifestOrigin::new(manifest, "/repo", ManifestKind::PaketDependencies);
        InstalledPackage::pinned(name, version, DependencyType::Dependencies, &origin)
    }

    #[tokio::test]
    async fn test_fetch_dedupes_names() {
        let registry = FakeRegistry::new(&[("a", "2.0.0")]);
        let packages = vec![
            package("a", "1.0.0", "/repo/one/paket.dependencies"),
            package("a", "1.5.0", "/repo/two/paket.dependencies"),
        ];

        let latest = fetch_latest_versions(&registry, &packages, DEFAULT_BATCH_SIZE).await;
        assert_eq!(registry.calls.lock().unwrap().len(), 1);

        let annotated = annotate_updates(packages, &latest);
        assert!(annotated.iter().all(|p| p.latest_version.as_deref() == Some("2.0.0")));
        assert!(annotated.iter().all(|p| p.update_type == Some(UpdateType::Major)));
    }

    #[tokio::test]
    async fn test_fetch_respects_batch_size() {
        let names: Vec<String> = (0..20).map(|i| format!("pkg{}", i)).collect();
        let entries: Vec<(&str, &str)> = names.iter().map(|n| (n.as_str(), "1.0.0")).collect();
        let registry = FakeRegistry::new(&entries);
        let packages: Vec<_> = names
            .iter()
            .map(|n| package(n, "1.0.0", "/repo/paket.dependencies"))
            .collect();

        let latest = fetch_latest_versions(&registry, &packages, 8).await;
        assert_eq!(latest.versions.len(), 20);
        assert!(registry.max_in_flight.load(Ordering::SeqCst) <= 8);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_isolated() {
        let registry = FakeRegistry::new(&[("good", "1.1.0")]);
        let packages = vec![
            package("broken", "1.0.0", "/repo/paket.dependencies"),
            package("good", "1.0.0", "/repo/paket.dependencies"),
        ];

        let latest = fetch_latest_versions(&registry, &packages, DEFAULT_BATCH_SIZE).await;
        assert_eq!(latest.failed.len(), 1);
        assert_eq!(latest.versions.len(), 1);

        let annotated = annotate_updates(packages, &latest);
        let broken = annotated.iter().find(|p| p.name == "broken").unwrap();
        assert!(!broken.has_update);
        assert!(broken.latest_version.is_none());
        let good = annotated.iter().find(|p| p.name == "good").unwrap();
        assert_eq!(good.update_type, Some(UpdateType::Minor));
    }

    #[test]
    fn test_update_candidates_filters_unresolvable() {
        let mut local = package("local", "1.0.0", "/repo/paket.dependencies");
        local.is_registry_resolvable = false;
        let mut tag = package("tagged", "latest", "/repo/paket.dependencies");
        tag.resolved_version = None;
        let keep = package("keep", "1.0.0", "/repo/paket.dependencies");

        let candidates = update_candidates(&[local, tag, keep]);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "keep");
    }
}
