//! Installed package records aggregated from manifests

use super::{Ecosystem, ManifestKind, SpecKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Dependency bucket a declaration belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DependencyType {
    #[serde(rename = "dependencies")]
    Dependencies,
    #[serde(rename = "devDependencies")]
    DevDependencies,
    #[serde(rename = "peerDependencies")]
    PeerDependencies,
    #[serde(rename = "optionalDependencies")]
    OptionalDependencies,
}

impl DependencyType {
    /// All buckets in package.json order
    pub fn all() -> &'static [DependencyType] {
        &[
            DependencyType::Dependencies,
            DependencyType::DevDependencies,
            DependencyType::PeerDependencies,
            DependencyType::OptionalDependencies,
        ]
    }

    /// The package.json field name for this bucket
    pub fn field_name(&self) -> &'static str {
        match self {
            DependencyType::Dependencies => "dependencies",
            DependencyType::DevDependencies => "devDependencies",
            DependencyType::PeerDependencies => "peerDependencies",
            DependencyType::OptionalDependencies => "optionalDependencies",
        }
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Magnitude of an available update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateType {
    Major,
    Minor,
    Patch,
    Prerelease,
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UpdateType::Major => "major",
            UpdateType::Minor => "minor",
            UpdateType::Patch => "patch",
            UpdateType::Prerelease => "prerelease",
        };
        f.write_str(s)
    }
}

/// One dependency declaration found in one manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstalledPackage {
    /// Package name (`group:artifact` for Maven)
    pub name: String,
    /// Version as displayed to the user
    pub current_version: String,
    /// Version comparable against registry versions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_version: Option<String>,
    /// Raw declared spec
    pub version_specifier: String,
    pub spec_kind: SpecKind,
    pub is_registry_resolvable: bool,
    #[serde(rename = "type")]
    pub dep_type: DependencyType,
    /// Owning manifest
    pub package_json_path: PathBuf,
    pub workspace_folder_path: PathBuf,
    /// Name of the owning project, or the manifest file name when it has none
    pub manifest_name: String,
    pub manifest_kind: ManifestKind,
    pub ecosystem: Ecosystem,
    pub has_update: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_type: Option<UpdateType>,
}

impl InstalledPackage {
    /// Creates a registry-resolvable entry with an exact version, as produced by
    /// the pom.xml and NuGet manifest readers
    pub fn pinned(
        name: impl Into<String>,
        version: impl Into<String>,
        dep_type: DependencyType,
        manifest: &ManifestOrigin,
    ) -> Self {
        let version = version.into();
        Self {
            name: name.into(),
            current_version: version.clone(),
            resolved_version: Some(version.clone()),
            version_specifier: version,
            spec_kind: SpecKind::Semver,
            is_registry_resolvable: true,
            dep_type,
            package_json_path: manifest.path.clone(),
            workspace_folder_path: manifest.workspace_folder.clone(),
            manifest_name: manifest.name.clone(),
            manifest_kind: manifest.kind,
            ecosystem: manifest.kind.ecosystem(),
            has_update: false,
            latest_version: None,
            update_type: None,
        }
    }

    /// Attaches the result of a latest-version lookup. Entries that are not
    /// registry-resolvable never receive an update type.
    pub fn with_latest(
        mut self,
        latest: Option<String>,
        update_type: Option<UpdateType>,
    ) -> Self {
        self.latest_version = latest;
        self.update_type = if self.is_registry_resolvable {
            update_type
        } else {
            None
        };
        self.has_update = self.update_type.is_some();
        self
    }
}

impl fmt::Display for InstalledPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} ({})", self.name, self.current_version, self.dep_type)
    }
}

/// Identity of the manifest a package was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestOrigin {
    pub path: PathBuf,
    pub workspace_folder: PathBuf,
    pub name: String,
    pub kind: ManifestKind,
}

impl ManifestOrigin {
    /// Creates an origin named after the manifest file
    pub fn new(
        path: impl Into<PathBuf>,
        workspace_folder: impl Into<PathBuf>,
        kind: ManifestKind,
    ) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(kind.label())
            .to_string();
        Self {
            path,
            workspace_folder: workspace_folder.into(),
            name,
            kind,
        }
    }

    /// Overrides the display name (e.g. the package.json `name` field)
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
