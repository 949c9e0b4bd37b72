//! Manifest discovery, reading and writing
//!
//! This module provides functionality to:
//! - Discover manifests across npm/pnpm/Lerna/Nx workspaces, Maven and .NET trees
//! - Read package.json, pom.xml, Directory.Packages.props, paket.dependencies
//!   and .cake files into [`InstalledPackage`] entries
//! - Write version updates back with minimal edits

mod discovery;
mod fs;
mod nuget;
mod package_json;
mod pnpm_workspace;
mod pom_xml;
mod writer;

pub use discovery::{
    collect_workspace_patterns, detect_nuget_management_style, discover_dotnet_manifests,
    discover_manifests, discover_maven_manifests, discover_package_json_manifests,
    discover_workspace_package_manifests, nx_project_manifests, owning_workspace_folder,
    package_json_workspaces, relative_display_path, select_nuget_install_target,
    DiscoveredManifest, NuGetInstallTarget, NuGetManagementStyle, WorkspacePatterns,
};
pub use fs::{LocalFs, ManifestFs};
pub use nuget::{parse_nuget_manifest, update_nuget_version};
pub use package_json::{
    declared_dependencies, local_manifest_target, normalize_path, package_name,
    parse_package_json, read_package_json_packages, spec_with_operator, to_pretty_json,
    update_package_json, update_package_json_version, LocalNames,
};
pub use pnpm_workspace::{parse_pnpm_workspace_packages, PNPM_WORKSPACE_FILE};
pub use pom_xml::{parse_pom_xml, project_artifact_id, update_pom_version};
pub use writer::{apply_version_update, update_manifest_content, WriteResult};

use crate::domain::{InstalledPackage, ManifestKind};
use crate::error::ManifestError;
use std::path::Path;

/// Name of the root package.json of a workspace folder
pub fn root_package_name(fs: &dyn ManifestFs, folder: &Path) -> Option<String> {
    let path = folder.join("package.json");
    if !fs.exists(&path) {
        return None;
    }
    let content = fs.read_to_string(&path).ok()?;
    parse_package_json(&content, &path)
        .ok()
        .and_then(|value| package_name(&value))
}

/// Reads the installed packages of one discovered manifest
pub fn read_installed_packages(
    fs: &dyn ManifestFs,
    manifest: &DiscoveredManifest,
    root_name: Option<&str>,
) -> Result<Vec<InstalledPackage>, ManifestError> {
    let path = manifest.path.as_path();
    let folder = manifest.workspace_folder.as_path();
    match manifest.kind {
        ManifestKind::PackageJson => read_package_json_packages(fs, path, folder, root_name),
        ManifestKind::PomXml => parse_pom_xml(&fs.read_to_string(path)?, path, folder),
        kind => parse_nuget_manifest(kind, &fs.read_to_string(path)?, path, folder),
    }
}
