//! Manifest version updates
//!
//! This module provides:
//! - Format dispatch for single-package version updates
//! - Read-modify-write through the [`ManifestFs`] capability
//! - [`WriteResult`] describing what happened to one file

use crate::domain::ManifestKind;
use crate::error::ManifestError;
use crate::manifest::nuget::update_nuget_version;
use crate::manifest::package_json::update_package_json_version;
use crate::manifest::pom_xml::update_pom_version;
use crate::manifest::ManifestFs;
use std::path::{Path, PathBuf};

/// Outcome of updating one manifest file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteResult {
    /// Path to the manifest file
    pub path: PathBuf,
    /// Whether the file content changed and was written
    pub file_modified: bool,
}

/// Applies a version update to manifest content without touching disk
pub fn update_manifest_content(
    kind: ManifestKind,
    content: &str,
    path: &Path,
    package: &str,
    version: &str,
) -> Result<String, ManifestError> {
    match kind {
        ManifestKind::PackageJson => update_package_json_version(content, path, package, version),
        ManifestKind::PomXml => update_pom_version(content, path, package, version),
        ManifestKind::DirectoryPackagesProps
        | ManifestKind::PaketDependencies
        | ManifestKind::CakeScript => update_nuget_version(kind, content, path, package, version),
    }
}

/// Updates `package` to `version` in the manifest at `path`
pub fn apply_version_update(
    fs: &dyn ManifestFs,
    path: &Path,
    package: &str,
    version: &str,
) -> Result<WriteResult, ManifestError> {
    let kind = ManifestKind::from_path(path).ok_or_else(|| ManifestError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    let content = fs.read_to_string(path)?;
    let updated = update_manifest_content(kind, &content, path, package, version)?;

    let file_modified = updated != content;
    if file_modified {
        fs.write(path, &updated)?;
        tracing::debug!("updated {} to {} in {}", package, version, path.display());
    }

    Ok(WriteResult {
        path: path.to_path_buf(),
        file_modified,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::LocalFs;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_apply_update_writes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("paket.dependencies");
        fs::write(&path, "nuget Serilog 3.0.0\n").unwrap();

        let result = apply_version_update(&LocalFs, &path, "Serilog", "3.1.1").unwrap();
        assert!(result.file_modified);
        assert_eq!(fs::read_to_string(&path).unwrap(), "nuget Serilog 3.1.1\n");
    }

    #[test]
    fn test_apply_same_version_does_not_write() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("package.json");
        let content = "{\n  \"dependencies\": {\n    \"lodash\": \"^4.17.21\"\n  }\n}\n";
        fs::write(&path, content).unwrap();

        let result = apply_version_update(&LocalFs, &path, "lodash", "4.17.21").unwrap();
        assert!(!result.file_modified);
        assert_eq!(fs::read_to_string(&path).unwrap(), content);
    }

    #[test]
    fn test_apply_unsupported_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Cargo.toml");
        fs::write(&path, "").unwrap();
        let err = apply_version_update(&LocalFs, &path, "serde", "1.0.0").unwrap_err();
        assert!(matches!(err, ManifestError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_update_content_dispatches_pom() {
        let pom = "<project><dependencies><dependency><groupId>g</groupId><artifactId>a</artifactId><version>1.0</version></dependency></dependencies></project>";
        let updated =
            update_manifest_content(ManifestKind::PomXml, pom, Path::new("pom.xml"), "g:a", "1.1")
                .unwrap();
        assert!(updated.contains("<version>1.1</version>"));
    }
}
