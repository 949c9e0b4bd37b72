//! NuGet manifest readers and writers
//!
//! Handles:
//! - Directory.Packages.props: `<PackageVersion Include="X" Version="Y" />`
//!   in either attribute order
//! - paket.dependencies: `nuget <id> <version>` lines
//! - Cake scripts: `#addin`/`#tool nuget:?package=X&version=Y` directives
//!
//! Updates substitute only the version token.

use crate::domain::{DependencyType, InstalledPackage, ManifestKind, ManifestOrigin};
use crate::error::ManifestError;
use regex::Regex;
use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;

static PACKAGE_VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<PackageVersion\b([^>]*?)/?>").unwrap());

static INCLUDE_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bInclude\s*=\s*"([^"]*)""#).unwrap());

static VERSION_ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bVersion\s*=\s*"([^"]*)""#).unwrap());

// The version token may follow a constraint operator such as `~>` or `>=`
static PAKET_NUGET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*nuget[ \t]+(\S+)[ \t]+(?:(?:~>|>=|<=|=|>|<)[ \t]*)?([0-9][^\s]*)")
        .unwrap()
});

static CAKE_DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[ \t]*#(addin|tool)[ \t]+"?nuget:[^?"\s]*\?([^"\s]+)"?"#).unwrap()
});

/// A package reference with the byte range of its version token
#[derive(Debug, Clone, PartialEq, Eq)]
struct VersionedReference {
    name: String,
    version: String,
    version_span: Range<usize>,
    dep_type: DependencyType,
}

fn scan_central_packages(content: &str) -> Vec<VersionedReference> {
    PACKAGE_VERSION_RE
        .captures_iter(content)
        .filter_map(|caps| {
            let attrs = caps.get(1)?;
            let include = INCLUDE_ATTR_RE.captures(attrs.as_str())?.get(1)?;
            let version = VERSION_ATTR_RE.captures(attrs.as_str())?.get(1)?;
            let start = attrs.start() + version.start();
            Some(VersionedReference {
                name: include.as_str().to_string(),
                version: version.as_str().to_string(),
                version_span: start..start + version.len(),
                dep_type: DependencyType::Dependencies,
            })
        })
        .filter(|r| !r.version.trim().is_empty())
        .collect()
}

fn scan_paket(content: &str) -> Vec<VersionedReference> {
    PAKET_NUGET_RE
        .captures_iter(content)
        .filter_map(|caps| {
            let name = caps.get(1)?;
            let version = caps.get(2)?;
            Some(VersionedReference {
                name: name.as_str().to_string(),
                version: version.as_str().to_string(),
                version_span: version.range(),
                dep_type: DependencyType::Dependencies,
            })
        })
        .collect()
}

/// Finds `key=value` in a `&`-separated query, case-insensitive on the key
fn query_value(query: &str, key: &str) -> Option<(String, Range<usize>)> {
    let mut offset = 0;
    for pair in query.split('&') {
        if let Some((k, v)) = pair.split_once('=') {
            if k.eq_ignore_ascii_case(key) {
                let start = offset + k.len() + 1;
                return Some((v.to_string(), start..start + v.len()));
            }
        }
        offset += pair.len() + 1;
    }
    None
}

fn scan_cake(content: &str) -> Vec<VersionedReference> {
    CAKE_DIRECTIVE_RE
        .captures_iter(content)
        .filter_map(|caps| {
            let directive = caps.get(1)?;
            let query = caps.get(2)?;
            let (name, _) = query_value(query.as_str(), "package")?;
            // Unpinned tool references are not tracked
            let (version, span) = query_value(query.as_str(), "version")?;
            if version.is_empty() {
                return None;
            }
            let dep_type = if directive.as_str() == "tool" {
                DependencyType::DevDependencies
            } else {
                DependencyType::Dependencies
            };
            Some(VersionedReference {
                name,
                version,
                version_span: query.start() + span.start..query.start() + span.end,
                dep_type,
            })
        })
        .collect()
}

fn scan(kind: ManifestKind, content: &str) -> Vec<VersionedReference> {
    match kind {
        ManifestKind::DirectoryPackagesProps => scan_central_packages(content),
        ManifestKind::PaketDependencies => scan_paket(content),
        ManifestKind::CakeScript => scan_cake(content),
        ManifestKind::PackageJson | ManifestKind::PomXml => Vec::new(),
    }
}

/// Reads the installed packages declared by a NuGet manifest
pub fn parse_nuget_manifest(
    kind: ManifestKind,
    content: &str,
    path: &Path,
    workspace_folder: &Path,
) -> Result<Vec<InstalledPackage>, ManifestError> {
    if kind.ecosystem() != crate::domain::Ecosystem::NuGet {
        return Err(ManifestError::UnsupportedFormat {
            path: path.to_path_buf(),
        });
    }
    let origin = ManifestOrigin::new(path, workspace_folder, kind);
    Ok(scan(kind, content)
        .into_iter()
        .map(|r| InstalledPackage::pinned(r.name, r.version, r.dep_type, &origin))
        .collect())
}

/// Sets the version of every reference to `package` (case-insensitive id)
pub fn update_nuget_version(
    kind: ManifestKind,
    content: &str,
    path: &Path,
    package: &str,
    new_version: &str,
) -> Result<String, ManifestError> {
    let spans: Vec<Range<usize>> = scan(kind, content)
        .into_iter()
        .filter(|r| r.name.eq_ignore_ascii_case(package))
        .map(|r| r.version_span)
        .collect();
    if spans.is_empty() {
        return Err(ManifestError::package_not_found(path, package));
    }

    let mut updated = content.to_string();
    for span in spans.into_iter().rev() {
        updated.replace_range(span, new_version);
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(kind: ManifestKind, content: &str) -> Vec<InstalledPackage> {
        parse_nuget_manifest(kind, content, Path::new("/repo/manifest"), Path::new("/repo"))
            .unwrap()
    }

    const PROPS: &str = r#"<Project>
  <PropertyGroup>
    <ManagePackageVersionsCentrally>true</ManagePackageVersionsCentrally>
  </PropertyGroup>
  <ItemGroup>
    <PackageVersion Include="Newtonsoft.Json" Version="13.0.1" />
    <PackageVersion Version="8.0.0" Include="Microsoft.Extensions.Logging" />
    <PackageVersion Include="xunit" Version="2.6.1"></PackageVersion>
  </ItemGroup>
</Project>
"#;

    #[test]
    fn test_parse_central_packages_both_orders() {
        let packages = parse(ManifestKind::DirectoryPackagesProps, PROPS);
        let names: Vec<(&str, &str)> = packages
            .iter()
            .map(|p| (p.name.as_str(), p.current_version.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Newtonsoft.Json", "13.0.1"),
                ("Microsoft.Extensions.Logging", "8.0.0"),
                ("xunit", "2.6.1"),
            ]
        );
        assert!(packages.iter().all(|p| p.is_registry_resolvable));
    }

    #[test]
    fn test_update_central_package_version() {
        let updated = update_nuget_version(
            ManifestKind::DirectoryPackagesProps,
            PROPS,
            Path::new("Directory.Packages.props"),
            "microsoft.extensions.logging",
            "8.0.1",
        )
        .unwrap();
        assert_eq!(
            updated,
            PROPS.replace(
                r#"<PackageVersion Version="8.0.0" Include"#,
                r#"<PackageVersion Version="8.0.1" Include"#
            )
        );
    }

    const PAKET: &str = "source https://api.nuget.org/v3/index.json\n\nnuget FSharp.Core 8.0.100\nnuget Argu ~> 6.1.1\n  nuget Expecto >= 10.0 prerelease\nnuget Fake.Core\ngithub fsprojects/Paket src/Paket.fs\n";

    #[test]
    fn test_parse_paket_lines() {
        let packages = parse(ManifestKind::PaketDependencies, PAKET);
        let names: Vec<(&str, &str)> = packages
            .iter()
            .map(|p| (p.name.as_str(), p.current_version.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![("FSharp.Core", "8.0.100"), ("Argu", "6.1.1"), ("Expecto", "10.0")]
        );
    }

    #[test]
    fn test_update_paket_keeps_operator() {
        let updated = update_nuget_version(
            ManifestKind::PaketDependencies,
            PAKET,
            Path::new("paket.dependencies"),
            "Argu",
            "6.2.4",
        )
        .unwrap();
        assert!(updated.contains("nuget Argu ~> 6.2.4\n"));
        assert!(updated.contains("nuget FSharp.Core 8.0.100\n"));
    }

    const CAKE: &str = r#"#addin nuget:?package=Cake.Git&version=3.0.0
#tool "nuget:?package=GitVersion.CommandLine&version=5.12.0"
#tool nuget:?package=NUnit.ConsoleRunner
#addin nuget:https://my.feed/v3/index.json?package=Cake.Docker&version=1.2.0&prerelease

Task("Default").Does(() => {});
"#;

    #[test]
    fn test_parse_cake_directives() {
        let packages = parse(ManifestKind::CakeScript, CAKE);
        assert_eq!(packages.len(), 3);

        let git = packages.iter().find(|p| p.name == "Cake.Git").unwrap();
        assert_eq!(git.dep_type, DependencyType::Dependencies);
        let gitversion = packages
            .iter()
            .find(|p| p.name == "GitVersion.CommandLine")
            .unwrap();
        assert_eq!(gitversion.dep_type, DependencyType::DevDependencies);
        assert_eq!(gitversion.current_version, "5.12.0");
        assert!(packages.iter().all(|p| p.name != "NUnit.ConsoleRunner"));
    }

    #[test]
    fn test_update_cake_version() {
        let updated = update_nuget_version(
            ManifestKind::CakeScript,
            CAKE,
            Path::new("build.cake"),
            "Cake.Docker",
            "1.3.0",
        )
        .unwrap();
        assert!(updated.contains("?package=Cake.Docker&version=1.3.0&prerelease"));
    }

    #[test]
    fn test_update_unknown_package() {
        let err = update_nuget_version(
            ManifestKind::PaketDependencies,
            PAKET,
            Path::new("paket.dependencies"),
            "Nope",
            "1.0.0",
        )
        .unwrap_err();
        assert!(matches!(err, ManifestError::PackageNotFound { .. }));
    }

    #[test]
    fn test_query_value() {
        assert_eq!(
            query_value("package=A&Version=1.0", "version"),
            Some(("1.0".to_string(), 18..21))
        );
        assert_eq!(query_value("package=A", "version"), None);
    }
}
