//! Ecosystem and manifest kind definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Supported package ecosystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    /// npm registry (package.json)
    Npm,
    /// Maven Central (pom.xml)
    Maven,
    /// NuGet gallery (Directory.Packages.props, paket.dependencies, .cake)
    NuGet,
}

impl Ecosystem {
    /// Returns the display name for this ecosystem
    pub fn display_name(&self) -> &'static str {
        match self {
            Ecosystem::Npm => "npm",
            Ecosystem::Maven => "Maven",
            Ecosystem::NuGet => "NuGet",
        }
    }

    /// Returns all supported ecosystems
    pub fn all() -> &'static [Ecosystem] {
        &[Ecosystem::Npm, Ecosystem::Maven, Ecosystem::NuGet]
    }
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Manifest formats the aggregator understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestKind {
    /// package.json
    PackageJson,
    /// pom.xml
    PomXml,
    /// Directory.Packages.props (NuGet central package management)
    DirectoryPackagesProps,
    /// paket.dependencies
    PaketDependencies,
    /// Cake build script (*.cake)
    CakeScript,
}

impl ManifestKind {
    /// Classifies a path by its file name
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        match name {
            "package.json" => Some(ManifestKind::PackageJson),
            "pom.xml" => Some(ManifestKind::PomXml),
            "Directory.Packages.props" => Some(ManifestKind::DirectoryPackagesProps),
            "paket.dependencies" => Some(ManifestKind::PaketDependencies),
            _ if name.ends_with(".cake") => Some(ManifestKind::CakeScript),
            _ => None,
        }
    }

    /// The ecosystem whose registry resolves this manifest's packages
    pub fn ecosystem(&self) -> Ecosystem {
        match self {
            ManifestKind::PackageJson => Ecosystem::Npm,
            ManifestKind::PomXml => Ecosystem::Maven,
            ManifestKind::DirectoryPackagesProps
            | ManifestKind::PaketDependencies
            | ManifestKind::CakeScript => Ecosystem::NuGet,
        }
    }

    /// Short label used in output
    pub fn label(&self) -> &'static str {
        match self {
            ManifestKind::PackageJson => "package.json",
            ManifestKind::PomXml => "pom.xml",
            ManifestKind::DirectoryPackagesProps => "Directory.Packages.props",
            ManifestKind::PaketDependencies => "paket.dependencies",
            ManifestKind::CakeScript => "cake",
        }
    }
}

impl fmt::Display for ManifestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
