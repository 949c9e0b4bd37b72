//! Output formatting for command results
//!
//! This module provides:
//! - Text output for human-readable display
//! - JSON output for machine processing
//! - Report types shared by both formatters

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use crate::domain::{InstalledPackage, WorkspaceProjectGraph};
use crate::manifest::{DiscoveredManifest, NuGetInstallTarget, NuGetManagementStyle};
use crate::nuget::{
    compute_all_tfms_with_status, normalize_tfm_for_lookup, normalized_tfm_to_display, TfmStatus,
};
use crate::service::{AlignmentOutcome, UpdateCheck};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for machine processing
    Json,
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Summary lines only
    Quiet,
    #[default]
    Normal,
    /// Include up-to-date entries and per-project dependency lists
    Verbose,
}

/// Configuration for output formatting
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub verbosity: Verbosity,
    /// Whether to use colors (when supported)
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            verbosity: Verbosity::default(),
            color: true,
        }
    }
}

impl OutputConfig {
    /// Create configuration from CLI flags
    pub fn from_cli(json: bool, verbose: bool, quiet: bool) -> Self {
        let format = if json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        };

        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };

        Self {
            format,
            verbosity,
            color: true,
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}

/// One declared framework of a `tfm` run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclaredTfm {
    pub input: String,
    pub normalized: String,
    pub display: String,
}

/// Normalized declared frameworks and their compatibility closure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TfmReport {
    pub declared: Vec<DeclaredTfm>,
    pub frameworks: BTreeMap<String, TfmStatus>,
}

impl TfmReport {
    pub fn compute<S: AsRef<str>>(inputs: &[S]) -> Self {
        let declared = inputs
            .iter()
            .map(|input| {
                let normalized = normalize_tfm_for_lookup(input.as_ref());
                DeclaredTfm {
                    input: input.as_ref().to_string(),
                    display: normalized_tfm_to_display(&normalized),
                    normalized,
                }
            })
            .collect();

        Self {
            declared,
            frameworks: compute_all_tfms_with_status(inputs),
        }
    }
}

/// Manifests and NuGet setup of one workspace folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderDiscovery {
    pub folder: PathBuf,
    pub nuget_style: NuGetManagementStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nuget_install_target: Option<NuGetInstallTarget>,
    pub manifests: Vec<DiscoveredManifest>,
}

/// Path shown relative to its workspace folder when possible
pub(crate) fn display_path(path: &Path, folder: &Path) -> String {
    path.strip_prefix(folder)
        .ok()
        .filter(|relative| !relative.as_os_str().is_empty())
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Trait for output formatters
pub trait OutputFormatter {
    /// Installed packages grouped by manifest
    fn format_packages(
        &self,
        packages: &[InstalledPackage],
        writer: &mut dyn Write,
    ) -> std::io::Result<()>;

    /// Result of a registry update check
    fn format_update_check(&self, check: &UpdateCheck, writer: &mut dyn Write)
        -> std::io::Result<()>;

    /// Workspace project graph and alignment issues
    fn format_graph(
        &self,
        graph: &WorkspaceProjectGraph,
        writer: &mut dyn Write,
    ) -> std::io::Result<()>;

    /// Result of aligning one dependency
    fn format_alignment(
        &self,
        package: &str,
        target: &str,
        outcome: &AlignmentOutcome,
        writer: &mut dyn Write,
    ) -> std::io::Result<()>;

    /// Framework normalization and compatibility closure
    fn format_tfms(&self, report: &TfmReport, writer: &mut dyn Write) -> std::io::Result<()>;

    /// Discovered manifests per workspace folder
    fn format_discovery(
        &self,
        folders: &[FolderDiscovery],
        writer: &mut dyn Write,
    ) -> std::io::Result<()>;
}

/// Create an output formatter based on configuration
pub fn create_formatter(config: OutputConfig) -> Box<dyn OutputFormatter> {
    match config.format {
        OutputFormat::Text => Box::new(TextFormatter::with_color(config.verbosity, config.color)),
        OutputFormat::Json => Box::new(JsonFormatter::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_config_default() {
        let config = OutputConfig::default();
        assert_eq!(config.format, OutputFormat::Text);
        assert_eq!(config.verbosity, Verbosity::Normal);
        assert!(config.color);
    }

    #[test]
    fn test_output_config_from_cli() {
        let config = OutputConfig::from_cli(true, false, false);
        assert_eq!(config.format, OutputFormat::Json);

        let config = OutputConfig::from_cli(false, true, false);
        assert_eq!(config.verbosity, Verbosity::Verbose);

        let config = OutputConfig::from_cli(false, true, true);
        assert_eq!(config.verbosity, Verbosity::Quiet);
    }

    #[test]
    fn test_tfm_report() {
        let report = TfmReport::compute(&[".NETFramework4.6.1"]);
        assert_eq!(report.declared[0].normalized, "net461");
        assert_eq!(report.declared[0].display, ".NETFramework 4.6.1");
        assert_eq!(report.frameworks.get("net461"), Some(&TfmStatus::Compatible));
        assert_eq!(report.frameworks.get("net48"), Some(&TfmStatus::Computed));
    }

    #[test]
    fn test_display_path() {
        assert_eq!(
            display_path(Path::new("/repo/packages/a/package.json"), Path::new("/repo")),
            "packages/a/package.json"
        );
        assert_eq!(
            display_path(Path::new("/other/pom.xml"), Path::new("/repo")),
            "/other/pom.xml"
        );
    }
}
