//! Text output formatter for human-readable display
//!
//! This module provides:
//! - Package listings grouped by manifest
//! - Update lines colored by update type (major/minor/patch/prerelease)
//! - Project graph with local edges and alignment issues
//! - Framework compatibility tables

use crate::domain::{InstalledPackage, UpdateType, WorkspaceProjectGraph};
use crate::nuget::TfmStatus;
use crate::output::{display_path, FolderDiscovery, OutputFormatter, TfmReport, Verbosity};
use crate::service::{AlignmentOutcome, UpdateCheck};
use colored::Colorize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

/// Text formatter for human-readable output
pub struct TextFormatter {
    verbosity: Verbosity,
    color: bool,
}

impl TextFormatter {
    /// Create a new text formatter
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            color: true,
        }
    }

    /// Create a new text formatter with color option
    pub fn with_color(verbosity: Verbosity, color: bool) -> Self {
        Self { verbosity, color }
    }

    fn update_label(&self, update_type: UpdateType) -> String {
        let label = update_type.to_string();
        if !self.color {
            return label;
        }
        match update_type {
            UpdateType::Major => label.red().bold().to_string(),
            UpdateType::Minor => label.yellow().to_string(),
            UpdateType::Patch => label.green().to_string(),
            UpdateType::Prerelease => label.magenta().to_string(),
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }

    fn by_manifest<'a>(
        packages: impl IntoIterator<Item = &'a InstalledPackage>,
    ) -> BTreeMap<PathBuf, Vec<&'a InstalledPackage>> {
        let mut grouped: BTreeMap<PathBuf, Vec<&InstalledPackage>> = BTreeMap::new();
        for pkg in packages {
            grouped
                .entry(pkg.package_json_path.clone())
                .or_default()
                .push(pkg);
        }
        grouped
    }

    fn manifest_heading(&self, first: &InstalledPackage) -> String {
        let path = display_path(&first.package_json_path, &first.workspace_folder_path);
        let label = format!("{} ({}) [{}]", path, first.manifest_name, first.ecosystem);
        self.heading(&label)
    }

    fn max_name_length(packages: &[&InstalledPackage]) -> usize {
        packages.iter().map(|p| p.name.len()).max().unwrap_or(0)
    }
}

impl OutputFormatter for TextFormatter {
    fn format_packages(
        &self,
        packages: &[InstalledPackage],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let grouped = Self::by_manifest(packages);

        if self.verbosity != Verbosity::Quiet {
            for entries in grouped.values() {
                writeln!(writer, "{}", self.manifest_heading(entries[0]))?;
                let width = Self::max_name_length(entries);
                for pkg in entries {
                    let mut line = format!(
                        "  {:width$} {} {}",
                        pkg.name,
                        pkg.current_version,
                        self.dim(pkg.dep_type.field_name()),
                        width = width
                    );
                    if self.verbosity == Verbosity::Verbose {
                        line.push_str(&format!(" [{}]", pkg.spec_kind));
                        if !pkg.is_registry_resolvable {
                            line.push_str(" local");
                        }
                    }
                    writeln!(writer, "{}", line)?;
                }
                writeln!(writer)?;
            }
        }

        writeln!(
            writer,
            "{} packages in {} manifests",
            packages.len(),
            grouped.len()
        )
    }

    fn format_update_check(
        &self,
        check: &UpdateCheck,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let shown: Vec<&InstalledPackage> = match self.verbosity {
            Verbosity::Verbose => check.packages.iter().collect(),
            _ => check.updatable().collect(),
        };
        let grouped = Self::by_manifest(shown);

        if self.verbosity != Verbosity::Quiet {
            for entries in grouped.values() {
                writeln!(writer, "{}", self.manifest_heading(entries[0]))?;
                let width = Self::max_name_length(entries);
                for pkg in entries {
                    let current = pkg.resolved_version.as_deref().unwrap_or(&pkg.current_version);
                    match (&pkg.latest_version, pkg.update_type) {
                        (Some(latest), Some(update_type)) => writeln!(
                            writer,
                            "  {:width$} {} {} {} [{}]",
                            pkg.name,
                            self.dim(current),
                            self.dim("→"),
                            latest,
                            self.update_label(update_type),
                            width = width
                        )?,
                        (Some(latest), None) => writeln!(
                            writer,
                            "  {:width$} {} {}",
                            pkg.name,
                            latest,
                            self.dim("(latest)"),
                            width = width
                        )?,
                        (None, _) => writeln!(
                            writer,
                            "  {:width$} {} {}",
                            pkg.name,
                            current,
                            self.dim("(unknown)"),
                            width = width
                        )?,
                    }
                }
                writeln!(writer)?;
            }
        }

        let updatable = check.updatable().count();
        if updatable == 0 {
            writeln!(writer, "All {} packages are up to date", check.packages.len())?;
        } else {
            writeln!(
                writer,
                "{} of {} packages can be updated",
                updatable,
                check.packages.len()
            )?;
        }
        if !check.failed_lookups.is_empty() {
            let message = format!(
                "{} lookups failed: {}",
                check.failed_lookups.len(),
                check.failed_lookups.join(", ")
            );
            if self.color {
                writeln!(writer, "{}", message.red())?;
            } else {
                writeln!(writer, "{}", message)?;
            }
        }
        Ok(())
    }

    fn format_graph(
        &self,
        graph: &WorkspaceProjectGraph,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if self.verbosity != Verbosity::Quiet {
            let tools: Vec<String> = graph.tools.iter().map(|t| t.to_string()).collect();
            writeln!(writer, "Tools: {}", tools.join(", "))?;
            writeln!(writer)?;
            writeln!(
                writer,
                "{}",
                self.heading(&format!("Projects ({})", graph.projects.len()))
            )?;

            for project in &graph.projects {
                writeln!(
                    writer,
                    "  {} {} {}",
                    project.relative_path,
                    project.name,
                    self.dim(&format!("[{}]", project.tool))
                )?;
                for target in &project.local_dependencies {
                    let name = graph
                        .project(target)
                        .map(|p| p.name.as_str())
                        .unwrap_or_default();
                    writeln!(writer, "    → {}", name)?;
                }
                for source in &project.local_dependents {
                    let name = graph
                        .project(source)
                        .map(|p| p.name.as_str())
                        .unwrap_or_default();
                    writeln!(writer, "    ← {}", self.dim(name))?;
                }
                if self.verbosity == Verbosity::Verbose {
                    for dep in &project.dependencies {
                        writeln!(
                            writer,
                            "    {} {} {}",
                            dep.name,
                            dep.spec,
                            self.dim(dep.dep_type.field_name())
                        )?;
                    }
                }
            }
            writeln!(writer)?;

            if !graph.alignment_issues.is_empty() {
                writeln!(
                    writer,
                    "{}",
                    self.heading(&format!(
                        "Alignment issues ({})",
                        graph.alignment_issues.len()
                    ))
                )?;
                for issue in &graph.alignment_issues {
                    writeln!(writer, "  {}: {}", issue.package_name, issue.specs.join(", "))?;
                    for consumer in &issue.consumers {
                        writeln!(
                            writer,
                            "    {} ({}) {} {}",
                            consumer.project_name,
                            consumer.relative_path,
                            consumer.spec,
                            self.dim(consumer.dep_type.field_name())
                        )?;
                    }
                }
                writeln!(writer)?;
            }
        }

        writeln!(
            writer,
            "{} projects, {} alignment issues",
            graph.projects.len(),
            graph.alignment_issues.len()
        )
    }

    fn format_alignment(
        &self,
        package: &str,
        target: &str,
        outcome: &AlignmentOutcome,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        if self.verbosity != Verbosity::Quiet {
            for path in &outcome.updated_manifests {
                writeln!(writer, "  updated {}", path.display())?;
            }
        }
        for path in &outcome.failed_manifests {
            let line = format!("  failed  {}", path.display());
            if self.color {
                writeln!(writer, "{}", line.red())?;
            } else {
                writeln!(writer, "{}", line)?;
            }
        }

        if outcome.updated_count() == 0 && outcome.failed_manifests.is_empty() {
            writeln!(writer, "{} is already aligned to {}", package, target)
        } else {
            writeln!(
                writer,
                "Aligned {} to {} in {} manifests",
                package,
                target,
                outcome.updated_count()
            )
        }
    }

    fn format_tfms(&self, report: &TfmReport, writer: &mut dyn Write) -> std::io::Result<()> {
        for declared in &report.declared {
            if declared.display == declared.normalized {
                writeln!(writer, "{} → {}", declared.input, declared.normalized)?;
            } else {
                writeln!(
                    writer,
                    "{} → {} ({})",
                    declared.input, declared.normalized, declared.display
                )?;
            }
        }
        writeln!(writer)?;

        let width = report.frameworks.keys().map(|k| k.len()).max().unwrap_or(0);
        for (tfm, status) in &report.frameworks {
            let status_label = match status {
                TfmStatus::Compatible if self.color => status.to_string().green().to_string(),
                TfmStatus::Computed if self.color => status.to_string().dimmed().to_string(),
                _ => status.to_string(),
            };
            writeln!(writer, "  {:width$} {}", tfm, status_label, width = width)?;
        }
        Ok(())
    }

    fn format_discovery(
        &self,
        folders: &[FolderDiscovery],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        for folder in folders {
            writeln!(writer, "{}", self.heading(&folder.folder.display().to_string()))?;
            writeln!(writer, "  NuGet style: {}", folder.nuget_style)?;
            if let Some(target) = &folder.nuget_install_target {
                writeln!(
                    writer,
                    "  NuGet install target: {}",
                    display_path(&target.path, &folder.folder)
                )?;
            }
            if self.verbosity != Verbosity::Quiet {
                for manifest in &folder.manifests {
                    writeln!(
                        writer,
                        "  {} {}",
                        display_path(&manifest.path, &folder.folder),
                        self.dim(&format!("[{}]", manifest.kind.ecosystem()))
                    )?;
                }
            }
            writeln!(writer, "  {} manifests", folder.manifests.len())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        DependencyType, ManifestKind, ManifestOrigin, MonorepoTool, WorkspaceAlignmentIssue,
        WorkspaceDependencyConsumer,
    };

    fn render(f: impl FnOnce(&TextFormatter, &mut Vec<u8>) -> std::io::Result<()>) -> String {
        let formatter = TextFormatter::with_color(Verbosity::Normal, false);
        let mut out = Vec::new();
        f(&formatter, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn package(name: &str, version: &str) -> InstalledPackage {
        let origin = ManifestOrigin::new(
            "/repo/paket.dependencies",
            "/repo",
            ManifestKind::PaketDependencies,
        );
        InstalledPackage::pinned(name, version, DependencyType::Dependencies, &origin)
    }

    #[test]
    fn test_format_packages_grouped() {
        let packages = vec![package("Polly", "8.2.0"), package("Serilog", "3.1.1")];
        let output = render(|f, w| f.format_packages(&packages, w));
        assert!(output.contains("paket.dependencies (paket.dependencies) [NuGet]"));
        assert!(output.contains("  Polly   8.2.0 dependencies"));
        assert!(output.contains("2 packages in 1 manifests"));
    }

    #[test]
    fn test_format_update_check() {
        let check = UpdateCheck {
            packages: vec![
                package("Polly", "8.2.0")
                    .with_latest(Some("8.3.0".to_string()), Some(UpdateType::Minor)),
                package("Serilog", "3.1.1").with_latest(Some("3.1.1".to_string()), None),
            ],
            failed_lookups: vec!["Broken".to_string()],
        };
        let output = render(|f, w| f.format_update_check(&check, w));
        assert!(output.contains("Polly 8.2.0 → 8.3.0 [minor]"));
        assert!(!output.contains("Serilog"));
        assert!(output.contains("1 of 2 packages can be updated"));
        assert!(output.contains("1 lookups failed: Broken"));
    }

    #[test]
    fn test_format_graph_alignment() {
        let graph = WorkspaceProjectGraph {
            tools: vec![MonorepoTool::Workspaces],
            projects: Vec::new(),
            alignment_issues: vec![WorkspaceAlignmentIssue {
                package_name: "pkg".to_string(),
                specs: vec!["^1.0.0".to_string(), "^2.0.0".to_string()],
                consumers: vec![WorkspaceDependencyConsumer {
                    project_name: "a".to_string(),
                    manifest_path: PathBuf::from("/repo/packages/a/package.json"),
                    relative_path: "packages/a".to_string(),
                    spec: "^1.0.0".to_string(),
                    dep_type: DependencyType::Dependencies,
                }],
            }],
        };
        let output = render(|f, w| f.format_graph(&graph, w));
        assert!(output.contains("Tools: workspaces"));
        assert!(output.contains("pkg: ^1.0.0, ^2.0.0"));
        assert!(output.contains("a (packages/a) ^1.0.0 dependencies"));
        assert!(output.contains("0 projects, 1 alignment issues"));
    }

    #[test]
    fn test_format_alignment_noop() {
        let outcome = AlignmentOutcome::default();
        let output = render(|f, w| f.format_alignment("pkg", "^2.0.0", &outcome, w));
        assert!(output.contains("pkg is already aligned to ^2.0.0"));
    }

    #[test]
    fn test_format_tfms() {
        let report = TfmReport::compute(&["netstandard2.0"]);
        let output = render(|f, w| f.format_tfms(&report, w));
        assert!(output.contains("netstandard2.0 → netstandard2.0"));
        assert!(output.contains("net461"));
        assert!(output.contains("compatible"));
    }
}
