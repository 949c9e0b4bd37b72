//! JSON output formatter for machine processing
//!
//! Every document carries a `generatedAt` RFC 3339 timestamp next to the
//! command result.

use crate::domain::{InstalledPackage, WorkspaceProjectGraph};
use crate::output::{FolderDiscovery, OutputFormatter, TfmReport};
use crate::service::{AlignmentOutcome, UpdateCheck};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

/// JSON formatter for machine-readable output
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }

    fn write<T: Serialize>(&self, body: T, writer: &mut dyn Write) -> std::io::Result<()> {
        let document = JsonDocument {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            body,
        };
        serde_json::to_writer_pretty(&mut *writer, &document)?;
        writeln!(writer)
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonDocument<T: Serialize> {
    generated_at: String,
    #[serde(flatten)]
    body: T,
}

#[derive(Serialize)]
struct JsonPackages<'a> {
    packages: &'a [InstalledPackage],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonUpdateCheck<'a> {
    checked: usize,
    updates: Vec<&'a InstalledPackage>,
    failed_lookups: &'a [String],
}

#[derive(Serialize)]
struct JsonGraph<'a> {
    graph: &'a WorkspaceProjectGraph,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonAlignment<'a> {
    package: &'a str,
    target: &'a str,
    updated_count: usize,
    updated_manifests: &'a [PathBuf],
    failed_manifests: &'a [PathBuf],
}

#[derive(Serialize)]
struct JsonTfms<'a> {
    tfm: &'a TfmReport,
}

#[derive(Serialize)]
struct JsonDiscovery<'a> {
    folders: &'a [FolderDiscovery],
}

impl OutputFormatter for JsonFormatter {
    fn format_packages(
        &self,
        packages: &[InstalledPackage],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        self.write(JsonPackages { packages }, writer)
    }

    fn format_update_check(
        &self,
        check: &UpdateCheck,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let body = JsonUpdateCheck {
            checked: check.packages.len(),
            updates: check.updatable().collect(),
            failed_lookups: &check.failed_lookups,
        };
        self.write(body, writer)
    }

    fn format_graph(
        &self,
        graph: &WorkspaceProjectGraph,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        self.write(JsonGraph { graph }, writer)
    }

    fn format_alignment(
        &self,
        package: &str,
        target: &str,
        outcome: &AlignmentOutcome,
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        let body = JsonAlignment {
            package,
            target,
            updated_count: outcome.updated_count(),
            updated_manifests: &outcome.updated_manifests,
            failed_manifests: &outcome.failed_manifests,
        };
        self.write(body, writer)
    }

    fn format_tfms(&self, report: &TfmReport, writer: &mut dyn Write) -> std::io::Result<()> {
        self.write(JsonTfms { tfm: report }, writer)
    }

    fn format_discovery(
        &self,
        folders: &[FolderDiscovery],
        writer: &mut dyn Write,
    ) -> std::io::Result<()> {
        self.write(JsonDiscovery { folders }, writer)
    }
}
