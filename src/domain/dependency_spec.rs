//! Dependency specification classification
//!
//! Classifies the raw version string of a declared dependency:
//! - Registry versions: `^1.2.3`, `~1.2`, `>=2.0.0`, `1.0.0-beta.1`
//! - Distribution tags: `latest`, `next`, `canary`
//! - Workspace protocol: `workspace:*`, `workspace:^`
//! - Local references: `file:../shared`, `link:../shared`, `./vendor/pkg`
//! - Git references: `git+https://...`, `github:user/repo`, `https://host/repo.git#v1`

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Distribution tags resolved by the registry rather than by version ordering
const DIST_TAGS: &[&str] = &[
    "latest", "next", "beta", "alpha", "rc", "canary", "nightly", "dev", "lts",
];

const PATH_PREFIXES: &[&str] = &["./", "../", "/", ".\\", "..\\"];

const GIT_PREFIXES: &[&str] = &["git+", "git@", "github:", "gitlab:", "bitbucket:"];

static GIT_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://\S+\.git(?:#\S*)?$").unwrap());

// 1-3 numeric components with an optional `.`/`-` qualifier
static SEMVER_LIKE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(?:\.\d+){0,2}(?:[.\-][0-9A-Za-z][0-9A-Za-z.\-+]*)?$").unwrap()
});

/// The kind of a dependency specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecKind {
    /// Registry version or range
    Semver,
    /// Distribution tag (`latest`, `next`, ...)
    Tag,
    /// `workspace:` protocol
    Workspace,
    /// `file:` or `link:` protocol
    File,
    /// Bare relative or absolute path
    Path,
    /// Git repository reference
    Git,
    /// Anything else
    Unknown,
}

impl SpecKind {
    /// Whether the spec points at something inside or beside the workspace
    /// rather than at a registry version
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            SpecKind::Workspace | SpecKind::File | SpecKind::Path | SpecKind::Git
        )
    }

    /// Whether the spec is a file/path reference resolved relative to its manifest
    pub fn is_path_like(&self) -> bool {
        matches!(self, SpecKind::File | SpecKind::Path)
    }
}

impl fmt::Display for SpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SpecKind::Semver => "semver",
            SpecKind::Tag => "tag",
            SpecKind::Workspace => "workspace",
            SpecKind::File => "file",
            SpecKind::Path => "path",
            SpecKind::Git => "git",
            SpecKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Parsed form of a raw dependency version string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    /// The raw string as declared in the manifest
    pub raw: String,
    /// Classification of the raw string
    pub kind: SpecKind,
    /// Version with range operators stripped (semver kind only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalized_version: Option<String>,
    /// Text to show when no richer display applies
    pub display_text: String,
    /// Whether a registry lookup can find a latest version for this spec
    pub is_registry_resolvable: bool,
}

impl DependencySpec {
    fn new(raw: &str, kind: SpecKind) -> Self {
        Self {
            raw: raw.to_string(),
            kind,
            normalized_version: None,
            display_text: raw.trim().to_string(),
            is_registry_resolvable: false,
        }
    }

    fn resolvable(mut self, normalized_version: Option<String>) -> Self {
        self.is_registry_resolvable = true;
        self.normalized_version = normalized_version;
        self
    }

    /// Target of a `file:`/`link:`/path spec with the protocol removed
    pub fn local_target(&self) -> Option<&str> {
        let trimmed = self.raw.trim();
        match self.kind {
            SpecKind::File => trimmed
                .strip_prefix("file:")
                .or_else(|| trimmed.strip_prefix("link:")),
            SpecKind::Path => Some(trimmed),
            _ => None,
        }
    }
}

impl fmt::Display for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// Classifies a raw dependency string. Every input produces a spec.
pub fn parse_dependency_spec(raw: &str) -> DependencySpec {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return DependencySpec::new(raw, SpecKind::Unknown);
    }

    if trimmed.starts_with("workspace:") {
        return DependencySpec::new(raw, SpecKind::Workspace);
    }

    if trimmed.starts_with("file:") || trimmed.starts_with("link:") {
        return DependencySpec::new(raw, SpecKind::File);
    }

    if PATH_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
        return DependencySpec::new(raw, SpecKind::Path);
    }

    if GIT_PREFIXES.iter().any(|p| trimmed.starts_with(p)) || GIT_URL_RE.is_match(trimmed) {
        return DependencySpec::new(raw, SpecKind::Git);
    }

    let lowered = trimmed.to_ascii_lowercase();
    if DIST_TAGS.contains(&lowered.as_str()) {
        return DependencySpec::new(raw, SpecKind::Tag).resolvable(None);
    }

    let stripped = trimmed
        .trim_start_matches(|c: char| matches!(c, '^' | '~' | '<' | '>' | '=') || c.is_whitespace());
    if SEMVER_LIKE_RE.is_match(stripped) {
        return DependencySpec::new(raw, SpecKind::Semver)
            .resolvable(Some(stripped.to_string()));
    }

    DependencySpec::new(raw, SpecKind::Unknown)
}

/// Display hints for a spec that resolved to a workspace project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpecDisplayOptions {
    /// The spec points at another project in the same workspace
    pub workspace_local: bool,
    /// The spec points back at the declaring project (or the monorepo root)
    pub workspace_self: bool,
}

/// Renders a human display string for a spec
pub fn format_dependency_spec_display(
    spec: &DependencySpec,
    options: SpecDisplayOptions,
) -> String {
    let raw = spec.raw.trim();
    if options.workspace_self {
        return format!("workspace self ({})", raw);
    }
    if options.workspace_local {
        return format!("workspace local ({})", raw);
    }
    match spec.kind {
        SpecKind::Workspace => format!("workspace local ({})", raw),
        SpecKind::File | SpecKind::Path => format!("local path ({})", raw),
        SpecKind::Git => format!("git ({})", raw),
        _ => spec.display_text.clone(),
    }
}
