//! Manifest discovery across monorepo layouts
//!
//! Features:
//! - npm/yarn `workspaces` (array or `{ packages: [...] }`)
//! - pnpm-workspace.yaml and lerna.json package globs
//! - Nx `project.json` siblings and legacy `workspace.json` roots
//! - Flat `**/package.json` fallback when no workspace is declared
//! - pom.xml and .NET manifest search with build-output excludes
//! - NuGet install-target selection and package management style detection

use crate::domain::ManifestKind;
use crate::manifest::fs::{relative_slash_path, ManifestFs};
use crate::manifest::pnpm_workspace::{parse_pnpm_workspace_packages, PNPM_WORKSPACE_FILE};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

const NODE_MODULES_EXCLUDE: &str = "**/node_modules/**";
const MAVEN_EXCLUDES: &[&str] = &["**/target/**"];
const DOTNET_EXCLUDES: &[&str] = &[
    "**/node_modules/**",
    "**/bin/**",
    "**/obj/**",
    "**/out/**",
];

/// A manifest found under a workspace folder
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredManifest {
    pub path: PathBuf,
    pub workspace_folder: PathBuf,
    pub kind: ManifestKind,
}

/// Workspace globs declared by a root folder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspacePatterns {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl WorkspacePatterns {
    fn push(&mut self, raw: &str) {
        match raw.trim().strip_prefix('!') {
            Some(negated) => self.exclude.push(normalize_pattern(negated)),
            None => self.include.push(normalize_pattern(raw)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

fn normalize_pattern(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix("./").unwrap_or(trimmed);
    trimmed.trim_end_matches('/').to_string()
}

fn read_json(fs: &dyn ManifestFs, path: &Path) -> Option<Value> {
    if !fs.exists(path) {
        return None;
    }
    let content = fs.read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("skipping malformed {}: {}", path.display(), e);
            None
        }
    }
}

fn string_array(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Patterns of the `workspaces` field: `[...]` or `{ "packages": [...] }`
pub fn package_json_workspaces(package_json: &Value) -> Vec<String> {
    match package_json.get("workspaces") {
        Some(Value::Array(_)) => string_array(package_json.get("workspaces")),
        Some(Value::Object(map)) => string_array(map.get("packages")),
        _ => Vec::new(),
    }
}

/// Collects workspace globs from package.json, pnpm-workspace.yaml and lerna.json
pub fn collect_workspace_patterns(fs: &dyn ManifestFs, root: &Path) -> WorkspacePatterns {
    let mut patterns = WorkspacePatterns::default();

    if let Some(package_json) = read_json(fs, &root.join("package.json")) {
        package_json_workspaces(&package_json)
            .iter()
            .for_each(|p| patterns.push(p));
    }

    let pnpm_path = root.join(PNPM_WORKSPACE_FILE);
    if fs.exists(&pnpm_path) {
        if let Ok(content) = fs.read_to_string(&pnpm_path) {
            parse_pnpm_workspace_packages(&content)
                .iter()
                .for_each(|p| patterns.push(p));
        }
    }

    if let Some(lerna) = read_json(fs, &root.join("lerna.json")) {
        string_array(lerna.get("packages"))
            .iter()
            .for_each(|p| patterns.push(p));
    }

    patterns
}

/// package.json files of Nx projects, empty when the folder is not an Nx workspace
pub fn nx_project_manifests(fs: &dyn ManifestFs, root: &Path) -> Vec<PathBuf> {
    if !fs.exists(&root.join("nx.json")) {
        return Vec::new();
    }

    let mut manifests = BTreeSet::new();
    let excludes = vec![NODE_MODULES_EXCLUDE.to_string()];
    for project_json in fs.find_files(root, "**/project.json", &excludes) {
        if let Some(dir) = project_json.parent() {
            let sibling = dir.join("package.json");
            if fs.exists(&sibling) {
                manifests.insert(sibling);
            }
        }
    }

    // Legacy workspace.json: "projects": { "name": "libs/a" | { "root": "libs/a" } }
    if let Some(workspace) = read_json(fs, &root.join("workspace.json")) {
        if let Some(projects) = workspace.get("projects").and_then(Value::as_object) {
            for project in projects.values() {
                let project_root = match project {
                    Value::String(path) => Some(path.as_str()),
                    Value::Object(map) => map.get("root").and_then(Value::as_str),
                    _ => None,
                };
                if let Some(project_root) = project_root {
                    let candidate = root.join(project_root).join("package.json");
                    if fs.exists(&candidate) {
                        manifests.insert(candidate);
                    }
                }
            }
        }
    }

    manifests.into_iter().collect()
}

/// package.json files declared by workspace configuration.
///
/// Returns empty when the folder declares no workspace patterns and no Nx
/// projects; callers fall back to a flat search.
pub fn discover_workspace_package_manifests(
    fs: &dyn ManifestFs,
    root: &Path,
    extra_excludes: &[String],
) -> Vec<PathBuf> {
    let patterns = collect_workspace_patterns(fs, root);
    let nx = nx_project_manifests(fs, root);
    if patterns.include.is_empty() && nx.is_empty() {
        return Vec::new();
    }

    let mut excludes: Vec<String> = extra_excludes.to_vec();
    excludes.push(NODE_MODULES_EXCLUDE.to_string());

    let excluded: BTreeSet<PathBuf> = patterns
        .exclude
        .iter()
        .flat_map(|p| fs.find_files(root, &format!("{}/package.json", p), &excludes))
        .collect();

    let mut manifests: BTreeSet<PathBuf> = patterns
        .include
        .iter()
        .flat_map(|p| fs.find_files(root, &format!("{}/package.json", p), &excludes))
        .filter(|path| !excluded.contains(path))
        .collect();
    manifests.extend(nx);

    let root_manifest = root.join("package.json");
    if fs.exists(&root_manifest) {
        manifests.insert(root_manifest);
    }

    tracing::debug!(
        "{} declares {} workspace manifests",
        root.display(),
        manifests.len()
    );
    manifests.into_iter().collect()
}

/// All package.json manifests of a folder: declared workspace members, or
/// every package.json outside node_modules
pub fn discover_package_json_manifests(
    fs: &dyn ManifestFs,
    root: &Path,
    extra_excludes: &[String],
) -> Vec<PathBuf> {
    let declared = discover_workspace_package_manifests(fs, root, extra_excludes);
    if !declared.is_empty() {
        return declared;
    }
    let mut excludes = extra_excludes.to_vec();
    excludes.push(NODE_MODULES_EXCLUDE.to_string());
    fs.find_files(root, "**/package.json", &excludes)
}

fn with_excludes(fixed: &[&str], extra: &[String]) -> Vec<String> {
    fixed
        .iter()
        .map(|s| s.to_string())
        .chain(extra.iter().cloned())
        .collect()
}

/// pom.xml files outside `target/`
pub fn discover_maven_manifests(
    fs: &dyn ManifestFs,
    root: &Path,
    extra_excludes: &[String],
) -> Vec<PathBuf> {
    fs.find_files(root, "**/pom.xml", &with_excludes(MAVEN_EXCLUDES, extra_excludes))
}

/// Directory.Packages.props, paket.dependencies and .cake files outside build output
pub fn discover_dotnet_manifests(
    fs: &dyn ManifestFs,
    root: &Path,
    extra_excludes: &[String],
) -> Vec<PathBuf> {
    let excludes = with_excludes(DOTNET_EXCLUDES, extra_excludes);
    let mut manifests: BTreeSet<PathBuf> = BTreeSet::new();
    for pattern in [
        "**/Directory.Packages.props",
        "**/paket.dependencies",
        "**/*.cake",
    ] {
        manifests.extend(fs.find_files(root, pattern, &excludes));
    }
    manifests.into_iter().collect()
}

/// Every supported manifest under the given folders, de-duplicated and sorted
pub fn discover_manifests(
    fs: &dyn ManifestFs,
    folders: &[PathBuf],
    extra_excludes: &[String],
) -> Vec<DiscoveredManifest> {
    let mut seen = BTreeSet::new();
    let mut manifests = Vec::new();

    for folder in folders {
        let found = discover_package_json_manifests(fs, folder, extra_excludes)
            .into_iter()
            .chain(discover_maven_manifests(fs, folder, extra_excludes))
            .chain(discover_dotnet_manifests(fs, folder, extra_excludes));

        for path in found {
            let Some(kind) = ManifestKind::from_path(&path) else {
                continue;
            };
            // Nested workspace folders: the deepest folder containing the file owns it
            if seen.insert(path.clone()) {
                let workspace_folder = owning_workspace_folder(&path, folders)
                    .unwrap_or(folder)
                    .clone();
                manifests.push(DiscoveredManifest {
                    path,
                    workspace_folder,
                    kind,
                });
            }
        }
    }

    manifests.sort();
    manifests
}

/// Workspace folder that contains `path` (the deepest one when nested)
pub fn owning_workspace_folder<'a>(path: &Path, folders: &'a [PathBuf]) -> Option<&'a PathBuf> {
    folders
        .iter()
        .filter(|folder| path.starts_with(folder))
        .max_by_key(|folder| folder.components().count())
}

/// Path of `dir` relative to `folder`, `.` for the folder itself
pub fn relative_display_path(dir: &Path, folder: &Path) -> String {
    match relative_slash_path(dir, folder) {
        Some(relative) if !relative.is_empty() => relative,
        _ => ".".to_string(),
    }
}

/// How NuGet packages are managed for a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NuGetManagementStyle {
    /// Directory.Packages.props
    CentralPackageManagement,
    Paket,
    /// Legacy packages.config
    PackagesConfig,
    /// Cake build scripts
    Cake,
    /// `<PackageReference>` items in project files
    PackageReference,
}

impl fmt::Display for NuGetManagementStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NuGetManagementStyle::CentralPackageManagement => "central package management",
            NuGetManagementStyle::Paket => "paket",
            NuGetManagementStyle::PackagesConfig => "packages.config",
            NuGetManagementStyle::Cake => "cake",
            NuGetManagementStyle::PackageReference => "PackageReference",
        };
        f.write_str(s)
    }
}

/// The file a NuGet install should edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NuGetInstallTarget {
    pub path: PathBuf,
    pub style: NuGetManagementStyle,
}

fn install_target_rank(path: &Path) -> Option<(u8, NuGetManagementStyle)> {
    let name = path.file_name()?.to_str()?;
    let lowered = name.to_ascii_lowercase();
    if name == "Directory.Packages.props" {
        Some((0, NuGetManagementStyle::CentralPackageManagement))
    } else if name == "paket.dependencies" {
        Some((1, NuGetManagementStyle::Paket))
    } else if name == "packages.config" {
        Some((2, NuGetManagementStyle::PackagesConfig))
    } else if [".csproj", ".vbproj", ".fsproj"]
        .iter()
        .any(|ext| lowered.ends_with(ext))
    {
        Some((3, NuGetManagementStyle::PackageReference))
    } else {
        None
    }
}

/// Picks the install target among candidate files by priority:
/// Directory.Packages.props > paket.dependencies > packages.config > project file
pub fn select_nuget_install_target(candidates: &[PathBuf]) -> Option<NuGetInstallTarget> {
    candidates
        .iter()
        .filter_map(|path| install_target_rank(path).map(|(rank, style)| (rank, path, style)))
        .min_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)))
        .map(|(_, path, style)| NuGetInstallTarget {
            path: path.clone(),
            style,
        })
}

fn style_in_dir(fs: &dyn ManifestFs, dir: &Path) -> Option<NuGetManagementStyle> {
    if fs.exists(&dir.join("paket.dependencies")) {
        return Some(NuGetManagementStyle::Paket);
    }
    if fs.exists(&dir.join("Directory.Packages.props")) {
        return Some(NuGetManagementStyle::CentralPackageManagement);
    }
    if fs.exists(&dir.join("packages.config")) {
        return Some(NuGetManagementStyle::PackagesConfig);
    }
    let has_cake = fs
        .list_dir(dir)
        .iter()
        .any(|p| p.extension().and_then(|e| e.to_str()) == Some("cake"));
    has_cake.then_some(NuGetManagementStyle::Cake)
}

/// Detects the NuGet style in effect at `context`, walking up to its
/// workspace folder. The nearest directory with a marker decides; within a
/// directory Paket wins over CPM, then packages.config, then .cake scripts.
pub fn detect_nuget_management_style(
    fs: &dyn ManifestFs,
    context: &Path,
    folders: &[PathBuf],
) -> NuGetManagementStyle {
    let start = if fs.exists(context) && !fs.is_dir(context) {
        context.parent().unwrap_or(context)
    } else {
        context
    };
    let boundary = owning_workspace_folder(start, folders);

    for dir in start.ancestors() {
        if let Some(style) = style_in_dir(fs, dir) {
            return style;
        }
        match boundary {
            Some(folder) if dir == folder.as_path() => break,
            None => break,
            _ => {}
        }
    }
    NuGetManagementStyle::PackageReference
}
