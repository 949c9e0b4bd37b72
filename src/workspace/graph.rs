//! Workspace project graph construction
//!
//! Nodes are built for every package.json first; local edges are resolved in
//! a second pass so an edge never points at a node that does not exist.

use crate::domain::{
    parse_dependency_spec, MonorepoTool, WorkspaceAlignmentIssue, WorkspaceDependencyConsumer,
    WorkspaceProjectDependency, WorkspaceProjectGraph, WorkspaceProjectNode,
};
use crate::manifest::{
    declared_dependencies, local_manifest_target, owning_workspace_folder, package_json_workspaces,
    package_name, parse_package_json, relative_display_path, ManifestFs, PNPM_WORKSPACE_FILE,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Detects the monorepo tool owning a workspace folder.
///
/// First match wins: nx.json, lerna.json, pnpm-workspace.yaml, a
/// `workspaces` field in the root package.json.
pub fn detect_monorepo_tool(fs: &dyn ManifestFs, folder: &Path) -> MonorepoTool {
    if fs.exists(&folder.join("nx.json")) {
        return MonorepoTool::Nx;
    }
    if fs.exists(&folder.join("lerna.json")) {
        return MonorepoTool::Lerna;
    }
    if fs.exists(&folder.join(PNPM_WORKSPACE_FILE)) {
        return MonorepoTool::Pnpm;
    }

    let root_manifest = folder.join("package.json");
    let declares_workspaces = fs
        .read_to_string(&root_manifest)
        .ok()
        .and_then(|content| parse_package_json(&content, &root_manifest).ok())
        .is_some_and(|value| !package_json_workspaces(&value).is_empty());
    if declares_workspaces {
        MonorepoTool::Workspaces
    } else {
        MonorepoTool::Plain
    }
}

fn project_dir_name(manifest_path: &Path) -> String {
    manifest_path
        .parent()
        .and_then(|dir| dir.file_name())
        .and_then(|name| name.to_str())
        .unwrap_or("root")
        .to_string()
}

fn build_node(
    fs: &dyn ManifestFs,
    manifest_path: &Path,
    folder: &Path,
    tool: MonorepoTool,
) -> Option<WorkspaceProjectNode> {
    let content = match fs.read_to_string(manifest_path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!("skipping project: {}", e);
            return None;
        }
    };
    let package_json = match parse_package_json(&content, manifest_path) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("skipping project: {}", e);
            return None;
        }
    };

    let dependencies = declared_dependencies(&package_json)
        .into_iter()
        .map(|(name, spec, dep_type)| WorkspaceProjectDependency {
            spec_kind: parse_dependency_spec(&spec).kind,
            name,
            spec,
            dep_type,
            local_project_path: None,
        })
        .collect();

    let project_dir = manifest_path.parent().unwrap_or(folder);
    Some(WorkspaceProjectNode {
        name: package_name(&package_json).unwrap_or_else(|| project_dir_name(manifest_path)),
        manifest_path: manifest_path.to_path_buf(),
        workspace_folder_path: folder.to_path_buf(),
        relative_path: relative_display_path(project_dir, folder),
        tool,
        dependencies,
        local_dependencies: Vec::new(),
        local_dependents: Vec::new(),
    })
}

/// Resolves every dependency to an in-workspace project where possible:
/// by project name first, then by `file:`/path spec target.
fn link_local_dependencies(projects: &mut [WorkspaceProjectNode]) {
    let known: BTreeSet<PathBuf> = projects.iter().map(|p| p.manifest_path.clone()).collect();
    let mut by_name: HashMap<String, PathBuf> = HashMap::new();
    for project in projects.iter() {
        by_name
            .entry(project.name.clone())
            .or_insert_with(|| project.manifest_path.clone());
    }

    for project in projects.iter_mut() {
        let own_path = project.manifest_path.clone();
        let mut local = BTreeSet::new();

        for dependency in project.dependencies.iter_mut() {
            if dependency.local_project_path.is_none() {
                dependency.local_project_path = match by_name.get(&dependency.name) {
                    Some(target) if *target != own_path => Some(target.clone()),
                    _ if dependency.spec_kind.is_path_like() => {
                        local_manifest_target(&parse_dependency_spec(&dependency.spec), &own_path)
                            .filter(|target| known.contains(target) && *target != own_path)
                    }
                    _ => None,
                };
            }
            if let Some(target) = &dependency.local_project_path {
                local.insert(target.clone());
            }
        }

        project.local_dependencies = local.into_iter().collect();
    }

    let mut dependents: BTreeMap<PathBuf, BTreeSet<PathBuf>> = BTreeMap::new();
    for project in projects.iter() {
        for target in &project.local_dependencies {
            dependents
                .entry(target.clone())
                .or_default()
                .insert(project.manifest_path.clone());
        }
    }
    for project in projects.iter_mut() {
        project.local_dependents = dependents
            .remove(&project.manifest_path)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();
    }
}

/// Groups non-local declarations by package name and reports names declared
/// with two or more distinct specs
pub fn find_alignment_issues(projects: &[WorkspaceProjectNode]) -> Vec<WorkspaceAlignmentIssue> {
    let mut grouped: BTreeMap<&str, Vec<WorkspaceDependencyConsumer>> = BTreeMap::new();
    for project in projects {
        for dependency in &project.dependencies {
            if dependency.spec_kind.is_local() {
                continue;
            }
            grouped
                .entry(dependency.name.as_str())
                .or_default()
                .push(WorkspaceDependencyConsumer {
                    project_name: project.name.clone(),
                    manifest_path: project.manifest_path.clone(),
                    relative_path: project.relative_path.clone(),
                    spec: dependency.spec.clone(),
                    dep_type: dependency.dep_type,
                });
        }
    }

    grouped
        .into_iter()
        .filter_map(|(name, mut consumers)| {
            let specs: BTreeSet<String> = consumers.iter().map(|c| c.spec.clone()).collect();
            if specs.len() < 2 {
                return None;
            }
            consumers.sort_by(|a, b| {
                a.relative_path
                    .cmp(&b.relative_path)
                    .then_with(|| a.manifest_path.cmp(&b.manifest_path))
                    .then_with(|| a.dep_type.field_name().cmp(b.dep_type.field_name()))
            });
            Some(WorkspaceAlignmentIssue {
                package_name: name.to_string(),
                specs: specs.into_iter().collect(),
                consumers,
            })
        })
        .collect()
}

/// Builds the project graph from package.json manifests under `folders`
pub fn build_workspace_project_graph(
    fs: &dyn ManifestFs,
    folders: &[PathBuf],
    package_manifests: &[PathBuf],
) -> WorkspaceProjectGraph {
    let tools: BTreeMap<&PathBuf, MonorepoTool> = folders
        .iter()
        .map(|folder| (folder, detect_monorepo_tool(fs, folder)))
        .collect();

    let mut projects: Vec<WorkspaceProjectNode> = package_manifests
        .iter()
        .filter_map(|manifest| {
            let folder = owning_workspace_folder(manifest, folders)?;
            let tool = tools.get(folder).copied().unwrap_or(MonorepoTool::Plain);
            build_node(fs, manifest, folder, tool)
        })
        .collect();

    projects.sort_by(|a, b| {
        a.relative_path
            .cmp(&b.relative_path)
            .then_with(|| a.manifest_path.cmp(&b.manifest_path))
    });
    link_local_dependencies(&mut projects);
    let alignment_issues = find_alignment_issues(&projects);

    let used_tools: BTreeSet<MonorepoTool> = projects.iter().map(|p| p.tool).collect();
    tracing::debug!(
        "workspace graph: {} projects, {} alignment issues",
        projects.len(),
        alignment_issues.len()
    );

    WorkspaceProjectGraph {
        tools: used_tools.into_iter().collect(),
        projects,
        alignment_issues,
    }
}
