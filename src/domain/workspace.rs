//! Workspace project graph model

use super::{DependencyType, SpecKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Monorepo orchestration convention owning a workspace folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonorepoTool {
    Nx,
    Lerna,
    Pnpm,
    /// npm/yarn `workspaces` field
    Workspaces,
    Plain,
}

impl fmt::Display for MonorepoTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MonorepoTool::Nx => "nx",
            MonorepoTool::Lerna => "lerna",
            MonorepoTool::Pnpm => "pnpm",
            MonorepoTool::Workspaces => "workspaces",
            MonorepoTool::Plain => "plain",
        };
        f.write_str(s)
    }
}

/// A dependency declared by a workspace project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceProjectDependency {
    pub name: String,
    /// Raw declared spec
    pub spec: String,
    #[serde(rename = "type")]
    pub dep_type: DependencyType,
    pub spec_kind: SpecKind,
    /// Manifest of the in-workspace project this resolves to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_project_path: Option<PathBuf>,
}

/// A project discovered in the workspace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceProjectNode {
    pub name: String,
    /// Unique key of the node
    pub manifest_path: PathBuf,
    pub workspace_folder_path: PathBuf,
    /// Project directory relative to its workspace folder (`.` for the root)
    pub relative_path: String,
    pub tool: MonorepoTool,
    pub dependencies: Vec<WorkspaceProjectDependency>,
    pub local_dependencies: Vec<PathBuf>,
    pub local_dependents: Vec<PathBuf>,
}

/// A project declaring a dependency involved in an alignment issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceDependencyConsumer {
    pub project_name: String,
    pub manifest_path: PathBuf,
    pub relative_path: String,
    pub spec: String,
    #[serde(rename = "type")]
    pub dep_type: DependencyType,
}

/// Divergent specs declared for one package across projects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceAlignmentIssue {
    pub package_name: String,
    /// Distinct raw specs, sorted
    pub specs: Vec<String>,
    pub consumers: Vec<WorkspaceDependencyConsumer>,
}

/// Snapshot of all projects in the workspace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceProjectGraph {
    pub tools: Vec<MonorepoTool>,
    pub projects: Vec<WorkspaceProjectNode>,
    pub alignment_issues: Vec<WorkspaceAlignmentIssue>,
}

impl WorkspaceProjectGraph {
    /// Looks up a project by manifest path
    pub fn project(&self, manifest_path: &std::path::Path) -> Option<&WorkspaceProjectNode> {
        self.projects.iter().find(|p| p.manifest_path == manifest_path)
    }

    /// Looks up a project by package name
    pub fn project_by_name(&self, name: &str) -> Option<&WorkspaceProjectNode> {
        self.projects.iter().find(|p| p.name == name)
    }
}
