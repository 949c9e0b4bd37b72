//! Core domain models for depscope
//!
//! This module contains the fundamental types used throughout the crate:
//! - Ecosystem and manifest kinds
//! - Dependency spec classification
//! - Installed package records and update types
//! - Workspace project graph structures

mod dependency_spec;
mod ecosystem;
mod installed_package;
mod workspace;

pub use dependency_spec::{
    format_dependency_spec_display, parse_dependency_spec, DependencySpec, SpecDisplayOptions,
    SpecKind,
};
pub use ecosystem::{Ecosystem, ManifestKind};
pub use installed_package::{
    DependencyType, InstalledPackage, ManifestOrigin, UpdateType,
};
pub use workspace::{
    MonorepoTool, WorkspaceAlignmentIssue, WorkspaceDependencyConsumer, WorkspaceProjectDependency,
    WorkspaceProjectGraph, WorkspaceProjectNode,
};
