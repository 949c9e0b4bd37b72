//! Workspace project graph
//!
//! This module provides:
//! - Monorepo tool detection per workspace folder
//! - Project nodes with local dependency and dependent edges
//! - Version alignment diagnostics across projects

mod graph;

pub use graph::{build_workspace_project_graph, detect_monorepo_tool, find_alignment_issues};
