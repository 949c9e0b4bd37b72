//! depscope - workspace dependency intelligence library
//!
//! This library discovers and reads dependency manifests across monorepo
//! layouts and reasons about their versions:
//! - npm (package.json with npm/yarn/pnpm workspaces, Lerna, Nx)
//! - Maven (pom.xml)
//! - NuGet (Directory.Packages.props, paket.dependencies, .cake scripts)
//!
//! On top of the aggregated package list it provides registry-backed update
//! checks, a workspace project graph with version alignment diagnostics and
//! NuGet target framework compatibility.

pub mod cache;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod manifest;
pub mod nuget;
pub mod output;
pub mod progress;
pub mod registry;
pub mod service;
pub mod update;
pub mod workspace;
