//! CLI argument parsing module for depscope

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Workspace dependency intelligence for npm, Maven and NuGet manifests
#[derive(Parser, Debug, Clone)]
#[command(name = "depscope", version, about)]
pub struct CliArgs {
    /// Config file (default: depscope.toml in the first workspace folder)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output and debug logs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable quiet mode - summary lines only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List installed packages across all manifests
    List {
        /// Workspace folders
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,
    },

    /// Check the registries for newer versions
    Outdated {
        /// Workspace folders
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Only check packages declared in this manifest
        #[arg(long)]
        manifest: Option<PathBuf>,
    },

    /// Show the workspace project graph and version alignment issues
    Graph {
        /// Workspace folders
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,
    },

    /// Set one dependency to the same spec in every package.json
    Align {
        /// Package name
        package: String,

        /// Target spec, e.g. ^2.0.0
        version: String,

        /// Workspace folders
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,
    },

    /// Normalize target framework monikers and list compatible frameworks
    Tfm {
        /// Declared frameworks, e.g. .NETStandard1.3 net472
        #[arg(required = true)]
        frameworks: Vec<String>,
    },

    /// List discovered manifests and the NuGet management style per folder
    Discover {
        /// Workspace folders
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,
    },
}

impl Command {
    /// Workspace folders the command operates on
    pub fn paths(&self) -> &[PathBuf] {
        match self {
            Command::List { paths }
            | Command::Outdated { paths, .. }
            | Command::Graph { paths }
            | Command::Align { paths, .. }
            | Command::Discover { paths } => paths,
            Command::Tfm { .. } => &[],
        }
    }
}

impl CliArgs {
    /// Whether spinners may be drawn
    pub fn show_progress(&self) -> bool {
        !self.quiet && !self.json
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let args = CliArgs::parse_from(["depscope", "list"]);
        assert_eq!(args.command.paths(), &[PathBuf::from(".")]);
        assert!(!args.json);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = CliArgs::parse_from(["depscope", "graph", "repo", "--json", "--verbose"]);
        assert!(args.json);
        assert!(args.verbose);
        assert!(!args.show_progress());
        assert_eq!(args.command.paths(), &[PathBuf::from("repo")]);
    }

    #[test]
    fn test_outdated_manifest_filter() {
        let args = CliArgs::parse_from([
            "depscope",
            "outdated",
            "a",
            "b",
            "--manifest",
            "a/package.json",
        ]);
        match args.command {
            Command::Outdated { paths, manifest } => {
                assert_eq!(paths.len(), 2);
                assert_eq!(manifest, Some(PathBuf::from("a/package.json")));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_align_arguments() {
        let args = CliArgs::parse_from(["depscope", "align", "react", "^18.3.1"]);
        match args.command {
            Command::Align {
                package,
                version,
                paths,
            } => {
                assert_eq!(package, "react");
                assert_eq!(version, "^18.3.1");
                assert_eq!(paths, vec![PathBuf::from(".")]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_tfm_requires_frameworks() {
        assert!(CliArgs::try_parse_from(["depscope", "tfm"]).is_err());
        let args = CliArgs::try_parse_from(["depscope", "tfm", ".NETStandard1.3"]).unwrap();
        assert!(matches!(args.command, Command::Tfm { .. }));
    }
}
