//! depscope - workspace dependency intelligence CLI
//!
//! Reads npm, Maven and NuGet manifests across monorepo layouts:
//! - package.json (npm/yarn/pnpm workspaces, Lerna, Nx)
//! - pom.xml
//! - Directory.Packages.props, paket.dependencies, .cake scripts

use clap::Parser;
use depscope::cache::PackageScope;
use depscope::cli::{CliArgs, Command};
use depscope::config::EngineConfig;
use depscope::error::IoError;
use depscope::manifest::LocalFs;
use depscope::output::{
    create_formatter, FolderDiscovery, OutputConfig, OutputFormatter, TfmReport,
};
use depscope::progress::Progress;
use depscope::registry::Registries;
use depscope::service::WorkspaceService;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Exit code when the command finished but some lookups or writes failed
const PARTIAL_FAILURE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "depscope=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn resolve_folders(paths: &[PathBuf]) -> Result<Vec<PathBuf>, IoError> {
    let mut folders: Vec<PathBuf> = Vec::new();
    for path in paths {
        if !path.is_dir() {
            return Err(IoError::directory_not_found(path));
        }
        let folder = path
            .canonicalize()
            .map_err(|e| IoError::generic(path, e))?;
        if !folders.contains(&folder) {
            folders.push(folder);
        }
    }
    Ok(folders)
}

fn load_config(explicit: Option<&Path>, folders: &[PathBuf]) -> anyhow::Result<EngineConfig> {
    let config = match (explicit, folders.first()) {
        (Some(path), _) => EngineConfig::load(path)?,
        (None, Some(root)) => EngineConfig::discover(root)?,
        (None, None) => EngineConfig::default(),
    };
    Ok(config)
}

/// Main application logic. `tfm` has no paths and runs without folders.
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let output_config = OutputConfig::from_cli(args.json, args.verbose, args.quiet)
        .with_color(io::stdout().is_terminal());
    let formatter = create_formatter(output_config);

    let folders = resolve_folders(args.command.paths())?;
    let config = load_config(args.config.as_deref(), &folders)?;
    tracing::debug!("workspace folders: {:?}", folders);

    let service = WorkspaceService::new(Arc::new(LocalFs), folders.clone(), config);
    let mut progress = Progress::new(args.show_progress());

    execute(&args, service, &folders, &mut progress, formatter.as_ref()).await
}

async fn execute(
    args: &CliArgs,
    service: WorkspaceService,
    folders: &[PathBuf],
    progress: &mut Progress,
    formatter: &dyn OutputFormatter,
) -> anyhow::Result<ExitCode> {
    let mut out: Vec<u8> = Vec::new();
    let mut exit_code = ExitCode::SUCCESS;

    match &args.command {
        Command::List { .. } => {
            progress.spinner("Reading manifests...");
            let packages = service.get_installed_packages().await;
            progress.finish_and_clear();
            formatter.format_packages(&packages, &mut out)?;
        }
        Command::Outdated { manifest, .. } => {
            let registries = Registries::from_config(service.config())?;
            let service = service.with_registry(Arc::new(registries));
            let scope = match manifest {
                Some(path) => Some(PackageScope::Manifest(
                    path.canonicalize().map_err(|e| IoError::generic(path, e))?,
                )),
                None => None,
            };

            progress.spinner("Checking registries...");
            let check = service.check_updates(scope).await?;
            progress.finish_and_clear();

            formatter.format_update_check(&check, &mut out)?;
            if !check.failed_lookups.is_empty() {
                exit_code = ExitCode::from(PARTIAL_FAILURE);
            }
        }
        Command::Graph { .. } => {
            progress.spinner("Building project graph...");
            let graph = service.get_workspace_project_graph();
            progress.finish_and_clear();
            formatter.format_graph(&graph, &mut out)?;
        }
        Command::Align {
            package, version, ..
        } => {
            let outcome = service
                .align_workspace_dependency_versions(package, version)
                .await;
            formatter.format_alignment(package, version, &outcome, &mut out)?;
            if !outcome.failed_manifests.is_empty() {
                exit_code = ExitCode::from(PARTIAL_FAILURE);
            }
        }
        Command::Discover { .. } => {
            progress.spinner("Discovering manifests...");
            let manifests = service.discover_manifests();
            let report: Vec<FolderDiscovery> = folders
                .iter()
                .map(|folder| FolderDiscovery {
                    folder: folder.clone(),
                    nuget_style: service.nuget_management_style(folder),
                    nuget_install_target: service.nuget_install_target(folder),
                    manifests: manifests
                        .iter()
                        .filter(|m| m.workspace_folder == *folder)
                        .cloned()
                        .collect(),
                })
                .collect();
            progress.finish_and_clear();
            formatter.format_discovery(&report, &mut out)?;
        }
        Command::Tfm { frameworks } => {
            formatter.format_tfms(&TfmReport::compute(frameworks), &mut out)?;
        }
    }

    let mut stdout = io::stdout().lock();
    stdout.write_all(&out)?;
    stdout.flush()?;
    Ok(exit_code)
}
