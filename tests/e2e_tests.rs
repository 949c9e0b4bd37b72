//! End-to-end tests for the depscope CLI
//!
//! These tests verify:
//! - Text and JSON output of the offline commands
//! - `align` rewrites manifests and is idempotent
//! - Exit codes for success, errors and partial failures

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn depscope() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_depscope"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Create a pnpm monorepo with two projects and one .NET tool folder
fn create_test_project() -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let root = temp_dir.path();

    write(
        root,
        "package.json",
        r#"{
  "name": "shop",
  "private": true,
  "devDependencies": {
    "typescript": "~5.3.0"
  }
}"#,
    );
    write(root, "pnpm-workspace.yaml", "packages:\n  - 'packages/*'\n");
    write(
        root,
        "packages/ui/package.json",
        r#"{
  "name": "@shop/ui",
  "dependencies": {
    "react": "^17.0.2"
  }
}"#,
    );
    write(
        root,
        "packages/web/package.json",
        r#"{
  "name": "@shop/web",
  "dependencies": {
    "@shop/ui": "workspace:*",
    "react": "^18.2.0"
  }
}"#,
    );
    write(root, "tools/paket.dependencies", "nuget FAKE 5.23.1\n");

    temp_dir
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is not valid JSON")
}

mod tfm_command {
    use super::*;

    #[test]
    fn test_tfm_text_output() {
        depscope()
            .args(["tfm", ".NETStandard1.3"])
            .assert()
            .success()
            .stdout(predicate::str::contains(".NETStandard1.3 → netstandard1.3"))
            .stdout(predicate::str::is_match(r"(?m)^  netstandard1\.3\s+compatible$").unwrap())
            .stdout(predicate::str::is_match(r"(?m)^  net461\s+computed$").unwrap())
            .stdout(predicate::str::contains("net452").not());
    }

    #[test]
    fn test_tfm_json_output() {
        let output = depscope()
            .args(["tfm", ".NETFramework4.6.1", "--json"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let json = stdout_json(&output);
        assert!(json["generatedAt"].is_string());
        assert_eq!(json["tfm"]["declared"][0]["normalized"], "net461");
        assert_eq!(json["tfm"]["declared"][0]["display"], ".NETFramework 4.6.1");
        assert_eq!(json["tfm"]["frameworks"]["net461"], "compatible");
        assert_eq!(json["tfm"]["frameworks"]["net48"], "computed");
    }

    #[test]
    fn test_tfm_requires_arguments() {
        depscope().arg("tfm").assert().failure();
    }
}

mod workspace_commands {
    use super::*;

    #[test]
    fn test_list_text() {
        let project = create_test_project();
        depscope()
            .arg("list")
            .arg(project.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("packages/web/package.json (@shop/web) [npm]"))
            .stdout(predicate::str::contains("workspace local (workspace:*)"))
            .stdout(predicate::str::contains("FAKE"))
            .stdout(predicate::str::contains("5 packages in 4 manifests"));
    }

    #[test]
    fn test_list_quiet_prints_summary_only() {
        let project = create_test_project();
        depscope()
            .args(["list", "--quiet"])
            .arg(project.path())
            .assert()
            .success()
            .stdout("5 packages in 4 manifests\n");
    }

    #[test]
    fn test_list_json() {
        let project = create_test_project();
        let output = depscope()
            .args(["list", "--json"])
            .arg(project.path())
            .output()
            .unwrap();
        assert!(output.status.success());

        let json = stdout_json(&output);
        let packages = json["packages"].as_array().unwrap();
        assert_eq!(packages.len(), 5);

        let fake = packages.iter().find(|p| p["name"] == "FAKE").unwrap();
        assert_eq!(fake["ecosystem"], "nuget");
        assert_eq!(fake["currentVersion"], "5.23.1");

        let ui = packages.iter().find(|p| p["name"] == "@shop/ui").unwrap();
        assert_eq!(ui["specKind"], "workspace");
        assert_eq!(ui["isRegistryResolvable"], false);
        assert_eq!(ui["type"], "dependencies");
    }

    #[test]
    fn test_graph_text() {
        let project = create_test_project();
        depscope()
            .arg("graph")
            .arg(project.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("Tools: pnpm"))
            .stdout(predicate::str::contains("react: ^17.0.2, ^18.2.0"))
            .stdout(predicate::str::contains("    → @shop/ui"))
            .stdout(predicate::str::contains("3 projects, 1 alignment issues"));
    }

    #[test]
    fn test_graph_json() {
        let project = create_test_project();
        let output = depscope()
            .args(["graph", "--json"])
            .arg(project.path())
            .output()
            .unwrap();
        assert!(output.status.success());

        let json = stdout_json(&output);
        let graph = &json["graph"];
        assert_eq!(graph["tools"], serde_json::json!(["pnpm"]));
        assert_eq!(graph["projects"].as_array().unwrap().len(), 3);

        let issues = graph["alignmentIssues"].as_array().unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0]["packageName"], "react");
        assert_eq!(issues[0]["consumers"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_discover_reports_nuget_setup() {
        let project = create_test_project();
        let output = depscope()
            .args(["discover", "--json"])
            .arg(project.path().join("tools"))
            .output()
            .unwrap();
        assert!(output.status.success());

        let json = stdout_json(&output);
        let folder = &json["folders"][0];
        assert_eq!(folder["nugetStyle"], "paket");
        assert_eq!(folder["nugetInstallTarget"]["style"], "paket");
        assert_eq!(folder["manifests"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_discover_text() {
        let project = create_test_project();
        depscope()
            .arg("discover")
            .arg(project.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("NuGet style: PackageReference"))
            .stdout(predicate::str::contains("tools/paket.dependencies [NuGet]"))
            .stdout(predicate::str::contains("4 manifests"));
    }

    #[test]
    fn test_align_then_already_aligned() {
        let project = create_test_project();
        let root = project.path();

        depscope()
            .args(["align", "react", "^18.3.1"])
            .arg(root)
            .assert()
            .success()
            .stdout(predicate::str::contains("Aligned react to ^18.3.1 in 2 manifests"));

        let ui = fs::read_to_string(root.join("packages/ui/package.json")).unwrap();
        let web = fs::read_to_string(root.join("packages/web/package.json")).unwrap();
        assert!(ui.contains(r#""react": "^18.3.1""#));
        assert!(web.contains(r#""react": "^18.3.1""#));
        assert!(web.contains(r#""@shop/ui": "workspace:*""#));

        depscope()
            .args(["align", "react", "^18.3.1"])
            .arg(root)
            .assert()
            .success()
            .stdout(predicate::str::contains("react is already aligned to ^18.3.1"));

        depscope()
            .arg("graph")
            .arg(root)
            .assert()
            .success()
            .stdout(predicate::str::contains("3 projects, 0 alignment issues"));
    }

    #[test]
    fn test_outdated_without_candidates_is_offline() {
        let temp_dir = tempfile::tempdir().unwrap();
        write(
            temp_dir.path(),
            "package.json",
            r#"{"dependencies": {"lib": "file:./lib", "tool": "github:acme/tool"}}"#,
        );

        depscope()
            .arg("outdated")
            .arg(temp_dir.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("All 0 packages are up to date"));
    }

    #[test]
    fn test_outdated_unreachable_registry_is_partial_failure() {
        let temp_dir = tempfile::tempdir().unwrap();
        let root = temp_dir.path();
        write(root, "package.json", r#"{"dependencies": {"react": "^18.2.0"}}"#);
        write(
            root,
            "depscope.toml",
            "timeout_secs = 1\nnpm_registry_url = \"http://127.0.0.1:9\"\n",
        );

        let output = depscope()
            .args(["outdated", "--json"])
            .arg(root)
            .output()
            .unwrap();
        assert_eq!(output.status.code(), Some(2));

        let json = stdout_json(&output);
        assert_eq!(json["checked"], 1);
        assert_eq!(json["failedLookups"], serde_json::json!(["react"]));
    }
}

mod errors {
    use super::*;

    #[test]
    fn test_missing_directory_fails() {
        depscope()
            .args(["list", "/definitely/not/a/workspace"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Error:"));
    }

    #[test]
    fn test_invalid_config_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        write(temp_dir.path(), "depscope.toml", "batch_size = 0\n");

        depscope()
            .arg("list")
            .arg(temp_dir.path())
            .assert()
            .code(1)
            .stderr(predicate::str::contains("batch"));
    }

    #[test]
    fn test_unknown_subcommand() {
        depscope()
            .arg("upgrade-everything")
            .assert()
            .failure()
            .stderr(predicate::str::contains("unrecognized subcommand"));
    }

    #[test]
    fn test_version_flag() {
        depscope()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::starts_with("depscope "));
    }
}
