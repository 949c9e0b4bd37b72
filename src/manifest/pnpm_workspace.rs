//! pnpm-workspace.yaml reader
//!
//! Only the top-level `packages:` list is read, line by line:
//!
//! ```yaml
//! packages:
//!   - 'packages/*'
//!   - "!**/test/**"
//! ```
//!
//! The list ends at the first unindented line that is not a list item.

/// Workspace file name
pub const PNPM_WORKSPACE_FILE: &str = "pnpm-workspace.yaml";

/// Extract the `packages` glob patterns from pnpm-workspace.yaml content
pub fn parse_pnpm_workspace_packages(content: &str) -> Vec<String> {
    let mut patterns = Vec::new();
    let mut in_packages = false;

    for line in content.lines() {
        let trimmed = line.trim();

        if !in_packages {
            if line.starts_with("packages:") {
                in_packages = true;
            }
            continue;
        }

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let indented = line.starts_with(' ') || line.starts_with('\t');
        if let Some(item) = trimmed.strip_prefix('-') {
            let pattern = strip_inline_comment(item.trim())
                .trim_matches('\'')
                .trim_matches('"');
            if !pattern.is_empty() {
                patterns.push(pattern.to_string());
            }
        } else if !indented {
            break;
        }
    }

    patterns
}

fn strip_inline_comment(value: &str) -> &str {
    match value.find(" #") {
        Some(idx) => value[..idx].trim_end(),
        None => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_quoted_patterns() {
        let content = "packages:\n  - 'packages/*'\n  - \"apps/*\"\n  - tools\n";
        assert_eq!(
            parse_pnpm_workspace_packages(content),
            vec!["packages/*", "apps/*", "tools"]
        );
    }

    #[test]
    fn test_parse_stops_at_next_key() {
        let content = "packages:\n  - 'packages/*'\ncatalog:\n  - 'ignored/*'\n";
        assert_eq!(parse_pnpm_workspace_packages(content), vec!["packages/*"]);
    }

    #[test]
    fn test_parse_keeps_exclusions_and_skips_comments() {
        let content = "# workspace\npackages:\n  # libraries\n  - 'libs/**'\n\n  - '!**/test/**' # no fixtures\n";
        assert_eq!(
            parse_pnpm_workspace_packages(content),
            vec!["libs/**", "!**/test/**"]
        );
    }

    #[test]
    fn test_parse_without_packages_key() {
        assert!(parse_pnpm_workspace_packages("onlyBuiltDependencies:\n  - esbuild\n").is_empty());
    }
}
