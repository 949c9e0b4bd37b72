//! File system capability used by discovery, readers and writers
//!
//! Everything that touches disk goes through [`ManifestFs`] so the engine can
//! run against an in-memory tree in tests.

use crate::error::ManifestError;
use glob::{MatchOptions, Pattern};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories never descended into during a search
const PRUNED_DIRS: &[&str] = &["node_modules", ".git"];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Abstract manifest read/write/search capability
pub trait ManifestFs: Send + Sync {
    /// Read a whole file as text
    fn read_to_string(&self, path: &Path) -> Result<String, ManifestError>;

    /// Replace the contents of a file
    fn write(&self, path: &Path, content: &str) -> Result<(), ManifestError>;

    /// Whether a file or directory exists
    fn exists(&self, path: &Path) -> bool;

    /// Whether a path is a directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Entries directly inside a directory
    fn list_dir(&self, dir: &Path) -> Vec<PathBuf>;

    /// Files under `root` whose root-relative path matches `pattern` and no
    /// pattern in `excludes`. Results are sorted.
    fn find_files(&self, root: &Path, pattern: &str, excludes: &[String]) -> Vec<PathBuf>;
}

/// [`ManifestFs`] over the local disk
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl ManifestFs for LocalFs {
    fn read_to_string(&self, path: &Path) -> Result<String, ManifestError> {
        std::fs::read_to_string(path).map_err(|e| ManifestError::read_error(path, e))
    }

    fn write(&self, path: &Path, content: &str) -> Result<(), ManifestError> {
        std::fs::write(path, content).map_err(|e| ManifestError::write_error(path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_dir(&self, dir: &Path) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
        paths.sort();
        paths
    }

    fn find_files(&self, root: &Path, pattern: &str, excludes: &[String]) -> Vec<PathBuf> {
        let Ok(include) = Pattern::new(pattern) else {
            tracing::warn!("ignoring invalid glob pattern {}", pattern);
            return Vec::new();
        };
        let excludes = compile_patterns(excludes);

        let walker = WalkDir::new(root).follow_links(false);
        let mut matches: Vec<PathBuf> = walker
            .into_iter()
            .filter_entry(|e| {
                let name = e.file_name().to_str().unwrap_or("");
                !(e.file_type().is_dir() && PRUNED_DIRS.contains(&name))
            })
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let relative = relative_slash_path(e.path(), root)?;
                let included = include.matches_with(&relative, MATCH_OPTIONS);
                let excluded = excludes
                    .iter()
                    .any(|p| p.matches_with(&relative, MATCH_OPTIONS));
                (included && !excluded).then(|| e.into_path())
            })
            .collect();
        matches.sort();
        matches
    }
}

/// Compiles glob patterns, dropping invalid ones
fn compile_patterns(patterns: &[String]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|p| match Pattern::new(p) {
            Ok(pattern) => Some(pattern),
            Err(e) => {
                tracing::warn!("ignoring invalid glob pattern {}: {}", p, e);
                None
            }
        })
        .collect()
}

/// `path` relative to `root`, joined with `/` on every platform
pub(crate) fn relative_slash_path(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .filter_map(|c| c.as_os_str().to_str())
        .collect();
    Some(parts.join("/"))
}
