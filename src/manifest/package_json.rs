//! package.json reader and writer
//!
//! Handles:
//! - dependencies
//! - devDependencies
//! - peerDependencies
//! - optionalDependencies
//!
//! Rewrites splice only the changed buckets into the original text, sorted
//! alphabetically and indented like the rest of the file. Every other byte
//! is kept; single-line documents are pretty-printed as a whole.

use crate::domain::{
    format_dependency_spec_display, parse_dependency_spec, DependencySpec, DependencyType,
    InstalledPackage, ManifestKind, ManifestOrigin, SpecDisplayOptions, SpecKind,
};
use crate::error::ManifestError;
use crate::manifest::ManifestFs;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::ops::Range;
use std::path::{Component, Path, PathBuf};

/// Parse package.json content
pub fn parse_package_json(content: &str, path: &Path) -> Result<Value, ManifestError> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| ManifestError::json_parse_error(path, e.to_string()))?;
    if !value.is_object() {
        return Err(ManifestError::json_parse_error(path, "top-level value is not an object"));
    }
    Ok(value)
}

/// The `name` field, when present and non-empty
pub fn package_name(package_json: &Value) -> Option<String> {
    package_json
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
        .map(str::to_string)
}

/// `(name, raw spec, bucket)` for every string entry of the four buckets
pub fn declared_dependencies(package_json: &Value) -> Vec<(String, String, DependencyType)> {
    let mut declared = Vec::new();
    for dep_type in DependencyType::all() {
        let Some(bucket) = package_json
            .get(dep_type.field_name())
            .and_then(Value::as_object)
        else {
            continue;
        };
        for (name, spec) in bucket {
            if let Some(spec) = spec.as_str() {
                declared.push((name.clone(), spec.to_string(), *dep_type));
            }
        }
    }
    declared
}

/// Lexically resolves `.` and `..` without touching the disk
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Manifest a `file:`/path spec points at, relative to the declaring manifest
pub fn local_manifest_target(spec: &DependencySpec, manifest_path: &Path) -> Option<PathBuf> {
    let target = spec.local_target()?.replace('\\', "/");
    let base = manifest_path.parent()?;
    let resolved = normalize_path(&base.join(target));
    if resolved.file_name().and_then(|n| n.to_str()) == Some("package.json") {
        Some(resolved)
    } else {
        Some(resolved.join("package.json"))
    }
}

/// Names a workspace-local spec is compared against to detect self references
#[derive(Debug, Clone, Default)]
pub struct LocalNames<'a> {
    /// Name of the declaring project
    pub project: Option<&'a str>,
    /// Name of the workspace folder's root package.json
    pub root: Option<&'a str>,
}

impl LocalNames<'_> {
    fn is_self(&self, name: &str) -> bool {
        self.project == Some(name) || self.root == Some(name)
    }
}

fn display_options(
    fs: &dyn ManifestFs,
    name: &str,
    spec: &DependencySpec,
    manifest_path: &Path,
    names: &LocalNames<'_>,
) -> SpecDisplayOptions {
    match spec.kind {
        SpecKind::Workspace => SpecDisplayOptions {
            workspace_local: true,
            workspace_self: names.is_self(name),
        },
        SpecKind::File | SpecKind::Path => {
            let target_name = local_manifest_target(spec, manifest_path)
                .filter(|target| fs.exists(target))
                .and_then(|target| fs.read_to_string(&target).ok())
                .and_then(|content| serde_json::from_str::<Value>(&content).ok())
                .and_then(|value| package_name(&value));
            match target_name {
                Some(target) => SpecDisplayOptions {
                    workspace_local: true,
                    workspace_self: names.is_self(&target),
                },
                None => SpecDisplayOptions::default(),
            }
        }
        _ => SpecDisplayOptions::default(),
    }
}

/// Reads the installed packages declared by one package.json
pub fn read_package_json_packages(
    fs: &dyn ManifestFs,
    path: &Path,
    workspace_folder: &Path,
    root_name: Option<&str>,
) -> Result<Vec<InstalledPackage>, ManifestError> {
    let content = fs.read_to_string(path)?;
    let package_json = parse_package_json(&content, path)?;
    let project_name = package_name(&package_json);

    let mut origin = ManifestOrigin::new(path, workspace_folder, ManifestKind::PackageJson);
    if let Some(name) = &project_name {
        origin = origin.with_name(name.clone());
    }
    let names = LocalNames {
        project: project_name.as_deref(),
        root: root_name,
    };

    let packages = declared_dependencies(&package_json)
        .into_iter()
        .map(|(name, raw, dep_type)| {
            let spec = parse_dependency_spec(&raw);
            let options = display_options(fs, &name, &spec, path, &names);
            InstalledPackage {
                current_version: format_dependency_spec_display(&spec, options),
                resolved_version: spec.normalized_version.clone(),
                version_specifier: raw,
                spec_kind: spec.kind,
                is_registry_resolvable: spec.is_registry_resolvable,
                dep_type,
                package_json_path: origin.path.clone(),
                workspace_folder_path: origin.workspace_folder.clone(),
                manifest_name: origin.name.clone(),
                manifest_kind: origin.kind,
                ecosystem: origin.kind.ecosystem(),
                has_update: false,
                latest_version: None,
                update_type: None,
                name,
            }
        })
        .collect();

    Ok(packages)
}

fn sort_bucket(bucket: &Map<String, Value>) -> Map<String, Value> {
    let mut entries: Vec<(&String, &Value)> = bucket.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
        .into_iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Serialize with 2-space indentation and a trailing newline
pub fn to_pretty_json(value: &Value) -> String {
    let mut output = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    output.push('\n');
    output
}

/// Index of the closing quote of the string opened at `start`
fn string_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// Index of the `}` closing the object opened at `open`
fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => i = string_end(bytes, i)?,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Byte range of the object value of top-level `key`
fn top_level_object_span(content: &str, key: &str) -> Option<Range<usize>> {
    let bytes = content.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'"' => {
                let end = string_end(bytes, i)?;
                if depth == 1 && &content[i + 1..end] == key {
                    let colon = skip_whitespace(bytes, end + 1);
                    if bytes.get(colon) == Some(&b':') {
                        let open = skip_whitespace(bytes, colon + 1);
                        if bytes.get(open) == Some(&b'{') {
                            return matching_brace(bytes, open).map(|close| open..close + 1);
                        }
                    }
                }
                i = end;
            }
            b'{' | b'[' => depth += 1,
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Leading whitespace of the first indented line
fn detect_indent(content: &str) -> Option<&str> {
    content.lines().skip(1).find_map(|line| {
        let trimmed = line.trim_start();
        let width = line.len() - trimmed.len();
        (width > 0 && !trimmed.is_empty()).then(|| &line[..width])
    })
}

fn render_bucket(bucket: &Value, indent: &str) -> Option<String> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    bucket.serialize(&mut serializer).ok()?;
    let rendered = String::from_utf8(buffer).ok()?;
    Some(rendered.replace('\n', &format!("\n{}", indent)))
}

/// Replaces the text of each rewritten bucket in `content`, keeping every
/// other byte. Single-line documents are re-serialized as a whole.
fn splice_buckets(content: &str, package_json: &Value, fields: &[&str]) -> String {
    let Some(indent) = detect_indent(content) else {
        return to_pretty_json(package_json);
    };

    let mut replacements = Vec::new();
    for field in fields {
        let rendered = package_json
            .get(*field)
            .and_then(|bucket| render_bucket(bucket, indent));
        match (top_level_object_span(content, field), rendered) {
            (Some(span), Some(text)) => replacements.push((span, text)),
            _ => return to_pretty_json(package_json),
        }
    }
    replacements.sort_by_key(|(span, _)| span.start);

    let mut updated = content.to_string();
    for (span, text) in replacements.into_iter().rev() {
        updated.replace_range(span, &text);
    }
    if !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated
}

/// Sets `package` to `new_spec` in every bucket that declares it.
///
/// With `resolvable_only`, entries whose current spec is not
/// registry-resolvable (workspace, file, path, git, unknown) are left alone.
/// Returns `None` when nothing changed.
pub fn update_package_json(
    content: &str,
    path: &Path,
    package: &str,
    new_spec: &str,
    resolvable_only: bool,
) -> Result<Option<String>, ManifestError> {
    let mut package_json = parse_package_json(content, path)?;
    let Some(root) = package_json.as_object_mut() else {
        return Ok(None);
    };

    let mut changed = Vec::new();
    for dep_type in DependencyType::all() {
        let Some(Value::Object(bucket)) = root.get_mut(dep_type.field_name()) else {
            continue;
        };
        let Some(current) = bucket.get(package).and_then(Value::as_str) else {
            continue;
        };
        if current == new_spec {
            continue;
        }
        if resolvable_only && !parse_dependency_spec(current).is_registry_resolvable {
            continue;
        }
        bucket.insert(package.to_string(), Value::String(new_spec.to_string()));
        *bucket = sort_bucket(bucket);
        changed.push(dep_type.field_name());
    }

    if changed.is_empty() {
        return Ok(None);
    }
    Ok(Some(splice_buckets(content, &package_json, &changed)))
}

/// Keeps the range operator of `current` in front of `version`
/// (`^1.2.3` + `2.0.0` -> `^2.0.0`)
pub fn spec_with_operator(current: &str, version: &str) -> String {
    let trimmed = current.trim();
    let operator: String = trimmed
        .chars()
        .take_while(|c| matches!(c, '^' | '~' | '<' | '>' | '='))
        .collect();
    format!("{}{}", operator, version)
}

/// Updates a dependency to a new registry version, keeping its range operator
pub fn update_package_json_version(
    content: &str,
    path: &Path,
    package: &str,
    version: &str,
) -> Result<String, ManifestError> {
    let package_json = parse_package_json(content, path)?;
    let current = declared_dependencies(&package_json)
        .into_iter()
        .find(|(name, raw, _)| name == package && parse_dependency_spec(raw).is_registry_resolvable)
        .map(|(_, raw, _)| raw)
        .ok_or_else(|| ManifestError::package_not_found(path, package))?;

    let new_spec = spec_with_operator(&current, version);
    Ok(update_package_json(content, path, package, &new_spec, true)?
        .unwrap_or_else(|| content.to_string()))
}
