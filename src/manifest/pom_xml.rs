//! pom.xml reader and writer
//!
//! Pattern-based, not a full XML parser. Accepted subset:
//! - `<dependency>` blocks inside `<dependencies>` blocks, except those
//!   under `<dependencyManagement>` or `<build>`
//! - `groupId`, `artifactId`, `version`, `scope`, `optional` child elements
//! - `${name}` versions resolved from the `<properties>` block
//!
//! Updates replace only the version text (or the referenced property value),
//! leaving every other byte of the document untouched.

use crate::domain::{DependencyType, InstalledPackage, ManifestKind, ManifestOrigin};
use crate::error::ManifestError;
use regex::Regex;
use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;

static DEPENDENCIES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<dependencies>(.*?)</dependencies>").unwrap());

// Dependency lists that are not the project's own: BOM pins and plugin dependencies
static MANAGED_SECTION_RES: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"(?s)<dependencyManagement>.*?</dependencyManagement>").unwrap(),
        Regex::new(r"(?s)<build>.*?</build>").unwrap(),
    ]
});

static DEPENDENCY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<dependency>(.*?)</dependency>").unwrap());

static PROPERTIES_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<properties>(.*?)</properties>").unwrap());

static PROPERTY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<([A-Za-z0-9_.\-]+)>\s*([^<]*?)\s*</([A-Za-z0-9_.\-]+)>").unwrap()
});

static PROPERTY_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$\{([^}]+)\}$").unwrap());

// Sections whose artifactId is not the project's own
static NESTED_SECTIONS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<(parent|dependencies|dependencyManagement|build|profiles|plugins)>.*?</(parent|dependencies|dependencyManagement|build|profiles|plugins)>")
        .unwrap()
});

fn element_re(tag: &str) -> Regex {
    Regex::new(&format!(r"(?s)<{tag}>\s*(.*?)\s*</{tag}>")).unwrap()
}

static GROUP_ID_RE: LazyLock<Regex> = LazyLock::new(|| element_re("groupId"));
static ARTIFACT_ID_RE: LazyLock<Regex> = LazyLock::new(|| element_re("artifactId"));
static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| element_re("version"));
static SCOPE_RE: LazyLock<Regex> = LazyLock::new(|| element_re("scope"));
static OPTIONAL_RE: LazyLock<Regex> = LazyLock::new(|| element_re("optional"));

/// One `<dependency>` block with byte offsets into the document
#[derive(Debug, Clone, PartialEq, Eq)]
struct PomDependency {
    group_id: String,
    artifact_id: String,
    version: Option<String>,
    /// Byte range of the version text
    version_span: Option<Range<usize>>,
    scope: Option<String>,
    optional: bool,
}

impl PomDependency {
    fn coordinate(&self) -> String {
        format!("{}:{}", self.group_id, self.artifact_id)
    }

    fn dependency_type(&self) -> DependencyType {
        if self.optional {
            DependencyType::OptionalDependencies
        } else {
            match self.scope.as_deref() {
                Some("test") => DependencyType::DevDependencies,
                Some("provided") => DependencyType::PeerDependencies,
                _ => DependencyType::Dependencies,
            }
        }
    }
}

fn capture_text(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn managed_sections(content: &str) -> Vec<Range<usize>> {
    MANAGED_SECTION_RES
        .iter()
        .flat_map(|re| re.find_iter(content).map(|m| m.range()))
        .collect()
}

fn scan_dependencies(content: &str) -> Vec<PomDependency> {
    let skipped = managed_sections(content);
    let mut dependencies = Vec::new();
    for block in DEPENDENCIES_RE.captures_iter(content) {
        let Some(body) = block.get(1) else { continue };
        if skipped.iter().any(|section| section.contains(&body.start())) {
            continue;
        }
        for dep in DEPENDENCY_RE.captures_iter(body.as_str()) {
            let Some(inner) = dep.get(1) else { continue };
            let text = inner.as_str();
            let (Some(group_id), Some(artifact_id)) = (
                capture_text(&GROUP_ID_RE, text),
                capture_text(&ARTIFACT_ID_RE, text),
            ) else {
                continue;
            };

            let offset = body.start() + inner.start();
            let version_match = VERSION_RE.captures(text).and_then(|c| c.get(1));
            dependencies.push(PomDependency {
                group_id,
                artifact_id,
                version: version_match.map(|m| m.as_str().to_string()),
                version_span: version_match.map(|m| offset + m.start()..offset + m.end()),
                scope: capture_text(&SCOPE_RE, text),
                optional: capture_text(&OPTIONAL_RE, text).as_deref() == Some("true"),
            });
        }
    }
    dependencies
}

/// Property name to (value, byte range of the value)
fn scan_properties(content: &str) -> HashMap<String, (String, Range<usize>)> {
    let mut properties = HashMap::new();
    for block in PROPERTIES_RE.captures_iter(content) {
        let Some(body) = block.get(1) else { continue };
        for prop in PROPERTY_RE.captures_iter(body.as_str()) {
            let (Some(open), Some(value), Some(close)) = (prop.get(1), prop.get(2), prop.get(3))
            else {
                continue;
            };
            if open.as_str() != close.as_str() {
                continue;
            }
            let start = body.start() + value.start();
            properties
                .entry(open.as_str().to_string())
                .or_insert((value.as_str().to_string(), start..start + value.len()));
        }
    }
    properties
}

fn property_reference(version: &str) -> Option<&str> {
    PROPERTY_REF_RE
        .captures(version)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Resolves `${name}` against the properties block; other values pass through
fn resolve_version(
    version: &str,
    properties: &HashMap<String, (String, Range<usize>)>,
) -> Option<String> {
    match property_reference(version) {
        Some(name) => properties
            .get(name)
            .map(|(value, _)| value.clone())
            .filter(|value| !value.is_empty() && !value.contains("${")),
        None => Some(version.to_string()),
    }
}

/// The project's own artifactId
pub fn project_artifact_id(content: &str) -> Option<String> {
    let top_level = NESTED_SECTIONS_RE.replace_all(content, "");
    capture_text(&ARTIFACT_ID_RE, &top_level)
}

/// Reads the installed packages declared by one pom.xml.
///
/// Dependencies without a resolvable version (managed by a parent or BOM)
/// are not tracked.
pub fn parse_pom_xml(
    content: &str,
    path: &Path,
    workspace_folder: &Path,
) -> Result<Vec<InstalledPackage>, ManifestError> {
    if !content.contains("<project") {
        return Err(ManifestError::markup_parse_error(path, "missing <project> element"));
    }

    let mut origin = ManifestOrigin::new(path, workspace_folder, ManifestKind::PomXml);
    if let Some(artifact_id) = project_artifact_id(content) {
        origin = origin.with_name(artifact_id);
    }
    let properties = scan_properties(content);

    let packages = scan_dependencies(content)
        .into_iter()
        .filter_map(|dep| {
            let version = resolve_version(dep.version.as_deref()?, &properties)?;
            Some(InstalledPackage::pinned(
                dep.coordinate(),
                version,
                dep.dependency_type(),
                &origin,
            ))
        })
        .collect();
    Ok(packages)
}

/// Sets the version of `package` (`groupId:artifactId`).
///
/// A literal version is replaced in place; a `${name}` version updates the
/// referenced property instead.
pub fn update_pom_version(
    content: &str,
    path: &Path,
    package: &str,
    new_version: &str,
) -> Result<String, ManifestError> {
    let properties = scan_properties(content);
    let mut spans: Vec<Range<usize>> = scan_dependencies(content)
        .into_iter()
        .filter(|dep| dep.coordinate() == package)
        .filter_map(|dep| {
            let version = dep.version?;
            match property_reference(&version) {
                Some(name) => properties.get(name).map(|(_, span)| span.clone()),
                None => dep.version_span,
            }
        })
        .collect();

    if spans.is_empty() {
        return Err(ManifestError::package_not_found(path, package));
    }

    // Several dependencies may share one property
    spans.sort_by_key(|span| span.start);
    spans.dedup();

    let mut updated = content.to_string();
    for span in spans.into_iter().rev() {
        updated.replace_range(span, new_version);
    }
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    const POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project>
  <parent>
    <groupId>org.springframework.boot</groupId>
    <artifactId>spring-boot-starter-parent</artifactId>
    <version>3.2.0</version>
  </parent>
  <artifactId>orders-service</artifactId>
  <properties>
    <jackson.version>2.15.2</jackson.version>
    <java.version>17</java.version>
  </properties>
  <dependencies>
    <dependency>
      <groupId>com.fasterxml.jackson.core</groupId>
      <artifactId>jackson-databind</artifactId>
      <version>${jackson.version}</version>
    </dependency>
    <dependency>
      <groupId>com.fasterxml.jackson.core</groupId>
      <artifactId>jackson-core</artifactId>
      <version>${jackson.version}</version>
    </dependency>
    <dependency>
      <groupId>org.junit.jupiter</groupId>
      <artifactId>junit-jupiter</artifactId>
      <version>5.10.0</version>
      <scope>test</scope>
    </dependency>
    <dependency>
      <groupId>jakarta.servlet</groupId>
      <artifactId>jakarta.servlet-api</artifactId>
      <version>6.0.0</version>
      <scope>provided</scope>
    </dependency>
    <dependency>
      <groupId>org.postgresql</groupId>
      <artifactId>postgresql</artifactId>
      <version>42.6.0</version>
      <optional>true</optional>
      <scope>test</scope>
    </dependency>
    <dependency>
      <groupId>org.springframework.boot</groupId>
      <artifactId>spring-boot-starter-web</artifactId>
    </dependency>
  </dependencies>
</project>
"#;

    fn parse(content: &str) -> Vec<InstalledPackage> {
        parse_pom_xml(content, Path::new("/repo/pom.xml"), Path::new("/repo")).unwrap()
    }

    #[test]
    fn test_parse_dependencies_with_scopes() {
        let packages = parse(POM);
        assert_eq!(packages.len(), 5);

        let find = |name: &str| packages.iter().find(|p| p.name == name).unwrap();
        assert_eq!(
            find("org.junit.jupiter:junit-jupiter").dep_type,
            DependencyType::DevDependencies
        );
        assert_eq!(
            find("jakarta.servlet:jakarta.servlet-api").dep_type,
            DependencyType::PeerDependencies
        );
        assert_eq!(
            find("org.postgresql:postgresql").dep_type,
            DependencyType::OptionalDependencies
        );
        assert_eq!(
            find("com.fasterxml.jackson.core:jackson-databind").current_version,
            "2.15.2"
        );
        assert!(packages.iter().all(|p| p.manifest_name == "orders-service"));
    }

    #[test]
    fn test_unresolvable_property_dropped() {
        let content = r#"<project><dependencies><dependency>
            <groupId>a</groupId><artifactId>b</artifactId><version>${missing}</version>
        </dependency></dependencies></project>"#;
        assert!(parse(content).is_empty());
    }

    #[test]
    fn test_not_a_pom_is_markup_error() {
        let err = parse_pom_xml("<settings/>", Path::new("pom.xml"), Path::new("/")).unwrap_err();
        assert!(matches!(err, ManifestError::MarkupParseError { .. }));
    }

    #[test]
    fn test_update_literal_version_in_place() {
        let updated = update_pom_version(
            POM,
            Path::new("pom.xml"),
            "org.junit.jupiter:junit-jupiter",
            "5.11.0",
        )
        .unwrap();
        assert_eq!(updated, POM.replace("<version>5.10.0</version>", "<version>5.11.0</version>"));
    }

    #[test]
    fn test_update_property_version() {
        let updated = update_pom_version(
            POM,
            Path::new("pom.xml"),
            "com.fasterxml.jackson.core:jackson-databind",
            "2.17.1",
        )
        .unwrap();
        assert!(updated.contains("<jackson.version>2.17.1</jackson.version>"));
        assert!(updated.contains("<version>${jackson.version}</version>"));
        assert_eq!(updated.len(), POM.len());
    }

    #[test]
    fn test_update_missing_package() {
        let err = update_pom_version(POM, Path::new("pom.xml"), "x:y", "1.0").unwrap_err();
        assert!(matches!(err, ManifestError::PackageNotFound { .. }));
    }

    const MANAGED_POM: &str = r#"<project>
  <artifactId>billing</artifactId>
  <dependencyManagement>
    <dependencies>
      <dependency>
        <groupId>org.springframework.boot</groupId>
        <artifactId>spring-boot-dependencies</artifactId>
        <version>3.2.0</version>
        <type>pom</type>
        <scope>import</scope>
      </dependency>
    </dependencies>
  </dependencyManagement>
  <dependencies>
    <dependency>
      <groupId>com.google.guava</groupId>
      <artifactId>guava</artifactId>
      <version>32.1.3-jre</version>
    </dependency>
  </dependencies>
  <build>
    <plugins>
      <plugin>
        <artifactId>maven-surefire-plugin</artifactId>
        <dependencies>
          <dependency>
            <groupId>org.junit.platform</groupId>
            <artifactId>junit-platform-launcher</artifactId>
            <version>1.10.0</version>
          </dependency>
        </dependencies>
      </plugin>
    </plugins>
  </build>
</project>
"#;

    #[test]
    fn test_managed_and_plugin_dependencies_ignored() {
        let packages = parse(MANAGED_POM);
        let names: Vec<&str> = packages.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["com.google.guava:guava"]);

        let err = update_pom_version(
            MANAGED_POM,
            Path::new("pom.xml"),
            "org.springframework.boot:spring-boot-dependencies",
            "3.3.0",
        )
        .unwrap_err();
        assert!(matches!(err, ManifestError::PackageNotFound { .. }));
    }

    #[test]
    fn test_project_artifact_id_skips_parent() {
        assert_eq!(project_artifact_id(POM).as_deref(), Some("orders-service"));
    }
}
