//! Application error types using thiserror
//!
//! Error hierarchy:
//! - ManifestError: Issues with reading, parsing or writing manifest files
//! - RegistryError: Issues with package registry communication
//! - ConfigError: Issues with configuration or missing collaborators
//! - IoError: File system operation failures outside of manifests

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::Ecosystem;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Manifest file related errors
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// Package registry related errors
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Configuration related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// IO related errors
    #[error(transparent)]
    Io(#[from] IoError),
}

/// Errors related to manifest file operations
#[derive(Error, Debug)]
pub enum ManifestError {
    /// Failed to read manifest file
    #[error("failed to read manifest file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write manifest file
    #[error("failed to write manifest file {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing error (package.json, lerna.json, nx.json)
    #[error("failed to parse JSON in {path}: {message}")]
    JsonParseError { path: PathBuf, message: String },

    /// Markup parsing error (pom.xml, Directory.Packages.props)
    #[error("failed to parse {path}: {message}")]
    MarkupParseError { path: PathBuf, message: String },

    /// The package to update does not appear in the manifest
    #[error("package '{package}' not found in {path}")]
    PackageNotFound { path: PathBuf, package: String },

    /// Unsupported manifest format
    #[error("unsupported manifest format: {path}")]
    UnsupportedFormat { path: PathBuf },
}

/// Errors related to package registry communication
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Package not found in registry
    #[error("package '{package}' not found in {registry} registry")]
    PackageNotFound { package: String, registry: String },

    /// Network request failed
    #[error("failed to fetch package '{package}' from {registry}: {message}")]
    NetworkError {
        package: String,
        registry: String,
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for {registry} registry")]
    RateLimitExceeded { registry: String },

    /// Invalid response from registry
    #[error("invalid response from {registry} for '{package}': {message}")]
    InvalidResponse {
        package: String,
        registry: String,
        message: String,
    },

    /// Timeout
    #[error("timeout while fetching '{package}' from {registry}")]
    Timeout { package: String, registry: String },

    /// Package name is not valid for this registry
    #[error("invalid package name '{name}' for {registry}: {reason}")]
    InvalidPackageName {
        name: String,
        registry: String,
        reason: String,
    },

    /// No adapter is registered for an ecosystem
    #[error("no registry adapter configured for {ecosystem}")]
    UnsupportedEcosystem { ecosystem: Ecosystem },
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be parsed
    #[error("invalid config file {path}: {message}")]
    InvalidConfigFile { path: PathBuf, message: String },

    /// Batch size must be at least one
    #[error("invalid batch size {value}: must be at least 1")]
    InvalidBatchSize { value: usize },

    /// An operation needing the registry ran before one was wired in
    #[error("registry client is not configured")]
    RegistryNotConfigured,
}

/// Errors related to IO operations
#[derive(Error, Debug)]
pub enum IoError {
    /// Directory not found
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    /// Generic IO error
    #[error("IO error at {path}: {source}")]
    Generic {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ManifestError {
    /// Creates a new ReadError
    pub fn read_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::ReadError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new WriteError
    pub fn write_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ManifestError::WriteError {
            path: path.into(),
            source,
        }
    }

    /// Creates a new JsonParseError
    pub fn json_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ManifestError::JsonParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new MarkupParseError
    pub fn markup_parse_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ManifestError::MarkupParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new PackageNotFound error
    pub fn package_not_found(path: impl Into<PathBuf>, package: impl Into<String>) -> Self {
        ManifestError::PackageNotFound {
            path: path.into(),
            package: package.into(),
        }
    }
}

impl RegistryError {
    /// Creates a new PackageNotFound error
    pub fn package_not_found(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::PackageNotFound {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Creates a new NetworkError
    pub fn network_error(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::NetworkError {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new InvalidResponse error
    pub fn invalid_response(
        package: impl Into<String>,
        registry: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RegistryError::InvalidResponse {
            package: package.into(),
            registry: registry.into(),
            message: message.into(),
        }
    }

    /// Creates a new Timeout error
    pub fn timeout(package: impl Into<String>, registry: impl Into<String>) -> Self {
        RegistryError::Timeout {
            package: package.into(),
            registry: registry.into(),
        }
    }

    /// Returns the registry name for this ecosystem
    pub fn registry_name(ecosystem: Ecosystem) -> &'static str {
        match ecosystem {
            Ecosystem::Npm => "npm",
            Ecosystem::Maven => "Maven Central",
            Ecosystem::NuGet => "NuGet",
        }
    }
}

impl IoError {
    /// Creates a new DirectoryNotFound error
    pub fn directory_not_found(path: impl Into<PathBuf>) -> Self {
        IoError::DirectoryNotFound { path: path.into() }
    }

    /// Creates a new Generic IO error
    pub fn generic(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        IoError::Generic {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_error_json_parse() {
        let err = ManifestError::json_parse_error("/path/to/package.json", "unexpected token");
        let msg = format!("{}", err);
        assert!(msg.contains("failed to parse JSON"));
        assert!(msg.contains("unexpected token"));
    }

    #[test]
    fn test_manifest_error_package_not_found() {
        let err = ManifestError::package_not_found("/repo/pom.xml", "org.slf4j:slf4j-api");
        let msg = format!("{}", err);
        assert!(msg.contains("org.slf4j:slf4j-api"));
        assert!(msg.contains("pom.xml"));
    }

    #[test]
    fn test_manifest_error_write() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ManifestError::write_error("/repo/package.json", io);
        assert!(format!("{}", err).contains("failed to write manifest file"));
    }

    #[test]
    fn test_registry_error_package_not_found() {
        let err = RegistryError::package_not_found("nonexistent-package", "npm");
        let msg = format!("{}", err);
        assert!(msg.contains("package 'nonexistent-package' not found"));
        assert!(msg.contains("npm"));
    }

    #[test]
    fn test_registry_error_network() {
        let err = RegistryError::network_error("lodash", "npm", "connection refused");
        let msg = format!("{}", err);
        assert!(msg.contains("failed to fetch"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_registry_error_timeout() {
        let err = RegistryError::timeout("Newtonsoft.Json", "NuGet");
        let msg = format!("{}", err);
        assert!(msg.contains("timeout"));
        assert!(msg.contains("Newtonsoft.Json"));
    }

    #[test]
    fn test_registry_name() {
        assert_eq!(RegistryError::registry_name(Ecosystem::Npm), "npm");
        assert_eq!(RegistryError::registry_name(Ecosystem::NuGet), "NuGet");
        assert_eq!(
            RegistryError::registry_name(Ecosystem::Maven),
            "Maven Central"
        );
    }

    #[test]
    fn test_config_error_registry_not_configured() {
        let err = ConfigError::RegistryNotConfigured;
        assert_eq!(format!("{}", err), "registry client is not configured");
    }

    #[test]
    fn test_app_error_from_manifest_error() {
        let manifest_err = ManifestError::json_parse_error("/path", "eof");
        let app_err: AppError = manifest_err.into();
        assert!(format!("{}", app_err).contains("failed to parse JSON"));
    }

    #[test]
    fn test_app_error_from_config_error() {
        let app_err: AppError = ConfigError::InvalidBatchSize { value: 0 }.into();
        assert!(format!("{}", app_err).contains("invalid batch size 0"));
    }

    #[test]
    fn test_io_error_directory_not_found() {
        let err = IoError::directory_not_found("/path/to/missing");
        assert!(format!("{}", err).contains("directory not found"));
    }
}
