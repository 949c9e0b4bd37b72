//! Registry adapters for latest-version lookups
//!
//! This module provides:
//! - HTTP client shared foundation with retry logic
//! - npm registry adapter
//! - NuGet V3 adapter (service index + registration index)
//! - Maven Central search adapter
//! - `Registries`, which routes lookups to the adapter for an ecosystem

mod client;
mod maven_central;
mod npm;
mod nuget;

pub use client::HttpClient;
pub use maven_central::MavenCentralAdapter;
pub use npm::NpmAdapter;
pub use nuget::NuGetAdapter;

pub(crate) use maven_central::MAVEN_CENTRAL_API_URL;
pub(crate) use npm::NPM_REGISTRY_URL;
pub(crate) use nuget::NUGET_SERVICE_INDEX_URL;

use crate::config::EngineConfig;
use crate::domain::Ecosystem;
use crate::error::RegistryError;
use async_trait::async_trait;
use std::collections::HashMap;

/// Latest-version capability consumed by update detection
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Latest published version of a package, `None` when the registry has none
    async fn latest_version(
        &self,
        ecosystem: Ecosystem,
        package: &str,
    ) -> Result<Option<String>, RegistryError>;
}

/// Trait for a single registry backend
#[async_trait]
pub trait RegistryAdapter: Send + Sync {
    /// Get the ecosystem this adapter handles
    fn ecosystem(&self) -> Ecosystem;

    /// Get the registry name
    fn registry_name(&self) -> &'static str;

    /// Fetch the latest version of a package
    async fn latest_version(&self, package: &str) -> Result<Option<String>, RegistryError>;
}

/// Create a registry adapter for the given ecosystem
pub fn create_adapter(
    ecosystem: Ecosystem,
    client: HttpClient,
    config: &EngineConfig,
) -> Box<dyn RegistryAdapter> {
    match ecosystem {
        Ecosystem::Npm => Box::new(NpmAdapter::with_base_url(client, &config.npm_registry_url)),
        Ecosystem::Maven => Box::new(MavenCentralAdapter::with_base_url(
            client,
            &config.maven_search_url,
        )),
        Ecosystem::NuGet => Box::new(NuGetAdapter::with_service_index(
            client,
            &config.nuget_service_index_url,
        )),
    }
}

/// Dispatches lookups to one adapter per ecosystem
#[derive(Default)]
pub struct Registries {
    adapters: HashMap<Ecosystem, Box<dyn RegistryAdapter>>,
}

impl Registries {
    /// Creates an empty dispatcher
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dispatcher with adapters for every supported ecosystem
    pub fn from_config(config: &EngineConfig) -> Result<Self, RegistryError> {
        let client = HttpClient::with_config(config.timeout(), client::DEFAULT_USER_AGENT)?;
        let mut registries = Self::new();
        for ecosystem in Ecosystem::all() {
            registries = registries.with_adapter(create_adapter(*ecosystem, client.clone(), config));
        }
        Ok(registries)
    }

    /// Registers an adapter, replacing any existing one for its ecosystem
    pub fn with_adapter(mut self, adapter: Box<dyn RegistryAdapter>) -> Self {
        self.adapters.insert(adapter.ecosystem(), adapter);
        self
    }
}

#[async_trait]
impl RegistryClient for Registries {
    async fn latest_version(
        &self,
        ecosystem: Ecosystem,
        package: &str,
    ) -> Result<Option<String>, RegistryError> {
        let adapter = self
            .adapters
            .get(&ecosystem)
            .ok_or(RegistryError::UnsupportedEcosystem { ecosystem })?;
        adapter.latest_version(package).await
    }
}
