//! NuGet V3 adapter
//!
//! Resolves the service index once to find the registration base URL, then
//! reads the registration index of a package. Pages that are not inlined in
//! the index are fetched separately.
//! API endpoint: https://api.nuget.org/v3/index.json

use crate::domain::Ecosystem;
use crate::error::RegistryError;
use crate::registry::{HttpClient, RegistryAdapter};
use crate::update::select_latest_version;
use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;

/// Public NuGet service index
pub(crate) const NUGET_SERVICE_INDEX_URL: &str = "https://api.nuget.org/v3/index.json";

const REGISTRATIONS_TYPE_PREFIX: &str = "RegistrationsBaseUrl";

/// NuGet V3 adapter
pub struct NuGetAdapter {
    client: HttpClient,
    service_index_url: String,
    /// Shared by all concurrent lookups; resolved on first use
    registrations_base: OnceCell<String>,
}

#[derive(Debug, Deserialize)]
struct ServiceIndex {
    resources: Vec<ServiceResource>,
}

#[derive(Debug, Deserialize)]
struct ServiceResource {
    #[serde(rename = "@id")]
    id: String,
    #[serde(rename = "@type")]
    resource_type: String,
}

#[derive(Debug, Deserialize)]
struct RegistrationIndex {
    #[serde(default)]
    items: Vec<RegistrationPage>,
}

#[derive(Debug, Deserialize)]
struct RegistrationPage {
    #[serde(rename = "@id")]
    id: String,
    /// Absent when the page has to be fetched separately
    items: Option<Vec<RegistrationLeaf>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationLeaf {
    catalog_entry: CatalogEntry,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    version: String,
    listed: Option<bool>,
}

impl NuGetAdapter {
    /// Create a new adapter against nuget.org
    pub fn new(client: HttpClient) -> Self {
        Self::with_service_index(client, NUGET_SERVICE_INDEX_URL)
    }

    /// Create an adapter against another V3 feed
    pub fn with_service_index(client: HttpClient, service_index_url: &str) -> Self {
        Self {
            client,
            service_index_url: service_index_url.to_string(),
            registrations_base: OnceCell::new(),
        }
    }

    async fn registrations_base(&self, package: &str) -> Result<&str, RegistryError> {
        let base = self
            .registrations_base
            .get_or_try_init(|| async {
                let index: ServiceIndex = self
                    .client
                    .get_json(&self.service_index_url, package, self.registry_name())
                    .await?;
                let base = registrations_base_from(&index).ok_or_else(|| {
                    RegistryError::invalid_response(
                        package,
                        self.registry_name(),
                        "service index has no RegistrationsBaseUrl resource",
                    )
                })?;
                tracing::debug!("resolved NuGet registrations base {}", base);
                Ok::<_, RegistryError>(base)
            })
            .await?;
        Ok(base.as_str())
    }

    fn build_registration_url(base: &str, package: &str) -> String {
        format!(
            "{}/{}/index.json",
            base.trim_end_matches('/'),
            package.to_lowercase()
        )
    }

    async fn collect_versions(
        &self,
        index: RegistrationIndex,
        package: &str,
    ) -> Result<Vec<String>, RegistryError> {
        let mut versions = Vec::new();
        for page in index.items {
            let leaves = match page.items {
                Some(leaves) => leaves,
                None => {
                    let fetched: RegistrationPage = self
                        .client
                        .get_json(&page.id, package, self.registry_name())
                        .await?;
                    fetched.items.unwrap_or_default()
                }
            };
            versions.extend(listed_versions(leaves));
        }
        Ok(versions)
    }
}

fn registrations_base_from(index: &ServiceIndex) -> Option<String> {
    index
        .resources
        .iter()
        .find(|r| r.resource_type.starts_with(REGISTRATIONS_TYPE_PREFIX))
        .map(|r| r.id.clone())
}

fn listed_versions(leaves: Vec<RegistrationLeaf>) -> impl Iterator<Item = String> {
    leaves
        .into_iter()
        .filter(|leaf| leaf.catalog_entry.listed != Some(false))
        .map(|leaf| leaf.catalog_entry.version)
}

#[async_trait]
impl RegistryAdapter for NuGetAdapter {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::NuGet
    }

    fn registry_name(&self) -> &'static str {
        "NuGet"
    }

    async fn latest_version(&self, package: &str) -> Result<Option<String>, RegistryError> {
        let base = self.registrations_base(package).await?;
        let url = Self::build_registration_url(base, package);
        let index: RegistrationIndex = self
            .client
            .get_json(&url, package, self.registry_name())
            .await?;

        let versions = self.collect_versions(index, package).await?;
        Ok(select_latest_version(versions))
    }
}
