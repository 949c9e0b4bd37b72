//! npm Registry adapter
//!
//! Reads the `latest` dist-tag of a package.
//! API endpoint: https://registry.npmjs.org/-/package/{package}/dist-tags

use crate::domain::Ecosystem;
use crate::error::RegistryError;
use crate::registry::{HttpClient, RegistryAdapter};
use async_trait::async_trait;
use std::collections::HashMap;

/// npm registry base URL
pub(crate) const NPM_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// npm Registry adapter
pub struct NpmAdapter {
    client: HttpClient,
    base_url: String,
}

impl NpmAdapter {
    /// Create a new npm adapter against the public registry
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, NPM_REGISTRY_URL)
    }

    /// Create an adapter against a mirror or private registry
    pub fn with_base_url(client: HttpClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Build the dist-tags URL for a package. Scoped names keep their `@`
    /// and encode the slash.
    fn build_url(&self, package: &str) -> String {
        format!(
            "{}/-/package/{}/dist-tags",
            self.base_url,
            package.replace('/', "%2F")
        )
    }
}

#[async_trait]
impl RegistryAdapter for NpmAdapter {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Npm
    }

    fn registry_name(&self) -> &'static str {
        "npm"
    }

    async fn latest_version(&self, package: &str) -> Result<Option<String>, RegistryError> {
        let url = self.build_url(package);
        let tags: HashMap<String, String> = self
            .client
            .get_json(&url, package, self.registry_name())
            .await?;
        Ok(tags.get("latest").cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_npm_adapter_ecosystem() {
        let adapter = NpmAdapter::new(HttpClient::new().unwrap());
        assert_eq!(adapter.ecosystem(), Ecosystem::Npm);
        assert_eq!(adapter.registry_name(), "npm");
    }

    #[test]
    fn test_build_url() {
        let adapter = NpmAdapter::new(HttpClient::new().unwrap());
        assert_eq!(
            adapter.build_url("lodash"),
            "https://registry.npmjs.org/-/package/lodash/dist-tags"
        );
    }

    #[test]
    fn test_build_url_scoped_package() {
        let adapter = NpmAdapter::with_base_url(
            HttpClient::new().unwrap(),
            "https://npm.internal.example/",
        );
        assert_eq!(
            adapter.build_url("@types/node"),
            "https://npm.internal.example/-/package/@types%2Fnode/dist-tags"
        );
    }
}
