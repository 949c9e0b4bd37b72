//! Maven Central Search API adapter
//!
//! Fetches Java package versions from Maven Central and picks the highest
//! stable one.
//! API endpoint: https://search.maven.org/solrsearch/select
//!
//! Query format: q=g:{groupId}+AND+a:{artifactId}&core=gav&rows=100&wt=json

use crate::domain::Ecosystem;
use crate::error::RegistryError;
use crate::registry::{HttpClient, RegistryAdapter};
use crate::update::select_latest_version;
use async_trait::async_trait;
use serde::Deserialize;

/// Maven Central Search API base URL
pub(crate) const MAVEN_CENTRAL_API_URL: &str = "https://search.maven.org/solrsearch/select";

/// Maximum number of versions to fetch
const MAX_VERSIONS: u32 = 100;

/// Maven Central adapter
pub struct MavenCentralAdapter {
    client: HttpClient,
    base_url: String,
}

/// Maven Central search response
#[derive(Debug, Deserialize)]
struct MavenSearchResponse {
    response: MavenResponseBody,
}

#[derive(Debug, Deserialize)]
struct MavenResponseBody {
    docs: Vec<MavenVersionDoc>,
}

#[derive(Debug, Deserialize)]
struct MavenVersionDoc {
    /// Version string
    v: String,
}

impl MavenCentralAdapter {
    /// Create a new Maven Central adapter
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, MAVEN_CENTRAL_API_URL)
    }

    /// Create an adapter against another Solr-compatible search endpoint
    pub fn with_base_url(client: HttpClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    /// Build search URL for group:artifact
    fn build_url(&self, package: &str) -> Result<String, RegistryError> {
        let (group, artifact) = package
            .split_once(':')
            .filter(|(g, a)| !g.is_empty() && !a.is_empty() && !a.contains(':'))
            .ok_or_else(|| RegistryError::InvalidPackageName {
                name: package.to_string(),
                registry: self.registry_name().to_string(),
                reason: "expected format 'groupId:artifactId'".to_string(),
            })?;
        Ok(format!(
            "{}?q=g:{}+AND+a:{}&core=gav&rows={}&wt=json",
            self.base_url, group, artifact, MAX_VERSIONS
        ))
    }
}

/// Highest stable version under the unified ordering
fn highest_version(docs: Vec<MavenVersionDoc>) -> Option<String> {
    select_latest_version(docs.into_iter().map(|doc| doc.v))
}

#[async_trait]
impl RegistryAdapter for MavenCentralAdapter {
    fn ecosystem(&self) -> Ecosystem {
        Ecosystem::Maven
    }

    fn registry_name(&self) -> &'static str {
        "Maven Central"
    }

    async fn latest_version(&self, package: &str) -> Result<Option<String>, RegistryError> {
        let url = self.build_url(package)?;
        let response: MavenSearchResponse = self
            .client
            .get_json(&url, package, self.registry_name())
            .await?;

        Ok(highest_version(response.response.docs))
    }
}
