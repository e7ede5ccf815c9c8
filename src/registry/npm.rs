//! npm registry transport.

use crate::config::EngineConfig;
use crate::registry::{Lookup, RegistryClient};
use crate::types::Result;
use reqwest::Client;
use std::time::Duration;
use tracing::trace;

/// HTTP client for `GET {registry}/{name}` existence checks.
#[derive(Debug, Clone)]
pub struct NpmRegistry {
    client: Client,
    registry_url: String,
}

impl NpmRegistry {
    /// Create a registry client from engine settings.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .http1_only()
            .pool_max_idle_per_host(config.concurrency.max(1))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            registry_url: config.registry_url.trim_end_matches('/').to_string(),
        })
    }

    /// Registry URL for a package, with the name fully percent-encoded.
    pub fn package_url(&self, package_name: &str) -> String {
        format!("{}/{}", self.registry_url, urlencoding::encode(package_name))
    }
}

impl RegistryClient for NpmRegistry {
    async fn lookup(&self, package_name: &str) -> Lookup {
        let url = self.package_url(package_name);
        trace!("Checking npm: {}", url);

        match self.client.get(&url).send().await {
            Ok(response) => Lookup::Status(response.status().as_u16()),
            Err(e) => Lookup::Failed(e.to_string()),
        }
    }
}
