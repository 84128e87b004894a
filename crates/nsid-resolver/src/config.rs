use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ResolveError, ResolveResult};

/// Endpoints used to resolve identifiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// DNS-over-HTTPS service answering `/resolve?name=..&type=TXT`
    #[serde(default = "default_doh_url")]
    pub doh_url: String,
    /// Universal DID resolver answering `/1.0/identifiers/<did>`
    #[serde(default = "default_universal_resolver_url")]
    pub universal_resolver_url: String,
    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

fn default_doh_url() -> String {
    "https://dns.google".to_string()
}

fn default_universal_resolver_url() -> String {
    "https://dev.uniresolver.io".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            doh_url: default_doh_url(),
            universal_resolver_url: default_universal_resolver_url(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl ResolverConfig {
    /// Build the shared HTTP client for every resolver stage
    pub fn http_client(&self) -> ResolveResult<HttpClient> {
        HttpClient::builder()
            .timeout(Duration::from_secs(self.request_timeout_seconds))
            .build()
            .map_err(|e| ResolveError::Configuration(format!("Failed to create HTTP client: {}", e)))
    }
}
