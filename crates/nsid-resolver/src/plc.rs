use async_trait::async_trait;
use nsid_types::{Did, DidDocument};
use reqwest::{Client as HttpClient, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::error::{ResolveError, ResolveResult};
use crate::registry::DidResolver;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResolutionEnvelope {
    #[serde(default)]
    did_document: Option<DidDocument>,
}

/// Resolves DIDs through a universal resolver over HTTP
#[derive(Clone)]
pub struct UniversalResolver {
    http_client: HttpClient,
    base_url: String,
}

impl UniversalResolver {
    pub fn new(http_client: HttpClient, base_url: &str) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn identifier_url(&self, did: &Did) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(did.as_str().as_bytes()).collect();
        format!("{}/1.0/identifiers/{}", self.base_url, encoded)
    }
}

#[async_trait]
impl DidResolver for UniversalResolver {
    async fn resolve(&self, did: &Did) -> ResolveResult<DidDocument> {
        let url = self.identifier_url(did);
        debug!("Fetching DID document from {}", url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ResolveError::NetworkFailure(format!("Could not reach DID resolver for {}: {}", did, e)))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                return Err(ResolveError::NotFound(format!("No DID document for {}", did)));
            }
            status => {
                return Err(ResolveError::ResolutionFailed(format!(
                    "DID resolver returned {} for {}",
                    status, did
                )));
            }
        }

        let envelope: ResolutionEnvelope = response
            .json()
            .await
            .map_err(|e| ResolveError::ResolutionFailed(format!("Invalid resolution result for {}: {}", did, e)))?;

        envelope
            .did_document
            .ok_or_else(|| ResolveError::NotFound(format!("Resolution result for {} has no DID document", did)))
    }
}
