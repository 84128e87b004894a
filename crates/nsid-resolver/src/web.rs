use async_trait::async_trait;
use nsid_types::{Did, DidDocument};
use reqwest::{Client as HttpClient, StatusCode};
use tracing::debug;

use crate::error::{ResolveError, ResolveResult};
use crate::registry::DidResolver;

/// Resolves `did:web` identifiers by fetching the document from the named host
#[derive(Clone)]
pub struct WebResolver {
    http_client: HttpClient,
    scheme: String,
}

impl WebResolver {
    pub fn new(http_client: HttpClient) -> Self {
        Self::with_scheme(http_client, "https")
    }

    /// Use a scheme other than https, for local hosts
    pub fn with_scheme(http_client: HttpClient, scheme: &str) -> Self {
        Self {
            http_client,
            scheme: scheme.to_string(),
        }
    }

    /// Map a did:web id to its document URL.
    ///
    /// `example.com` maps to `/.well-known/did.json`, `example.com:u:alice`
    /// to `/u/alice/did.json`. A `%3A` in the host encodes a port.
    pub fn document_url(&self, did: &Did) -> ResolveResult<String> {
        if did.method() != "web" {
            return Err(ResolveError::UnsupportedMethod(did.method().to_string()));
        }

        let mut segments = did.id().split(':');
        let host = segments
            .next()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ResolveError::MalformedInput(format!("did:web without host: {}", did)))?
            .replace("%3A", ":")
            .replace("%3a", ":");
        let path: Vec<&str> = segments.collect();

        if path.is_empty() {
            Ok(format!("{}://{}/.well-known/did.json", self.scheme, host))
        } else {
            Ok(format!("{}://{}/{}/did.json", self.scheme, host, path.join("/")))
        }
    }
}

#[async_trait]
impl DidResolver for WebResolver {
    async fn resolve(&self, did: &Did) -> ResolveResult<DidDocument> {
        let url = self.document_url(did)?;
        debug!("Fetching did:web document from {}", url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| ResolveError::NetworkFailure(format!("Could not reach {}: {}", url, e)))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                return Err(ResolveError::NotFound(format!("No DID document at {}", url)));
            }
            status => {
                return Err(ResolveError::ResolutionFailed(format!("{} returned {}", url, status)));
            }
        }

        response
            .json::<DidDocument>()
            .await
            .map_err(|e| ResolveError::ResolutionFailed(format!("Invalid DID document at {}: {}", url, e)))
    }
}
