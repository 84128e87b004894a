use async_trait::async_trait;
use nsid_types::{Did, DidDocument};
use reqwest::Client as HttpClient;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::config::ResolverConfig;
use crate::error::{ResolveError, ResolveResult};
use crate::plc::UniversalResolver;
use crate::web::WebResolver;

/// Resolves one DID method to its document
#[async_trait]
pub trait DidResolver: Send + Sync {
    async fn resolve(&self, did: &Did) -> ResolveResult<DidDocument>;
}

/// Strategy table keyed by DID method token
#[derive(Clone, Default)]
pub struct ResolverRegistry {
    resolvers: HashMap<String, Arc<dyn DidResolver>>,
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `plc` resolved through the universal resolver and `web` resolved directly
    pub fn with_defaults(http_client: HttpClient, config: &ResolverConfig) -> Self {
        let mut registry = Self::new();
        registry.register(
            "plc",
            Arc::new(UniversalResolver::new(http_client.clone(), &config.universal_resolver_url)),
        );
        registry.register("web", Arc::new(WebResolver::new(http_client)));
        registry
    }

    /// Register a resolver, returning the one it replaces
    pub fn register(
        &mut self,
        method: impl Into<String>,
        resolver: Arc<dyn DidResolver>,
    ) -> Option<Arc<dyn DidResolver>> {
        self.resolvers.insert(method.into(), resolver)
    }

    pub fn supports(&self, method: &str) -> bool {
        self.resolvers.contains_key(method)
    }

    pub fn methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = self.resolvers.keys().map(String::as_str).collect();
        methods.sort_unstable();
        methods
    }

    /// Dispatch on the method token of `did`
    pub async fn resolve(&self, did: &Did) -> ResolveResult<DidDocument> {
        let resolver = self
            .resolvers
            .get(did.method())
            .ok_or_else(|| ResolveError::UnsupportedMethod(did.method().to_string()))?;

        debug!("Resolving {} with the {} resolver", did, did.method());
        resolver.resolve(did).await
    }
}
