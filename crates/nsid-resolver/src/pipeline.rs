use nsid_types::{Did, RecordLocator};
use reqwest::Client as HttpClient;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::config::ResolverConfig;
use crate::dns::DnsTxtResolver;
use crate::endpoint::service_endpoint;
use crate::error::ResolveResult;
use crate::record::RecordFetcher;
use crate::registry::ResolverRegistry;

/// Collection holding published schema documents, keyed by NSID
pub const LEXICON_SCHEMA_COLLECTION: &str = "com.atproto.lexicon.schema";

/// A schema document and where it was found
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LexiconSchema {
    pub nsid: String,
    pub authority: Did,
    pub endpoint: String,
    pub schema: Value,
}

/// A record value and the hosting service it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRecord {
    pub locator: RecordLocator,
    pub endpoint: String,
    pub value: Value,
}

/// DNS authority lookup, DID resolution and record fetch chained together
#[derive(Clone)]
pub struct LexiconPipeline {
    dns: DnsTxtResolver,
    registry: ResolverRegistry,
    records: RecordFetcher,
}

impl LexiconPipeline {
    pub fn new(config: &ResolverConfig) -> ResolveResult<Self> {
        Ok(Self::with_client(config.http_client()?, config))
    }

    pub fn from_parts(dns: DnsTxtResolver, registry: ResolverRegistry, records: RecordFetcher) -> Self {
        Self { dns, registry, records }
    }

    /// Pipeline with the default registry, sharing one client
    pub fn with_client(http_client: HttpClient, config: &ResolverConfig) -> Self {
        Self::from_parts(
            DnsTxtResolver::new(http_client.clone(), &config.doh_url),
            ResolverRegistry::with_defaults(http_client.clone(), config),
            RecordFetcher::new(http_client),
        )
    }

    pub fn registry(&self) -> &ResolverRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ResolverRegistry {
        &mut self.registry
    }

    /// Resolve the DID publishing schemas for `nsid`
    pub async fn resolve_operator(&self, nsid: &str) -> ResolveResult<Did> {
        self.dns.resolve_operator(nsid).await
    }

    /// Resolve the hosting-service endpoint of `did`
    pub async fn resolve_service_endpoint(&self, did: &Did) -> ResolveResult<String> {
        let document = self.registry.resolve(did).await?;
        let endpoint = service_endpoint(&document)?;
        info!("Resolved PDS of {} to {}", did, endpoint);
        Ok(endpoint)
    }

    /// Fetch the published schema document for `nsid`
    pub async fn fetch_schema(&self, nsid: &str) -> ResolveResult<LexiconSchema> {
        let authority = self.resolve_operator(nsid).await?;
        let endpoint = self.resolve_service_endpoint(&authority).await?;
        let schema = self
            .records
            .fetch_record(&endpoint, &authority, LEXICON_SCHEMA_COLLECTION, nsid)
            .await?;

        Ok(LexiconSchema {
            nsid: nsid.to_string(),
            authority,
            endpoint,
            schema,
        })
    }

    /// Fetch the record addressed by `locator` from its owner's hosting service
    pub async fn fetch_locator(&self, locator: &RecordLocator) -> ResolveResult<ResolvedRecord> {
        let endpoint = self.resolve_service_endpoint(&locator.repo).await?;
        let value = self.records.fetch(&endpoint, locator).await?;

        Ok(ResolvedRecord {
            locator: locator.clone(),
            endpoint,
            value,
        })
    }
}
