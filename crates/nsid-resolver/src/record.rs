use nsid_types::{Did, RecordLocator};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ResolveError, ResolveResult};

const GET_RECORD_PATH: &str = "/xrpc/com.atproto.repo.getRecord";

#[derive(Debug, Deserialize)]
struct GetRecordResponse {
    #[serde(default)]
    value: Option<Value>,
}

/// Fetches single records from a hosting service
#[derive(Clone)]
pub struct RecordFetcher {
    http_client: HttpClient,
}

impl RecordFetcher {
    pub fn new(http_client: HttpClient) -> Self {
        Self { http_client }
    }

    /// URL of the record-retrieval method on `endpoint`
    pub fn record_url(endpoint: &str) -> String {
        format!("{}{}", endpoint.trim().trim_end_matches('/'), GET_RECORD_PATH)
    }

    /// Fetch one record and return its `value`
    pub async fn fetch_record(
        &self,
        endpoint: &str,
        repo: &Did,
        collection: &str,
        rkey: &str,
    ) -> ResolveResult<Value> {
        let url = Self::record_url(endpoint);
        debug!("getRecord {} {} {} from {}", repo, collection, rkey, url);

        let response = self
            .http_client
            .get(&url)
            .query(&[("repo", repo.as_str()), ("collection", collection), ("rkey", rkey)])
            .send()
            .await
            .map_err(|e| {
                warn!("Could not reach {}: {}", endpoint, e);
                ResolveError::NetworkFailure(format!("Could not reach host {}: {}", endpoint, e))
            })?;

        if !response.status().is_success() {
            return Err(ResolveError::NotFound(format!(
                "No such record {}/{}/{} on {} ({})",
                repo,
                collection,
                rkey,
                endpoint,
                response.status()
            )));
        }

        let body: GetRecordResponse = response
            .json()
            .await
            .map_err(|e| ResolveError::ResolutionFailed(format!("Invalid getRecord response from {}: {}", endpoint, e)))?;

        body.value
            .ok_or_else(|| ResolveError::NotFound(format!("Record {}/{}/{} has no value", repo, collection, rkey)))
    }

    pub async fn fetch(&self, endpoint: &str, locator: &RecordLocator) -> ResolveResult<Value> {
        self.fetch_record(endpoint, &locator.repo, &locator.collection, &locator.rkey)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn test_record_url_tolerates_trailing_slash() {
        assert_eq!(
            RecordFetcher::record_url("https://pds.example/"),
            "https://pds.example/xrpc/com.atproto.repo.getRecord"
        );
    }

    #[tokio::test]
    async fn test_fetch_record_sends_one_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/xrpc/com.atproto.repo.getRecord")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("repo".into(), "did:plc:abc".into()),
                Matcher::UrlEncoded("collection".into(), "uk.skyblur.post".into()),
                Matcher::UrlEncoded("rkey".into(), "3k2x".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"uri":"at://did:plc:abc/uk.skyblur.post/3k2x","cid":"bafy","value":{"text":"hi"}}"#)
            .expect(1)
            .create_async()
            .await;

        let fetcher = RecordFetcher::new(HttpClient::new());
        let did = Did::parse("did:plc:abc").unwrap();
        let value = fetcher
            .fetch_record(&server.url(), &did, "uk.skyblur.post", "3k2x")
            .await
            .unwrap();

        assert_eq!(value, serde_json::json!({"text": "hi"}));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_query_parameters_are_escaped() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/xrpc/com.atproto.repo.getRecord")
            .match_query(Matcher::Regex("rkey=a%26b%3Dc".into()))
            .with_status(200)
            .with_body(r#"{"value":{}}"#)
            .create_async()
            .await;

        let fetcher = RecordFetcher::new(HttpClient::new());
        let did = Did::parse("did:plc:abc").unwrap();
        fetcher.fetch_record(&server.url(), &did, "uk.skyblur.post", "a&b=c").await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/xrpc/com.atproto.repo.getRecord")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"error":"RecordNotFound"}"#)
            .create_async()
            .await;

        let fetcher = RecordFetcher::new(HttpClient::new());
        let locator = RecordLocator::parse("at://did:plc:abc/uk.skyblur.post/none").unwrap();
        let result = fetcher.fetch(&server.url(), &locator).await;

        assert!(matches!(result, Err(ResolveError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_failure() {
        let fetcher = RecordFetcher::new(HttpClient::new());
        let locator = RecordLocator::parse("at://did:plc:abc/uk.skyblur.post/3k2x").unwrap();
        let result = fetcher.fetch("http://127.0.0.1:1", &locator).await;

        assert!(matches!(result, Err(ResolveError::NetworkFailure(_))));
    }
}
