use chrono::{DateTime, Utc};
use nsid_types::{CollectionRecord, CollectionRow, Did, RecordLocator, SchemaKeyRow, SchemaKeySet};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::activity::{rank_feed_servers, DailyCount, DailyView, FeedRange, FeedServer};
use crate::config::DataApiConfig;
use crate::error::{BrowserError, BrowserResult};

/// Different data API endpoints
#[derive(Debug, Clone, Copy)]
pub enum DataEndpoint {
    CollectionCounts,
    SchemaKeys,
    Collection,
    CollectionStats,
    UniqueDidCount,
    Cursor,
    EventLogsByServer,
    DailySummary(DailyView),
}

impl DataEndpoint {
    fn path(&self) -> &'static str {
        match self {
            DataEndpoint::CollectionCounts => "/collection_count_view",
            DataEndpoint::SchemaKeys => "/distinct_schema_rkeys",
            DataEndpoint::Collection => "/collection",
            DataEndpoint::CollectionStats => "/collection_stats",
            DataEndpoint::UniqueDidCount => "/unique_did_count_view",
            DataEndpoint::Cursor => "/cursor",
            DataEndpoint::EventLogsByServer => "/rpc/get_event_logs_by_server",
            DataEndpoint::DailySummary(view) => view.path(),
        }
    }
}

/// Per-collection totals from `collection_stats`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionStats {
    #[serde(default)]
    pub unique_did: u64,
    #[serde(default)]
    pub min_createdat: Option<String>,
    #[serde(default)]
    pub max_createdat: Option<String>,
    #[serde(default)]
    pub unique_rkey: u64,
    #[serde(default)]
    pub total_count: u64,
}

#[derive(Debug, Deserialize)]
struct UniqueDidCountRow {
    unique_did_count: u64,
}

#[derive(Debug, Deserialize)]
struct CursorRow {
    cursor: i64,
}

#[derive(Debug, Serialize)]
struct EventLogRange {
    start_date: String,
    end_date: String,
}

#[derive(Debug, Deserialize)]
struct LatestRecordRow {
    did: String,
    rkey: String,
    collection: String,
}

/// Read-only client for the collection data API
#[derive(Clone)]
pub struct DataApiClient {
    base_url: String,
    http_client: HttpClient,
}

impl DataApiClient {
    pub fn new(config: &DataApiConfig) -> BrowserResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| BrowserError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self::with_client(http_client, &config.base_url))
    }

    pub fn with_client(http_client: HttpClient, base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        }
    }

    async fn get_rows<T: DeserializeOwned>(&self, endpoint: DataEndpoint, query: &[(&str, &str)]) -> BrowserResult<Vec<T>> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        debug!("Data API GET {} {:?}", url, query);

        let response = self.http_client.get(&url).query(query).send().await?;
        Self::read_rows(endpoint, response).await
    }

    async fn post_rows<T: DeserializeOwned, B: Serialize>(&self, endpoint: DataEndpoint, body: &B) -> BrowserResult<Vec<T>> {
        let url = format!("{}{}", self.base_url, endpoint.path());
        debug!("Data API POST {}", url);

        let response = self.http_client.post(&url).json(body).send().await?;
        Self::read_rows(endpoint, response).await
    }

    async fn read_rows<T: DeserializeOwned>(endpoint: DataEndpoint, response: reqwest::Response) -> BrowserResult<Vec<T>> {
        if !response.status().is_success() {
            return Err(BrowserError::Api(format!(
                "{} returned {}",
                endpoint.path(),
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| BrowserError::Serialization(format!("Invalid rows from {}: {}", endpoint.path(), e)))
    }

    /// Raw rows of `collection_count_view`
    pub async fn list_collection_rows(&self) -> BrowserResult<Vec<CollectionRow>> {
        self.get_rows(DataEndpoint::CollectionCounts, &[]).await
    }

    /// Every indexed collection, with `is_new` derived against `now`.
    /// Rows with unreadable timestamps are skipped.
    pub async fn list_collections(&self, now: DateTime<Utc>, new_window_hours: i64) -> BrowserResult<Vec<CollectionRecord>> {
        let rows = self.list_collection_rows().await?;
        let total = rows.len();

        let records: Vec<CollectionRecord> = rows
            .into_iter()
            .filter_map(|row| {
                let name = row.collection.clone();
                match CollectionRecord::from_row(row, now, new_window_hours) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        warn!("Skipping collection {}: {}", name, e);
                        None
                    }
                }
            })
            .collect();

        info!("Loaded {} of {} collections", records.len(), total);
        Ok(records)
    }

    /// Record keys of every published schema
    pub async fn list_schema_keys(&self) -> BrowserResult<SchemaKeySet> {
        let rows: Vec<SchemaKeyRow> = self.get_rows(DataEndpoint::SchemaKeys, &[]).await?;
        Ok(rows.into_iter().map(|row| row.rkey).collect())
    }

    /// Most recently created record of `collection`, if any was indexed
    pub async fn latest_record(&self, collection: &str) -> BrowserResult<Option<RecordLocator>> {
        let filter = format!("eq.{}", collection);
        let rows: Vec<LatestRecordRow> = self
            .get_rows(
                DataEndpoint::Collection,
                &[
                    ("select", "did,rkey,collection,createdAt"),
                    ("collection", filter.as_str()),
                    ("order", "createdAt.desc"),
                    ("limit", "1"),
                ],
            )
            .await?;

        match rows.into_iter().next() {
            Some(row) => {
                let repo = Did::parse(&row.did)?;
                Ok(Some(RecordLocator::new(repo, row.collection, row.rkey)))
            }
            None => Ok(None),
        }
    }

    pub async fn collection_stats(&self, collection: &str) -> BrowserResult<Option<CollectionStats>> {
        let filter = format!("eq.{}", collection);
        let rows: Vec<CollectionStats> = self
            .get_rows(DataEndpoint::CollectionStats, &[("collection", filter.as_str())])
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Distinct repositories seen by the indexer
    pub async fn unique_did_count(&self) -> BrowserResult<Option<u64>> {
        let rows: Vec<UniqueDidCountRow> = self.get_rows(DataEndpoint::UniqueDidCount, &[]).await?;
        Ok(rows.into_iter().next().map(|row| row.unique_did_count))
    }

    /// Firehose cursor of the collection indexer, in microseconds since the epoch
    pub async fn indexer_cursor(&self) -> BrowserResult<Option<i64>> {
        let rows: Vec<CursorRow> = self
            .get_rows(
                DataEndpoint::Cursor,
                &[("service", "eq.collection"), ("select", "service,cursor")],
            )
            .await?;
        Ok(rows.into_iter().next().map(|row| row.cursor))
    }

    /// Feed generator servers active in `range`, masked and largest first
    pub async fn feed_servers(&self, range: FeedRange, now: DateTime<Utc>) -> BrowserResult<Vec<FeedServer>> {
        let (start, end) = range.bounds(now)?;
        let body = EventLogRange {
            start_date: start.to_rfc3339(),
            end_date: end.to_rfc3339(),
        };

        let servers: Vec<FeedServer> = self.post_rows(DataEndpoint::EventLogsByServer, &body).await?;
        info!("Loaded {} feed servers", servers.len());
        Ok(rank_feed_servers(servers))
    }

    /// Raw rows of a daily counter view, at most `limit` days
    pub async fn daily_series(&self, view: DailyView, limit: u32) -> BrowserResult<Vec<DailyCount>> {
        let limit = limit.to_string();
        self.get_rows(DataEndpoint::DailySummary(view), &[("limit", limit.as_str())])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_list_collections_skips_bad_rows() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/collection_count_view")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"collection":"uk.skyblur.post","count":120,"recent_count":4,"min":"2025-01-09T00:00:00","max":"2025-01-10T00:00:00"},
                    {"collection":"app.bsky.feed.post","count":9000,"recent_count":80,"min":"2024-10-01T00:00:00.123","max":"2025-01-10T00:00:00"},
                    {"collection":"broken.row","count":1,"recent_count":0,"min":"not a date","max":"2025-01-10T00:00:00"}
                ]"#,
            )
            .create_async()
            .await;

        let client = DataApiClient::with_client(HttpClient::new(), &server.url());
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
        let records = client.list_collections(now, 72).await.unwrap();

        assert_eq!(records.len(), 2);
        assert!(records[0].is_new);
        assert!(!records[1].is_new);
        assert_eq!(records[1].event_count, 9000);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_schema_keys() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/distinct_schema_rkeys")
            .with_status(200)
            .with_body(r#"[{"rkey":"uk.skyblur.post"},{"rkey":"app.example.thing"}]"#)
            .create_async()
            .await;

        let client = DataApiClient::with_client(HttpClient::new(), &server.url());
        let keys = client.list_schema_keys().await.unwrap();

        assert_eq!(keys.len(), 2);
        assert!(keys.contains("uk.skyblur.post"));
    }

    #[tokio::test]
    async fn test_latest_record_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/collection")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("collection".into(), "eq.uk.skyblur.post".into()),
                Matcher::UrlEncoded("order".into(), "createdAt.desc".into()),
                Matcher::UrlEncoded("limit".into(), "1".into()),
            ]))
            .with_status(200)
            .with_body(r#"[{"did":"did:plc:abc","rkey":"3k2x","collection":"uk.skyblur.post","createdAt":"2025-01-01T00:00:00"}]"#)
            .create_async()
            .await;

        let client = DataApiClient::with_client(HttpClient::new(), &server.url());
        let locator = client.latest_record("uk.skyblur.post").await.unwrap().unwrap();

        assert_eq!(locator.to_string(), "at://did:plc:abc/uk.skyblur.post/3k2x");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_empty_stats() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/collection_stats")
            .match_query(Matcher::UrlEncoded("collection".into(), "eq.a.b".into()))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = DataApiClient::with_client(HttpClient::new(), &server.url());
        assert!(client.collection_stats("a.b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_indexer_cursor_and_unique_dids() {
        let mut server = mockito::Server::new_async().await;
        let cursor = server
            .mock("GET", "/cursor")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("service".into(), "eq.collection".into()),
                Matcher::UrlEncoded("select".into(), "service,cursor".into()),
            ]))
            .with_status(200)
            .with_body(r#"[{"service":"collection","cursor":1736467200000000}]"#)
            .create_async()
            .await;
        let _dids = server
            .mock("GET", "/unique_did_count_view")
            .with_status(200)
            .with_body(r#"[{"unique_did_count":4321}]"#)
            .create_async()
            .await;

        let client = DataApiClient::with_client(HttpClient::new(), &server.url());

        assert_eq!(client.indexer_cursor().await.unwrap(), Some(1_736_467_200_000_000));
        assert_eq!(client.unique_did_count().await.unwrap(), Some(4321));
        cursor.assert_async().await;
    }

    #[tokio::test]
    async fn test_feed_servers_posts_month_range() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rpc/get_event_logs_by_server")
            .match_body(Matcher::Json(serde_json::json!({
                "start_date": "2024-12-01T00:00:00+00:00",
                "end_date": "2025-01-01T00:00:00+00:00"
            })))
            .with_status(200)
            .with_body(
                r#"[
                    {"server_did":"did:web:solo.example.com","unique_creator_did":1,"unique_creator_rkey":1},
                    {"server_did":"did:plc:feeds","unique_creator_did":3,"unique_creator_rkey":12},
                    {"server_did":"did:web:big.example.com","unique_creator_did":40,"unique_creator_rkey":85}
                ]"#,
            )
            .create_async()
            .await;

        let client = DataApiClient::with_client(HttpClient::new(), &server.url());
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
        let servers = client
            .feed_servers(FeedRange::Month { year: 2024, month: 12 }, now)
            .await
            .unwrap();

        let dids: Vec<&str> = servers.iter().map(|s| s.server_did.as_str()).collect();
        assert_eq!(dids, vec!["did:web:big.example.com", "did:plc:*****", "did:***:*****"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_daily_series() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/active_did_summary_view")
            .match_query(Matcher::UrlEncoded("limit".into(), "7".into()))
            .with_status(200)
            .with_body(r#"[{"day":0,"count":12},{"day":2,"count":7}]"#)
            .create_async()
            .await;

        let client = DataApiClient::with_client(HttpClient::new(), &server.url());
        let rows = client.daily_series(DailyView::ActiveDids, 7).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(crate::activity::fill_daily_gaps(&rows), vec![7, 0, 12]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/collection_count_view")
            .with_status(503)
            .create_async()
            .await;

        let client = DataApiClient::with_client(HttpClient::new(), &server.url());
        assert!(matches!(client.list_collection_rows().await, Err(BrowserError::Api(_))));
    }
}
