use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{BrowserError, BrowserResult};

/// First month the indexer has event logs for
const FEED_LOG_START: (i32, u32) = (2024, 10);

/// Daily counter views of the data API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyView {
    NewCollections,
    ActiveCollections,
    NewDids,
    ActiveDids,
}

impl DailyView {
    pub fn path(&self) -> &'static str {
        match self {
            DailyView::NewCollections => "/new_collection_summary_view",
            DailyView::ActiveCollections => "/active_collection_summary_view",
            DailyView::NewDids => "/new_did_summary_view",
            DailyView::ActiveDids => "/active_did_summary_view",
        }
    }
}

/// One row of a daily view; `day` counts back from today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    pub day: i64,
    #[serde(default)]
    pub count: u64,
}

/// Counts from the oldest day to today, with days missing from the view as 0
pub fn fill_daily_gaps(rows: &[DailyCount]) -> Vec<u64> {
    let (min, max) = match (rows.iter().map(|r| r.day).min(), rows.iter().map(|r| r.day).max()) {
        (Some(min), Some(max)) => (min, max),
        _ => return Vec::new(),
    };

    let by_day: BTreeMap<i64, u64> = rows.iter().map(|r| (r.day, r.count)).collect();
    (min..=max)
        .rev()
        .map(|day| by_day.get(&day).copied().unwrap_or(0))
        .collect()
}

/// Aggregated custom-feed activity for one feed generator server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedServer {
    pub server_did: String,
    #[serde(default)]
    pub unique_creator_did: u64,
    #[serde(default)]
    pub unique_creator_rkey: u64,
    #[serde(default)]
    pub min_create_at: Option<String>,
    #[serde(default)]
    pub max_create_at: Option<String>,
}

impl FeedServer {
    /// Hide servers that would identify a single feed, and every did:plc server
    pub fn masked(mut self) -> Self {
        if self.unique_creator_rkey == 1 {
            self.server_did = "did:***:*****".to_string();
        } else if self.server_did.starts_with("did:plc") {
            self.server_did = "did:plc:*****".to_string();
        }
        self
    }
}

/// Mask and order feed servers by feed count, largest first
pub fn rank_feed_servers(servers: Vec<FeedServer>) -> Vec<FeedServer> {
    let mut servers: Vec<FeedServer> = servers.into_iter().map(FeedServer::masked).collect();
    servers.sort_by(|a, b| b.unique_creator_rkey.cmp(&a.unique_creator_rkey));
    servers
}

/// Time window for the feed server listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedRange {
    All,
    Month { year: i32, month: u32 },
}

impl FeedRange {
    /// Parse `all` or `YYYY-MM`
    pub fn parse(value: &str) -> BrowserResult<Self> {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") {
            return Ok(FeedRange::All);
        }

        let date = NaiveDate::parse_from_str(&format!("{}-01", value), "%Y-%m-%d")
            .map_err(|_| BrowserError::Config(format!("Expected all or YYYY-MM, got {}", value)))?;
        Ok(FeedRange::Month {
            year: date.year(),
            month: date.month(),
        })
    }

    /// Start and end instants sent to the server
    pub fn bounds(&self, now: DateTime<Utc>) -> BrowserResult<(DateTime<Utc>, DateTime<Utc>)> {
        match *self {
            FeedRange::All => Ok((month_start(FEED_LOG_START.0, FEED_LOG_START.1)?, now)),
            FeedRange::Month { year, month } => {
                let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
                Ok((month_start(year, month)?, month_start(next_year, next_month)?))
            }
        }
    }
}

fn month_start(year: i32, month: u32) -> BrowserResult<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| BrowserError::Config(format!("Invalid month {}-{:02}", year, month)))
}

/// Minutes the indexer cursor (microseconds since epoch) trails `now`; 0 when caught up
pub fn cursor_lag_minutes(cursor_us: i64, now: DateTime<Utc>) -> i64 {
    let cursor = Utc.timestamp_nanos(cursor_us.saturating_mul(1_000));
    (now - cursor).num_minutes().max(0)
}

/// Instant the indexer cursor points at
pub fn cursor_time(cursor_us: i64) -> DateTime<Utc> {
    Utc.timestamp_nanos(cursor_us.saturating_mul(1_000))
}

/// Week or month view of a daily series
pub fn series_limit(days: u32) -> u32 {
    if days <= 7 {
        7
    } else {
        30
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_daily_gaps() {
        let rows = vec![
            DailyCount { day: 3, count: 30 },
            DailyCount { day: 0, count: 5 },
            DailyCount { day: 1, count: 10 },
        ];

        assert_eq!(fill_daily_gaps(&rows), vec![30, 0, 10, 5]);
        assert!(fill_daily_gaps(&[]).is_empty());
    }

    #[test]
    fn test_feed_server_masking() {
        let server = |did: &str, rkeys: u64| FeedServer {
            server_did: did.to_string(),
            unique_creator_did: 1,
            unique_creator_rkey: rkeys,
            min_create_at: None,
            max_create_at: None,
        };

        let ranked = rank_feed_servers(vec![
            server("did:web:feeds.example.com", 1),
            server("did:plc:abc", 4),
            server("did:web:big.example.com", 9),
        ]);

        let dids: Vec<&str> = ranked.iter().map(|s| s.server_did.as_str()).collect();
        assert_eq!(dids, vec!["did:web:big.example.com", "did:plc:*****", "did:***:*****"]);
    }

    #[test]
    fn test_feed_range_bounds() {
        let now = Utc.with_ymd_and_hms(2025, 3, 5, 12, 0, 0).unwrap();

        let (start, end) = FeedRange::All.bounds(now).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0).unwrap());
        assert_eq!(end, now);

        let december = FeedRange::parse("2024-12").unwrap();
        assert_eq!(december, FeedRange::Month { year: 2024, month: 12 });
        let (start, end) = december.bounds(now).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());

        assert_eq!(FeedRange::parse("all").unwrap(), FeedRange::All);
        assert!(FeedRange::parse("2024-13").is_err());
    }

    #[test]
    fn test_cursor_lag() {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 0, 10, 0).unwrap();
        let cursor = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap().timestamp_micros();

        assert_eq!(cursor_lag_minutes(cursor, now), 10);
        assert_eq!(cursor_lag_minutes(cursor + 3_600_000_000, now), 0);
        assert_eq!(cursor_time(cursor).timestamp_micros(), cursor);
    }
}
