use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{TypeError, TypeResult};

/// A collection first indexed within this many hours is reported as new
pub const NEW_COLLECTION_WINDOW_HOURS: i64 = 72;

/// Row shape returned by the `collection_count_view` endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRow {
    pub collection: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub recent_count: u64,
    pub min: String,
    pub max: String,
}

/// An indexed collection with its event counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRecord {
    /// Dot-delimited NSID, e.g. "uk.skyblur.post"
    pub name: String,
    pub event_count: u64,
    pub recent_event_count: u64,
    pub first_indexed_at: DateTime<Utc>,
    pub last_indexed_at: DateTime<Utc>,
    /// Derived at ingest from `first_indexed_at`
    pub is_new: bool,
}

impl CollectionRecord {
    /// Convert a wire row, deriving `is_new` against `now` with the given window
    pub fn from_row(row: CollectionRow, now: DateTime<Utc>, new_window_hours: i64) -> TypeResult<Self> {
        let first_indexed_at = parse_timestamp(&row.min)?;
        let last_indexed_at = parse_timestamp(&row.max)?;
        let is_new = first_indexed_at > now - Duration::hours(new_window_hours);

        Ok(Self {
            name: row.collection,
            event_count: row.count,
            recent_event_count: row.recent_count,
            first_indexed_at,
            last_indexed_at,
            is_new,
        })
    }

    /// Dot segments of the name
    pub fn segments(&self) -> Vec<&str> {
        self.name.split('.').collect()
    }
}

/// Parse an indexer timestamp. Zone-less values are taken as UTC.
pub fn parse_timestamp(value: &str) -> TypeResult<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }

    Err(TypeError::InvalidTimestamp(value.to_string()))
}

/// Row shape returned by the `distinct_schema_rkeys` endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaKeyRow {
    pub rkey: String,
}

/// Record keys of every published schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaKeySet {
    keys: BTreeSet<String>,
}

impl SchemaKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.keys.insert(key.into())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    /// True when `path` contains any known key as a substring
    pub fn matches(&self, path: &str) -> bool {
        self.keys.iter().any(|key| !key.is_empty() && path.contains(key.as_str()))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for SchemaKeySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(name: &str, min: &str) -> CollectionRow {
        CollectionRow {
            collection: name.to_string(),
            count: 10,
            recent_count: 2,
            min: min.to_string(),
            max: "2025-01-10T00:00:00".to_string(),
        }
    }

    #[test]
    fn test_zoneless_timestamp_is_utc() {
        let ts = parse_timestamp("2025-01-02T03:04:05.678").unwrap();
        assert_eq!(ts.timestamp_millis(), Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap().timestamp_millis() + 678);
        assert!(parse_timestamp("2025-01-02T03:04:05Z").is_ok());
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_is_new_uses_window() {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();

        let fresh = CollectionRecord::from_row(row("uk.skyblur.post", "2025-01-08T00:00:00"), now, 72).unwrap();
        assert!(fresh.is_new);

        let old = CollectionRecord::from_row(row("uk.skyblur.post", "2025-01-01T00:00:00"), now, 72).unwrap();
        assert!(!old.is_new);
    }

    #[test]
    fn test_schema_key_substring_match() {
        let keys: SchemaKeySet = ["uk.skyblur.post"].into_iter().collect();
        assert!(keys.matches("uk.skyblur.post"));
        assert!(keys.matches("uk.skyblur.post.extra"));
        assert!(!keys.matches("uk.skyblur"));
        assert!(!SchemaKeySet::new().matches("uk.skyblur.post"));
    }
}
