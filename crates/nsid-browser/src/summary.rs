use chrono::{DateTime, Utc};
use nsid_types::CollectionRecord;
use nsid_tree::is_transaction_collection;
use serde::Serialize;

use crate::activity::{cursor_lag_minutes, cursor_time};
use std::collections::BTreeSet;

/// Headline numbers for the collection dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub total_collections: usize,
    pub new_collections: usize,
    /// Distinct two-segment namespaces, e.g. `app.bsky`
    pub namespace_count: usize,
    pub earliest_collection: Option<String>,
    pub indexed_since: Option<DateTime<Utc>>,
    pub total_events: u64,
    /// Distinct repositories seen by the indexer, when the data API reported it
    pub unique_did_count: Option<u64>,
    /// Instant of the indexer's firehose cursor
    pub indexed_until: Option<DateTime<Utc>>,
    /// Minutes the cursor trails the time of the summary
    pub indexer_lag_minutes: Option<i64>,
}

impl DashboardSummary {
    pub fn from_records(records: &[CollectionRecord]) -> Self {
        let namespaces: BTreeSet<String> = records
            .iter()
            .filter_map(|r| {
                let parts: Vec<&str> = r.name.split('.').collect();
                (parts.len() >= 2).then(|| parts[..2].join("."))
            })
            .collect();

        let earliest = records.iter().min_by_key(|r| r.first_indexed_at);

        Self {
            total_collections: records.len(),
            new_collections: records.iter().filter(|r| r.is_new).count(),
            namespace_count: namespaces.len(),
            earliest_collection: earliest.map(|r| r.name.clone()),
            indexed_since: earliest.map(|r| r.first_indexed_at),
            total_events: records.iter().map(|r| r.event_count).sum(),
            unique_did_count: None,
            indexed_until: None,
            indexer_lag_minutes: None,
        }
    }

    /// Like `from_records`, leaving out transaction collections when asked to
    pub fn from_visible_records(records: &[CollectionRecord], except_transaction: bool) -> Self {
        if !except_transaction {
            return Self::from_records(records);
        }

        let visible: Vec<CollectionRecord> = records
            .iter()
            .filter(|r| !is_transaction_collection(&r.name))
            .cloned()
            .collect();
        Self::from_records(&visible)
    }

    /// Attach the indexer's firehose position as of `now`
    pub fn with_indexer_cursor(mut self, cursor_us: Option<i64>, now: DateTime<Utc>) -> Self {
        self.indexed_until = cursor_us.map(cursor_time);
        self.indexer_lag_minutes = cursor_us.map(|cursor| cursor_lag_minutes(cursor, now));
        self
    }
}
