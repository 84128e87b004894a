use chrono::{DateTime, Duration, NaiveDate, Utc};
use nsid_types::{parse_timestamp, TypeError, TypeResult};
use serde::{Deserialize, Serialize};

use crate::tld::TldAllowList;

/// Root grouping depth: `uk.skyblur.post` is rooted at `uk.skyblur`
pub const DEFAULT_ROOT_SEGMENTS: usize = 2;

/// Shape of the built tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeLayout {
    /// Number of leading segments joined into a root label, at least 1
    pub root_segments: usize,
    /// Collapse single-child folder chains
    pub compress: bool,
}

impl Default for TreeLayout {
    fn default() -> Self {
        Self {
            root_segments: DEFAULT_ROOT_SEGMENTS,
            compress: false,
        }
    }
}

/// Inclusive timestamp bounds; a missing side is unconstrained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        Self { from, to }
    }

    /// Parse user-entered bounds. Empty strings leave the side open and a
    /// date-only `to` covers the whole day.
    pub fn parse(from: &str, to: &str) -> TypeResult<Self> {
        Ok(Self {
            from: parse_bound(from, false)?,
            to: parse_bound(to, true)?,
        })
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.from.map_or(true, |from| ts >= from) && self.to.map_or(true, |to| ts <= to)
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

fn parse_bound(value: &str, end_of_day: bool) -> TypeResult<Option<DateTime<Utc>>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    let normalized = value.replace('/', "-");
    if let Ok(date) = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d") {
        let start = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| TypeError::InvalidTimestamp(value.to_string()))?
            .and_utc();
        let bound = if end_of_day {
            start + Duration::days(1) - Duration::milliseconds(1)
        } else {
            start
        };
        return Ok(Some(bound));
    }

    parse_timestamp(&normalized).map(Some)
}

/// Every filter and layout switch that feeds a tree build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Case-insensitive substring of the collection name
    pub search: Option<String>,
    pub first_indexed: DateRange,
    pub last_indexed: DateRange,
    /// Drop transaction-keyed and placeholder collections
    pub except_collection_with_transaction: bool,
    /// Keep only roots under an accepted top-level label
    pub except_invalid_tlds: bool,
    /// Keep only branches leading to a published schema
    pub only_with_schema: bool,
    pub allowed_tlds: TldAllowList,
    pub layout: TreeLayout,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            search: None,
            first_indexed: DateRange::default(),
            last_indexed: DateRange::default(),
            except_collection_with_transaction: false,
            except_invalid_tlds: true,
            only_with_schema: false,
            allowed_tlds: TldAllowList::default(),
            layout: TreeLayout::default(),
        }
    }
}

impl FilterOptions {
    /// Options that keep every well-formed collection
    pub fn unfiltered() -> Self {
        Self {
            except_invalid_tlds: false,
            ..Self::default()
        }
    }

    /// Trimmed, lower-cased search text, or `None` when blank
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }
}
