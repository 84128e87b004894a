use nsid_types::CollectionRecord;

use crate::options::FilterOptions;

const TRANSACTION_PREFIXES: &[&str] = &["ge.shadowcaster"];
const NOISY_FRAGMENTS: &[&str] = &["---", "aaa", "zzz"];

/// Collections created per transaction, one name per trade
pub fn is_transaction_collection(name: &str) -> bool {
    TRANSACTION_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

/// Transaction collections plus names with placeholder runs
pub fn is_noisy_collection(name: &str) -> bool {
    is_transaction_collection(name) || NOISY_FRAGMENTS.iter().any(|fragment| name.contains(fragment))
}

/// Apply the record-level filters that run before tree construction
pub fn filter_records(records: &[CollectionRecord], options: &FilterOptions) -> Vec<CollectionRecord> {
    let search = options.search_term();

    records
        .iter()
        .filter(|r| !options.except_collection_with_transaction || !is_noisy_collection(&r.name))
        .filter(|r| search.as_ref().map_or(true, |q| r.name.to_lowercase().contains(q.as_str())))
        .filter(|r| options.first_indexed.contains(r.first_indexed_at))
        .filter(|r| options.last_indexed.contains(r.last_indexed_at))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DateRange;
    use chrono::{TimeZone, Utc};

    fn record(name: &str, first_day: u32, last_day: u32) -> CollectionRecord {
        CollectionRecord {
            name: name.to_string(),
            event_count: 5,
            recent_event_count: 1,
            first_indexed_at: Utc.with_ymd_and_hms(2025, 1, first_day, 10, 0, 0).unwrap(),
            last_indexed_at: Utc.with_ymd_and_hms(2025, 1, last_day, 10, 0, 0).unwrap(),
            is_new: false,
        }
    }

    fn names(records: &[CollectionRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_noise_rule() {
        assert!(is_noisy_collection("ge.shadowcaster.tx.abc"));
        assert!(is_noisy_collection("com.example---x"));
        assert!(is_noisy_collection("com.aaa.test"));
        assert!(!is_noisy_collection("uk.skyblur.post"));

        assert!(is_transaction_collection("ge.shadowcaster.tx.abc"));
        assert!(!is_transaction_collection("com.aaa.test"));
    }

    #[test]
    fn test_noise_exclusion_is_optional() {
        let input = vec![record("uk.skyblur.post", 1, 2), record("ge.shadowcaster.tx", 1, 2)];

        assert_eq!(filter_records(&input, &FilterOptions::unfiltered()).len(), 2);

        let options = FilterOptions {
            except_collection_with_transaction: true,
            ..FilterOptions::unfiltered()
        };
        assert_eq!(names(&filter_records(&input, &options)), vec!["uk.skyblur.post"]);
    }

    #[test]
    fn test_date_ranges_are_inclusive() {
        let input = vec![
            record("a.one", 1, 5),
            record("a.two", 3, 6),
            record("a.three", 4, 9),
        ];

        let options = FilterOptions {
            first_indexed: DateRange::parse("2025-01-01", "2025-01-03").unwrap(),
            last_indexed: DateRange::parse("2025-01-06", "").unwrap(),
            ..FilterOptions::unfiltered()
        };

        assert_eq!(names(&filter_records(&input, &options)), vec!["a.two"]);
    }
}
