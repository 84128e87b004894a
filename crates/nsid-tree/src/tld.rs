use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Top-level labels accepted when invalid TLDs are excluded
pub const DEFAULT_TLDS: &[&str] = &[
    // generic
    "app", "art", "biz", "blog", "blue", "cafe", "chat", "cloud", "club", "co", "com", "community", "coop",
    "design", "dev", "edu", "email", "fun", "games", "gay", "gov", "group", "info", "ink", "io", "link", "live",
    "me", "moe", "name", "net", "network", "news", "ninja", "one", "online", "org", "page", "pet", "photo",
    "pro", "pub", "run", "sh", "site", "social", "software", "space", "studio", "systems", "team", "tech",
    "tools", "tv", "wiki", "work", "works", "world", "xyz", "zone",
    // country code
    "ai", "ar", "at", "au", "be", "br", "ca", "cat", "cc", "ch", "cl", "cn", "cz", "de", "dk", "es", "eu",
    "fi", "fm", "fr", "ge", "gg", "gr", "hk", "hu", "id", "ie", "im", "in", "is", "it", "jp", "kr", "la",
    "ly", "mx", "my", "nl", "no", "nz", "ph", "pl", "pt", "ro", "ru", "se", "sg", "th", "to", "tw", "ua",
    "uk", "us", "vn", "ws", "za",
];

/// Set of accepted top-level labels, compared case-insensitively
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TldAllowList {
    labels: BTreeSet<String>,
}

impl Default for TldAllowList {
    fn default() -> Self {
        DEFAULT_TLDS.iter().copied().collect()
    }
}

impl TldAllowList {
    pub fn allows(&self, label: &str) -> bool {
        self.labels.contains(&label.to_lowercase())
    }

    /// True when the first dot segment of `path` is an accepted label
    pub fn allows_path(&self, path: &str) -> bool {
        path.split('.').next().map_or(false, |tld| self.allows(tld))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for TldAllowList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().map(|s| s.as_ref().trim().to_lowercase()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_list() {
        let tlds = TldAllowList::default();
        assert!(tlds.allows_path("uk.skyblur.post"));
        assert!(tlds.allows_path("App.bsky.feed.post"));
        assert!(!tlds.allows_path("xx.bogus.thing"));
        assert!(!tlds.allows_path("test.local"));
    }

    #[test]
    fn test_custom_list_is_case_insensitive() {
        let tlds: TldAllowList = ["UK", " jp "].into_iter().collect();
        assert!(tlds.allows("uk"));
        assert!(tlds.allows("JP"));
        assert_eq!(tlds.len(), 2);
    }
}
