use nsid_resolver::ResolverConfig;
use nsid_tree::{TldAllowList, TreeLayout};
use nsid_types::NEW_COLLECTION_WINDOW_HOURS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BrowserError, BrowserResult};

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the persisted preference flags
    #[serde(default = "default_preferences_dir")]
    pub preferences_dir: PathBuf,
    /// Data API configuration
    #[serde(default)]
    pub data_api: DataApiConfig,
    /// Identifier resolution endpoints
    #[serde(default)]
    pub resolver: ResolverConfig,
    /// Tree layout configuration
    #[serde(default)]
    pub tree: TreeConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Data API configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataApiConfig {
    /// Base URL of the REST data API
    #[serde(default = "default_data_api_url")]
    pub base_url: String,
    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

/// Tree layout configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Leading segments joined into a root label
    #[serde(default = "default_root_segments")]
    pub root_segments: usize,
    /// Collapse single-child folder chains
    #[serde(default = "default_false")]
    pub compress: bool,
    /// Accepted top-level labels; the built-in list when absent
    #[serde(default)]
    pub allowed_tlds: Option<Vec<String>>,
    /// Window in hours for marking a collection as new
    #[serde(default = "default_new_window")]
    pub new_window_hours: i64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default functions for DataApiConfig
fn default_data_api_url() -> String {
    "https://collectiondata.usounds.work".to_string()
}

fn default_request_timeout() -> u64 {
    30 // 30 seconds
}

// Default functions for TreeConfig
fn default_root_segments() -> usize {
    nsid_tree::options::DEFAULT_ROOT_SEGMENTS
}

fn default_new_window() -> i64 {
    NEW_COLLECTION_WINDOW_HOURS
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_preferences_dir() -> PathBuf {
    PathBuf::from("./storage")
}

fn default_false() -> bool {
    false
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            preferences_dir: default_preferences_dir(),
            data_api: DataApiConfig::default(),
            resolver: ResolverConfig::default(),
            tree: TreeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DataApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_data_api_url(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            root_segments: default_root_segments(),
            compress: default_false(),
            allowed_tlds: None,
            new_window_hours: default_new_window(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl TreeConfig {
    pub fn layout(&self) -> TreeLayout {
        TreeLayout {
            root_segments: self.root_segments.max(1),
            compress: self.compress,
        }
    }

    pub fn allow_list(&self) -> TldAllowList {
        match &self.allowed_tlds {
            Some(labels) => labels.iter().collect(),
            None => TldAllowList::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> BrowserResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| BrowserError::Io(format!("Failed to read config file {}: {}", path.display(), e)))?;

        toml::from_str(&content)
            .map_err(|e| BrowserError::Config(format!("Failed to parse config file {}: {}", path.display(), e)))
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> BrowserResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| BrowserError::Serialization(format!("Failed to serialize config: {}", e)))?;

        // Ensure the directory exists
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .map_err(|e| BrowserError::Io(format!("Failed to create config directory: {}", e)))?;
        }

        fs::write(path, content).map_err(|e| BrowserError::Io(format!("Failed to write config file: {}", e)))
    }

    /// Load or create default configuration
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> BrowserResult<Self> {
        if path.as_ref().exists() {
            return Self::load(path);
        }

        let config = Self::default();
        config.save(&path)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [data_api]
            base_url = "http://localhost:3000"

            [tree]
            compress = true
            allowed_tlds = ["uk", "app"]
            "#,
        )
        .unwrap();

        assert_eq!(config.data_api.base_url, "http://localhost:3000");
        assert_eq!(config.data_api.request_timeout_seconds, 30);
        assert_eq!(config.resolver, ResolverConfig::default());
        assert_eq!(config.tree.root_segments, 2);
        assert!(config.tree.layout().compress);
        assert!(config.tree.allow_list().allows("UK"));
        assert!(!config.tree.allow_list().allows("com"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_or_create_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("nsid.toml");

        let created = AppConfig::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(AppConfig::load(&path).unwrap(), created);
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "data_api = 5").unwrap();

        assert!(matches!(AppConfig::load(&path), Err(BrowserError::Config(_))));
    }
}
