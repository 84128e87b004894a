use nsid_tree::FilterOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{BrowserError, BrowserResult};

/// Fixed storage key of the persisted preference flags
pub const PREFERENCE_STORAGE_KEY: &str = "nsid-browser.preference";

/// User toggles that survive restarts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    #[serde(default)]
    pub except_collection_with_transaction: bool,
    #[serde(rename = "exceptInvalidTLDs", default = "default_true")]
    pub except_invalid_tlds: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            except_collection_with_transaction: false,
            except_invalid_tlds: true,
        }
    }
}

impl Preferences {
    /// Copy the toggles into a set of filter options
    pub fn apply(&self, options: &mut FilterOptions) {
        options.except_collection_with_transaction = self.except_collection_with_transaction;
        options.except_invalid_tlds = self.except_invalid_tlds;
    }
}

/// Persistence adapter: read at startup, write on change
pub trait PreferenceStore: Send + Sync {
    fn load(&self) -> BrowserResult<Preferences>;
    fn save(&self, preferences: &Preferences) -> BrowserResult<()>;
}

/// Stores preferences as `<dir>/nsid-browser.preference.json`
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            path: dir.as_ref().join(format!("{}.json", PREFERENCE_STORAGE_KEY)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> BrowserResult<Preferences> {
        if !self.path.exists() {
            debug!("No preferences at {}, using defaults", self.path.display());
            return Ok(Preferences::default());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| BrowserError::Preference(format!("Failed to read {}: {}", self.path.display(), e)))?;

        match serde_json::from_str(&content) {
            Ok(preferences) => Ok(preferences),
            Err(e) => {
                warn!("Ignoring unreadable preferences at {}: {}", self.path.display(), e);
                Ok(Preferences::default())
            }
        }
    }

    fn save(&self, preferences: &Preferences) -> BrowserResult<()> {
        let content = serde_json::to_string_pretty(preferences)
            .map_err(|e| BrowserError::Serialization(format!("Failed to serialize preferences: {}", e)))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| BrowserError::Preference(format!("Failed to create {}: {}", parent.display(), e)))?;
        }

        fs::write(&self.path, content)
            .map_err(|e| BrowserError::Preference(format!("Failed to write {}: {}", self.path.display(), e)))
    }
}

/// Keeps preferences for the lifetime of the process only
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    stored: Mutex<Option<Preferences>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> BrowserResult<Preferences> {
        let stored = self
            .stored
            .lock()
            .map_err(|_| BrowserError::Preference("Preference lock poisoned".to_string()))?;
        Ok(stored.unwrap_or_default())
    }

    fn save(&self, preferences: &Preferences) -> BrowserResult<()> {
        let mut stored = self
            .stored
            .lock()
            .map_err(|_| BrowserError::Preference("Preference lock poisoned".to_string()))?;
        *stored = Some(*preferences);
        Ok(())
    }
}
