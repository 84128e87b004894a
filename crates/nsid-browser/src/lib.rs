pub mod activity;
pub mod config;
pub mod data_api;
pub mod error;
pub mod generation;
pub mod preference;
pub mod session;
pub mod summary;

// Re-export key types for convenience
pub use activity::{fill_daily_gaps, DailyCount, DailyView, FeedRange, FeedServer};
pub use config::{AppConfig, DataApiConfig, LoggingConfig, TreeConfig};
pub use data_api::{CollectionStats, DataApiClient, DataEndpoint};
pub use error::{BrowserError, BrowserResult};
pub use generation::{Generation, Ticket};
pub use preference::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, Preferences, PREFERENCE_STORAGE_KEY};
pub use session::{describe_failure, BrowserSession, DetailView};
pub use summary::DashboardSummary;
