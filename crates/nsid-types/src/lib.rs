pub mod collection;
pub mod did;
pub mod document;
pub mod error;
pub mod locator;

// Re-export key types for convenience
pub use collection::{
    parse_timestamp, CollectionRecord, CollectionRow, SchemaKeyRow, SchemaKeySet, NEW_COLLECTION_WINDOW_HOURS,
};
pub use did::Did;
pub use document::{DidDocument, DidService, ATPROTO_PDS_FRAGMENT};
pub use error::{TypeError, TypeResult};
pub use locator::RecordLocator;
