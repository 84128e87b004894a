pub mod config;
pub mod dns;
pub mod endpoint;
pub mod error;
pub mod pipeline;
pub mod plc;
pub mod record;
pub mod registry;
pub mod web;

pub use config::ResolverConfig;
pub use dns::{extract_did, lexicon_txt_name, DnsTxtResolver};
pub use endpoint::service_endpoint;
pub use error::{ResolveError, ResolveResult};
pub use pipeline::{LexiconPipeline, LexiconSchema, ResolvedRecord, LEXICON_SCHEMA_COLLECTION};
pub use plc::UniversalResolver;
pub use record::RecordFetcher;
pub use registry::{DidResolver, ResolverRegistry};
pub use web::WebResolver;
