use thiserror::Error;
use nsid_types::TypeError;

/// Resolution and fetch errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// DNS record, DID document, service entry or record is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// The service endpoint is missing or has an unusable shape
    #[error("Invalid service endpoint: {0}")]
    InvalidEndpoint(String),

    /// Transport-level failure reaching a host
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// A service answered but the answer could not be used
    #[error("Resolution failed: {0}")]
    ResolutionFailed(String),

    /// No resolver is registered for the DID method
    #[error("Unsupported DID method: {0}")]
    UnsupportedMethod(String),

    /// Input identifier is malformed
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// HTTP client could not be configured
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound(_))
    }
}

/// Resolver result type
pub type ResolveResult<T> = Result<T, ResolveError>;

impl From<reqwest::Error> for ResolveError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ResolveError::NetworkFailure(format!("Connection timeout: {}", error))
        } else if error.is_connect() {
            ResolveError::NetworkFailure(format!("Connection error: {}", error))
        } else if error.is_decode() {
            ResolveError::ResolutionFailed(format!("Undecodable response: {}", error))
        } else {
            ResolveError::NetworkFailure(format!("HTTP error: {}", error))
        }
    }
}

impl From<TypeError> for ResolveError {
    fn from(error: TypeError) -> Self {
        ResolveError::MalformedInput(error.to_string())
    }
}
