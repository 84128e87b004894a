use nsid_resolver::ResolveError;
use nsid_types::TypeError;
use thiserror::Error;

/// Browser errors
#[derive(Error, Debug)]
pub enum BrowserError {
    /// Data API request failed or answered with an error
    #[error("Data API error: {0}")]
    Api(String),

    /// Identifier resolution or record fetch failed
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// User input could not be parsed
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] TypeError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Preference persistence error
    #[error("Preference error: {0}")]
    Preference(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// Click on a path that is not in the current tree
    #[error("No node {0} in the current tree")]
    UnknownNode(String),

    /// A newer request superseded this one before it finished
    #[error("Superseded request: {0}")]
    Stale(String),
}

impl BrowserError {
    pub fn is_stale(&self) -> bool {
        matches!(self, BrowserError::Stale(_))
    }
}

/// Browser result type
pub type BrowserResult<T> = Result<T, BrowserError>;

impl From<reqwest::Error> for BrowserError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            BrowserError::Api(format!("Connection timeout: {}", error))
        } else if error.is_connect() {
            BrowserError::Api(format!("Connection error: {}", error))
        } else {
            BrowserError::Api(format!("HTTP error: {}", error))
        }
    }
}
