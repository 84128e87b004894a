use thiserror::Error;

/// Errors raised while parsing shared types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// The string is not a `did:<method>:<id>` identifier
    #[error("Invalid DID: {0}")]
    InvalidDid(String),

    /// The string is not an `at://<did>/<collection>/<rkey>` locator
    #[error("Invalid record locator: {0}")]
    InvalidLocator(String),

    /// A timestamp or date bound could not be parsed
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

pub type TypeResult<T> = Result<T, TypeError>;
