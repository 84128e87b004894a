use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::error::{TypeError, TypeResult};

/// Decentralized identifier naming an account or operator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did {
    /// Full DID string, e.g. "did:plc:ewvi7nxzyoun6zhxrhs64oiz"
    did_string: String,

    /// Method name, e.g. "plc"
    method: String,

    /// Method-specific identifier
    id: String,
}

impl Did {
    /// Create a new DID from its components
    pub fn new(method: &str, id: &str) -> Self {
        Self {
            did_string: format!("did:{}:{}", method, id),
            method: method.to_string(),
            id: id.to_string(),
        }
    }

    /// Try to parse a DID string
    pub fn parse(did_string: &str) -> TypeResult<Self> {
        let did_string = did_string.trim();
        let parts: Vec<&str> = did_string.splitn(3, ':').collect();

        if parts.len() < 3 || parts[0] != "did" {
            return Err(TypeError::InvalidDid(format!("Invalid DID format: {}", did_string)));
        }

        let method = parts[1];
        if method.is_empty() || !method.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()) {
            return Err(TypeError::InvalidDid(format!("Invalid DID method in {}", did_string)));
        }

        if parts[2].is_empty() {
            return Err(TypeError::InvalidDid(format!("Missing method-specific id in {}", did_string)));
        }

        Ok(Self {
            did_string: did_string.to_string(),
            method: method.to_string(),
            id: parts[2].to_string(),
        })
    }

    /// The method token used to pick a resolver
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The method-specific identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn as_str(&self) -> &str {
        &self.did_string
    }
}

impl Display for Did {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.did_string)
    }
}

impl FromStr for Did {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Did {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.did_string
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plc() {
        let did = Did::parse("did:plc:abc123").unwrap();
        assert_eq!(did.method(), "plc");
        assert_eq!(did.id(), "abc123");
        assert_eq!(did.to_string(), "did:plc:abc123");
    }

    #[test]
    fn test_parse_web_keeps_port_separator() {
        let did = Did::parse("did:web:localhost%3A8080:user").unwrap();
        assert_eq!(did.method(), "web");
        assert_eq!(did.id(), "localhost%3A8080:user");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Did::parse("plc:abc").is_err());
        assert!(Did::parse("did:plc:").is_err());
        assert!(Did::parse("did::abc").is_err());
        assert!(Did::parse("did:PLC:abc").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let did: Did = serde_json::from_str("\"did:plc:xyz\"").unwrap();
        assert_eq!(did, Did::new("plc", "xyz"));
        assert_eq!(serde_json::to_string(&did).unwrap(), "\"did:plc:xyz\"");
    }
}
