use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use crate::did::Did;
use crate::error::{TypeError, TypeResult};

const AT_URI_SCHEME: &str = "at://";

/// Three-part address of a single record: owner, collection and record key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordLocator {
    pub repo: Did,
    pub collection: String,
    pub rkey: String,
}

impl RecordLocator {
    pub fn new(repo: Did, collection: impl Into<String>, rkey: impl Into<String>) -> Self {
        Self {
            repo,
            collection: collection.into(),
            rkey: rkey.into(),
        }
    }

    /// Parse an `at://<did>/<collection>/<rkey>` URI. The scheme prefix is optional.
    pub fn parse(uri: &str) -> TypeResult<Self> {
        let trimmed = uri.trim();
        let path = trimmed.strip_prefix(AT_URI_SCHEME).unwrap_or(trimmed);
        let parts: Vec<&str> = path.split('/').collect();

        if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
            return Err(TypeError::InvalidLocator(format!(
                "Expected at://<did>/<collection>/<rkey>, got {}",
                uri
            )));
        }

        let repo = Did::parse(parts[0])
            .map_err(|e| TypeError::InvalidLocator(format!("{}: {}", uri, e)))?;

        Ok(Self::new(repo, parts[1], parts[2]))
    }
}

impl Display for RecordLocator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}/{}", AT_URI_SCHEME, self.repo, self.collection, self.rkey)
    }
}

impl FromStr for RecordLocator {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
