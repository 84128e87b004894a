use serde::{Deserialize, Serialize};

/// Service id fragment that marks a user's hosting server
pub const ATPROTO_PDS_FRAGMENT: &str = "#atproto_pds";

/// The subset of a DID document this workspace reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    pub id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub also_known_as: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<Vec<DidService>>,
}

/// A `service` entry. The endpoint is kept raw because resolvers disagree on its shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidService {
    pub id: String,
    #[serde(rename = "type", default)]
    pub service_type: String,
    #[serde(default)]
    pub service_endpoint: serde_json::Value,
}

impl DidDocument {
    /// Find a service by fragment, accepting both `#frag` and `<did>#frag` ids
    pub fn find_service(&self, fragment: &str) -> Option<&DidService> {
        let qualified = format!("{}{}", self.id, fragment);
        self.service
            .as_deref()
            .unwrap_or_default()
            .iter()
            .find(|service| {
                let id = service.id.trim();
                id == fragment || id == qualified
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_find_service_by_fragment() {
        let doc: DidDocument = serde_json::from_value(json!({
            "id": "did:plc:abc",
            "alsoKnownAs": ["at://alice.example.com"],
            "service": [
                { "id": "#other", "type": "Other", "serviceEndpoint": "https://other.example" },
                { "id": " #atproto_pds ", "type": "AtprotoPersonalDataServer", "serviceEndpoint": "https://pds.example" }
            ]
        }))
        .unwrap();

        let service = doc.find_service(ATPROTO_PDS_FRAGMENT).unwrap();
        assert_eq!(service.service_endpoint, json!("https://pds.example"));
        assert_eq!(doc.also_known_as, vec!["at://alice.example.com".to_string()]);
    }

    #[test]
    fn test_find_service_qualified_id() {
        let doc: DidDocument = serde_json::from_value(json!({
            "id": "did:web:example.com",
            "service": [{ "id": "did:web:example.com#atproto_pds", "serviceEndpoint": "https://pds.example" }]
        }))
        .unwrap();

        assert!(doc.find_service(ATPROTO_PDS_FRAGMENT).is_some());
    }

    #[test]
    fn test_missing_service_list() {
        let doc: DidDocument = serde_json::from_value(json!({ "id": "did:plc:abc" })).unwrap();
        assert!(doc.find_service(ATPROTO_PDS_FRAGMENT).is_none());
    }
}
