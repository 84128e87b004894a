use nsid_types::{DidDocument, ATPROTO_PDS_FRAGMENT};
use serde_json::Value;

use crate::error::{ResolveError, ResolveResult};

/// Extract the hosting-service endpoint from a DID document.
///
/// An array endpoint yields its first element. Nothing is substituted when
/// the entry is missing.
pub fn service_endpoint(document: &DidDocument) -> ResolveResult<String> {
    let service = document.find_service(ATPROTO_PDS_FRAGMENT).ok_or_else(|| {
        ResolveError::NotFound(format!("{} has no {} service", document.id, ATPROTO_PDS_FRAGMENT))
    })?;

    let endpoint = match &service.service_endpoint {
        Value::String(endpoint) => endpoint.as_str(),
        Value::Array(endpoints) => match endpoints.first() {
            Some(Value::String(endpoint)) => endpoint.as_str(),
            other => {
                return Err(ResolveError::InvalidEndpoint(format!(
                    "First endpoint of {} is not a string: {:?}",
                    document.id, other
                )));
            }
        },
        other => {
            return Err(ResolveError::InvalidEndpoint(format!(
                "Unexpected endpoint shape for {}: {}",
                document.id, other
            )));
        }
    };

    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        return Err(ResolveError::InvalidEndpoint(format!("Empty endpoint for {}", document.id)));
    }

    Ok(endpoint.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(endpoint: Value) -> DidDocument {
        serde_json::from_value(json!({
            "id": "did:plc:abc",
            "service": [{ "id": "#atproto_pds", "type": "AtprotoPersonalDataServer", "serviceEndpoint": endpoint }]
        }))
        .unwrap()
    }

    #[test]
    fn test_scalar_endpoint() {
        assert_eq!(service_endpoint(&document(json!("https://pds.example"))).unwrap(), "https://pds.example");
    }

    #[test]
    fn test_array_endpoint_takes_first() {
        let doc = document(json!(["https://first.example", "https://second.example"]));
        assert_eq!(service_endpoint(&doc).unwrap(), "https://first.example");
    }

    #[test]
    fn test_invalid_shapes() {
        assert!(matches!(service_endpoint(&document(json!({"uri": "x"}))), Err(ResolveError::InvalidEndpoint(_))));
        assert!(matches!(service_endpoint(&document(json!([]))), Err(ResolveError::InvalidEndpoint(_))));
        assert!(matches!(service_endpoint(&document(json!(42))), Err(ResolveError::InvalidEndpoint(_))));
    }

    #[test]
    fn test_missing_service_is_not_found() {
        let doc: DidDocument = serde_json::from_value(json!({
            "id": "did:plc:abc",
            "service": [{ "id": "#bsky_chat", "serviceEndpoint": "https://chat.example" }]
        }))
        .unwrap();

        assert!(matches!(service_endpoint(&doc), Err(ResolveError::NotFound(_))));
    }
}
