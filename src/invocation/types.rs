// Invocation envelope types
// Request/response shapes used by the host's custom handler protocol

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

use super::error::{InvocationError, MetadataTypeMismatch};

/// Request envelope delivered by the host for a single trigger invocation
#[derive(Debug, Default, Deserialize)]
pub struct InvocationRequest {
    /// Input bindings keyed by binding name
    #[serde(rename = "Data", default, deserialize_with = "null_as_empty")]
    pub data: HashMap<String, Value>,
    /// Host-supplied context about the triggering message
    #[serde(rename = "Metadata", default, deserialize_with = "null_as_empty")]
    pub metadata: HashMap<String, Value>,
}

/// Response envelope returned to the host
#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct InvocationResponse {
    /// Output bindings keyed by binding name
    pub outputs: Map<String, Value>,
    /// Log lines the host attaches to the invocation record
    pub logs: Vec<String>,
    /// Function return value, serialized as `null` when absent
    pub return_value: Option<Value>,
}

/// Decoded value of an input binding
///
/// The host hands queue messages over as JSON strings. When the string
/// itself holds JSON, the decoded value is used; otherwise the text is kept
/// verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum MessagePayload {
    Json(Value),
    Raw(String),
}

impl InvocationRequest {
    /// Decode an envelope from a request body
    ///
    /// A bare `null` body is an empty envelope.
    pub fn from_slice(body: &[u8]) -> Result<Self, InvocationError> {
        serde_json::from_slice::<Option<Self>>(body)
            .map(Option::unwrap_or_default)
            .map_err(InvocationError::MalformedRequest)
    }

    /// Decoded payload of the named input binding, `None` when absent
    pub fn message(&self, binding: &str) -> Option<MessagePayload> {
        self.data.get(binding).map(MessagePayload::decode)
    }

    /// Raw metadata value, `None` when absent
    pub fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Metadata value that must be a string
    ///
    /// Absent keys are `Ok(None)`; present keys of any other JSON type yield
    /// [`MetadataTypeMismatch`].
    pub fn metadata_str(&self, key: &str) -> Result<Option<&str>, MetadataTypeMismatch> {
        match self.metadata.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(MetadataTypeMismatch {
                key: key.to_string(),
                expected: "string",
                found: value_kind(other),
            }),
        }
    }
}

impl InvocationResponse {
    /// Response with no outputs and no return value
    pub fn from_logs(logs: Vec<String>) -> Self {
        Self {
            outputs: Map::new(),
            logs,
            return_value: None,
        }
    }
}

impl MessagePayload {
    pub fn decode(raw: &Value) -> Self {
        match raw {
            Value::String(text) => {
                serde_json::from_str(text).map_or_else(|_| Self::Raw(text.clone()), Self::Json)
            }
            other => Self::Json(other.clone()),
        }
    }
}

impl fmt::Display for MessagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(value) => write!(f, "{value}"),
            Self::Raw(text) => f.write_str(text),
        }
    }
}

/// JSON type name of a value, used in mismatch reports
pub const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// The host may send `"Data": null` for triggers without inputs
fn null_as_empty<'de, D>(deserializer: D) -> Result<HashMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(body: &str) -> InvocationRequest {
        InvocationRequest::from_slice(body.as_bytes()).expect("valid envelope")
    }

    #[test]
    fn test_message_json_number_is_decoded() {
        let req = parse(r#"{"Data":{"message":"42"},"Metadata":{}}"#);
        assert_eq!(req.message("message"), Some(MessagePayload::Json(json!(42))));
    }

    #[test]
    fn test_message_json_object_is_decoded() {
        let req = parse(r#"{"Data":{"message":"{\"order\":7,\"items\":[1,2]}"}}"#);
        assert_eq!(
            req.message("message"),
            Some(MessagePayload::Json(json!({"order": 7, "items": [1, 2]})))
        );
    }

    #[test]
    fn test_message_plain_text_falls_back_to_string() {
        let req = parse(r#"{"Data":{"message":"hello world"}}"#);
        assert_eq!(
            req.message("message"),
            Some(MessagePayload::Raw("hello world".to_string()))
        );
        assert_eq!(req.message("message").unwrap().to_string(), "hello world");
    }

    #[test]
    fn test_message_non_string_value_taken_as_is() {
        let req = parse(r#"{"Data":{"message":{"a":true}}}"#);
        assert_eq!(req.message("message"), Some(MessagePayload::Json(json!({"a": true}))));
    }

    #[test]
    fn test_message_absent() {
        let req = parse(r#"{"Data":{},"Metadata":{}}"#);
        assert_eq!(req.message("message"), None);

        let req = parse(r"{}");
        assert!(req.data.is_empty());
        assert!(req.metadata.is_empty());
    }

    #[test]
    fn test_null_sections_are_empty() {
        let req = parse(r#"{"Data":null,"Metadata":null}"#);
        assert!(req.data.is_empty());
        assert!(req.metadata.is_empty());
    }

    #[test]
    fn test_null_body_is_empty_envelope() {
        let req = parse("null");
        assert!(req.data.is_empty());
        assert!(req.metadata.is_empty());
        assert_eq!(req.message("message"), None);
    }

    #[test]
    fn test_malformed_envelopes_rejected() {
        for body in ["{", "", "42", r#"{"Data":"oops"}"#, r#"{"Metadata":[1]}"#] {
            assert!(
                matches!(
                    InvocationRequest::from_slice(body.as_bytes()),
                    Err(InvocationError::MalformedRequest(_))
                ),
                "expected rejection for {body:?}"
            );
        }
    }

    #[test]
    fn test_metadata_str() {
        let req = parse(r#"{"Metadata":{"MessageId":"abc-123","DeliveryCount":3}}"#);
        assert_eq!(req.metadata_str("MessageId").unwrap(), Some("abc-123"));
        assert_eq!(req.metadata_str("EnqueuedTimeUtc").unwrap(), None);

        assert_eq!(
            req.metadata_str("DeliveryCount"),
            Err(MetadataTypeMismatch {
                key: "DeliveryCount".to_string(),
                expected: "string",
                found: "number",
            })
        );
    }

    #[test]
    fn test_response_wire_shape() {
        let resp = InvocationResponse::from_logs(vec!["start".to_string(), "end".to_string()]);
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            value,
            json!({"Outputs": {}, "Logs": ["start", "end"], "ReturnValue": null})
        );
    }
}
