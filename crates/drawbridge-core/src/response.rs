//! Uniform response envelope returned for every command.

use crate::error::CommandError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// One block of response content: a human-readable line plus an optional
/// structured payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Result envelope for a command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub content: Vec<Content>,
    pub is_error: bool,
}

impl Response {
    /// A successful response with a single line of text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content {
                text: text.into(),
                payload: None,
            }],
            is_error: false,
        }
    }

    /// A successful response carrying structured data.
    pub fn with_payload(text: impl Into<String>, payload: Value) -> Self {
        Self {
            content: vec![Content {
                text: text.into(),
                payload: Some(payload),
            }],
            is_error: false,
        }
    }

    /// Append another content block.
    pub fn push(&mut self, text: impl Into<String>, payload: Option<Value>) {
        self.content.push(Content {
            text: text.into(),
            payload,
        });
    }

    /// The error envelope for a failed command.
    pub fn error(err: &CommandError) -> Self {
        Self {
            content: vec![Content {
                text: format!("Error: {}", err),
                payload: Some(json!({ "code": err.code() })),
            }],
            is_error: true,
        }
    }

    /// Text of the first content block.
    pub fn summary(&self) -> &str {
        self.content.first().map(|c| c.text.as_str()).unwrap_or("")
    }

    /// Payload of the first content block.
    pub fn payload(&self) -> Option<&Value> {
        self.content.first().and_then(|c| c.payload.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_wire_shape() {
        let response = Response::with_payload("Created", json!({"id": "e1"}));
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({"content": [{"text": "Created", "payload": {"id": "e1"}}], "isError": false})
        );
    }

    #[test]
    fn test_text_only_omits_payload() {
        let value = serde_json::to_value(Response::text("ok")).unwrap();
        assert_eq!(value, json!({"content": [{"text": "ok"}], "isError": false}));
    }

    #[test]
    fn test_error_envelope() {
        let response = Response::error(&CommandError::element_not_found("e9"));
        assert!(response.is_error);
        assert_eq!(response.summary(), "Error: Element not found: e9");
        assert_eq!(response.payload(), Some(&json!({"code": "not_found"})));
    }
}
