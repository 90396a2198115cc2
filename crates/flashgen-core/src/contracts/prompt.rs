//! `POST /prompt/` request and response bodies.

use serde::{Deserialize, Serialize};

use crate::domain::PromptRequest;

/// Exercise generation endpoint.
pub const PROMPT_PATH: &str = "/prompt/";

/// Name of the field carrying the generated sentence in the response.
pub const RESPONSE_FIELD: &str = "response";

/// Request body: `{"front_side": ..., "back_side": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequestBody {
    pub front_side: String,
    pub back_side: String,
}

impl From<&PromptRequest> for PromptRequestBody {
    fn from(request: &PromptRequest) -> Self {
        Self {
            front_side: request.front_text.clone(),
            back_side: request.back_text.clone(),
        }
    }
}

/// Response body: `{"response": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptResponseBody {
    pub response: String,
}

impl PromptResponseBody {
    /// Extract the response from an already-parsed JSON document.
    ///
    /// Returns `None` when the document is not an object or the field is
    /// missing or not a string.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        value
            .get(RESPONSE_FIELD)
            .and_then(serde_json::Value::as_str)
            .map(|text| Self {
                response: text.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_uses_wire_field_names() {
        let body = PromptRequestBody::from(&PromptRequest::new("run", "to run"));
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value, json!({"front_side": "run", "back_side": "to run"}));
    }

    #[test]
    fn response_field_is_extracted() {
        let value = json!({"response": "He likes to ___ every morning."});
        let body = PromptResponseBody::from_value(&value).unwrap();
        assert_eq!(body.response, "He likes to ___ every morning.");
    }

    #[test]
    fn missing_or_mistyped_field_yields_none() {
        assert!(PromptResponseBody::from_value(&json!({"answer": "x"})).is_none());
        assert!(PromptResponseBody::from_value(&json!({"response": 42})).is_none());
        assert!(PromptResponseBody::from_value(&json!(["response"])).is_none());
    }
}
